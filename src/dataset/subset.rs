use crate::backend::{Backend, Tensor1D, Tensor2D};
use crate::dataset::Dataset;
use std::ops::Range;

/// View over selected rows of another dataset.
///
/// Sample `i` of the subset is sample `indices[i]` of the parent.
#[derive(Debug, Clone)]
pub struct Subset<'a, D> {
    dataset: &'a D,
    indices: Vec<usize>,
}

impl<'a, D: Dataset> Subset<'a, D> {
    pub fn new(dataset: &'a D, indices: Vec<usize>) -> Self {
        Self { dataset, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: Dataset> Dataset for Subset<'_, D> {
    type Error = D::Error;

    fn len(&self) -> Option<usize> {
        Some(self.indices.len())
    }

    fn get_batch<B: Backend>(
        &self,
        range: Range<usize>,
    ) -> Result<(Tensor2D<B>, Tensor1D<B>), Self::Error> {
        self.dataset.gather(&self.indices[range])
    }

    fn gather<B: Backend>(
        &self,
        indices: &[usize],
    ) -> Result<(Tensor2D<B>, Tensor1D<B>), Self::Error> {
        let mapped: Vec<usize> = indices.iter().map(|&i| self.indices[i]).collect();
        self.dataset.gather(&mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::dataset::InMemoryDataset;

    #[test]
    fn test_subset_maps_indices() {
        let ds = InMemoryDataset::new(
            (0..6).map(|i| vec![i as f64]).collect(),
            (0..6).map(|i| 100.0 + i as f64).collect(),
        )
        .unwrap();
        let sub = Subset::new(&ds, vec![4, 1, 5]);
        assert_eq!(sub.len(), Some(3));

        let (x, y) = sub.get_batch::<CpuBackend>(1..3).unwrap();
        assert_eq!(x.to_vec(), vec![1.0, 5.0]);
        assert_eq!(y.to_vec(), vec![101.0, 105.0]);

        let (_, y) = sub.gather::<CpuBackend>(&[2, 0]).unwrap();
        assert_eq!(y.to_vec(), vec![105.0, 104.0]);
    }
}
