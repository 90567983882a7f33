//! Datasets and mini-batch iteration.

use crate::backend::{Backend, Tensor1D, Tensor2D};
use rand::seq::SliceRandom;
use rand::Rng;
use std::{fmt::Debug, ops::Range};

pub mod memory;
pub mod queue_csv;
pub mod split;
pub mod subset;

pub use self::memory::InMemoryDataset;
pub use self::queue_csv::{QueueData, QueueRecord};
pub use self::split::{shuffled_split, Split};
pub use self::subset::Subset;

pub trait Dataset {
    type Error: Debug;

    /// Total number of samples, if known.
    fn len(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Sequential batches of at most `batch_size` samples.
    fn batches<B: Backend>(&self, batch_size: usize) -> DatasetBatchIter<'_, B, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
            order: None,
            _backend: std::marker::PhantomData,
        }
    }

    /// Batches over a fresh random permutation of the samples.
    fn shuffled_batches<B: Backend, R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> DatasetBatchIter<'_, B, Self>
    where
        Self: Sized,
    {
        let mut order: Vec<usize> = (0..self.len().unwrap_or(0)).collect();
        order.shuffle(rng);
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
            order: Some(order),
            _backend: std::marker::PhantomData,
        }
    }

    fn get_batch<B: Backend>(
        &self,
        range: Range<usize>,
    ) -> Result<(Tensor2D<B>, Tensor1D<B>), Self::Error>;

    /// Gathers the given samples, in order.
    fn gather<B: Backend>(
        &self,
        indices: &[usize],
    ) -> Result<(Tensor2D<B>, Tensor1D<B>), Self::Error>;
}

/// Iterator over the batches of a [`Dataset`].
pub struct DatasetBatchIter<'a, B: Backend, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
    order: Option<Vec<usize>>,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend, D: Dataset> Iterator for DatasetBatchIter<'_, B, D> {
    type Item = Result<(Tensor2D<B>, Tensor1D<B>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(match &self.order {
            Some(order) => self.dataset.gather::<B>(&order[range]),
            None => self.dataset.get_batch::<B>(range),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> InMemoryDataset {
        InMemoryDataset::new(
            (0..5).map(|i| vec![i as f64, 10.0 * i as f64]).collect(),
            (0..5).map(|i| i as f64).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_sequential_batches() {
        let ds = dataset();
        let sizes: Vec<usize> = ds
            .batches::<CpuBackend>(2)
            .map(|b| b.unwrap().1.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_shuffled_batches_cover_every_sample_once() {
        let ds = dataset();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen: Vec<f64> = ds
            .shuffled_batches::<CpuBackend, _>(2, &mut rng)
            .flat_map(|b| b.unwrap().1.to_vec())
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_shuffled_batches_keep_rows_aligned() {
        let ds = dataset();
        let mut rng = StdRng::seed_from_u64(3);
        for batch in ds.shuffled_batches::<CpuBackend, _>(3, &mut rng) {
            let (x, y) = batch.unwrap();
            assert_eq!(x.column(0).to_vec(), y.to_vec());
        }
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let ds = dataset();
        assert_eq!(ds.batches::<CpuBackend>(0).count(), 5);
    }
}
