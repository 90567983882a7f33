use crate::backend::{Backend, Tensor1D, Tensor2D};
use crate::dataset::Dataset;
use crate::error::{ModelError, Result};
use std::ops::Range;

/// Row-major feature matrix and targets held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    x: Vec<f64>,
    y: Vec<f64>,
    n_features: usize,
}

impl InMemoryDataset {
    pub fn new(x: Vec<Vec<f64>>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(ModelError::LengthMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ModelError::EmptyData("Dataset is empty".to_string()));
        }
        let n_features = x[0].len();
        if !x.iter().all(|row| row.len() == n_features) {
            return Err(ModelError::InvalidConfig(
                "All rows must have the same number of features".to_string(),
            ));
        }
        Ok(Self {
            x: x.into_iter().flatten().collect(),
            y,
            n_features,
        })
    }

    /// Copies tensors to host memory.
    pub fn from_tensors<B: Backend>(x: &Tensor2D<B>, y: &Tensor1D<B>) -> Result<Self> {
        let (rows, cols) = x.shape();
        if rows != y.len() {
            return Err(ModelError::LengthMismatch {
                expected: rows,
                got: y.len(),
            });
        }
        if rows == 0 {
            return Err(ModelError::EmptyData("Dataset is empty".to_string()));
        }
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            n_features: cols,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn targets(&self) -> &[f64] {
        &self.y
    }

    /// The whole dataset as one batch.
    pub fn to_tensors<B: Backend>(&self) -> (Tensor2D<B>, Tensor1D<B>) {
        (
            Tensor2D::new(self.x.clone(), self.y.len(), self.n_features),
            Tensor1D::new(self.y.clone()),
        )
    }
}

impl Dataset for InMemoryDataset {
    type Error = std::convert::Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.y.len())
    }

    fn get_batch<B: Backend>(
        &self,
        range: Range<usize>,
    ) -> std::result::Result<(Tensor2D<B>, Tensor1D<B>), Self::Error> {
        let f = self.n_features;
        let batch_size = range.len();
        let data = self.x[range.start * f..range.end * f].to_vec();

        Ok((
            Tensor2D::new(data, batch_size, f),
            Tensor1D::new(self.y[range].to_vec()),
        ))
    }

    fn gather<B: Backend>(
        &self,
        indices: &[usize],
    ) -> std::result::Result<(Tensor2D<B>, Tensor1D<B>), Self::Error> {
        let f = self.n_features;
        let mut data = Vec::with_capacity(indices.len() * f);
        for &i in indices {
            data.extend_from_slice(&self.x[i * f..(i + 1) * f]);
        }
        let y = indices.iter().map(|&i| self.y[i]).collect();

        Ok((Tensor2D::new(data, indices.len(), f), Tensor1D::new(y)))
    }
}
