use super::scalar::Scalar;
use super::tensor1d::Tensor1D;
use crate::backend::Backend;
use std::marker::PhantomData;

/// Backend-typed 2D tensor (row-major matrix).
///
/// # Example
/// ```
/// use queuenet::backend::{CpuBackend, Tensor2D};
///
/// let m = Tensor2D::<CpuBackend>::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(m.shape(), (2, 2));
/// assert_eq!(m.transpose().to_vec(), vec![1.0, 3.0, 2.0, 4.0]);
/// ```
#[derive(Clone)]
pub struct Tensor2D<B: Backend> {
    pub(crate) data: B::Tensor2D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor2D<B> {
    pub(crate) fn wrap(data: B::Tensor2D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Creates a matrix from row-major host data.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        Self::wrap(B::from_vec_2d(data, rows, cols))
    }

    /// Creates a matrix from a slice of equally sized rows.
    ///
    /// An empty slice yields a `(0, 0)` matrix.
    ///
    /// # Panics
    /// If rows have different lengths.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        assert!(
            rows.iter().all(|r| r.as_ref().len() == n_cols),
            "All rows must have the same length"
        );
        let data = rows.iter().flat_map(|r| r.as_ref().iter()).copied().collect();
        Self::new(data, n_rows, n_cols)
    }

    /// Creates a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::wrap(B::zeros_2d(rows, cols))
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::wrap(B::add_2d(&self.data, &other.data))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::wrap(B::sub_2d(&self.data, &other.data))
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::wrap(B::mul_2d(&self.data, &other.data))
    }

    pub fn div(&self, other: &Self) -> Self {
        Self::wrap(B::div_2d(&self.data, &other.data))
    }

    pub fn scale(&self, a: &Scalar<B>) -> Self {
        Self::wrap(B::mul_scalar_2d(&self.data, &a.data))
    }

    pub fn add_scalar(&self, a: &Scalar<B>) -> Self {
        Self::wrap(B::add_scalar_2d(&self.data, &a.data))
    }

    pub fn sqrt(&self) -> Self {
        Self::wrap(B::sqrt_2d(&self.data))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Scalar<B> {
        Scalar {
            data: B::sum_all_2d(&self.data),
            backend: PhantomData,
        }
    }

    /// Matrix product `self @ other`.
    pub fn matmul(&self, other: &Self) -> Self {
        Self::wrap(B::matmul(&self.data, &other.data))
    }

    pub fn transpose(&self) -> Self {
        Self::wrap(B::transpose(&self.data))
    }

    /// Adds `v[j]` to every element of column `j`.
    pub fn add_row_vector(&self, v: &Tensor1D<B>) -> Self {
        Self::wrap(B::broadcast_add_1d_to_2d_rows(&self.data, &v.data))
    }

    pub fn col_sum(&self) -> Tensor1D<B> {
        Tensor1D::wrap(B::col_sum_2d(&self.data))
    }

    pub fn col_min(&self) -> Tensor1D<B> {
        Tensor1D::wrap(B::col_min_2d(&self.data))
    }

    pub fn col_max(&self) -> Tensor1D<B> {
        Tensor1D::wrap(B::col_max_2d(&self.data))
    }

    /// Gathers the given rows, in order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self::wrap(B::select_rows_2d(&self.data, rows))
    }

    /// Copies column `j` into a 1D tensor.
    ///
    /// # Panics
    /// If `j` is out of bounds.
    pub fn column(&self, j: usize) -> Tensor1D<B> {
        let (rows, cols) = self.shape();
        assert!(j < cols, "column {} out of bounds for {} columns", j, cols);
        let flat = self.to_vec();
        Tensor1D::new((0..rows).map(|i| flat[i * cols + j]).collect())
    }

    pub fn relu(&self) -> Self {
        Self::wrap(B::relu_2d(&self.data))
    }

    /// `1.0` where the element is positive, else `0.0`.
    pub fn heaviside(&self) -> Self {
        Self::wrap(B::heaviside_2d(&self.data))
    }

    pub fn tanh(&self) -> Self {
        Self::wrap(B::tanh_2d(&self.data))
    }

    pub fn sigmoid(&self) -> Self {
        Self::wrap(B::sigmoid_2d(&self.data))
    }

    /// Flattens into a 1D tensor (row-major).
    pub fn ravel(&self) -> Tensor1D<B> {
        Tensor1D::wrap(B::ravel_2d(&self.data))
    }

    /// Row-major host copy of the data.
    pub fn to_vec(&self) -> Vec<f64> {
        B::to_vec_2d(&self.data)
    }

    /// Host copy as a vector of rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let (_, cols) = self.shape();
        if cols == 0 {
            return Vec::new();
        }
        self.to_vec().chunks(cols).map(|c| c.to_vec()).collect()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        B::shape(&self.data)
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }
}

impl<B: Backend> std::fmt::Debug for Tensor2D<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor2D")
            .field("shape", &self.shape())
            .field("data", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    #[test]
    fn test_from_rows_and_to_rows() {
        let m = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_from_rows_empty() {
        let rows: Vec<[f64; 2]> = Vec::new();
        let m = Tensor2D::<CpuBackend>::from_rows(&rows);
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_from_rows_ragged() {
        let _ = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
    }

    #[test]
    fn test_matmul() {
        // [[1, 2], [3, 4]] @ [[5], [6]] = [[17], [39]]
        let a = Tensor2D::<CpuBackend>::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = Tensor2D::<CpuBackend>::new(vec![5.0, 6.0], 2, 1);
        let c = a.matmul(&b);
        assert_eq!(c.shape(), (2, 1));
        assert_eq!(c.to_vec(), vec![17.0, 39.0]);
    }

    #[test]
    fn test_column_and_select_rows() {
        let m = Tensor2D::<CpuBackend>::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        assert_eq!(m.column(1).to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(m.select_rows(&[2, 0]).to_vec(), vec![5.0, 6.0, 1.0, 2.0]);
    }

    #[test]
    fn test_activations() {
        let m = Tensor2D::<CpuBackend>::new(vec![-1.0, 0.0, 2.0], 1, 3);
        assert_eq!(m.relu().to_vec(), vec![0.0, 0.0, 2.0]);
        assert_eq!(m.heaviside().to_vec(), vec![0.0, 0.0, 1.0]);
        let s = m.sigmoid().to_vec();
        assert!((s[1] - 0.5).abs() < 1e-12);
        let t = m.tanh().to_vec();
        assert!((t[2] - 2.0f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_add_row_vector_and_col_sum() {
        let m = Tensor2D::<CpuBackend>::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let v = Tensor1D::<CpuBackend>::new(vec![10.0, 20.0]);
        assert_eq!(m.add_row_vector(&v).to_vec(), vec![11.0, 22.0, 13.0, 24.0]);
        assert_eq!(m.col_sum().to_vec(), vec![4.0, 6.0]);
    }
}
