use super::Backend;
use ndarray::{Array1, Array2, Axis};

#[derive(Clone, Debug, Copy)]
pub struct NdarrayBackend;

#[derive(Debug, Clone)]
pub struct NdarrayTensor2D(pub Array2<f64>);

fn from_shape(data: Vec<f64>, rows: usize, cols: usize) -> Array2<f64> {
    assert_eq!(data.len(), rows * cols, "Inconsistent shape");
    match Array2::from_shape_vec((rows, cols), data) {
        Ok(a) => a,
        // length checked above, so only a layout bug can land here
        Err(e) => panic!("Inconsistent shape: {}", e),
    }
}

impl From<&[Vec<f64>]> for NdarrayTensor2D {
    fn from(x: &[Vec<f64>]) -> Self {
        let rows = x.len();
        if rows == 0 {
            return NdarrayTensor2D(Array2::zeros((0, 0)));
        }
        let cols = x[0].len();
        assert!(
            x.iter().all(|r| r.len() == cols),
            "All rows must have same length"
        );
        let data: Vec<f64> = x.iter().flat_map(|r| r.iter()).copied().collect();
        NdarrayTensor2D(from_shape(data, rows, cols))
    }
}

fn column_fold(t: &Array2<f64>, init: f64, f: impl Fn(f64, f64) -> f64 + Copy) -> Array1<f64> {
    t.map_axis(Axis(0), |col| col.iter().fold(init, |a, &x| f(a, x)))
}

impl Backend for NdarrayBackend {
    type Scalar = f64;
    type Tensor1D = Array1<f64>;
    type Tensor2D = NdarrayTensor2D;

    fn zeros_1d(len: usize) -> Self::Tensor1D {
        Array1::zeros(len)
    }

    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        NdarrayTensor2D(Array2::zeros((rows, cols)))
    }

    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D {
        Array1::from_vec(data)
    }

    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        NdarrayTensor2D(from_shape(data, rows, cols))
    }

    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a + b
    }
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a - b
    }
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a * b
    }
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        a / b
    }
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t * *s
    }
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t + *s
    }
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.mapv(f64::sqrt)
    }

    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 + &b.0)
    }
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 - &b.0)
    }
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 * &b.0)
    }
    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(&a.0 / &b.0)
    }
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 * *s)
    }
    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        NdarrayTensor2D(&t.0 + *s)
    }
    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(f64::sqrt))
    }

    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.sum()
    }
    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.sum()
    }
    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.mean().unwrap_or(f64::NAN)
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.to_vec()
    }
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.iter().copied().collect()
    }
    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }
    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        t.0.dim()
    }
    fn ravel_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.iter().copied().collect()
    }

    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        let (m, k) = a.0.dim();
        let (kb, n) = b.0.dim();
        assert_eq!(k, kb, "Inner dimensions must match: ({}, {}) @ ({}, {})", m, k, kb, n);
        NdarrayTensor2D(a.0.dot(&b.0))
    }

    fn transpose(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.t().to_owned())
    }

    fn col_min_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        column_fold(&t.0, f64::INFINITY, f64::min)
    }
    fn col_max_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        column_fold(&t.0, f64::NEG_INFINITY, f64::max)
    }
    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.sum_axis(Axis(0))
    }

    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        assert_eq!(t.0.ncols(), v.len(), "Row vector length must match column count");
        NdarrayTensor2D(&t.0 - v)
    }
    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        assert_eq!(t.0.ncols(), v.len(), "Row vector length must match column count");
        NdarrayTensor2D(&t.0 * v)
    }
    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        assert_eq!(t.0.ncols(), v.len(), "Row vector length must match column count");
        NdarrayTensor2D(&t.0 / v)
    }
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        assert_eq!(t.0.ncols(), v.len(), "Row vector length must match column count");
        NdarrayTensor2D(&t.0 + v)
    }

    fn select_rows_2d(t: &Self::Tensor2D, rows: &[usize]) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.select(Axis(0), rows))
    }

    fn select_1d(t: &Self::Tensor1D, indices: &[usize]) -> Self::Tensor1D {
        t.select(Axis(0), indices)
    }

    fn relu_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(|x| x.max(0.0)))
    }
    fn heaviside_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 }))
    }
    fn tanh_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(f64::tanh))
    }
    fn sigmoid_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        NdarrayTensor2D(t.0.mapv(|z| {
            if z >= 0.0 {
                1.0 / (1.0 + (-z).exp())
            } else {
                let ez = z.exp();
                ez / (1.0 + ez)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBackend, Tensor2D};

    #[test]
    fn test_matmul_matches_cpu() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let cpu = Tensor2D::<CpuBackend>::new(a.clone(), 2, 3)
            .matmul(&Tensor2D::new(b.clone(), 3, 2));
        let nd = Tensor2D::<NdarrayBackend>::new(a, 2, 3).matmul(&Tensor2D::new(b, 3, 2));
        assert_eq!(cpu.to_vec(), nd.to_vec());
        assert_eq!(nd.shape(), (2, 2));
    }

    #[test]
    fn test_column_reductions() {
        let t = NdarrayBackend::from_vec_2d(vec![1.0, 5.0, -2.0, 3.0, 4.0, 0.0], 3, 2);
        assert_eq!(NdarrayBackend::col_min_2d(&t).to_vec(), vec![-2.0, 0.0]);
        assert_eq!(NdarrayBackend::col_max_2d(&t).to_vec(), vec![4.0, 5.0]);
        assert_eq!(NdarrayBackend::col_sum_2d(&t).to_vec(), vec![3.0, 8.0]);
    }

    #[test]
    fn test_transpose_row_major_copy() {
        let t = NdarrayBackend::from_vec_2d(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let tt = NdarrayBackend::transpose(&t);
        assert_eq!(NdarrayBackend::shape(&tt), (3, 2));
        assert_eq!(NdarrayBackend::to_vec_2d(&tt), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
