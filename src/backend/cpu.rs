use super::Backend;

/// Pure-Rust CPU backend.
///
/// - `Scalar`: `f64`
/// - `Tensor1D`: `Vec<f64>`
/// - `Tensor2D`: [`CpuTensor2D`], row-major `(data, rows, cols)`
#[derive(Clone, Debug, Copy)]
pub struct CpuBackend;

/// Row-major matrix storage: `(data, rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTensor2D(pub Vec<f64>, pub usize, pub usize);

impl CpuTensor2D {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols, "Inconsistent shape");
        Self(data, rows, cols)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.iter().map(|&x| f(x)).collect(), self.1, self.2)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(
            (self.1, self.2),
            (other.1, other.2),
            "Shapes must match for element-wise ops"
        );
        Self(
            self.0.iter().zip(other.0.iter()).map(|(&a, &b)| f(a, b)).collect(),
            self.1,
            self.2,
        )
    }

    fn broadcast_rows(&self, v: &[f64], f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(self.2, v.len(), "Row vector length must match column count");
        let cols = self.2;
        let data = self
            .0
            .iter()
            .enumerate()
            .map(|(idx, &x)| f(x, v[idx % cols]))
            .collect();
        Self(data, self.1, self.2)
    }

    fn col_fold(&self, init: f64, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let mut acc = vec![init; self.2];
        for row in self.0.chunks(self.2.max(1)) {
            for (a, &x) in acc.iter_mut().zip(row.iter()) {
                *a = f(*a, x);
            }
        }
        acc
    }
}

impl From<&[Vec<f64>]> for CpuTensor2D {
    fn from(x: &[Vec<f64>]) -> Self {
        if x.is_empty() {
            return CpuTensor2D::new(Vec::new(), 0, 0);
        }
        let rows = x.len();
        let cols = x[0].len();
        assert!(
            x.iter().all(|row| row.len() == cols),
            "All rows must have same length"
        );
        let data: Vec<f64> = x.iter().flat_map(|row| row.iter()).copied().collect();
        CpuTensor2D::new(data, rows, cols)
    }
}

fn zip_1d(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "Lengths must match for element-wise ops");
    a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect()
}

fn stable_sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

impl Backend for CpuBackend {
    type Scalar = f64;
    type Tensor1D = Vec<f64>;
    type Tensor2D = CpuTensor2D;

    // --- Constructors ---
    fn zeros_1d(len: usize) -> Self::Tensor1D {
        vec![0.; len]
    }
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(vec![0.; rows * cols], rows, cols)
    }
    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D {
        data
    }
    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D {
        CpuTensor2D::new(data, rows, cols)
    }

    // --- Element-wise ops (1D) ---
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x + y)
    }
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x - y)
    }
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x * y)
    }
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D {
        zip_1d(a, b, |x, y| x / y)
    }
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x * s).collect()
    }
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D {
        t.iter().map(|x| x + s).collect()
    }
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D {
        t.iter().map(|x| x.sqrt()).collect()
    }

    // --- Element-wise ops (2D) ---
    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x + y)
    }
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x - y)
    }
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x * y)
    }
    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        a.zip_with(b, |x, y| x / y)
    }
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        t.map(|x| x * s)
    }
    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D {
        t.map(|x| x + s)
    }
    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(f64::sqrt)
    }

    // --- Reductions ---
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>()
    }
    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar {
        t.0.iter().sum::<f64>()
    }
    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar {
        t.iter().sum::<f64>() / t.len() as f64
    }

    fn scalar_f64(value: f64) -> Self::Scalar {
        value
    }

    // --- Access ---
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64> {
        t.clone()
    }
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64> {
        t.0.clone()
    }
    fn len_1d(t: &Self::Tensor1D) -> usize {
        t.len()
    }
    fn shape(t: &Self::Tensor2D) -> (usize, usize) {
        (t.1, t.2)
    }
    fn ravel_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.0.clone()
    }

    // --- Linear algebra ---
    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D {
        let (m, k) = (a.1, a.2);
        let (kb, n) = (b.1, b.2);
        assert_eq!(k, kb, "Inner dimensions must match: ({}, {}) @ ({}, {})", m, k, kb, n);

        // i-k-j loop order keeps the inner loop contiguous in both `b` and `out`
        let mut out = vec![0.0; m * n];
        for i in 0..m {
            let a_row = &a.0[i * k..(i + 1) * k];
            let out_row = &mut out[i * n..(i + 1) * n];
            for (p, &a_ip) in a_row.iter().enumerate() {
                if a_ip == 0.0 {
                    continue;
                }
                let b_row = &b.0[p * n..(p + 1) * n];
                for (o, &b_pj) in out_row.iter_mut().zip(b_row.iter()) {
                    *o += a_ip * b_pj;
                }
            }
        }
        CpuTensor2D::new(out, m, n)
    }

    fn transpose(t: &Self::Tensor2D) -> Self::Tensor2D {
        let (rows, cols) = (t.1, t.2);
        let mut out = vec![0.0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                out[j * rows + i] = t.0[i * cols + j];
            }
        }
        CpuTensor2D::new(out, cols, rows)
    }

    // --- Column-wise ---
    fn col_min_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.col_fold(f64::INFINITY, f64::min)
    }
    fn col_max_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.col_fold(f64::NEG_INFINITY, f64::max)
    }
    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D {
        t.col_fold(0.0, |a, x| a + x)
    }

    // --- Broadcasting ---
    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x - y)
    }
    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x * y)
    }
    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x / y)
    }
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D {
        t.broadcast_rows(v, |x, y| x + y)
    }

    // --- Row selection ---
    fn select_rows_2d(t: &Self::Tensor2D, rows: &[usize]) -> Self::Tensor2D {
        let cols = t.2;
        let mut data = Vec::with_capacity(rows.len() * cols);
        for &r in rows {
            assert!(r < t.1, "row index {} out of bounds for {} rows", r, t.1);
            data.extend_from_slice(&t.0[r * cols..(r + 1) * cols]);
        }
        CpuTensor2D::new(data, rows.len(), cols)
    }

    fn select_1d(t: &Self::Tensor1D, indices: &[usize]) -> Self::Tensor1D {
        indices.iter().map(|&i| t[i]).collect()
    }

    // --- Activations ---
    fn relu_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(|x| x.max(0.0))
    }
    fn heaviside_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(|x| if x > 0.0 { 1.0 } else { 0.0 })
    }
    fn tanh_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(f64::tanh)
    }
    fn sigmoid_2d(t: &Self::Tensor2D) -> Self::Tensor2D {
        t.map(stable_sigmoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_tensor_from_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let t = CpuTensor2D::from(&rows[..]);
        assert_eq!(t, CpuTensor2D(vec![1.0, 2.0, 3.0, 4.0], 2, 2));
    }

    #[test]
    #[should_panic(expected = "Inconsistent shape")]
    fn test_cpu_tensor_bad_shape() {
        let _ = CpuTensor2D::new(vec![1.0, 2.0, 3.0], 2, 2);
    }

    #[test]
    fn test_matmul_rectangular() {
        // (2x3) @ (3x2)
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let b = CpuTensor2D::new(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2);
        let c = CpuBackend::matmul(&a, &b);
        assert_eq!(c, CpuTensor2D(vec![58.0, 64.0, 139.0, 154.0], 2, 2));
    }

    #[test]
    #[should_panic(expected = "Inner dimensions must match")]
    fn test_matmul_mismatch() {
        let a = CpuTensor2D::new(vec![1.0, 2.0], 1, 2);
        let b = CpuTensor2D::new(vec![1.0, 2.0, 3.0], 3, 1);
        let _ = CpuBackend::matmul(&a, &b);
    }

    #[test]
    fn test_transpose() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let t = CpuBackend::transpose(&a);
        assert_eq!(t, CpuTensor2D(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 3, 2));
    }

    #[test]
    fn test_col_min_max_sum() {
        let a = CpuTensor2D::new(vec![1.0, 5.0, -2.0, 3.0, 4.0, 0.0], 3, 2);
        assert_eq!(CpuBackend::col_min_2d(&a), vec![-2.0, 0.0]);
        assert_eq!(CpuBackend::col_max_2d(&a), vec![4.0, 5.0]);
        assert_eq!(CpuBackend::col_sum_2d(&a), vec![3.0, 8.0]);
    }

    #[test]
    fn test_broadcast_ops() {
        let a = CpuTensor2D::new(vec![2.0, 4.0, 6.0, 8.0], 2, 2);
        let v = vec![2.0, 4.0];
        assert_eq!(CpuBackend::broadcast_sub_1d_to_2d_rows(&a, &v).0, vec![0.0, 0.0, 4.0, 4.0]);
        assert_eq!(CpuBackend::broadcast_div_1d_to_2d_rows(&a, &v).0, vec![1.0, 1.0, 3.0, 2.0]);
        assert_eq!(CpuBackend::broadcast_mul_1d_to_2d_rows(&a, &v).0, vec![4.0, 16.0, 12.0, 32.0]);
        assert_eq!(CpuBackend::broadcast_add_1d_to_2d_rows(&a, &v).0, vec![4.0, 8.0, 8.0, 12.0]);
    }

    #[test]
    fn test_sigmoid_stability() {
        let a = CpuTensor2D::new(vec![-1000.0, 1000.0], 1, 2);
        let s = CpuBackend::sigmoid_2d(&a);
        assert!(s.0[0] >= 0.0 && s.0[0] < 1e-10);
        assert!((s.0[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_select_rows_repeats() {
        let a = CpuTensor2D::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let s = CpuBackend::select_rows_2d(&a, &[1, 1, 0]);
        assert_eq!(s, CpuTensor2D(vec![3.0, 4.0, 3.0, 4.0, 1.0, 2.0], 3, 2));
    }
}
