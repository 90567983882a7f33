//! # Backend Abstraction
//!
//! Trait-based abstraction over the numerical backend used by the scalers and
//! the multilayer perceptron. Models and transformers are generic over
//! [`Backend`], so the same network code runs on the pure-Rust [`CpuBackend`]
//! or, with the `ndarray` cargo feature, on `NdarrayBackend`.
//!
//! ## Available Backends
//!
//! | Backend          | Feature   | Use Case                            |
//! |------------------|-----------|-------------------------------------|
//! | `CpuBackend`     | always on | Default, pure-Rust implementation   |
//! | `NdarrayBackend` | `ndarray` | Interop with the `ndarray` ecosystem |
//!
//! ## Example
//!
//! ```rust
//! use queuenet::backend::{CpuBackend, Tensor1D, Tensor2D};
//!
//! let x: Tensor2D<CpuBackend> = Tensor2D::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
//! let w: Tensor2D<CpuBackend> = Tensor2D::new(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
//! assert_eq!(x.matmul(&w).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
//!
//! let v: Tensor1D<CpuBackend> = Tensor1D::new(vec![1.0, 2.0]);
//! assert_eq!(v.sum().to_f64(), 3.0);
//! ```

/// Pure-Rust CPU backend implementation with zero external dependencies.
pub mod cpu;
pub use cpu::{CpuBackend, CpuTensor2D};

#[cfg(feature = "ndarray")]
mod ndarray_backend;
#[cfg(feature = "ndarray")]
/// Backend backed by the `ndarray` crate for ecosystem interoperability.
pub use ndarray_backend::{NdarrayBackend, NdarrayTensor2D};

/// Scalar value representation and arithmetic operations.
pub mod scalar;
/// One-dimensional tensor abstraction.
pub mod tensor1d;
/// Two-dimensional tensor abstraction.
pub mod tensor2d;

pub use scalar::{Scalar, ScalarOps};
pub use tensor1d::Tensor1D;
pub use tensor2d::Tensor2D;

/// Abstraction over computation devices and tensor operations.
///
/// The trait exposes the minimal set of operations needed to min-max scale a
/// feature matrix and to run forward and backward passes of a dense network.
/// All values are stored in double precision.
///
/// # Safety Guarantees
///
/// - Shape-changing operations (`matmul`, broadcasts, element-wise ops) check
///   shapes and panic on mismatch; the typed wrappers in [`Tensor1D`] and
///   [`Tensor2D`] are the intended entry points.
/// - Tensor types are `Clone + Send + Sync`.
pub trait Backend: Clone + Copy + std::fmt::Debug + 'static {
    /// Scalar type supporting arithmetic operations.
    type Scalar: ScalarOps + Clone;

    /// One-dimensional tensor type.
    type Tensor1D: Clone + Send + Sync;

    /// Two-dimensional tensor type.
    type Tensor2D: Clone + Send + Sync;

    // --- Constructors ---

    /// Creates a 1D tensor filled with zeros of given length.
    fn zeros_1d(len: usize) -> Self::Tensor1D;

    /// Creates a 2D tensor filled with zeros of given dimensions.
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D;

    /// Constructs a 1D tensor from owned data.
    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D;

    /// Constructs a 2D tensor from row-major ordered data.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D;

    // --- Element-wise operations (1D) ---

    /// Element-wise addition of two 1D tensors.
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise subtraction of two 1D tensors.
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise multiplication of two 1D tensors.
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise division of two 1D tensors.
    fn div_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Multiplies each element of tensor by a scalar.
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Adds a scalar to each element of tensor.
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Element-wise square root.
    fn sqrt_1d(t: &Self::Tensor1D) -> Self::Tensor1D;

    // --- Element-wise operations (2D) ---

    /// Element-wise addition of two 2D tensors.
    fn add_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise subtraction of two 2D tensors.
    fn sub_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise multiplication of two 2D tensors.
    fn mul_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise division of two 2D tensors.
    fn div_2d(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Multiplies each element of 2D tensor by a scalar.
    fn mul_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D;

    /// Adds a scalar to each element of 2D tensor.
    fn add_scalar_2d(t: &Self::Tensor2D, s: &Self::Scalar) -> Self::Tensor2D;

    /// Element-wise square root.
    fn sqrt_2d(t: &Self::Tensor2D) -> Self::Tensor2D;

    // --- Reduction operations ---

    /// Sum of all elements in a 1D tensor.
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    /// Sum of all elements in a 2D tensor.
    fn sum_all_2d(t: &Self::Tensor2D) -> Self::Scalar;

    /// Arithmetic mean of all elements in a 1D tensor.
    fn mean_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    // --- Scalar operations ---

    /// Creates a backend-specific scalar from an f64 value.
    fn scalar_f64(value: f64) -> Self::Scalar;

    // --- Data access ---

    /// Converts a 1D tensor to a host `Vec<f64>`.
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64>;

    /// Converts a 2D tensor to a host `Vec<f64>` in row-major order.
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64>;

    /// Number of elements in a 1D tensor.
    fn len_1d(t: &Self::Tensor1D) -> usize;

    /// Shape of a 2D tensor as `(rows, cols)`.
    fn shape(t: &Self::Tensor2D) -> (usize, usize);

    /// Flattens a 2D tensor into a 1D tensor (row-major).
    fn ravel_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    // --- Linear algebra ---

    /// Matrix product `A @ B` of an (m × k) and a (k × n) matrix.
    ///
    /// # Panics
    /// If `A.cols() != B.rows()`.
    fn matmul(a: &Self::Tensor2D, b: &Self::Tensor2D) -> Self::Tensor2D;

    /// Returns the transpose of a 2D tensor.
    fn transpose(t: &Self::Tensor2D) -> Self::Tensor2D;

    // --- Column-wise operations ---

    /// Minimum value of each column; returns a tensor of length `cols`.
    fn col_min_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    /// Maximum value of each column; returns a tensor of length `cols`.
    fn col_max_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    /// Sum of each column; returns a tensor of length `cols`.
    fn col_sum_2d(t: &Self::Tensor2D) -> Self::Tensor1D;

    // --- Broadcasting operations ---

    /// `Result[i, j] = t[i, j] - v[j]`
    fn broadcast_sub_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] * v[j]`
    fn broadcast_mul_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] / v[j]`
    fn broadcast_div_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    /// `Result[i, j] = t[i, j] + v[j]`
    fn broadcast_add_1d_to_2d_rows(t: &Self::Tensor2D, v: &Self::Tensor1D) -> Self::Tensor2D;

    // --- Row selection ---

    /// Gathers the given rows (in order, repeats allowed) into a new tensor.
    ///
    /// # Panics
    /// If any index is out of bounds.
    fn select_rows_2d(t: &Self::Tensor2D, rows: &[usize]) -> Self::Tensor2D;

    /// Gathers the given elements (in order) into a new tensor.
    ///
    /// # Panics
    /// If any index is out of bounds.
    fn select_1d(t: &Self::Tensor1D, indices: &[usize]) -> Self::Tensor1D;

    // --- Activations ---

    /// Element-wise `max(x, 0)`.
    fn relu_2d(t: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise step function: `1.0` where `x > 0`, else `0.0`.
    fn heaviside_2d(t: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise hyperbolic tangent.
    fn tanh_2d(t: &Self::Tensor2D) -> Self::Tensor2D;

    /// Element-wise sigmoid `1 / (1 + e^(-x))`, numerically stable for large |x|.
    fn sigmoid_2d(t: &Self::Tensor2D) -> Self::Tensor2D;
}
