use crate::backend::Backend;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Sub};

/// Element type a backend stores. Everything in this crate runs on `f64`.
///
/// ```
/// use queuenet::backend::ScalarOps;
///
/// assert_eq!(ScalarOps::sqrt(16.0f64), 4.0);
/// assert_eq!(ScalarOps::to_f64(0.25f64), 0.25);
/// ```
pub trait ScalarOps:
    Copy
    + Send
    + Sync
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    fn sqrt(self) -> Self;
    fn to_f64(self) -> f64;
}

impl ScalarOps for f64 {
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// A single value produced by backend `B` (a loss, a penalty, a step size).
///
/// ```
/// use queuenet::backend::{CpuBackend, Scalar};
///
/// let half: Scalar<CpuBackend> = Scalar::new(0.5);
/// assert_eq!((half * Scalar::new(3.0)).to_f64(), 1.5);
/// ```
#[derive(Clone, Debug, Copy)]
pub struct Scalar<B: Backend> {
    pub(crate) data: B::Scalar,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Scalar<B> {
    pub fn new(f: f64) -> Self {
        Self::wrap(B::scalar_f64(f))
    }

    fn wrap(data: B::Scalar) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.data.to_f64()
    }

    pub fn sqrt(&self) -> Self {
        Self::wrap(self.data.sqrt())
    }
}

macro_rules! scalar_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<B: Backend> $trait for Scalar<B> {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self::wrap(self.data $op rhs.data)
            }
        }
    };
}

scalar_binop!(Add, add, +);
scalar_binop!(Sub, sub, -);
scalar_binop!(Mul, mul, *);
scalar_binop!(Div, div, /);
