use anyhow::{anyhow, Result};
use rayon::prelude::*;

use crate::error::CoreError;
use crate::framework::{DoneCallback, OpKernel, OpKernelBase, OpKernelContext, OpKernelInfo};
use crate::tensor::{Tensor, TensorElement};

pub fn unary_map<T: Copy>(a: &Tensor<T>, out: &mut Tensor<T>, f: impl Fn(T) -> T) -> Result<()> {
    ensure_same_shape(a, out)?;
    for (out_slot, value) in out.data.iter_mut().zip(a.data.iter()) {
        *out_slot = f(*value);
    }
    Ok(())
}

/// `unary_map` split across the rayon pool.
pub fn unary_map_parallel<T>(a: &Tensor<T>, out: &mut Tensor<T>, f: impl Fn(T) -> T + Sync) -> Result<()>
where
    T: Copy + Send + Sync,
{
    ensure_same_shape(a, out)?;
    out.data
        .par_iter_mut()
        .zip(a.data.par_iter())
        .for_each(|(out_slot, value)| *out_slot = f(*value));
    Ok(())
}

fn ensure_same_shape<T>(a: &Tensor<T>, out: &Tensor<T>) -> Result<()> {
    if a.shape() != out.shape() {
        return Err(CoreError::ShapeMismatch {
            expected: a.shape().to_vec(),
            actual: out.shape().to_vec(),
        }
        .into());
    }
    Ok(())
}

/// Elements with a sign: `Abs` and `Neg`.
pub trait SignedElement: TensorElement {
    fn abs_value(self) -> Self;
    fn negate(self) -> Self;
}

/// Floating point elements for the rounding and transcendental ops.
pub trait FloatElement: SignedElement {
    fn floor_value(self) -> Self;
    fn ceil_value(self) -> Self;
    fn reciprocal(self) -> Self;
    fn sqrt_value(self) -> Self;
    fn ln_value(self) -> Self;
    fn exp_value(self) -> Self;
}

macro_rules! impl_signed_int {
    ($($ty:ty),+) => {
        $(
            impl SignedElement for $ty {
                // MIN has no positive counterpart; wrap like two's complement hardware.
                fn abs_value(self) -> Self {
                    self.wrapping_abs()
                }

                fn negate(self) -> Self {
                    self.wrapping_neg()
                }
            }
        )+
    };
}

macro_rules! impl_float {
    ($($ty:ty),+) => {
        $(
            impl SignedElement for $ty {
                fn abs_value(self) -> Self {
                    self.abs()
                }

                fn negate(self) -> Self {
                    -self
                }
            }

            impl FloatElement for $ty {
                fn floor_value(self) -> Self {
                    self.floor()
                }

                fn ceil_value(self) -> Self {
                    self.ceil()
                }

                fn reciprocal(self) -> Self {
                    self.recip()
                }

                fn sqrt_value(self) -> Self {
                    self.sqrt()
                }

                fn ln_value(self) -> Self {
                    self.ln()
                }

                fn exp_value(self) -> Self {
                    self.exp()
                }
            }
        )+
    };
}

impl_signed_int!(i8, i16, i32, i64);
impl_float!(f32, f64);

/// One unary elementwise kernel, instantiated per operator and element type.
pub struct UnaryElementwise<T> {
    base: OpKernelBase,
    op: fn(T) -> T,
}

impl<T: TensorElement> UnaryElementwise<T> {
    pub fn new(info: &OpKernelInfo<'_>, op: fn(T) -> T) -> Self {
        Self {
            base: OpKernelBase::new(info),
            op,
        }
    }
}

impl<T: TensorElement> OpKernel for UnaryElementwise<T> {
    fn base(&self) -> &OpKernelBase {
        &self.base
    }

    fn compute(&self, ctx: &mut OpKernelContext<'_>) -> Result<()> {
        let shape = ctx.input_tensor::<T>(0)?.shape().to_vec();
        let (inputs, out) = ctx.split_output(0, &shape)?;
        let input = inputs.tensor::<T>(0)?;
        let out = T::tensor_mut(out)
            .ok_or_else(|| anyhow!("{}: output is not {}", self.base.node().name, T::DTYPE))?;
        unary_map(input, out, self.op)
    }

    fn compute_async(&self, ctx: &mut OpKernelContext<'_>, done: DoneCallback) -> Result<()> {
        let shape = ctx.input_tensor::<T>(0)?.shape().to_vec();
        let (inputs, out) = ctx.split_output(0, &shape)?;
        let input = inputs.tensor::<T>(0)?;
        let out = T::tensor_mut(out)
            .ok_or_else(|| anyhow!("{}: output is not {}", self.base.node().name, T::DTYPE))?;
        let op = self.op;
        let mut status = Ok(());
        let status_slot = &mut status;
        rayon::scope(|scope| {
            scope.spawn(move |_| {
                *status_slot = unary_map_parallel(input, out, op);
                done();
            });
        });
        status
    }
}
