use anyhow::Result;

use crate::framework::{OpKernel, OpKernelInfo};
use crate::registry::{KernelDefBuilder, KernelRegistry};
use crate::tensor::{TensorElement, ALL_DTYPES};

use super::{FloatElement, Identity, SignedElement, Slice, UnaryElementwise, Unsqueeze};

/// Register every CPU kernel with `registry`.
pub fn register_cpu_kernels(registry: &mut KernelRegistry) -> Result<()> {
    registry.register(
        KernelDefBuilder::new("Identity")
            .since_version(1)
            .type_constraint("T", ALL_DTYPES)
            .alias(0, 0)
            .build(),
        |info| Ok(Box::new(Identity::new(info)) as Box<dyn OpKernel>),
    )?;
    registry.register(
        KernelDefBuilder::new("Unsqueeze")
            .since_version(1)
            .type_constraint("T", ALL_DTYPES)
            .alias(0, 0)
            .build(),
        |info| Ok(Box::new(Unsqueeze::new(info)?) as Box<dyn OpKernel>),
    )?;
    registry.register(
        KernelDefBuilder::new("Slice")
            .since_version(1)
            .type_constraint("T", ALL_DTYPES)
            .build(),
        |info| Ok(Box::new(Slice::new(info)?) as Box<dyn OpKernel>),
    )?;

    register_signed::<f32>(registry)?;
    register_signed::<f64>(registry)?;
    register_signed::<i8>(registry)?;
    register_signed::<i16>(registry)?;
    register_signed::<i32>(registry)?;
    register_signed::<i64>(registry)?;
    register_float::<f32>(registry)?;
    register_float::<f64>(registry)?;
    Ok(())
}

fn register_unary<T: TensorElement>(
    registry: &mut KernelRegistry,
    op_name: &str,
    op: fn(T) -> T,
) -> Result<()> {
    registry.register(
        KernelDefBuilder::new(op_name)
            .since_version(6)
            .type_constraint("T", &[T::DTYPE])
            .alias(0, 0)
            .build(),
        move |info: &OpKernelInfo<'_>| {
            Ok(Box::new(UnaryElementwise::<T>::new(info, op)) as Box<dyn OpKernel>)
        },
    )
}

fn register_signed<T: SignedElement>(registry: &mut KernelRegistry) -> Result<()> {
    register_unary::<T>(registry, "Abs", T::abs_value)?;
    register_unary::<T>(registry, "Neg", T::negate)
}

fn register_float<T: FloatElement>(registry: &mut KernelRegistry) -> Result<()> {
    register_unary::<T>(registry, "Floor", T::floor_value)?;
    register_unary::<T>(registry, "Ceil", T::ceil_value)?;
    register_unary::<T>(registry, "Reciprocal", T::reciprocal)?;
    register_unary::<T>(registry, "Sqrt", T::sqrt_value)?;
    register_unary::<T>(registry, "Log", T::ln_value)?;
    register_unary::<T>(registry, "Exp", T::exp_value)
}
