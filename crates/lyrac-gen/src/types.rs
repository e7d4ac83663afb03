//! Lyra type → LLVM type mapping.
//!
//! i32 → i32, f64 → double, bool → i1, string → opaque pointer,
//! void → void (return position only). Names outside the set are
//! rejected here.

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::AddressSpace;
use lyrac_util::{Span, Ty};

use crate::error::{CodeGenError, Result};

/// Maps Lyra types onto LLVM types.
pub struct TypeMapper<'ctx> {
    context: &'ctx Context,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// The LLVM type for a value of type `ty`. `void` has no value type
    /// and is rejected alongside unknown names.
    pub fn basic(&self, ty: Ty, span: Span) -> Result<BasicTypeEnum<'ctx>> {
        match ty {
            Ty::I32 => Ok(self.context.i32_type().into()),
            Ty::F64 => Ok(self.context.f64_type().into()),
            Ty::Bool => Ok(self.context.bool_type().into()),
            Ty::Str => Ok(self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into()),
            Ty::Void | Ty::Named(_) => Err(CodeGenError::UnknownType {
                name: ty.name().to_string(),
                span,
            }),
        }
    }

    /// A function type over mapped parameter and return types.
    pub fn function(&self, params: &[Ty], ret: Ty, span: Span) -> Result<FunctionType<'ctx>> {
        let args = params
            .iter()
            .map(|&ty| self.basic(ty, span).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>>>()?;
        match ret {
            Ty::Void => Ok(self.context.void_type().fn_type(&args, false)),
            _ => Ok(self.basic(ret, span)?.fn_type(&args, false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_util::Symbol;

    #[test]
    fn test_value_type_mapping() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        assert!(mapper.basic(Ty::I32, Span::DUMMY).expect("i32").is_int_type());
        assert!(mapper.basic(Ty::F64, Span::DUMMY).expect("f64").is_float_type());
        assert!(mapper
            .basic(Ty::Str, Span::DUMMY)
            .expect("string")
            .is_pointer_type());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let bad = Ty::Named(Symbol::intern("widget"));
        assert!(matches!(
            mapper.basic(bad, Span::DUMMY),
            Err(CodeGenError::UnknownType { .. })
        ));
        assert!(mapper.basic(Ty::Void, Span::DUMMY).is_err());
    }

    #[test]
    fn test_void_return_function_type() {
        let context = Context::create();
        let mapper = TypeMapper::new(&context);
        let fn_type = mapper
            .function(&[Ty::I32], Ty::Void, Span::DUMMY)
            .expect("fn type");
        assert!(fn_type.get_return_type().is_none());
        assert_eq!(fn_type.count_param_types(), 1);
    }
}
