//! Value types of the IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest integer type the model can hold constants for
pub const MAX_INT_BITS: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Int(u32),
    Half,
    BFloat,
    Float,
    Double,
    Ptr,
    Vector { len: u32, elem: Box<Type> },
    Struct(Vec<Type>),
}

impl Type {
    pub fn i1() -> Self {
        Type::Int(1)
    }

    pub fn int(bits: u32) -> Self {
        Type::Int(bits)
    }

    pub fn vector(len: u32, elem: Type) -> Self {
        Type::Vector {
            len,
            elem: Box::new(elem),
        }
    }

    /// Element type for vectors, the type itself otherwise
    pub fn scalar(&self) -> &Type {
        match self {
            Type::Vector { elem, .. } => elem,
            other => other,
        }
    }

    /// Same shape as `self` with the scalar replaced, e.g. the i1 result of a compare
    pub fn with_scalar(&self, scalar: Type) -> Type {
        match self {
            Type::Vector { len, .. } => Type::vector(*len, scalar),
            _ => scalar,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_int_or_int_vector(&self) -> bool {
        matches!(self.scalar(), Type::Int(_))
    }

    /// i1 or a vector of i1
    pub fn is_bool_or_bool_vector(&self) -> bool {
        matches!(self.scalar(), Type::Int(1))
    }

    pub fn is_fp_or_fp_vector(&self) -> bool {
        matches!(
            self.scalar(),
            Type::Half | Type::BFloat | Type::Float | Type::Double
        )
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr)
    }

    /// Bit width of the integer scalar, if any
    pub fn int_bits(&self) -> Option<u32> {
        match self.scalar() {
            Type::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    /// Returns true if `pred` holds for this type or any type nested in it
    pub fn any(&self, pred: &impl Fn(&Type) -> bool) -> bool {
        pred(self)
            || match self {
                Type::Vector { elem, .. } => elem.any(pred),
                Type::Struct(fields) => fields.iter().any(|field| field.any(pred)),
                _ => false,
            }
    }

    /// Every integer inside is between 1 and `MAX_INT_BITS` bits wide
    pub fn has_supported_widths(&self) -> bool {
        !self.any(&|ty| matches!(ty, Type::Int(bits) if *bits == 0 || *bits > MAX_INT_BITS))
    }

    /// Types a register can hold: everything but void and aggregates
    pub fn is_single_value(&self) -> bool {
        !matches!(self, Type::Void | Type::Struct(_))
    }

    /// Short name used to build helper symbols such as `fuzz_use_i32` or `fuzz_use_4xf32`
    pub fn mangled_name(&self) -> Option<String> {
        match self {
            Type::Int(bits) => Some(format!("i{}", bits)),
            Type::Float => Some("f32".to_string()),
            Type::Double => Some("f64".to_string()),
            Type::Half => Some("f16".to_string()),
            Type::BFloat => Some("bf16".to_string()),
            Type::Ptr => Some("ptr".to_string()),
            Type::Vector { len, elem } => elem.mangled_name().map(|sub| format!("{}x{}", len, sub)),
            Type::Void | Type::Struct(_) => None,
        }
    }

    /// Overload suffix used in intrinsic names, e.g. `i32`, `v4f32`, `p0`
    pub fn intrinsic_suffix(&self) -> Option<String> {
        match self {
            Type::Ptr => Some("p0".to_string()),
            Type::Vector { len, elem } => elem.intrinsic_suffix().map(|sub| format!("v{}{}", len, sub)),
            other => other.mangled_name(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int(bits) => write!(f, "i{}", bits),
            Type::Half => write!(f, "half"),
            Type::BFloat => write!(f, "bfloat"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Ptr => write!(f, "ptr"),
            Type::Vector { len, elem } => write!(f, "<{} x {}>", len, elem),
            Type::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_predicates() {
        assert!(Type::i1().is_bool_or_bool_vector());
        assert!(Type::vector(4, Type::i1()).is_bool_or_bool_vector());
        assert!(!Type::int(8).is_bool_or_bool_vector());

        assert!(Type::vector(2, Type::Double).is_fp_or_fp_vector());
        assert!(!Type::Ptr.is_fp_or_fp_vector());

        assert_eq!(Type::vector(4, Type::int(16)).int_bits(), Some(16));
        assert_eq!(Type::Float.int_bits(), None);

        assert!(Type::Ptr.is_single_value());
        assert!(!Type::Struct(vec![Type::int(32), Type::i1()]).is_single_value());
        assert!(!Type::Void.is_single_value());
    }

    #[test]
    fn test_supported_widths() {
        assert!(Type::int(128).has_supported_widths());
        assert!(Type::Struct(vec![Type::Ptr, Type::vector(2, Type::i1())]).has_supported_widths());
        assert!(!Type::int(0).has_supported_widths());
        assert!(!Type::vector(4, Type::int(256)).has_supported_widths());
        assert!(!Type::Struct(vec![Type::int(32), Type::int(129)]).has_supported_widths());
        assert!(Type::Struct(vec![Type::BFloat]).any(&|ty| *ty == Type::BFloat));
    }

    #[test]
    fn test_mangled_names() {
        assert_eq!(Type::int(32).mangled_name().as_deref(), Some("i32"));
        assert_eq!(Type::BFloat.mangled_name().as_deref(), Some("bf16"));
        assert_eq!(
            Type::vector(4, Type::Float).mangled_name().as_deref(),
            Some("4xf32")
        );
        assert_eq!(Type::Struct(vec![Type::i1()]).mangled_name(), None);
        assert_eq!(
            Type::vector(2, Type::int(64)).intrinsic_suffix().as_deref(),
            Some("v2i64")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::vector(4, Type::int(32)).to_string(), "<4 x i32>");
        assert_eq!(
            Type::Struct(vec![Type::int(8), Type::i1()]).to_string(),
            "{ i8, i1 }"
        );
        assert_eq!(Type::i1().with_scalar(Type::Float), Type::Float);
        assert_eq!(
            Type::vector(2, Type::int(8)).with_scalar(Type::i1()),
            Type::vector(2, Type::i1())
        );
    }
}
