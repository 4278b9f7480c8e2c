//! Constant operands.

use crate::types::{Type, MAX_INT_BITS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width two's complement integer, up to 128 bits.
///
/// The stored value is always truncated to `bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntValue {
    bits: u32,
    value: u128,
}

fn mask(bits: u32) -> u128 {
    if bits >= MAX_INT_BITS {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

impl IntValue {
    pub fn new(bits: u32, value: u128) -> Self {
        Self {
            bits,
            value: value & mask(bits),
        }
    }

    /// Sign-extends `value` to the target width
    pub fn from_i64(bits: u32, value: i64) -> Self {
        Self::new(bits, value as i128 as u128)
    }

    pub fn zero(bits: u32) -> Self {
        Self::new(bits, 0)
    }

    pub fn one(bits: u32) -> Self {
        Self::new(bits, 1)
    }

    pub fn all_ones(bits: u32) -> Self {
        Self::new(bits, u128::MAX)
    }

    pub fn signed_max(bits: u32) -> Self {
        Self::new(bits, mask(bits) >> 1)
    }

    pub fn signed_min(bits: u32) -> Self {
        Self::signed_max(bits).not()
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn as_u128(&self) -> u128 {
        self.value
    }

    pub fn as_i128(&self) -> i128 {
        if self.bits == 0 || self.bits >= MAX_INT_BITS {
            return self.value as i128;
        }
        let shift = MAX_INT_BITS - self.bits;
        ((self.value << shift) as i128) >> shift
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_one(&self) -> bool {
        self.value == 1
    }

    pub fn is_all_ones(&self) -> bool {
        self.value == mask(self.bits)
    }

    /// Two's complement negation
    pub fn neg(&self) -> Self {
        Self::new(self.bits, self.value.wrapping_neg())
    }

    /// Bitwise complement
    pub fn not(&self) -> Self {
        Self::new(self.bits, !self.value)
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bits == 1 {
            write!(f, "{}", !self.is_zero())
        } else {
            write!(f, "{}", self.as_i128())
        }
    }
}

/// A constant operand. Integer and float constants on a vector-typed value are splats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(IntValue),
    Float(f64),
    Null,
    Poison,
    Undef,
}

impl Constant {
    /// The all-zero constant of `ty`
    pub fn zero_of(ty: &Type) -> Constant {
        match ty.scalar() {
            Type::Int(bits) => Constant::Int(IntValue::zero(*bits)),
            Type::Ptr => Constant::Null,
            Type::Half | Type::BFloat | Type::Float | Type::Double => Constant::Float(0.0),
            _ => Constant::Poison,
        }
    }

    pub fn as_int(&self) -> Option<&IntValue> {
        match self {
            Constant::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Constant::Undef)
    }
}

/// Prints a constant as an operand of type `ty`
pub(crate) struct TypedConstant<'a>(pub &'a Constant, pub &'a Type);

impl fmt::Display for TypedConstant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let TypedConstant(constant, ty) = self;
        let scalar = match constant {
            Constant::Int(value) => value.to_string(),
            Constant::Float(value) => format!("{:?}", value),
            Constant::Null => "null".to_string(),
            Constant::Poison => return write!(f, "poison"),
            Constant::Undef => return write!(f, "undef"),
        };
        match ty {
            Type::Vector { elem, .. } => write!(f, "splat ({} {})", elem, scalar),
            _ => write!(f, "{}", scalar),
        }
    }
}
