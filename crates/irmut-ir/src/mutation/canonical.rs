use super::{match_logical, replace_inst, LogicalOp};
use crate::function::Function;
use crate::instruction::{BinaryOp, CastOp, Flag, FlagSet, Inst, InstKind};
use irmut_core::Result;

/// Rewrites a known non-canonical shape into its canonical form. Never the reverse.
pub(super) fn canonicalize(func: &mut Function, inst: Inst) -> Result<bool> {
    let data = &func[inst];
    let kind = data.kind.clone();
    let flags = data.flags;
    let args = data.args().to_vec();
    let result_ty = func.result_type(inst);

    match kind {
        InstKind::Cast(CastOp::SExt) => replace_inst(func, inst, |b| {
            b.cast(CastOp::ZExt, args[0], result_ty, FlagSet::of(&[Flag::NonNeg]))
        }),
        InstKind::Cast(CastOp::SIToFP) => replace_inst(func, inst, |b| {
            b.cast(CastOp::UIToFP, args[0], result_ty, FlagSet::of(&[Flag::NonNeg]))
        }),
        InstKind::Binary(BinaryOp::Xor | BinaryOp::Add) => replace_inst(func, inst, |b| {
            b.binary_with_flags(BinaryOp::Or, args[0], args[1], FlagSet::of(&[Flag::Disjoint]))
        }),
        InstKind::ICmp(pred) if pred.is_unsigned() && !flags.contains(Flag::SameSign) => {
            if let Some(data) = func.inst_mut(inst) {
                data.flags.insert(Flag::SameSign);
            }
            Ok(true)
        }
        InstKind::FCmp(pred) if pred.is_unordered() => {
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::FCmp(pred.ordered());
                data.flags.insert(Flag::NoNaNs);
            }
            Ok(true)
        }
        InstKind::Select => match match_logical(func, inst) {
            Some(LogicalOp::And(x, y)) => replace_inst(func, inst, |b| b.binary(BinaryOp::And, x, y)),
            Some(LogicalOp::Or(x, y)) => replace_inst(func, inst, |b| b.binary(BinaryOp::Or, x, y)),
            None => Ok(false),
        },
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{FloatPredicate, IntPredicate};
    use crate::mutation::testing::{binary_fn, returned};
    use crate::types::Type;

    #[test]
    fn test_add_becomes_disjoint_or() {
        let (mut func, add) = binary_fn(Type::int(32), |b, x, y| b.binary(BinaryOp::Add, x, y));
        func.set_value_name(func.result(add).unwrap(), "c");
        let (a, b) = (func.params()[0].value, func.params()[1].value);

        assert!(canonicalize(&mut func, add).unwrap());
        let or = func.defining_inst(returned(&func)).unwrap();
        assert_eq!(func[or].kind, InstKind::Binary(BinaryOp::Or));
        assert_eq!(func[or].args(), &[a, b]);
        assert_eq!(func.flags(or), FlagSet::of(&[Flag::Disjoint]));
        assert_eq!(func.value_name(returned(&func)), Some("c"));
        assert!(!func.is_live(add));
    }

    #[test]
    fn test_unsigned_icmp_gets_samesign_once() {
        let (mut func, sel) = binary_fn(Type::int(32), |b, x, y| {
            let c = b.icmp(IntPredicate::Ult, x, y, FlagSet::empty());
            b.select(c, x, y, FlagSet::empty())
        });
        let cmp = func.defining_inst(func[sel].arg(0).unwrap()).unwrap();

        assert!(canonicalize(&mut func, cmp).unwrap());
        assert_eq!(func[cmp].kind, InstKind::ICmp(IntPredicate::Ult));
        assert!(func.flags(cmp).contains(Flag::SameSign));
        assert!(!canonicalize(&mut func, cmp).unwrap());
    }

    #[test]
    fn test_signed_icmp_is_canonical() {
        let (mut func, sel) = binary_fn(Type::int(32), |b, x, y| {
            let c = b.icmp(IntPredicate::Sgt, x, y, FlagSet::empty());
            b.select(c, x, y, FlagSet::empty())
        });
        let cmp = func.defining_inst(func[sel].arg(0).unwrap()).unwrap();
        assert!(!canonicalize(&mut func, cmp).unwrap());
    }

    #[test]
    fn test_unordered_fcmp() {
        let (mut func, sel) = binary_fn(Type::Float, |b, x, y| {
            let c = b.fcmp(FloatPredicate::Ule, x, y, FlagSet::empty());
            b.select(c, x, y, FlagSet::empty())
        });
        let cmp = func.defining_inst(func[sel].arg(0).unwrap()).unwrap();
        assert!(canonicalize(&mut func, cmp).unwrap());
        assert_eq!(func[cmp].kind, InstKind::FCmp(FloatPredicate::Ole));
        assert!(func.flags(cmp).contains(Flag::NoNaNs));
        assert!(!canonicalize(&mut func, cmp).unwrap());
    }

    #[test]
    fn test_logical_select_becomes_bitwise() {
        let (mut func, sel) = binary_fn(Type::i1(), |b, x, y| b.logical_and(x, y));
        assert!(canonicalize(&mut func, sel).unwrap());
        let and = func.defining_inst(returned(&func)).unwrap();
        assert_eq!(func[and].kind, InstKind::Binary(BinaryOp::And));
        assert!(!canonicalize(&mut func, and).unwrap());
    }
}
