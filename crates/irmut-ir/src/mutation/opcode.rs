use super::{choose_other, replace_inst};
use crate::function::Function;
use crate::instruction::{
    BinaryOp, CastOp, Flag, FlagSet, FloatPredicate, Inst, InstKind, IntPredicate,
    BITWISE_LOGIC_OPS,
};
use irmut_core::Result;
use rand_chacha::ChaCha8Rng;

/// Swaps the instruction for a semantically adjacent form
pub(super) fn mutate_opcode(func: &mut Function, inst: Inst, rng: &mut ChaCha8Rng) -> Result<bool> {
    let data = &func[inst];
    let kind = data.kind.clone();
    let flags = data.flags;
    let args = data.args().to_vec();
    let result_ty = func.result_type(inst);

    match kind {
        InstKind::ICmp(pred) => {
            let Some(new_pred) = choose_other(&IntPredicate::ALL, pred, rng) else {
                return Ok(false);
            };
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::ICmp(new_pred);
            }
            Ok(true)
        }
        InstKind::FCmp(pred) => {
            let Some(new_pred) = choose_other(&FloatPredicate::ALL, pred, rng) else {
                return Ok(false);
            };
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::FCmp(new_pred);
            }
            Ok(true)
        }
        InstKind::Select => {
            let [cond, on_true, on_false] = args[..] else {
                return Ok(false);
            };
            if !result_ty.is_bool_or_bool_vector() || func.value_type(cond) != &result_ty {
                return Ok(false);
            }
            if func.const_int(on_true).is_some_and(|c| c.is_all_ones()) {
                return replace_inst(func, inst, |b| b.binary(BinaryOp::Or, cond, on_false));
            }
            if func.const_int(on_false).is_some_and(|c| c.is_zero()) {
                return replace_inst(func, inst, |b| b.binary(BinaryOp::And, cond, on_true));
            }
            Ok(false)
        }
        InstKind::Binary(BinaryOp::And) if result_ty.is_bool_or_bool_vector() => {
            replace_inst(func, inst, |b| b.logical_and(args[0], args[1]))
        }
        InstKind::Binary(BinaryOp::Or) if result_ty.is_bool_or_bool_vector() => {
            replace_inst(func, inst, |b| b.logical_or(args[0], args[1]))
        }
        InstKind::Binary(op @ (BinaryOp::LShr | BinaryOp::AShr)) => {
            let swapped = if op == BinaryOp::LShr {
                BinaryOp::AShr
            } else {
                BinaryOp::LShr
            };
            let mut kept = FlagSet::empty();
            if flags.contains(Flag::Exact) {
                kept.insert(Flag::Exact);
            }
            replace_inst(func, inst, |b| b.binary_with_flags(swapped, args[0], args[1], kept))
        }
        InstKind::Cast(op @ (CastOp::SExt | CastOp::ZExt)) => {
            let swapped = if op == CastOp::SExt {
                CastOp::ZExt
            } else {
                CastOp::SExt
            };
            replace_inst(func, inst, |b| b.cast(swapped, args[0], result_ty, FlagSet::empty()))
        }
        InstKind::Binary(op) if op.is_bitwise_logic() => {
            let Some(other) = choose_other(&BITWISE_LOGIC_OPS, op, rng) else {
                return Ok(false);
            };
            replace_inst(func, inst, |b| b.binary(other, args[0], args[1]))
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::testing::{binary_fn, returned};
    use crate::types::Type;
    use rand::SeedableRng;

    fn returned_kind(func: &Function) -> InstKind {
        let inst = func.defining_inst(returned(func)).unwrap();
        func[inst].kind.clone()
    }

    #[test]
    fn test_icmp_predicate_changes() {
        let (mut func, cmp) = binary_fn(Type::int(32), |b, x, y| {
            let c = b.icmp(IntPredicate::Eq, x, y, FlagSet::empty());
            b.select(c, x, y, FlagSet::empty())
        });
        let cmp = func.defining_inst(func[cmp].arg(0).unwrap()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..16 {
            let InstKind::ICmp(before) = func[cmp].kind else {
                panic!("not an icmp");
            };
            assert!(mutate_opcode(&mut func, cmp, &mut rng).unwrap());
            assert_ne!(func[cmp].kind, InstKind::ICmp(before));
        }
    }

    #[test]
    fn test_shift_swap_keeps_exact() {
        let (mut func, shr) = binary_fn(Type::int(32), |b, x, y| {
            b.binary_with_flags(BinaryOp::LShr, x, y, FlagSet::of(&[Flag::Exact]))
        });
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(mutate_opcode(&mut func, shr, &mut rng).unwrap());
        assert!(!func.is_live(shr));

        let ashr = func.defining_inst(returned(&func)).unwrap();
        assert_eq!(func[ashr].kind, InstKind::Binary(BinaryOp::AShr));
        assert!(func.flags(ashr).contains(Flag::Exact));
    }

    #[test]
    fn test_bool_and_becomes_logical() {
        let (mut func, and) = binary_fn(Type::i1(), |b, x, y| b.binary(BinaryOp::And, x, y));
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(mutate_opcode(&mut func, and, &mut rng).unwrap());
        assert_eq!(returned_kind(&func), InstKind::Select);
        assert_eq!(func.instruction_count(), 2);

        // and back to the bitwise form
        let sel = func.defining_inst(returned(&func)).unwrap();
        assert!(mutate_opcode(&mut func, sel, &mut rng).unwrap());
        assert_eq!(returned_kind(&func), InstKind::Binary(BinaryOp::And));
    }

    #[test]
    fn test_bitwise_family() {
        let (mut func, xor) = binary_fn(Type::int(8), |b, x, y| b.binary(BinaryOp::Xor, x, y));
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(mutate_opcode(&mut func, xor, &mut rng).unwrap());
        let kind = returned_kind(&func);
        assert!(kind == InstKind::Binary(BinaryOp::And) || kind == InstKind::Binary(BinaryOp::Or));
    }

    #[test]
    fn test_unsupported_shape_declines() {
        let (mut func, add) = binary_fn(Type::int(32), |b, x, y| b.binary(BinaryOp::Add, x, y));
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(!mutate_opcode(&mut func, add, &mut rng).unwrap());
        assert!(func.is_live(add));
    }
}
