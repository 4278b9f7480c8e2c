use crate::constant::{Constant, IntValue};
use crate::function::Function;
use crate::instruction::Inst;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Rewrites the first integer constant operand that survives a coin flip
pub(super) fn mutate_constant(func: &mut Function, inst: Inst, rng: &mut ChaCha8Rng) -> bool {
    let args = func[inst].args().to_vec();
    for (slot, arg) in args.into_iter().enumerate() {
        if !func.is_constant(arg) {
            continue;
        }
        if rng.gen::<bool>() {
            continue;
        }
        let Some(current) = func.const_int(arg) else {
            continue;
        };

        let bits = current.bits();
        let replacement = match rng.gen_range(0..4) {
            0 => match rng.gen_range(0..5) {
                0 => IntValue::zero(bits),
                1 => IntValue::one(bits),
                2 => IntValue::all_ones(bits),
                3 => IntValue::signed_max(bits),
                _ => IntValue::signed_min(bits),
            },
            1 => current.neg(),
            2 => current.not(),
            _ => {
                if bits < 64 {
                    return false;
                }
                IntValue::new(bits, u128::from(rng.gen::<u64>()))
            }
        };

        let ty = func.value_type(arg).clone();
        let value = func.make_const(ty, Constant::Int(replacement));
        func.set_arg(inst, slot, value);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::BinaryOp;
    use crate::mutation::testing::binary_fn;
    use crate::types::Type;
    use rand::SeedableRng;

    #[test]
    fn test_no_constant_operands() {
        let (mut func, add) = binary_fn(Type::int(32), |b, x, y| b.binary(BinaryOp::Add, x, y));
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..32 {
            assert!(!mutate_constant(&mut func, add, &mut rng));
        }
    }

    #[test]
    fn test_rewrites_constant_operand() {
        let (mut func, add) = binary_fn(Type::int(64), |b, x, _| {
            let c = b.iconst(&Type::int(64), 12345);
            b.binary(BinaryOp::Add, x, c)
        });
        let a = func.params()[0].value;
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut applied = 0;
        for _ in 0..64 {
            let before = func.const_int(func[add].arg(1).unwrap());
            if mutate_constant(&mut func, add, &mut rng) {
                applied += 1;
                let after = func[add].arg(1).unwrap();
                assert_eq!(func.value_type(after), &Type::int(64));
                assert!(func.const_int(after).is_some());
                assert_ne!(before, None);
            }
            assert_eq!(func[add].arg(0), Some(a));
            assert_eq!(func.num_uses(func[add].arg(1).unwrap()), 1);
        }
        assert!(applied > 0);
    }

    #[test]
    fn test_splat_keeps_vector_type() {
        let ty = Type::vector(4, Type::int(8));
        let (mut func, mul) = binary_fn(ty.clone(), |b, x, _| {
            let c = b.iconst(&Type::vector(4, Type::int(8)), 3);
            b.binary(BinaryOp::Mul, x, c)
        });
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..64 {
            mutate_constant(&mut func, mul, &mut rng);
            let c = func[mul].arg(1).unwrap();
            assert_eq!(func.value_type(c), &ty);
            assert_eq!(func.const_int(c).unwrap().bits(), 8);
        }
    }
}
