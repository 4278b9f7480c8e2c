//! Properties that hold for any function the engine is handed.

use irmut_core::EngineConfig;
use irmut_ir::instruction::{BinaryOp, IntPredicate, RefinementFlags};
use irmut_ir::{
    validate_function, Candidates, Flag, FlagSet, Function, FunctionBuilder, Inst, Mutator,
    Recipe, RecipeKind, Type,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const OPS: [BinaryOp; 8] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Shl,
    BinaryOp::LShr,
    BinaryOp::UDiv,
    BinaryOp::Or,
    BinaryOp::Xor,
];

/// One straight-line step: opcode index, flag bits, constant right operand
type Step = (usize, u8, Option<i64>);

fn step() -> impl Strategy<Value = Step> {
    (0..OPS.len(), any::<u8>(), proptest::option::of(-8i64..8))
}

/// Chain of integer ops over two arguments, ending in a compare and a select
fn build(steps: &[Step]) -> Function {
    let mut func = Function::new("f", Type::int(32));
    let a = func.add_param(Type::int(32), "a");
    let b = func.add_param(Type::int(32), "b");
    let entry = func.add_block("entry");
    let mut builder = FunctionBuilder::at_end(&mut func, entry);

    let mut acc = a;
    for (i, &(op, bits, constant)) in steps.iter().enumerate() {
        let op = OPS[op];
        let flags: Vec<Flag> = Flag::ALL
            .iter()
            .enumerate()
            .filter(|(bit, _)| bits & (1 << (bit % 8)) != 0)
            .map(|(_, flag)| *flag)
            .filter(|flag| op.refinement_flags().contains(flag))
            .collect();
        let rhs = match constant {
            Some(c) => builder.iconst(&Type::int(32), c),
            None if i % 2 == 0 => b,
            None => a,
        };
        acc = builder.binary_with_flags(op, acc, rhs, FlagSet::of(&flags));
    }
    let cmp = builder.icmp(IntPredicate::Ult, acc, b, FlagSet::empty());
    let picked = builder.select(cmp, acc, a, FlagSet::empty());
    builder.ret(Some(picked));
    func
}

fn snapshot(func: &Function) -> Vec<(Inst, FlagSet)> {
    func.instructions().map(|inst| (inst, func.flags(inst))).collect()
}

proptest! {
    #[test]
    fn flag_preserving_only_adds(steps in prop::collection::vec(step(), 0..10), seed in any::<u64>()) {
        let mut func = build(&steps);
        let before = snapshot(&func);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Mutator::new(EngineConfig::default())
            .mutate_function(Recipe::lookup(RecipeKind::FlagPreserving), &mut func, &mut rng)
            .unwrap();

        for (inst, flags) in before {
            prop_assert!(flags.is_subset(&func.flags(inst)));
        }
        prop_assert!(validate_function(&func).is_ok());
    }

    #[test]
    fn flag_dropping_never_adds(steps in prop::collection::vec(step(), 0..10), seed in any::<u64>()) {
        let mut func = build(&steps);
        let before = snapshot(&func);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Mutator::new(EngineConfig::default())
            .mutate_function(Recipe::lookup(RecipeKind::FlagDropping), &mut func, &mut rng)
            .unwrap();

        for (inst, flags) in before {
            prop_assert!(func.flags(inst).is_subset(&flags));
        }
    }

    #[test]
    fn commutative_keeps_shape(steps in prop::collection::vec(step(), 0..10), seed in any::<u64>()) {
        let mut func = build(&steps);
        let count = func.instruction_count();
        let types: Vec<Type> = func.instructions().map(|inst| func.result_type(inst)).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Mutator::new(EngineConfig::default())
            .mutate_function(Recipe::lookup(RecipeKind::Commutative), &mut func, &mut rng)
            .unwrap();

        prop_assert_eq!(func.instruction_count(), count);
        let after: Vec<Type> = func.instructions().map(|inst| func.result_type(inst)).collect();
        prop_assert_eq!(after, types);
        prop_assert!(validate_function(&func).is_ok());
    }

    #[test]
    fn every_recipe_stays_within_budget(steps in prop::collection::vec(step(), 0..10), seed in any::<u64>()) {
        let config = EngineConfig { attempts_per_mutation: 20, ..EngineConfig::default() };
        let mutator = Mutator::new(config.clone());
        for kind in RecipeKind::ALL {
            let recipe = Recipe::lookup(kind);
            let mut func = build(&steps);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let target = recipe.target(&config, &mut rng);
            let outcome = mutator.search(recipe, &mut func, target, &mut rng).unwrap();
            prop_assert!(outcome.attempts() <= recipe.budget(&config, target));
            prop_assert!(validate_function(&func).is_ok());
        }
    }

    #[test]
    fn enumeration_is_stable(steps in prop::collection::vec(step(), 0..10)) {
        let func = build(&steps);
        prop_assert_eq!(Candidates::collect(&func), Candidates::collect(&func));
        prop_assert_eq!(Candidates::collect(&func).len(), 2 + func.instruction_count());
    }
}
