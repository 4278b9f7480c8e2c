//! Search driver: samples sites and applies a recipe until it succeeds or the
//! attempt budget runs out.

use crate::enumerator::Candidates;
use crate::function::Function;
use crate::program::Program;
use crate::recipe::{Recipe, RecipeKind};
use irmut_core::{EngineConfig, Error, Result};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// How the search over one function ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The recipe reached its target; the function was mutated in place
    Kept { applied: u32, attempts: u32 },
    /// The budget ran out first
    Discarded {
        applied: u32,
        target: u32,
        attempts: u32,
    },
}

impl Outcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, Outcome::Kept { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            Outcome::Kept { attempts, .. } | Outcome::Discarded { attempts, .. } => attempts,
        }
    }
}

/// Which functions survived a program-level run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub recipe: RecipeKind,
    pub kept: Vec<String>,
    pub discarded: Vec<String>,
}

pub struct Mutator {
    config: EngineConfig,
}

impl Mutator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `recipe` on `func` until `target` applications succeed.
    ///
    /// Each attempt samples a fresh site uniformly, with replacement. An empty
    /// site space ends the search immediately.
    pub fn search(
        &self,
        recipe: &Recipe,
        func: &mut Function,
        target: u32,
        rng: &mut ChaCha8Rng,
    ) -> Result<Outcome> {
        let budget = recipe.budget(&self.config, target);
        let mut applied = 0;
        let mut attempts = 0;

        while applied < target && attempts < budget {
            let Some(site) = Candidates::collect(func).sample(rng) else {
                break;
            };
            attempts += 1;
            if recipe.apply(func, site, rng)? {
                applied += 1;
            }
        }

        if applied >= target {
            Ok(Outcome::Kept { applied, attempts })
        } else {
            Ok(Outcome::Discarded {
                applied,
                target,
                attempts,
            })
        }
    }

    /// Draws the recipe's target and searches
    pub fn mutate_function(
        &self,
        recipe: &Recipe,
        func: &mut Function,
        rng: &mut ChaCha8Rng,
    ) -> Result<Outcome> {
        let target = recipe.target(&self.config, rng);
        self.search(recipe, func, target, rng)
    }

    /// Mutates every function of `program` with the recipe named by `kind`.
    ///
    /// Discarded functions are removed. Those still called become declarations,
    /// as do the helper callees the operators introduced.
    #[instrument(skip(self, program, rng), fields(recipe = %kind, functions = program.num_functions()))]
    pub fn mutate_program(
        &self,
        program: &mut Program,
        kind: RecipeKind,
        rng: &mut ChaCha8Rng,
    ) -> Result<MutationReport> {
        if program.functions.is_empty() {
            return Err(Error::NoFunctions);
        }

        let recipe = Recipe::lookup(kind);
        let mut report = MutationReport {
            recipe: kind,
            kept: Vec::new(),
            discarded: Vec::new(),
        };

        for func in &mut program.functions {
            match self.mutate_function(recipe, func, rng)? {
                Outcome::Kept { applied, attempts } => {
                    debug!(function = %func.name, applied, attempts, "Mutated function");
                    report.kept.push(func.name.clone());
                }
                Outcome::Discarded {
                    applied,
                    target,
                    attempts,
                } => {
                    debug!(
                        function = %func.name,
                        applied,
                        target,
                        attempts,
                        "Discarding function"
                    );
                    report.discarded.push(func.name.clone());
                }
            }
        }

        program.discard_functions(&report.discarded);
        if program.functions.is_empty() {
            warn!(discarded = report.discarded.len(), "No function survived");
            return Err(Error::NoSurvivingFunctions(kind.name().to_string()));
        }

        let declared = program.declare_missing_callees();
        info!(
            kept = report.kept.len(),
            discarded = report.discarded.len(),
            declared = declared.len(),
            "Mutation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::instruction::{BinaryOp, CastOp, Flag, FlagSet};
    use crate::types::Type;
    use rand::SeedableRng;

    fn mutator() -> Mutator {
        Mutator::new(EngineConfig::default())
    }

    /// `name(i32 %a) { %t = trunc nuw i32 %a to i8; ret i8 %t }`
    fn trunc_nuw(name: &str) -> Function {
        let mut func = Function::new(name, Type::int(8));
        let a = func.add_param(Type::int(32), "a");
        let entry = func.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        let t = b.cast(CastOp::Trunc, a, Type::int(8), FlagSet::of(&[Flag::Nuw]));
        b.ret(Some(t));
        func
    }

    fn add_const(name: &str) -> Function {
        let mut func = Function::new(name, Type::int(32));
        let a = func.add_param(Type::int(32), "a");
        let entry = func.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        let five = b.iconst(&Type::int(32), 5);
        let sum = b.binary(BinaryOp::Add, a, five);
        b.ret(Some(sum));
        func
    }

    #[test]
    fn test_empty_function_discarded_without_sampling() {
        let mut func = Function::new("empty", Type::Void);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let recipe = Recipe::lookup(RecipeKind::FlagPreserving);

        let outcome = mutator().search(recipe, &mut func, 1, &mut rng).unwrap();
        assert_eq!(
            outcome,
            Outcome::Discarded {
                applied: 0,
                target: 1,
                attempts: 0
            }
        );
    }

    #[test]
    fn test_single_application_kept() {
        let mut func = trunc_nuw("f");
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let recipe = Recipe::lookup(RecipeKind::FlagPreserving);

        let outcome = mutator().mutate_function(recipe, &mut func, &mut rng).unwrap();
        assert!(outcome.is_kept());
        let trunc = func.instructions().next().unwrap();
        assert_eq!(func.flags(trunc), FlagSet::of(&[Flag::Nuw, Flag::Nsw]));
    }

    #[test]
    fn test_short_of_target_is_discarded() {
        let mut func = trunc_nuw("f");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let recipe = Recipe::lookup(RecipeKind::FlagPreserving);

        let outcome = mutator().search(recipe, &mut func, 3, &mut rng).unwrap();
        assert_eq!(
            outcome,
            Outcome::Discarded {
                applied: 1,
                target: 3,
                attempts: 100
            }
        );
    }

    #[test]
    fn test_correctness_reaches_target() {
        let mut func = add_const("f");
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let recipe = Recipe::lookup(RecipeKind::Correctness);

        let outcome = mutator().search(recipe, &mut func, 2, &mut rng).unwrap();
        assert!(matches!(outcome, Outcome::Kept { applied: 2, attempts } if attempts <= 200));
    }

    #[test]
    fn test_program_discards_and_declares() {
        // `caller` has no flag to add; the trunc in `callee` does.
        let mut caller = Function::new("caller", Type::int(8));
        let x = caller.add_param(Type::int(32), "x");
        let entry = caller.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut caller, entry);
        let call = b.call(
            crate::instruction::Callee::Function("callee".to_string()),
            vec![x],
            Type::int(8),
        );
        let result = b.func().result(call).unwrap();
        b.ret(Some(result));

        let mut program = Program::with_functions(vec![trunc_nuw("callee"), caller]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let report = mutator()
            .mutate_program(&mut program, RecipeKind::FlagPreserving, &mut rng)
            .unwrap();

        assert_eq!(report.kept, vec!["callee".to_string()]);
        assert_eq!(report.discarded, vec!["caller".to_string()]);
        assert!(program.defines("callee"));
        assert!(!program.has_symbol("caller"));
    }

    #[test]
    fn test_program_level_failures() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let err = mutator()
            .mutate_program(&mut Program::new(), RecipeKind::MultiUse, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::NoFunctions));

        let mut ret_only = Function::new("g", Type::Void);
        let entry = ret_only.add_block("entry");
        FunctionBuilder::at_end(&mut ret_only, entry).ret(None);
        let mut program = Program::with_functions(vec![ret_only]);
        let err = mutator()
            .mutate_program(&mut program, RecipeKind::CanonicalForm, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::NoSurvivingFunctions(name) if name == "canonical-form"));
    }
}
