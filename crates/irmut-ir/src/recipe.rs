//! Recipes: named pairs of a success condition and the operators that pursue it.

use crate::enumerator::Site;
use crate::function::Function;
use crate::mutation::Operator;
use irmut_core::{EngineConfig, Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeKind {
    Correctness,
    Commutative,
    MultiUse,
    FlagPreserving,
    FlagDropping,
    CanonicalForm,
}

impl RecipeKind {
    pub const ALL: [RecipeKind; 6] = [
        RecipeKind::Correctness,
        RecipeKind::Commutative,
        RecipeKind::MultiUse,
        RecipeKind::FlagPreserving,
        RecipeKind::FlagDropping,
        RecipeKind::CanonicalForm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecipeKind::Correctness => "correctness",
            RecipeKind::Commutative => "commutative",
            RecipeKind::MultiUse => "multi-use",
            RecipeKind::FlagPreserving => "flag-preserving",
            RecipeKind::FlagDropping => "flag-dropping",
            RecipeKind::CanonicalForm => "canonical-form",
        }
    }
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RecipeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "commutative-equivalence" {
            return Ok(RecipeKind::Commutative);
        }
        RecipeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownRecipe(s.to_string()))
    }
}

/// How a recipe decides success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Reach a random number of successful applications. Argument sites use
    /// `argument_op`; instruction sites draw uniformly from `instruction_ops`.
    Repeated {
        argument_op: Operator,
        instruction_ops: &'static [Operator],
    },
    /// One successful application of a single operator
    Once(Operator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub kind: RecipeKind,
    pub policy: Policy,
}

/// Operators mixed by the correctness recipe at instruction sites
pub const CORRECTNESS_OPS: [Operator; 6] = [
    Operator::MutateConstant,
    Operator::AddFlag,
    Operator::DropFlag,
    Operator::MutateOpcode,
    Operator::CommuteOperands,
    Operator::ReplaceArgumentUse,
];

static RECIPES: [Recipe; 6] = [
    Recipe {
        kind: RecipeKind::Correctness,
        policy: Policy::Repeated {
            argument_op: Operator::MutateArgumentAttribute,
            instruction_ops: &CORRECTNESS_OPS,
        },
    },
    Recipe {
        kind: RecipeKind::Commutative,
        policy: Policy::Once(Operator::CommutePreserving),
    },
    Recipe {
        kind: RecipeKind::MultiUse,
        policy: Policy::Once(Operator::BreakOneUse),
    },
    Recipe {
        kind: RecipeKind::FlagPreserving,
        policy: Policy::Once(Operator::AddFlag),
    },
    Recipe {
        kind: RecipeKind::FlagDropping,
        policy: Policy::Once(Operator::DropFlag),
    },
    Recipe {
        kind: RecipeKind::CanonicalForm,
        policy: Policy::Once(Operator::Canonicalize),
    },
];

impl Recipe {
    pub fn lookup(kind: RecipeKind) -> &'static Recipe {
        // RECIPES is indexed in declaration order of RecipeKind
        &RECIPES[kind as usize]
    }

    pub fn by_name(name: &str) -> Result<&'static Recipe> {
        name.parse().map(Recipe::lookup)
    }

    /// Number of successful applications the search must reach
    pub fn target(&self, config: &EngineConfig, rng: &mut ChaCha8Rng) -> u32 {
        match self.policy {
            Policy::Repeated { .. } => {
                let low = config.min_mutations.max(1);
                let high = config.max_mutations.max(low);
                rng.gen_range(low..=high)
            }
            Policy::Once(_) => 1,
        }
    }

    /// Site samples allowed for reaching `target`
    pub fn budget(&self, config: &EngineConfig, target: u32) -> u32 {
        match self.policy {
            Policy::Repeated { .. } => config.attempts_per_mutation.saturating_mul(target),
            Policy::Once(_) => config.attempts_per_mutation,
        }
    }

    /// One attempt at `site`
    pub fn apply(&self, func: &mut Function, site: Site, rng: &mut ChaCha8Rng) -> Result<bool> {
        let operator = match (self.policy, site) {
            (Policy::Repeated { argument_op, .. }, Site::Argument(_)) => argument_op,
            (Policy::Repeated { instruction_ops, .. }, Site::Instruction(_)) => {
                match instruction_ops.choose(rng) {
                    Some(op) => *op,
                    None => return Ok(false),
                }
            }
            (Policy::Once(op), _) => op,
        };
        operator.attempt(func, site, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_table_matches_kinds() {
        for kind in RecipeKind::ALL {
            assert_eq!(Recipe::lookup(kind).kind, kind);
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in RecipeKind::ALL {
            assert_eq!(kind.name().parse::<RecipeKind>().unwrap(), kind);
        }
        assert_eq!(
            "commutative-equivalence".parse::<RecipeKind>().unwrap(),
            RecipeKind::Commutative
        );
        assert!(matches!(
            Recipe::by_name("fastest"),
            Err(Error::UnknownRecipe(name)) if name == "fastest"
        ));
    }

    #[test]
    fn test_targets_and_budgets() {
        let config = EngineConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let correctness = Recipe::lookup(RecipeKind::Correctness);
        for _ in 0..100 {
            let target = correctness.target(&config, &mut rng);
            assert!((1..=5).contains(&target));
            assert_eq!(correctness.budget(&config, target), 100 * target);
        }

        let once = Recipe::lookup(RecipeKind::MultiUse);
        assert_eq!(once.target(&config, &mut rng), 1);
        assert_eq!(once.budget(&config, 1), 100);
    }

    #[test]
    fn test_correctness_mix_excludes_single_purpose_operators() {
        assert_eq!(CORRECTNESS_OPS.len(), 6);
        assert!(!CORRECTNESS_OPS.contains(&Operator::Canonicalize));
        assert!(!CORRECTNESS_OPS.contains(&Operator::BreakOneUse));
        assert!(CORRECTNESS_OPS.iter().all(|op| !op.targets_arguments()));
    }
}
