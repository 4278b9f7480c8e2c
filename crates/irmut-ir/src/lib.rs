//! SSA program model and mutation engine for differential testing.
//!
//! A [`Program`] holds functions in an arena form: values, instructions and blocks
//! are addressed by small copyable handles. The engine picks mutation sites with
//! [`Candidates`], edits them through the operators in [`mutation`], and the
//! [`Mutator`] drives a named [`Recipe`] over every function of a program.

pub mod builder;
pub mod cfg;
pub mod constant;
pub mod cost;
pub mod driver;
pub mod enumerator;
pub mod function;
pub mod instruction;
pub mod merge;
pub mod mutation;
mod printer;
pub mod program;
pub mod recipe;
pub mod types;
pub mod validation;

pub use builder::FunctionBuilder;
pub use constant::{Constant, IntValue};
pub use driver::{MutationReport, Mutator, Outcome};
pub use enumerator::{Candidates, Site};
pub use function::{Function, InsertPoint};
pub use instruction::{Block, Callee, Flag, FlagSet, Inst, InstKind, Value};
pub use merge::Merger;
pub use mutation::Operator;
pub use program::{Declaration, Program};
pub use recipe::{Recipe, RecipeKind};
pub use types::Type;
pub use validation::{validate_function, validate_program};
