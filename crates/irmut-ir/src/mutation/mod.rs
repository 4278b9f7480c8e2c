//! Mutation operators.
//!
//! Each operator attempts one bounded edit at a site and reports whether it
//! applied. A decline (`Ok(false)`) leaves the function untouched. Operators that
//! replace an instruction build the replacement first, redirect every use of the
//! old result, then erase the old instruction.

mod attrs;
mod canonical;
mod commute;
mod constant;
mod flags;
mod opcode;
mod uses;

use crate::builder::FunctionBuilder;
use crate::enumerator::Site;
use crate::function::{Function, InsertPoint};
use crate::instruction::{Inst, InstKind, Value};
use irmut_core::Result;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use uses::FUZZ_USE_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    MutateConstant,
    AddFlag,
    DropFlag,
    MutateOpcode,
    Canonicalize,
    CommuteOperands,
    CommutePreserving,
    BreakOneUse,
    MutateArgumentAttribute,
    ReplaceArgumentUse,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::MutateConstant,
        Operator::AddFlag,
        Operator::DropFlag,
        Operator::MutateOpcode,
        Operator::Canonicalize,
        Operator::CommuteOperands,
        Operator::CommutePreserving,
        Operator::BreakOneUse,
        Operator::MutateArgumentAttribute,
        Operator::ReplaceArgumentUse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operator::MutateConstant => "mutate-constant",
            Operator::AddFlag => "add-flag",
            Operator::DropFlag => "drop-flag",
            Operator::MutateOpcode => "mutate-opcode",
            Operator::Canonicalize => "canonicalize",
            Operator::CommuteOperands => "commute-operands",
            Operator::CommutePreserving => "commute-operands-preserving",
            Operator::BreakOneUse => "break-one-use",
            Operator::MutateArgumentAttribute => "mutate-argument-attribute",
            Operator::ReplaceArgumentUse => "replace-argument-use",
        }
    }

    /// Returns true if the operator edits arguments rather than instructions
    pub fn targets_arguments(&self) -> bool {
        matches!(self, Operator::MutateArgumentAttribute)
    }

    /// Attempts the edit at `site`. Sites of the wrong kind decline.
    pub fn attempt(self, func: &mut Function, site: Site, rng: &mut ChaCha8Rng) -> Result<bool> {
        let inst = match site {
            Site::Argument(index) if self.targets_arguments() => {
                return Ok(attrs::mutate_argument_attribute(func, index, rng));
            }
            Site::Instruction(inst) if !self.targets_arguments() && func.is_live(inst) => inst,
            _ => return Ok(false),
        };

        match self {
            Operator::MutateConstant => Ok(constant::mutate_constant(func, inst, rng)),
            Operator::AddFlag => Ok(flags::mutate_flags(func, inst, true, rng)),
            Operator::DropFlag => Ok(flags::mutate_flags(func, inst, false, rng)),
            Operator::MutateOpcode => opcode::mutate_opcode(func, inst, rng),
            Operator::Canonicalize => canonical::canonicalize(func, inst),
            Operator::CommuteOperands => Ok(commute::commute_operands(func, inst)),
            Operator::CommutePreserving => Ok(commute::commute_preserving(func, inst)),
            Operator::BreakOneUse => Ok(uses::break_one_use(func, inst)),
            Operator::ReplaceArgumentUse => Ok(attrs::replace_argument_use(func, inst, rng)),
            Operator::MutateArgumentAttribute => Ok(false),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Replaces `old` with the value built by `build`, inserted right before it.
///
/// The replacement takes over the old result's name.
pub(crate) fn replace_inst<F>(func: &mut Function, old: Inst, build: F) -> Result<bool>
where
    F: FnOnce(&mut FunctionBuilder<'_>) -> Value,
{
    let Some(old_value) = func.result(old) else {
        return Ok(false);
    };
    let new_value = {
        let mut builder = FunctionBuilder::new(func, InsertPoint::Before(old));
        build(&mut builder)
    };
    if let Some(name) = func.value_name(old_value).map(str::to_string) {
        func.set_value_name(new_value, name);
    }
    func.replace_all_uses(old_value, new_value);
    func.erase_inst(old)?;
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    /// `select a, b, false`
    And(Value, Value),
    /// `select a, true, b`
    Or(Value, Value),
}

/// Matches a select that computes a short-circuiting and/or of booleans
pub(crate) fn match_logical(func: &Function, inst: Inst) -> Option<LogicalOp> {
    let data = func.inst_data(inst)?;
    if data.kind != InstKind::Select {
        return None;
    }
    let (cond, on_true, on_false) = (data.arg(0)?, data.arg(1)?, data.arg(2)?);
    let ty = func.value_type(on_true);
    if !ty.is_bool_or_bool_vector() || func.value_type(cond) != ty {
        return None;
    }
    if func.const_int(on_false).is_some_and(|c| c.is_zero()) {
        return Some(LogicalOp::And(cond, on_true));
    }
    if func.const_int(on_true).is_some_and(|c| c.is_all_ones()) {
        return Some(LogicalOp::Or(cond, on_false));
    }
    None
}

/// Matches `xor x, -1` in either operand order and returns `x`
pub(crate) fn match_not(func: &Function, value: Value) -> Option<Value> {
    let data = func.inst_data(func.defining_inst(value)?)?;
    if data.kind != InstKind::Binary(crate::instruction::BinaryOp::Xor) {
        return None;
    }
    let (lhs, rhs) = (data.arg(0)?, data.arg(1)?);
    let is_all_ones = |v: Value| func.const_int(v).is_some_and(|c| c.is_all_ones());
    if is_all_ones(rhs) {
        Some(lhs)
    } else if is_all_ones(lhs) {
        Some(rhs)
    } else {
        None
    }
}

/// Uniform choice among `items` other than `current`
pub(crate) fn choose_other<T: Copy + PartialEq>(
    items: &[T],
    current: T,
    rng: &mut ChaCha8Rng,
) -> Option<T> {
    let others: Vec<T> = items.iter().copied().filter(|item| *item != current).collect();
    others.choose(rng).copied()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Small functions shared by the operator tests.

    use crate::builder::FunctionBuilder;
    use crate::function::Function;
    use crate::instruction::{Inst, Value};
    use crate::types::Type;

    /// `f(ty %a, ty %b)` with one block; `body` emits the instructions, then `ret` of its value
    pub fn binary_fn<F>(ty: Type, body: F) -> (Function, Inst)
    where
        F: FnOnce(&mut FunctionBuilder<'_>, Value, Value) -> Value,
    {
        let mut func = Function::new("f", ty.clone());
        let a = func.add_param(ty.clone(), "a");
        let b = func.add_param(ty, "b");
        let entry = func.add_block("entry");
        let mut builder = FunctionBuilder::at_end(&mut func, entry);
        let value = body(&mut builder, a, b);
        builder.ret(Some(value));
        let inst = func.defining_inst(value).expect("body returns an instruction result");
        (func, inst)
    }

    /// The value returned by the function's last block
    pub fn returned(func: &Function) -> Value {
        let last = func.blocks().last().expect("function has blocks");
        let ret = func.terminator(last).expect("block is terminated");
        func[ret].arg(0).expect("ret has a value")
    }
}
