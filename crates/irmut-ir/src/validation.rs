//! Structural validation for programs read from disk or produced by a merge.

use crate::function::{Function, Use, ValueDef};
use crate::constant::Constant;
use crate::instruction::{Callee, InstKind, Value};
use crate::program::Program;
use crate::types::Type;
use irmut_core::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Validate that a program is well-formed
pub fn validate_program(program: &Program) -> Result<()> {
    let mut names = HashSet::new();
    for name in program
        .functions
        .iter()
        .map(|f| f.name.as_str())
        .chain(program.declarations.iter().map(|d| d.name.as_str()))
    {
        if !names.insert(name) {
            return Err(Error::Validation(format!("Duplicate symbol '{}'", name)));
        }
    }

    for decl in &program.declarations {
        if let Some(ty) = std::iter::once(&decl.ret_ty)
            .chain(&decl.params)
            .find(|ty| !ty.has_supported_widths())
        {
            return Err(Error::Validation(format!(
                "Declaration '{}': unsupported type '{}'",
                decl.name, ty
            )));
        }
    }

    for func in &program.functions {
        validate_function(func)?;
    }
    Ok(())
}

fn check_type(func: &Function, ty: &Type, what: &str) -> Result<()> {
    if ty.has_supported_widths() {
        Ok(())
    } else {
        Err(invalid(func, format!("{} has unsupported type '{}'", what, ty)))
    }
}

fn invalid(func: &Function, message: String) -> Error {
    Error::Validation(format!("Function '{}': {}", func.name, message))
}

/// Validate one function body
pub fn validate_function(func: &Function) -> Result<()> {
    if func.num_blocks() == 0 {
        return Err(invalid(func, "has no basic blocks".to_string()));
    }

    check_type(func, &func.ret_ty, "return value")?;

    let mut recorded: HashMap<Use, Value> = HashMap::new();
    for value in func.value_handles() {
        let data = func.value(value);
        check_type(func, &data.ty, &format!("value {}", value.index()))?;
        if let ValueDef::Const(Constant::Int(int)) = &data.def {
            if data.ty.int_bits() != Some(int.bits()) {
                return Err(invalid(
                    func,
                    format!("i{} constant {} typed as '{}'", int.bits(), int, data.ty),
                ));
            }
        }
        if let ValueDef::Param(index) = data.def {
            if func.param(index as usize).map(|p| p.value) != Some(value) {
                return Err(invalid(func, format!("argument {} is not registered", index)));
            }
        }
        for used_by in data.uses() {
            if recorded.insert(*used_by, value).is_some() {
                return Err(invalid(func, "operand slot recorded twice".to_string()));
            }
        }
    }

    for block in func.blocks() {
        let insts = func.block(block).insts();
        let label = func.block(block).name.clone().unwrap_or_else(|| block.index().to_string());
        let Some(&last) = insts.last() else {
            return Err(invalid(func, format!("block '{}' is empty", label)));
        };

        for &inst in insts {
            let Some(data) = func.inst_data(inst) else {
                return Err(invalid(func, format!("block '{}' lists an erased instruction", label)));
            };
            if data.block() != block {
                return Err(invalid(func, format!("block '{}' holds a foreign instruction", label)));
            }
            if data.is_terminator() != (inst == last) {
                return Err(invalid(
                    func,
                    format!("block '{}' must end with exactly one terminator", label),
                ));
            }

            for (slot, arg) in data.args().iter().enumerate() {
                if arg.index() >= func.num_values() {
                    return Err(invalid(func, format!("operand {} is out of range", arg.index())));
                }
                if let Some(def) = func.defining_inst(*arg) {
                    if !func.is_live(def) {
                        return Err(invalid(func, format!("operand of '{}' reads an erased value", data.kind)));
                    }
                }
                let used_by = Use {
                    inst,
                    slot: slot as u32,
                };
                if recorded.remove(&used_by) != Some(*arg) {
                    return Err(invalid(func, format!("use list out of sync at '{}'", data.kind)));
                }
            }

            if let Some(result) = data.result() {
                if func.defining_inst(result) != Some(inst) {
                    return Err(invalid(func, format!("result of '{}' is not linked back", data.kind)));
                }
            }

            for succ in data.kind.successors() {
                if succ.index() >= func.num_blocks() {
                    return Err(invalid(func, format!("branch to missing block {}", succ.index())));
                }
            }
            if let InstKind::GetElementPtr { source_ty } = &data.kind {
                check_type(func, source_ty, "getelementptr source")?;
            }
            check_arity(func, &data.kind, data.args().len())?;
        }
    }

    if !recorded.is_empty() {
        return Err(invalid(func, "use lists reference instructions outside the body".to_string()));
    }
    Ok(())
}

fn check_arity(func: &Function, kind: &InstKind, args: usize) -> Result<()> {
    let ok = match kind {
        InstKind::Binary(_) | InstKind::ICmp(_) | InstKind::FCmp(_) | InstKind::Store => args == 2,
        InstKind::FNeg
        | InstKind::Cast(_)
        | InstKind::Load
        | InstKind::ExtractValue { .. }
        | InstKind::CondBr { .. } => args == 1,
        InstKind::Select => args == 3,
        InstKind::Phi { incoming } => {
            incoming.len() == args && incoming.iter().all(|b| b.index() < func.num_blocks())
        }
        InstKind::GetElementPtr { .. } => args >= 1,
        InstKind::Ret => args <= 1,
        InstKind::Br { .. } | InstKind::Unreachable => args == 0,
        InstKind::Call { callee, .. } => match callee {
            Callee::Intrinsic(id) if id.has_poison_flag_arg() => args >= 2,
            _ => true,
        },
    };
    if ok {
        Ok(())
    } else {
        Err(invalid(func, format!("'{}' has {} operands", kind, args)))
    }
}
