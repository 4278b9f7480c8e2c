use super::{match_logical, match_not};
use crate::function::Function;
use crate::instruction::{Inst, InstKind, Value};

/// Swaps successors, select arms or the first two operands without compensating
pub(super) fn commute_operands(func: &mut Function, inst: Inst) -> bool {
    let (lhs, rhs) = (func[inst].arg(0), func[inst].arg(1));
    match func[inst].kind.clone() {
        InstKind::CondBr {
            then_dest,
            else_dest,
        } => {
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::CondBr {
                    then_dest: else_dest,
                    else_dest: then_dest,
                };
            }
            true
        }
        InstKind::Br { .. } | InstKind::Phi { .. } => false,
        InstKind::Select => {
            if match_logical(func, inst).is_some() {
                return false;
            }
            func.swap_args(inst, 1, 2);
            true
        }
        _ => {
            let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                return false;
            };
            if func.value_type(lhs) != func.value_type(rhs) {
                return false;
            }
            func.swap_args(inst, 0, 1);
            true
        }
    }
}

/// Swaps operands while keeping the result: compares swap their predicate, selects
/// invert their condition.
pub(super) fn commute_preserving(func: &mut Function, inst: Inst) -> bool {
    let data = &func[inst];
    let (Some(lhs), Some(rhs)) = (data.arg(0), data.arg(1)) else {
        return false;
    };

    match data.kind.clone() {
        InstKind::Select => {
            if match_logical(func, inst).is_some() {
                return false;
            }
            if let Some(x) = match_not(func, lhs) {
                func.set_arg(inst, 0, x);
            } else if !invert_condition(func, lhs) {
                return false;
            }
            func.swap_args(inst, 1, 2);
            true
        }
        _ if func.is_constant(rhs) => false,
        InstKind::ICmp(pred) => {
            func.swap_args(inst, 0, 1);
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::ICmp(pred.swapped());
            }
            true
        }
        InstKind::FCmp(pred) => {
            func.swap_args(inst, 0, 1);
            if let Some(data) = func.inst_mut(inst) {
                data.kind = InstKind::FCmp(pred.swapped());
            }
            true
        }
        InstKind::Binary(op) if op.is_commutative() => {
            func.swap_args(inst, 0, 1);
            true
        }
        InstKind::Call { callee, .. }
            if callee.as_intrinsic().is_some_and(|id| id.is_commutative()) =>
        {
            func.swap_args(inst, 0, 1);
            true
        }
        _ => false,
    }
}

/// Inverts the predicate of the compare defining `cond`.
///
/// Declines when the compare feeds other users, whose results would change too.
fn invert_condition(func: &mut Function, cond: Value) -> bool {
    let Some(cmp) = func.defining_inst(cond) else {
        return false;
    };
    if func.num_uses(cond) != 1 {
        return false;
    }
    let Some(data) = func.inst_mut(cmp) else {
        return false;
    };
    data.kind = match data.kind {
        InstKind::ICmp(pred) => InstKind::ICmp(pred.inverse()),
        InstKind::FCmp(pred) => InstKind::FCmp(pred.inverse()),
        _ => return false,
    };
    true
}
