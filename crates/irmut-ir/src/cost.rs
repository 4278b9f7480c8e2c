//! Static cost estimate used to rank seed functions.

use crate::function::Function;
use crate::instruction::{Callee, Inst, InstKind, Intrinsic};
use crate::program::Program;

fn intrinsic_cost(id: Intrinsic) -> u32 {
    match id {
        Intrinsic::Assume
        | Intrinsic::LifetimeStart
        | Intrinsic::LifetimeEnd
        | Intrinsic::IsConstant => 0,
        Intrinsic::SaddSat
        | Intrinsic::UaddSat
        | Intrinsic::SsubSat
        | Intrinsic::UsubSat
        | Intrinsic::SshlSat
        | Intrinsic::UshlSat
        | Intrinsic::SaddWithOverflow
        | Intrinsic::UaddWithOverflow
        | Intrinsic::SsubWithOverflow
        | Intrinsic::UsubWithOverflow
        | Intrinsic::SmulWithOverflow
        | Intrinsic::UmulWithOverflow => 3,
        Intrinsic::IsFpclass
        | Intrinsic::Fabs
        | Intrinsic::Copysign
        | Intrinsic::Maximum
        | Intrinsic::Minimum
        | Intrinsic::Maximumnum
        | Intrinsic::Minimumnum
        | Intrinsic::Maxnum
        | Intrinsic::Minnum
        | Intrinsic::Smax
        | Intrinsic::Smin
        | Intrinsic::Umax
        | Intrinsic::Umin => 1,
        _ => 2,
    }
}

fn inst_cost(func: &Function, inst: Inst) -> u32 {
    match &func[inst].kind {
        InstKind::Binary(op) if op.is_int_div_rem() => 10,
        InstKind::Load | InstKind::Store => 4,
        InstKind::Call {
            callee: Callee::Intrinsic(id),
            ..
        } => intrinsic_cost(*id),
        InstKind::Call { .. } => 0,
        _ => 1,
    }
}

/// Sum of per-instruction weights
pub fn function_cost(func: &Function) -> u32 {
    func.instructions().map(|inst| inst_cost(func, inst)).sum()
}

/// `(name, cost)` for every defined function, in program order
pub fn program_costs(program: &Program) -> Vec<(String, u32)> {
    program
        .functions
        .iter()
        .map(|func| (func.name.clone(), function_cost(func)))
        .collect()
}
