use crate::constant::{Constant, IntValue};
use crate::function::Function;
use crate::instruction::{Flag, Inst, InstKind};
use crate::types::Type;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// One refinement the flag operators can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagEdit {
    Flag(Flag),
    /// `noundef` on an intrinsic's return value
    RetNoUndef,
    /// The i1 "poison on edge input" argument of abs/ctlz/cttz
    PoisonArg,
}

fn eligible_edits(func: &Function, inst: Inst, add: bool) -> Vec<FlagEdit> {
    let data = &func[inst];
    let result_ty = func.result_type(inst);

    let mut edits: Vec<FlagEdit> = data
        .kind
        .refinement_flags(&result_ty)
        .iter()
        .copied()
        .filter(|flag| data.flags.contains(*flag) != add)
        .map(FlagEdit::Flag)
        .collect();

    if let InstKind::Call {
        callee,
        ret_noundef,
    } = &data.kind
    {
        if let Some(intrinsic) = callee.as_intrinsic() {
            if result_ty.is_int_or_int_vector() && *ret_noundef != add {
                edits.push(FlagEdit::RetNoUndef);
            }
            let poison_arg = data.arg(1).and_then(|arg| func.const_int(arg));
            if intrinsic.has_poison_flag_arg()
                && poison_arg.is_some_and(|flag| flag.bits() == 1 && flag.is_zero() == add)
            {
                edits.push(FlagEdit::PoisonArg);
            }
        }
    }
    edits
}

/// Sets (`add`) or clears one refinement that is currently clear (set).
///
/// Adding never clears anything and dropping never sets anything.
pub(super) fn mutate_flags(func: &mut Function, inst: Inst, add: bool, rng: &mut ChaCha8Rng) -> bool {
    let Some(edit) = eligible_edits(func, inst, add).choose(rng).copied() else {
        return false;
    };

    match edit {
        FlagEdit::Flag(flag) => {
            if let Some(data) = func.inst_mut(inst) {
                if add {
                    data.flags.insert(flag);
                } else {
                    data.flags.remove(flag);
                }
            }
        }
        FlagEdit::RetNoUndef => {
            if let Some(InstKind::Call { ret_noundef, .. }) = func.inst_mut(inst).map(|d| &mut d.kind) {
                *ret_noundef = add;
            }
        }
        FlagEdit::PoisonArg => {
            let value = func.make_const(Type::i1(), Constant::Int(IntValue::new(1, u128::from(add))));
            func.set_arg(inst, 1, value);
        }
    }
    true
}
