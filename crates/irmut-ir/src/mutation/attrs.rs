use crate::function::Function;
use crate::instruction::Inst;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Toggles `nonnull` (pointers only) or `noundef` on an argument
pub(super) fn mutate_argument_attribute(func: &mut Function, index: usize, rng: &mut ChaCha8Rng) -> bool {
    let Some(param) = func.param(index) else {
        return false;
    };
    let is_ptr = func.value_type(param.value).is_ptr();
    let toggle_nonnull = rng.gen::<bool>();
    let Some(attrs) = func.param_attrs_mut(index) else {
        return false;
    };

    if toggle_nonnull {
        if !is_ptr {
            return false;
        }
        attrs.nonnull = !attrs.nonnull;
    } else {
        attrs.noundef = !attrs.noundef;
    }
    true
}

/// Points one operand that reads a multi-use argument at another argument of the same type
pub(super) fn replace_argument_use(func: &mut Function, inst: Inst, rng: &mut ChaCha8Rng) -> bool {
    let slots: Vec<usize> = func[inst]
        .args()
        .iter()
        .enumerate()
        .filter(|(_, arg)| func.as_param(**arg).is_some() && func.num_uses(**arg) > 1)
        .map(|(slot, _)| slot)
        .collect();
    let Some(&slot) = slots.choose(rng) else {
        return false;
    };
    let Some(current) = func[inst].arg(slot) else {
        return false;
    };

    let ty = func.value_type(current);
    let replacements: Vec<_> = func
        .params()
        .iter()
        .map(|param| param.value)
        .filter(|value| *value != current && func.value_type(*value) == ty)
        .collect();
    let Some(&replacement) = replacements.choose(rng) else {
        return false;
    };

    func.set_arg(inst, slot, replacement);
    true
}
