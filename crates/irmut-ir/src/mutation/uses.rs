use crate::builder::FunctionBuilder;
use crate::function::{Function, InsertPoint};
use crate::instruction::{Callee, Inst};
use crate::types::Type;

/// Helper symbols that give a value a second, opaque use
pub const FUZZ_USE_PREFIX: &str = "fuzz_use_";

/// Adds a `call void @fuzz_use_<ty>(value)` right after a single-use definition.
///
/// The callee is declared at program level by the driver once the function is kept.
pub(super) fn break_one_use(func: &mut Function, inst: Inst) -> bool {
    let data = &func[inst];
    if data.is_terminator() || data.kind.is_phi() {
        return false;
    }
    let Some(value) = data.result() else {
        return false;
    };
    if !func.has_one_use(value) {
        return false;
    }
    let ty = func.value_type(value);
    if !ty.is_single_value() {
        return false;
    }
    let Some(suffix) = ty.mangled_name() else {
        return false;
    };

    let callee = Callee::Function(format!("{}{}", FUZZ_USE_PREFIX, suffix));
    FunctionBuilder::new(func, InsertPoint::After(inst)).call(callee, vec![value], Type::Void);
    true
}
