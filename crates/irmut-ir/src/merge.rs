//! Corpus merge: folds seed programs into one batch of supported functions.

use crate::cfg::has_back_edge;
use crate::constant::Constant;
use crate::function::{Function, ValueDef};
use crate::instruction::{Flag, InstKind, Intrinsic};
use crate::program::Program;
use crate::types::Type;
use crate::validation::validate_program;
use irmut_core::{Error, MergeConfig, Result};
use tracing::{debug, info, instrument};

pub struct Merger {
    config: MergeConfig,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Links every seed into one program, passing over the seed list again until
    /// the program holds at least `batch_size` functions.
    ///
    /// Fails when a pass leaves the program empty or the pass limit is reached.
    #[instrument(skip(self, seeds), fields(seeds = seeds.len(), batch_size = self.config.batch_size))]
    pub fn merge(&self, seeds: &[Program], source: &str) -> Result<Program> {
        let mut merged = Program::new();
        let mut rounds = 0;

        while merged.num_functions() < self.config.batch_size {
            for seed in seeds {
                self.link_seed(&mut merged, seed.clone());
            }
            rounds += 1;
            debug!(rounds, functions = merged.num_functions(), "merge pass finished");

            if merged.functions.is_empty() || rounds > self.config.batch_size {
                return Err(Error::NoValidSeeds(source.to_string()));
            }
        }

        validate_program(&merged)?;
        info!(
            functions = merged.num_functions(),
            declarations = merged.declarations.len(),
            "Merged seed corpus"
        );
        Ok(merged)
    }

    fn link_seed(&self, merged: &mut Program, mut seed: Program) {
        let rejected: Vec<String> = seed
            .functions
            .iter()
            .filter_map(|func| {
                let reason = self.rejection(func)?;
                debug!(function = %func.name, reason, "Dropping function");
                Some(func.name.clone())
            })
            .collect();
        seed.discard_functions(&rejected);

        let names: Vec<String> = seed.functions.iter().map(|f| f.name.clone()).collect();
        for name in names {
            if merged.has_symbol(&name) {
                let fresh = fresh_name(merged, &seed, &name);
                seed.rename_function(&name, &fresh);
            }
        }

        for func in &mut seed.functions {
            sanitize(func);
        }

        for decl in seed.declarations {
            if !merged.has_symbol(&decl.name) {
                merged.declarations.push(decl);
            }
        }
        merged.functions.extend(seed.functions);
    }

    fn rejection(&self, func: &Function) -> Option<&'static str> {
        if has_back_edge(func) {
            return Some("successor dominates its predecessor");
        }
        if self.config.ignore_fp && func.instructions().any(|inst| func.is_fp_math(inst)) {
            return Some("floating point operation");
        }
        if has_unsupported_type(func) {
            return Some("unsupported type");
        }
        for inst in func.instructions() {
            match &func[inst].kind {
                InstKind::Call { callee, .. } if !callee.as_intrinsic().is_some_and(is_known) => {
                    return Some("call to unknown function");
                }
                InstKind::Select if !func.result_type(inst).is_single_value() => {
                    return Some("select of an aggregate");
                }
                _ => {}
            }
        }
        None
    }
}

/// Intrinsics the downstream checker models
fn is_known(id: Intrinsic) -> bool {
    !matches!(
        id,
        Intrinsic::LifetimeStart | Intrinsic::LifetimeEnd | Intrinsic::IsConstant
    )
}

fn has_unsupported_type(func: &Function) -> bool {
    let bfloat = |ty: &Type| matches!(ty, Type::BFloat);
    func.ret_ty.any(&bfloat)
        || func.value_handles().any(|value| func.value_type(value).any(&bfloat))
        || func.instructions().any(|inst| {
            matches!(&func[inst].kind, InstKind::GetElementPtr { source_ty } if source_ty.any(&bfloat))
        })
}

/// `name1`, `name2`, ... whichever is free in both programs first
fn fresh_name(merged: &Program, seed: &Program, name: &str) -> String {
    (1u32..)
        .map(|id| format!("{}{}", name, id))
        .find(|candidate| !merged.has_symbol(candidate) && !seed.has_symbol(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Clears `nsz` and replaces `undef` operands with zero
fn sanitize(func: &mut Function) {
    let insts: Vec<_> = func.instructions().collect();
    for inst in insts {
        if let Some(data) = func.inst_mut(inst) {
            data.flags.remove(Flag::NoSignedZeros);
        }
    }

    let undefs: Vec<_> = func
        .value_handles()
        .filter(|value| func.const_value(*value).is_some_and(Constant::is_undef))
        .collect();
    for value in undefs {
        let data = func.value_mut(value);
        data.def = ValueDef::Const(Constant::zero_of(&data.ty));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::constant::IntValue;
    use crate::instruction::{BinaryOp, Callee, FlagSet};

    fn fadd(name: &str) -> Function {
        let mut func = Function::new(name, Type::Float);
        let x = func.add_param(Type::Float, "x");
        let entry = func.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        let sum = b.binary_with_flags(
            BinaryOp::FAdd,
            x,
            x,
            FlagSet::of(&[Flag::NoSignedZeros, Flag::NoNaNs]),
        );
        b.ret(Some(sum));
        func
    }

    fn with_undef(name: &str) -> Function {
        let mut func = Function::new(name, Type::int(8));
        let x = func.add_param(Type::int(8), "x");
        let entry = func.add_block("entry");
        let undef = func.make_const(Type::int(8), Constant::Undef);
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        let sum = b.binary(BinaryOp::Add, x, undef);
        b.ret(Some(sum));
        func
    }

    fn looping(name: &str) -> Function {
        let mut func = Function::new(name, Type::Void);
        let entry = func.add_block("entry");
        FunctionBuilder::at_end(&mut func, entry).br(entry);
        func
    }

    fn calling(name: &str, callee: &str) -> Function {
        let mut func = Function::new(name, Type::Void);
        let entry = func.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut func, entry);
        b.call(Callee::Function(callee.to_string()), vec![], Type::Void);
        b.ret(None);
        func
    }

    fn config(batch_size: usize, ignore_fp: bool) -> MergeConfig {
        MergeConfig {
            batch_size,
            ignore_fp,
        }
    }

    #[test]
    fn test_repeats_seeds_and_renames() {
        let seeds = vec![Program::with_functions(vec![fadd("f"), with_undef("g")])];
        let merged = Merger::new(config(5, false)).merge(&seeds, "seeds").unwrap();

        assert_eq!(merged.num_functions(), 6);
        for name in ["f", "g", "f1", "g1", "f2", "g2"] {
            assert!(merged.defines(name), "missing {}", name);
        }
    }

    #[test]
    fn test_sanitizes_kept_functions() {
        let seeds = vec![Program::with_functions(vec![fadd("f"), with_undef("u")])];
        let merged = Merger::new(config(2, false)).merge(&seeds, "seeds").unwrap();

        let f = merged.get_function("f").unwrap();
        let add = f.instructions().next().unwrap();
        assert_eq!(f.flags(add), FlagSet::of(&[Flag::NoNaNs]));

        let u = merged.get_function("u").unwrap();
        let add = u.instructions().next().unwrap();
        let operand = u[add].arg(1).unwrap();
        assert!(u.const_int(operand).unwrap().is_zero());
    }

    #[test]
    fn test_drops_unsupported_functions() {
        let seeds = vec![Program::with_functions(vec![
            looping("spin"),
            fadd("fp"),
            calling("lost", "nowhere"),
            with_undef("ok"),
        ])];
        let merged = Merger::new(config(1, true)).merge(&seeds, "seeds").unwrap();
        assert_eq!(merged.num_functions(), 1);
        assert!(merged.defines("ok"));
    }

    #[test]
    fn test_only_known_intrinsic_calls_survive() {
        let mut umax = Function::new("umax", Type::int(8));
        let x = umax.add_param(Type::int(8), "x");
        let y = umax.add_param(Type::int(8), "y");
        let entry = umax.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut umax, entry);
        let call = b.call(Callee::Intrinsic(Intrinsic::Umax), vec![x, y], Type::int(8));
        let max = b.func().result(call).unwrap();
        b.ret(Some(max));

        let mut marker = Function::new("marker", Type::Void);
        let p = marker.add_param(Type::Ptr, "p");
        let entry = marker.add_block("entry");
        let size = marker.make_const(Type::int(64), Constant::Int(IntValue::from_i64(64, 4)));
        let mut b = FunctionBuilder::at_end(&mut marker, entry);
        b.call(Callee::Intrinsic(Intrinsic::LifetimeStart), vec![size, p], Type::Void);
        b.ret(None);

        let seeds = vec![Program::with_functions(vec![
            fadd("callee"),
            calling("user", "callee"),
            umax,
            marker,
        ])];
        let merged = Merger::new(config(1, false)).merge(&seeds, "seeds").unwrap();
        assert!(merged.defines("callee"));
        assert!(merged.defines("umax"));
        assert!(!merged.defines("user"));
        assert!(!merged.defines("marker"));
    }

    #[test]
    fn test_drops_unsupported_types() {
        let mut half = Function::new("half", Type::Void);
        half.add_param(Type::vector(2, Type::BFloat), "v");
        let entry = half.add_block("entry");
        FunctionBuilder::at_end(&mut half, entry).ret(None);

        let pair = Type::Struct(vec![Type::int(32), Type::i1()]);
        let mut choose = Function::new("choose", Type::Void);
        let c = choose.add_param(Type::i1(), "c");
        let l = choose.add_param(pair.clone(), "l");
        let r = choose.add_param(pair, "r");
        let entry = choose.add_block("entry");
        let mut b = FunctionBuilder::at_end(&mut choose, entry);
        b.select(c, l, r, FlagSet::empty());
        b.ret(None);

        let seeds = vec![Program::with_functions(vec![half, choose, with_undef("ok")])];
        let merged = Merger::new(config(1, false)).merge(&seeds, "seeds").unwrap();
        assert_eq!(merged.num_functions(), 1);
        assert!(merged.defines("ok"));
    }

    #[test]
    fn test_nothing_valid() {
        let seeds = vec![Program::with_functions(vec![looping("spin")])];
        let err = Merger::new(config(4, false)).merge(&seeds, "corpus").unwrap_err();
        assert!(matches!(err, Error::NoValidSeeds(source) if source == "corpus"));
    }
}
