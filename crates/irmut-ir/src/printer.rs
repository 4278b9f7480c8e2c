//! LLVM-like textual listing of programs. Output only; nothing parses it back.

use crate::constant::TypedConstant;
use crate::function::Function;
use crate::instruction::{Block, Callee, FlagSet, Inst, InstKind, Intrinsic, Value};
use crate::program::{Declaration, Program};
use crate::types::Type;
use std::collections::HashMap;
use std::fmt::{self, Write};

/// Printable names for values and blocks. Unnamed ones are numbered in order.
struct Names {
    values: HashMap<Value, String>,
}

impl Names {
    fn new(func: &Function) -> Self {
        let mut values = HashMap::new();
        let mut next = 0;
        let mut assign = |value: Value, values: &mut HashMap<Value, String>| {
            let name = match func.value_name(value) {
                Some(name) => name.to_string(),
                None => {
                    next += 1;
                    (next - 1).to_string()
                }
            };
            values.insert(value, name);
        };

        for param in func.params() {
            assign(param.value, &mut values);
        }
        for inst in func.instructions() {
            if let Some(result) = func.result(inst) {
                assign(result, &mut values);
            }
        }
        Self { values }
    }

    fn value(&self, value: Value) -> String {
        match self.values.get(&value) {
            Some(name) => format!("%{}", name),
            None => format!("%v{}", value.index()),
        }
    }
}

fn block_label(func: &Function, block: Block) -> String {
    func.block(block)
        .name
        .clone()
        .unwrap_or_else(|| format!("bb{}", block.index()))
}

fn flags_prefix(flags: FlagSet) -> String {
    flags.iter().map(|flag| format!("{} ", flag.name())).collect()
}

struct InstPrinter<'a> {
    func: &'a Function,
    names: &'a Names,
}

impl InstPrinter<'_> {
    fn operand(&self, value: Value) -> String {
        match self.func.const_value(value) {
            Some(constant) => TypedConstant(constant, self.func.value_type(value)).to_string(),
            None => self.names.value(value),
        }
    }

    fn typed(&self, value: Value) -> String {
        format!("{} {}", self.func.value_type(value), self.operand(value))
    }

    fn typed_list(&self, values: &[Value]) -> String {
        values
            .iter()
            .map(|v| self.typed(*v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn callee_name(&self, callee: &Callee, args: &[Value]) -> String {
        match callee {
            Callee::Function(name) => name.clone(),
            Callee::Intrinsic(Intrinsic::Assume) => Intrinsic::Assume.name().to_string(),
            Callee::Intrinsic(id) => {
                let suffix = args
                    .first()
                    .and_then(|arg| self.func.value_type(*arg).intrinsic_suffix());
                match suffix {
                    Some(suffix) => format!("{}.{}", id.name(), suffix),
                    None => id.name().to_string(),
                }
            }
        }
    }

    fn write(&self, out: &mut String, inst: Inst) -> fmt::Result {
        let data = &self.func[inst];
        let args = data.args();
        let flags = flags_prefix(data.flags);
        let result_ty = self.func.result_type(inst);

        if let Some(result) = data.result() {
            write!(out, "{} = ", self.names.value(result))?;
        }

        match &data.kind {
            InstKind::Binary(op) => write!(
                out,
                "{} {}{} {}, {}",
                op.name(),
                flags,
                result_ty,
                self.operand(args[0]),
                self.operand(args[1])
            ),
            InstKind::FNeg => write!(out, "fneg {}{}", flags, self.typed(args[0])),
            InstKind::Cast(op) => write!(
                out,
                "{} {}{} to {}",
                op.name(),
                flags,
                self.typed(args[0]),
                result_ty
            ),
            InstKind::ICmp(pred) => write!(
                out,
                "icmp {}{} {}, {}",
                flags,
                pred.name(),
                self.typed(args[0]),
                self.operand(args[1])
            ),
            InstKind::FCmp(pred) => write!(
                out,
                "fcmp {}{} {}, {}",
                flags,
                pred.name(),
                self.typed(args[0]),
                self.operand(args[1])
            ),
            InstKind::Select => write!(out, "select {}{}", flags, self.typed_list(args)),
            InstKind::Phi { incoming } => {
                let arms: Vec<String> = args
                    .iter()
                    .zip(incoming)
                    .map(|(v, b)| format!("[ {}, %{} ]", self.operand(*v), block_label(self.func, *b)))
                    .collect();
                write!(out, "phi {}{} {}", flags, result_ty, arms.join(", "))
            }
            InstKind::Call {
                callee,
                ret_noundef,
            } => write!(
                out,
                "call {}{}{} @{}({})",
                flags,
                if *ret_noundef { "noundef " } else { "" },
                result_ty,
                self.callee_name(callee, args),
                self.typed_list(args)
            ),
            InstKind::Load => write!(out, "load {}, {}", result_ty, self.typed(args[0])),
            InstKind::Store => write!(out, "store {}", self.typed_list(args)),
            InstKind::GetElementPtr { source_ty } => write!(
                out,
                "getelementptr {}{}, {}",
                flags,
                source_ty,
                self.typed_list(args)
            ),
            InstKind::ExtractValue { index } => {
                write!(out, "extractvalue {}, {}", self.typed(args[0]), index)
            }
            InstKind::Br { dest } => write!(out, "br label %{}", block_label(self.func, *dest)),
            InstKind::CondBr {
                then_dest,
                else_dest,
            } => write!(
                out,
                "br {}, label %{}, label %{}",
                self.typed(args[0]),
                block_label(self.func, *then_dest),
                block_label(self.func, *else_dest)
            ),
            InstKind::Ret => match args.first() {
                Some(value) => write!(out, "ret {}", self.typed(*value)),
                None => write!(out, "ret void"),
            },
            InstKind::Unreachable => write!(out, "unreachable"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = Names::new(self);
        let printer = InstPrinter {
            func: self,
            names: &names,
        };

        let params: Vec<String> = self
            .params()
            .iter()
            .map(|param| {
                let mut text = self.value_type(param.value).to_string();
                if param.attrs.nonnull {
                    text.push_str(" nonnull");
                }
                if param.attrs.noundef {
                    text.push_str(" noundef");
                }
                format!("{} {}", text, names.value(param.value))
            })
            .collect();
        writeln!(f, "define {} @{}({}) {{", self.ret_ty, self.name, params.join(", "))?;

        for (i, block) in self.blocks().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block_label(self, block))?;
            for &inst in self.block(block).insts() {
                let mut line = String::new();
                printer.write(&mut line, inst)?;
                writeln!(f, "  {}", line)?;
            }
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(Type::to_string).collect();
        write!(f, "declare {} @{}({})", self.ret_ty, self.name, params.join(", "))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            writeln!(f, "{}", func)?;
            writeln!(f)?;
        }
        for decl in &self.declarations {
            writeln!(f, "{}", decl)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use crate::instruction::{BinaryOp, CastOp, Flag, IntPredicate};

    #[test]
    fn test_function_listing() {
        let mut func = Function::new("f", Type::int(32));
        let a = func.add_param(Type::int(32), "a");
        let b = func.add_param(Type::int(32), "b");
        let entry = func.add_block("entry");
        let mut builder = FunctionBuilder::at_end(&mut func, entry);
        let c = builder.binary_with_flags(BinaryOp::Or, a, b, FlagSet::of(&[Flag::Disjoint]));
        let cmp = builder.icmp(IntPredicate::Ult, c, b, FlagSet::of(&[Flag::SameSign]));
        let wide = builder.cast(CastOp::ZExt, cmp, Type::int(32), FlagSet::of(&[Flag::NonNeg]));
        builder.ret(Some(wide));
        func.set_value_name(c, "c");

        let text = func.to_string();
        let expected = "define i32 @f(i32 %a, i32 %b) {\n\
                        entry:\n  \
                        %c = or disjoint i32 %a, %b\n  \
                        %0 = icmp samesign ult i32 %c, %b\n  \
                        %1 = zext nneg i1 %0 to i32\n  \
                        ret i32 %1\n\
                        }";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_calls_and_declarations() {
        let mut func = Function::new("g", Type::Void);
        let x = func.add_param(Type::int(8), "x");
        func.param_attrs_mut(0).unwrap().noundef = true;
        let entry = func.add_block("entry");
        let mut builder = FunctionBuilder::at_end(&mut func, entry);
        let no_poison = builder.iconst(&Type::i1(), 0);
        let abs = builder.call(Callee::Intrinsic(Intrinsic::Abs), vec![x, no_poison], Type::int(8));
        let abs = builder.func().result(abs).unwrap();
        builder.call(Callee::Function("fuzz_use_i8".to_string()), vec![abs], Type::Void);
        builder.ret(None);

        let mut program = Program::with_functions(vec![func]);
        program.declare_missing_callees();
        let text = program.to_string();

        assert!(text.contains("define void @g(i8 noundef %x) {"));
        assert!(text.contains("%0 = call i8 @llvm.abs.i8(i8 %x, i1 false)"));
        assert!(text.contains("call void @fuzz_use_i8(i8 %0)"));
        assert!(text.contains("declare void @fuzz_use_i8(i8)"));
    }
}
