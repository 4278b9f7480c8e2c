//! Instruction builder that derives result types from operands.

use crate::constant::{Constant, IntValue};
use crate::function::{Function, InsertPoint};
use crate::instruction::{
    BinaryOp, Block, Callee, CastOp, FlagSet, FloatPredicate, Inst, InstKind, IntPredicate, Value,
};
use crate::types::Type;

/// Appends instructions at an insertion point.
///
/// Inserting after an instruction moves the point past each new instruction, so a
/// sequence of calls lands in program order.
pub struct FunctionBuilder<'f> {
    func: &'f mut Function,
    point: InsertPoint,
}

impl<'f> FunctionBuilder<'f> {
    pub fn new(func: &'f mut Function, point: InsertPoint) -> Self {
        Self { func, point }
    }

    pub fn at_end(func: &'f mut Function, block: Block) -> Self {
        Self::new(func, InsertPoint::End(block))
    }

    pub fn func(&mut self) -> &mut Function {
        self.func
    }

    pub fn position_at_end(&mut self, block: Block) {
        self.point = InsertPoint::End(block);
    }

    fn advance(&mut self, inst: Inst) {
        if let InsertPoint::After(_) = self.point {
            self.point = InsertPoint::After(inst);
        }
    }

    fn value_inst(&mut self, kind: InstKind, args: Vec<Value>, flags: FlagSet, ty: Type) -> Value {
        let (inst, value) = self.func.insert_value(self.point, kind, args, flags, ty);
        self.advance(inst);
        value
    }

    fn void_inst(&mut self, kind: InstKind, args: Vec<Value>) -> Inst {
        let inst = self
            .func
            .insert_inst(self.point, kind, args, FlagSet::empty(), Type::Void);
        self.advance(inst);
        inst
    }

    // ----- constants -----

    /// Integer constant of `ty` (splat for vectors), sign-extended from `value`
    pub fn iconst(&mut self, ty: &Type, value: i64) -> Value {
        let bits = ty.int_bits().unwrap_or(64);
        self.func
            .make_const(ty.clone(), Constant::Int(IntValue::from_i64(bits, value)))
    }

    pub fn bool_const(&mut self, ty: &Type, value: bool) -> Value {
        self.iconst(ty, if value { -1 } else { 0 })
    }

    pub fn fconst(&mut self, ty: &Type, value: f64) -> Value {
        self.func.make_const(ty.clone(), Constant::Float(value))
    }

    // ----- arithmetic -----

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        self.binary_with_flags(op, lhs, rhs, FlagSet::empty())
    }

    pub fn binary_with_flags(
        &mut self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        flags: FlagSet,
    ) -> Value {
        let ty = self.func.value_type(lhs).clone();
        self.value_inst(InstKind::Binary(op), vec![lhs, rhs], flags, ty)
    }

    pub fn fneg(&mut self, operand: Value, flags: FlagSet) -> Value {
        let ty = self.func.value_type(operand).clone();
        self.value_inst(InstKind::FNeg, vec![operand], flags, ty)
    }

    pub fn cast(&mut self, op: CastOp, operand: Value, ty: Type, flags: FlagSet) -> Value {
        self.value_inst(InstKind::Cast(op), vec![operand], flags, ty)
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value, flags: FlagSet) -> Value {
        let ty = self.func.value_type(lhs).with_scalar(Type::i1());
        self.value_inst(InstKind::ICmp(pred), vec![lhs, rhs], flags, ty)
    }

    pub fn fcmp(&mut self, pred: FloatPredicate, lhs: Value, rhs: Value, flags: FlagSet) -> Value {
        let ty = self.func.value_type(lhs).with_scalar(Type::i1());
        self.value_inst(InstKind::FCmp(pred), vec![lhs, rhs], flags, ty)
    }

    pub fn select(&mut self, cond: Value, on_true: Value, on_false: Value, flags: FlagSet) -> Value {
        let ty = self.func.value_type(on_true).clone();
        self.value_inst(InstKind::Select, vec![cond, on_true, on_false], flags, ty)
    }

    /// `select a, b, false`: poison in `b` does not leak when `a` is false
    pub fn logical_and(&mut self, a: Value, b: Value) -> Value {
        let ty = self.func.value_type(a).clone();
        let fals = self.bool_const(&ty, false);
        self.select(a, b, fals, FlagSet::empty())
    }

    /// `select a, true, b`
    pub fn logical_or(&mut self, a: Value, b: Value) -> Value {
        let ty = self.func.value_type(a).clone();
        let tru = self.bool_const(&ty, true);
        self.select(a, tru, b, FlagSet::empty())
    }

    // ----- calls and memory -----

    pub fn call(&mut self, callee: Callee, args: Vec<Value>, ret_ty: Type) -> Inst {
        let inst = self.func.insert_inst(
            self.point,
            InstKind::Call {
                callee,
                ret_noundef: false,
            },
            args,
            FlagSet::empty(),
            ret_ty,
        );
        self.advance(inst);
        inst
    }

    pub fn load(&mut self, ty: Type, addr: Value) -> Value {
        self.value_inst(InstKind::Load, vec![addr], FlagSet::empty(), ty)
    }

    pub fn store(&mut self, value: Value, addr: Value) -> Inst {
        self.void_inst(InstKind::Store, vec![value, addr])
    }

    pub fn gep(&mut self, source_ty: Type, base: Value, indices: &[Value], flags: FlagSet) -> Value {
        let mut args = vec![base];
        args.extend_from_slice(indices);
        self.value_inst(InstKind::GetElementPtr { source_ty }, args, flags, Type::Ptr)
    }

    pub fn extract_value(&mut self, aggregate: Value, index: u32) -> Value {
        let ty = match self.func.value_type(aggregate) {
            Type::Struct(fields) => fields.get(index as usize).cloned().unwrap_or(Type::Void),
            other => other.clone(),
        };
        self.value_inst(
            InstKind::ExtractValue { index },
            vec![aggregate],
            FlagSet::empty(),
            ty,
        )
    }

    pub fn phi(&mut self, ty: Type, incoming: &[(Value, Block)]) -> Value {
        let (values, blocks): (Vec<_>, Vec<_>) = incoming.iter().copied().unzip();
        self.value_inst(
            InstKind::Phi { incoming: blocks },
            values,
            FlagSet::empty(),
            ty,
        )
    }

    // ----- terminators -----

    pub fn br(&mut self, dest: Block) -> Inst {
        self.void_inst(InstKind::Br { dest }, Vec::new())
    }

    pub fn cond_br(&mut self, cond: Value, then_dest: Block, else_dest: Block) -> Inst {
        self.void_inst(
            InstKind::CondBr {
                then_dest,
                else_dest,
            },
            vec![cond],
        )
    }

    pub fn ret(&mut self, value: Option<Value>) -> Inst {
        self.void_inst(InstKind::Ret, value.into_iter().collect())
    }

    pub fn unreachable(&mut self) -> Inst {
        self.void_inst(InstKind::Unreachable, Vec::new())
    }
}
