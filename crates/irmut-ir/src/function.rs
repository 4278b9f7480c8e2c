//! Function bodies: an arena of values and instructions with explicit use lists.
//!
//! Handles (`Value`, `Inst`, `Block`) are indices into the arenas and stay valid
//! for the lifetime of the function. Erasing an instruction leaves a tombstone in
//! its slot; erasure is refused while the instruction's result still has uses, so
//! callers redirect uses first (`replace_all_uses`) and erase second.

use crate::constant::Constant;
use crate::instruction::{Block, Callee, FlagSet, Inst, InstData, InstKind, Value};
use crate::types::Type;
use irmut_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An operand slot reading a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Use {
    pub inst: Inst,
    pub slot: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueDef {
    /// The n-th function argument
    Param(u32),
    /// Result of an instruction
    Result(Inst),
    Const(Constant),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueData {
    pub ty: Type,
    pub def: ValueDef,
    pub name: Option<String>,
    uses: Vec<Use>,
}

impl ValueData {
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }
}

/// Attributes of a function argument
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamAttrs {
    pub nonnull: bool,
    pub noundef: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub value: Value,
    pub attrs: ParamAttrs,
}

/// A basic block is a sequence of instructions ending in a terminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub name: Option<String>,
    insts: Vec<Inst>,
}

impl BasicBlock {
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }
}

/// Where a new instruction goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    Before(Inst),
    After(Inst),
    End(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub ret_ty: Type,
    params: Vec<Param>,
    blocks: Vec<BasicBlock>,
    values: Vec<ValueData>,
    insts: Vec<Option<InstData>>,
}

impl Function {
    pub fn new(name: impl Into<String>, ret_ty: Type) -> Self {
        Self {
            name: name.into(),
            ret_ty,
            params: Vec::new(),
            blocks: Vec::new(),
            values: Vec::new(),
            insts: Vec::new(),
        }
    }

    fn push_value(&mut self, ty: Type, def: ValueDef) -> Value {
        self.values.push(ValueData {
            ty,
            def,
            name: None,
            uses: Vec::new(),
        });
        Value((self.values.len() - 1) as u32)
    }

    // ----- arguments -----

    pub fn add_param(&mut self, ty: Type, name: impl Into<String>) -> Value {
        let index = self.params.len() as u32;
        let value = self.push_value(ty, ValueDef::Param(index));
        self.values[value.index()].name = Some(name.into());
        self.params.push(Param {
            value,
            attrs: ParamAttrs::default(),
        });
        value
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn param_attrs_mut(&mut self, index: usize) -> Option<&mut ParamAttrs> {
        self.params.get_mut(index).map(|param| &mut param.attrs)
    }

    /// Argument index of `value`, if it is an argument
    pub fn as_param(&self, value: Value) -> Option<usize> {
        match self.value(value).def {
            ValueDef::Param(index) => Some(index as usize),
            _ => None,
        }
    }

    // ----- values -----

    pub fn value(&self, value: Value) -> &ValueData {
        &self.values[value.index()]
    }

    pub fn value_type(&self, value: Value) -> &Type {
        &self.values[value.index()].ty
    }

    pub fn value_name(&self, value: Value) -> Option<&str> {
        self.values[value.index()].name.as_deref()
    }

    pub fn set_value_name(&mut self, value: Value, name: impl Into<String>) {
        self.values[value.index()].name = Some(name.into());
    }

    pub fn uses(&self, value: Value) -> &[Use] {
        &self.values[value.index()].uses
    }

    pub fn num_uses(&self, value: Value) -> usize {
        self.values[value.index()].uses.len()
    }

    pub fn has_one_use(&self, value: Value) -> bool {
        self.num_uses(value) == 1
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn value_handles(&self) -> impl Iterator<Item = Value> {
        (0..self.values.len() as u32).map(Value)
    }

    /// Creates a fresh constant value. Constants are not shared between operand slots.
    pub fn make_const(&mut self, ty: Type, constant: Constant) -> Value {
        self.push_value(ty, ValueDef::Const(constant))
    }

    pub fn const_value(&self, value: Value) -> Option<&Constant> {
        match &self.value(value).def {
            ValueDef::Const(constant) => Some(constant),
            _ => None,
        }
    }

    /// Integer (or splat integer) constant carried by `value`
    pub fn const_int(&self, value: Value) -> Option<crate::constant::IntValue> {
        self.const_value(value).and_then(|c| c.as_int()).copied()
    }

    pub fn is_constant(&self, value: Value) -> bool {
        self.const_value(value).is_some()
    }

    pub fn defining_inst(&self, value: Value) -> Option<Inst> {
        match self.value(value).def {
            ValueDef::Result(inst) => Some(inst),
            _ => None,
        }
    }

    // ----- blocks -----

    pub fn add_block(&mut self, name: impl Into<String>) -> Block {
        self.blocks.push(BasicBlock {
            name: Some(name.into()),
            insts: Vec::new(),
        });
        Block((self.blocks.len() - 1) as u32)
    }

    /// Blocks in layout order
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        (0..self.blocks.len() as u32).map(Block)
    }

    pub fn block(&self, block: Block) -> &BasicBlock {
        &self.blocks[block.index()]
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn entry_block(&self) -> Option<Block> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(Block(0))
        }
    }

    pub fn terminator(&self, block: Block) -> Option<Inst> {
        let last = *self.block(block).insts.last()?;
        self[last].is_terminator().then_some(last)
    }

    pub fn successors(&self, block: Block) -> Vec<Block> {
        self.terminator(block)
            .map(|term| self[term].kind.successors())
            .unwrap_or_default()
    }

    // ----- instructions -----

    pub fn inst_data(&self, inst: Inst) -> Option<&InstData> {
        self.insts.get(inst.index()).and_then(Option::as_ref)
    }

    /// Mutable access for kind and flag edits. Operands go through `set_arg`/`swap_args`.
    pub fn inst_mut(&mut self, inst: Inst) -> Option<&mut InstData> {
        self.insts.get_mut(inst.index()).and_then(Option::as_mut)
    }

    pub fn is_live(&self, inst: Inst) -> bool {
        self.inst_data(inst).is_some()
    }

    pub fn result(&self, inst: Inst) -> Option<Value> {
        self.inst_data(inst).and_then(|data| data.result)
    }

    pub fn flags(&self, inst: Inst) -> FlagSet {
        self.inst_data(inst).map(|data| data.flags).unwrap_or_default()
    }

    /// All live instructions in layout order
    pub fn instructions(&self) -> impl Iterator<Item = Inst> + '_ {
        self.blocks.iter().flat_map(|block| block.insts.iter().copied())
    }

    /// Count total instructions in the function
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Type of the instruction's result, `Void` if it has none
    pub fn result_type(&self, inst: Inst) -> Type {
        self.result(inst)
            .map(|value| self.value_type(value).clone())
            .unwrap_or(Type::Void)
    }

    /// Creates an instruction at `point`. A result value is created unless `ty` is void.
    pub fn insert_inst(
        &mut self,
        point: InsertPoint,
        kind: InstKind,
        args: Vec<Value>,
        flags: FlagSet,
        ty: Type,
    ) -> Inst {
        let inst = Inst(self.insts.len() as u32);
        let result = if ty.is_void() {
            None
        } else {
            Some(self.push_value(ty, ValueDef::Result(inst)))
        };
        self.link(point, inst, kind, args, flags, result);
        inst
    }

    /// Creates a value-producing instruction at `point`
    pub fn insert_value(
        &mut self,
        point: InsertPoint,
        kind: InstKind,
        args: Vec<Value>,
        flags: FlagSet,
        ty: Type,
    ) -> (Inst, Value) {
        let inst = Inst(self.insts.len() as u32);
        let value = self.push_value(ty, ValueDef::Result(inst));
        self.link(point, inst, kind, args, flags, Some(value));
        (inst, value)
    }

    fn link(
        &mut self,
        point: InsertPoint,
        inst: Inst,
        kind: InstKind,
        args: Vec<Value>,
        flags: FlagSet,
        result: Option<Value>,
    ) {
        let (block, position) = match point {
            InsertPoint::Before(at) => self.locate(at),
            InsertPoint::After(at) => {
                let (block, position) = self.locate(at);
                (block, position + 1)
            }
            InsertPoint::End(block) => (block, self.blocks[block.index()].insts.len()),
        };

        for (slot, arg) in args.iter().enumerate() {
            self.values[arg.index()].uses.push(Use {
                inst,
                slot: slot as u32,
            });
        }

        self.insts.push(Some(InstData {
            kind,
            flags,
            args,
            result,
            block,
        }));
        self.blocks[block.index()].insts.insert(position, inst);
    }

    fn locate(&self, inst: Inst) -> (Block, usize) {
        let block = self[inst].block;
        let position = self.blocks[block.index()]
            .insts
            .iter()
            .position(|&i| i == inst)
            .unwrap_or(self.blocks[block.index()].insts.len());
        (block, position)
    }

    fn unlink_use(&mut self, value: Value, used_by: Use) {
        let uses = &mut self.values[value.index()].uses;
        if let Some(pos) = uses.iter().position(|u| *u == used_by) {
            uses.swap_remove(pos);
        }
    }

    /// Points operand `slot` of `inst` at `value`, keeping both use lists current
    pub fn set_arg(&mut self, inst: Inst, slot: usize, value: Value) {
        let Some(data) = self.insts.get_mut(inst.index()).and_then(Option::as_mut) else {
            return;
        };
        let Some(old) = data.args.get_mut(slot).map(|arg| std::mem::replace(arg, value)) else {
            return;
        };
        let used_by = Use {
            inst,
            slot: slot as u32,
        };
        self.unlink_use(old, used_by);
        self.values[value.index()].uses.push(used_by);
    }

    /// Exchanges two operands of `inst`
    pub fn swap_args(&mut self, inst: Inst, a: usize, b: usize) {
        let (Some(first), Some(second)) = (
            self.inst_data(inst).and_then(|d| d.arg(a)),
            self.inst_data(inst).and_then(|d| d.arg(b)),
        ) else {
            return;
        };
        self.set_arg(inst, a, second);
        self.set_arg(inst, b, first);
    }

    /// Redirects every use of `old` to `new`. `old` is left with no uses.
    pub fn replace_all_uses(&mut self, old: Value, new: Value) {
        if old == new {
            return;
        }
        let uses = std::mem::take(&mut self.values[old.index()].uses);
        for used_by in &uses {
            if let Some(data) = self.insts[used_by.inst.index()].as_mut() {
                data.args[used_by.slot as usize] = new;
            }
        }
        self.values[new.index()].uses.extend(uses);
    }

    /// Removes `inst` from its block and drops its operand uses.
    ///
    /// Fails with `Error::ValueInUse` while the instruction's result is still read.
    pub fn erase_inst(&mut self, inst: Inst) -> Result<()> {
        let data = self
            .inst_data(inst)
            .ok_or_else(|| Error::InvalidState(format!("instruction {} already erased", inst.0)))?;
        if let Some(result) = data.result {
            let uses = self.num_uses(result);
            if uses > 0 {
                return Err(Error::ValueInUse {
                    function: self.name.clone(),
                    value: self
                        .value_name(result)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{}", result.0)),
                    uses,
                });
            }
        }

        let (block, position) = self.locate(inst);
        if let Some(data) = self.insts[inst.index()].take() {
            for (slot, arg) in data.args.iter().enumerate() {
                self.unlink_use(
                    *arg,
                    Use {
                        inst,
                        slot: slot as u32,
                    },
                );
            }
        }
        let insts = &mut self.blocks[block.index()].insts;
        if position < insts.len() {
            insts.remove(position);
        }
        Ok(())
    }

    /// Non-intrinsic call targets, one entry per call site
    pub fn callees(&self) -> impl Iterator<Item = (Inst, &str)> + '_ {
        self.instructions().filter_map(move |inst| match &self[inst].kind {
            InstKind::Call {
                callee: Callee::Function(name),
                ..
            } => Some((inst, name.as_str())),
            _ => None,
        })
    }

    pub fn calls(&self, name: &str) -> bool {
        self.callees().any(|(_, callee)| callee == name)
    }

    /// Points every call of `from` at `to`
    pub fn rename_callee(&mut self, from: &str, to: &str) {
        let sites: Vec<Inst> = self
            .callees()
            .filter(|(_, callee)| *callee == from)
            .map(|(inst, _)| inst)
            .collect();
        for inst in sites {
            if let Some(data) = self.inst_mut(inst) {
                data.kind = match std::mem::replace(&mut data.kind, InstKind::Unreachable) {
                    InstKind::Call { ret_noundef, .. } => InstKind::Call {
                        callee: Callee::Function(to.to_string()),
                        ret_noundef,
                    },
                    other => other,
                };
            }
        }
    }

    pub(crate) fn value_mut(&mut self, value: Value) -> &mut ValueData {
        &mut self.values[value.index()]
    }

    /// Returns true if the instruction is a floating point operation
    pub fn is_fp_math(&self, inst: Inst) -> bool {
        let Some(data) = self.inst_data(inst) else {
            return false;
        };
        match &data.kind {
            InstKind::Binary(op) => op.is_float(),
            InstKind::FNeg | InstKind::FCmp(_) => true,
            InstKind::Cast(op) => {
                matches!(op, crate::instruction::CastOp::FPTrunc | crate::instruction::CastOp::FPExt)
            }
            InstKind::Select | InstKind::Phi { .. } | InstKind::Call { .. } => {
                self.result_type(inst).is_fp_or_fp_vector()
            }
            _ => false,
        }
    }
}

impl Index<Inst> for Function {
    type Output = InstData;

    /// Panics if `inst` was erased
    fn index(&self, inst: Inst) -> &InstData {
        match self.inst_data(inst) {
            Some(data) => data,
            None => panic!("instruction {} of {} was erased", inst.0, self.name),
        }
    }
}
