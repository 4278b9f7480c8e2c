//! Instruction set of the SSA IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a value (argument, instruction result or constant) inside a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Value(pub(crate) u32);

/// Handle of an instruction inside a function. Stable across insertions and erasures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Inst(pub(crate) u32);

/// Handle of a basic block inside a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Block(pub(crate) u32);

impl Value {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Inst {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Block {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Two-operand arithmetic and bitwise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Integer arithmetic
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,

    // Shifts
    Shl,
    LShr,
    AShr,

    // Bitwise logic
    And,
    Or,
    Xor,

    // Floating point
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

/// Members of the bitwise logic family
pub const BITWISE_LOGIC_OPS: [BinaryOp; 3] = [BinaryOp::And, BinaryOp::Or, BinaryOp::Xor];

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::URem => "urem",
            BinaryOp::SRem => "srem",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::FRem => "frem",
        }
    }

    /// Returns true if `a op b == b op a`
    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Mul
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Xor
                | BinaryOp::FAdd
                | BinaryOp::FMul
        )
    }

    pub fn is_int_div_rem(&self) -> bool {
        matches!(
            self,
            BinaryOp::UDiv | BinaryOp::SDiv | BinaryOp::URem | BinaryOp::SRem
        )
    }

    pub fn is_bitwise_logic(&self) -> bool {
        BITWISE_LOGIC_OPS.contains(self)
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv | BinaryOp::FRem
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    FPTrunc,
    FPExt,
    PtrToInt,
    BitCast,
}

impl CastOp {
    pub fn name(&self) -> &'static str {
        match self {
            CastOp::Trunc => "trunc",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::FPToUI => "fptoui",
            CastOp::FPToSI => "fptosi",
            CastOp::UIToFP => "uitofp",
            CastOp::SIToFP => "sitofp",
            CastOp::FPTrunc => "fptrunc",
            CastOp::FPExt => "fpext",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::BitCast => "bitcast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl IntPredicate {
    pub const ALL: [IntPredicate; 10] = [
        IntPredicate::Eq,
        IntPredicate::Ne,
        IntPredicate::Ugt,
        IntPredicate::Uge,
        IntPredicate::Ult,
        IntPredicate::Ule,
        IntPredicate::Sgt,
        IntPredicate::Sge,
        IntPredicate::Slt,
        IntPredicate::Sle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Ugt => "ugt",
            IntPredicate::Uge => "uge",
            IntPredicate::Ult => "ult",
            IntPredicate::Ule => "ule",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            IntPredicate::Ugt | IntPredicate::Uge | IntPredicate::Ult | IntPredicate::Ule
        )
    }

    /// Predicate that is true exactly when `self` is false
    pub fn inverse(&self) -> Self {
        match self {
            IntPredicate::Eq => IntPredicate::Ne,
            IntPredicate::Ne => IntPredicate::Eq,
            IntPredicate::Ugt => IntPredicate::Ule,
            IntPredicate::Uge => IntPredicate::Ult,
            IntPredicate::Ult => IntPredicate::Uge,
            IntPredicate::Ule => IntPredicate::Ugt,
            IntPredicate::Sgt => IntPredicate::Sle,
            IntPredicate::Sge => IntPredicate::Slt,
            IntPredicate::Slt => IntPredicate::Sge,
            IntPredicate::Sle => IntPredicate::Sgt,
        }
    }

    /// Predicate to use once the operands are exchanged
    pub fn swapped(&self) -> Self {
        match self {
            IntPredicate::Ugt => IntPredicate::Ult,
            IntPredicate::Uge => IntPredicate::Ule,
            IntPredicate::Ult => IntPredicate::Ugt,
            IntPredicate::Ule => IntPredicate::Uge,
            IntPredicate::Sgt => IntPredicate::Slt,
            IntPredicate::Sge => IntPredicate::Sle,
            IntPredicate::Slt => IntPredicate::Sgt,
            IntPredicate::Sle => IntPredicate::Sge,
            other => *other,
        }
    }
}

/// Float comparison predicates, in their 4-bit encoding order (unordered bit = 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatPredicate {
    False,
    Oeq,
    Ogt,
    Oge,
    Olt,
    Ole,
    One,
    Ord,
    Uno,
    Ueq,
    Ugt,
    Uge,
    Ult,
    Ule,
    Une,
    True,
}

impl FloatPredicate {
    pub const ALL: [FloatPredicate; 16] = [
        FloatPredicate::False,
        FloatPredicate::Oeq,
        FloatPredicate::Ogt,
        FloatPredicate::Oge,
        FloatPredicate::Olt,
        FloatPredicate::Ole,
        FloatPredicate::One,
        FloatPredicate::Ord,
        FloatPredicate::Uno,
        FloatPredicate::Ueq,
        FloatPredicate::Ugt,
        FloatPredicate::Uge,
        FloatPredicate::Ult,
        FloatPredicate::Ule,
        FloatPredicate::Une,
        FloatPredicate::True,
    ];

    fn code(&self) -> usize {
        *self as usize
    }

    fn from_code(code: usize) -> Self {
        Self::ALL[code & 0xf]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FloatPredicate::False => "false",
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::One => "one",
            FloatPredicate::Ord => "ord",
            FloatPredicate::Uno => "uno",
            FloatPredicate::Ueq => "ueq",
            FloatPredicate::Ugt => "ugt",
            FloatPredicate::Uge => "uge",
            FloatPredicate::Ult => "ult",
            FloatPredicate::Ule => "ule",
            FloatPredicate::Une => "une",
            FloatPredicate::True => "true",
        }
    }

    /// True for the predicates that hold when either operand is NaN (`uno` through `une`)
    pub fn is_unordered(&self) -> bool {
        (FloatPredicate::Uno.code()..=FloatPredicate::Une.code()).contains(&self.code())
    }

    /// Clears the unordered bit: `ult` becomes `olt`, `uno` becomes `false`
    pub fn ordered(&self) -> Self {
        Self::from_code(self.code() & FloatPredicate::Ord.code())
    }

    pub fn inverse(&self) -> Self {
        Self::from_code(!self.code())
    }

    pub fn swapped(&self) -> Self {
        match self {
            FloatPredicate::Ogt => FloatPredicate::Olt,
            FloatPredicate::Oge => FloatPredicate::Ole,
            FloatPredicate::Olt => FloatPredicate::Ogt,
            FloatPredicate::Ole => FloatPredicate::Oge,
            FloatPredicate::Ugt => FloatPredicate::Ult,
            FloatPredicate::Uge => FloatPredicate::Ule,
            FloatPredicate::Ult => FloatPredicate::Ugt,
            FloatPredicate::Ule => FloatPredicate::Uge,
            other => *other,
        }
    }
}

/// Intrinsics accepted in seed programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intrinsic {
    // Integer
    Abs,
    Ctlz,
    Cttz,
    Ctpop,
    Smax,
    Smin,
    Umax,
    Umin,
    Fshl,
    Fshr,
    Bitreverse,
    Bswap,

    // Saturating and overflow-checking arithmetic
    SaddSat,
    UaddSat,
    SsubSat,
    UsubSat,
    SshlSat,
    UshlSat,
    SaddWithOverflow,
    UaddWithOverflow,
    SsubWithOverflow,
    UsubWithOverflow,
    SmulWithOverflow,
    UmulWithOverflow,

    // Floating point
    Fabs,
    Copysign,
    IsFpclass,
    Fma,
    Fmuladd,
    Maximum,
    Minimum,
    Maximumnum,
    Minimumnum,
    Maxnum,
    Minnum,
    Canonicalize,

    // Markers
    Assume,
    LifetimeStart,
    LifetimeEnd,
    IsConstant,
}

impl Intrinsic {
    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Abs => "llvm.abs",
            Intrinsic::Ctlz => "llvm.ctlz",
            Intrinsic::Cttz => "llvm.cttz",
            Intrinsic::Ctpop => "llvm.ctpop",
            Intrinsic::Smax => "llvm.smax",
            Intrinsic::Smin => "llvm.smin",
            Intrinsic::Umax => "llvm.umax",
            Intrinsic::Umin => "llvm.umin",
            Intrinsic::Fshl => "llvm.fshl",
            Intrinsic::Fshr => "llvm.fshr",
            Intrinsic::Bitreverse => "llvm.bitreverse",
            Intrinsic::Bswap => "llvm.bswap",
            Intrinsic::SaddSat => "llvm.sadd.sat",
            Intrinsic::UaddSat => "llvm.uadd.sat",
            Intrinsic::SsubSat => "llvm.ssub.sat",
            Intrinsic::UsubSat => "llvm.usub.sat",
            Intrinsic::SshlSat => "llvm.sshl.sat",
            Intrinsic::UshlSat => "llvm.ushl.sat",
            Intrinsic::SaddWithOverflow => "llvm.sadd.with.overflow",
            Intrinsic::UaddWithOverflow => "llvm.uadd.with.overflow",
            Intrinsic::SsubWithOverflow => "llvm.ssub.with.overflow",
            Intrinsic::UsubWithOverflow => "llvm.usub.with.overflow",
            Intrinsic::SmulWithOverflow => "llvm.smul.with.overflow",
            Intrinsic::UmulWithOverflow => "llvm.umul.with.overflow",
            Intrinsic::Fabs => "llvm.fabs",
            Intrinsic::Copysign => "llvm.copysign",
            Intrinsic::IsFpclass => "llvm.is.fpclass",
            Intrinsic::Fma => "llvm.fma",
            Intrinsic::Fmuladd => "llvm.fmuladd",
            Intrinsic::Maximum => "llvm.maximum",
            Intrinsic::Minimum => "llvm.minimum",
            Intrinsic::Maximumnum => "llvm.maximumnum",
            Intrinsic::Minimumnum => "llvm.minimumnum",
            Intrinsic::Maxnum => "llvm.maxnum",
            Intrinsic::Minnum => "llvm.minnum",
            Intrinsic::Canonicalize => "llvm.canonicalize",
            Intrinsic::Assume => "llvm.assume",
            Intrinsic::LifetimeStart => "llvm.lifetime.start",
            Intrinsic::LifetimeEnd => "llvm.lifetime.end",
            Intrinsic::IsConstant => "llvm.is.constant",
        }
    }

    /// Returns true if the first two arguments can be exchanged freely
    pub fn is_commutative(&self) -> bool {
        matches!(
            self,
            Intrinsic::Smax
                | Intrinsic::Smin
                | Intrinsic::Umax
                | Intrinsic::Umin
                | Intrinsic::SaddSat
                | Intrinsic::UaddSat
                | Intrinsic::SaddWithOverflow
                | Intrinsic::UaddWithOverflow
                | Intrinsic::SmulWithOverflow
                | Intrinsic::UmulWithOverflow
                | Intrinsic::Maximum
                | Intrinsic::Minimum
                | Intrinsic::Maximumnum
                | Intrinsic::Minimumnum
                | Intrinsic::Maxnum
                | Intrinsic::Minnum
                | Intrinsic::Fma
                | Intrinsic::Fmuladd
        )
    }

    /// Intrinsics whose second argument is an i1 "result is poison on edge input" switch
    pub fn has_poison_flag_arg(&self) -> bool {
        matches!(self, Intrinsic::Abs | Intrinsic::Ctlz | Intrinsic::Cttz)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    Intrinsic(Intrinsic),
    Function(String),
}

impl Callee {
    pub fn as_intrinsic(&self) -> Option<Intrinsic> {
        match self {
            Callee::Intrinsic(id) => Some(*id),
            Callee::Function(_) => None,
        }
    }
}

/// Refinement flags an instruction can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Nuw,
    Nsw,
    Exact,
    Disjoint,
    NonNeg,
    SameSign,
    InBounds,
    Nusw,
    NoNaNs,
    NoInfs,
    NoSignedZeros,
}

impl Flag {
    pub const ALL: [Flag; 11] = [
        Flag::Nuw,
        Flag::Nsw,
        Flag::Exact,
        Flag::Disjoint,
        Flag::NonNeg,
        Flag::SameSign,
        Flag::InBounds,
        Flag::Nusw,
        Flag::NoNaNs,
        Flag::NoInfs,
        Flag::NoSignedZeros,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Flag::Nuw => "nuw",
            Flag::Nsw => "nsw",
            Flag::Exact => "exact",
            Flag::Disjoint => "disjoint",
            Flag::NonNeg => "nneg",
            Flag::SameSign => "samesign",
            Flag::InBounds => "inbounds",
            Flag::Nusw => "nusw",
            Flag::NoNaNs => "nnan",
            Flag::NoInfs => "ninf",
            Flag::NoSignedZeros => "nsz",
        }
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagSet(u16);

impl FlagSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(flags: &[Flag]) -> Self {
        let mut set = Self::empty();
        for flag in flags {
            set.insert(*flag);
        }
        set
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: Flag) {
        self.0 &= !flag.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(&self, other: &FlagSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

pub const OVERFLOW_FLAGS: &[Flag] = &[Flag::Nuw, Flag::Nsw];
pub const FP_MATH_FLAGS: &[Flag] = &[Flag::NoInfs, Flag::NoNaNs, Flag::NoSignedZeros];
pub const GEP_FLAGS: &[Flag] = &[Flag::InBounds, Flag::Nuw, Flag::Nusw];

/// Which refinement flags an operation category may carry
pub trait RefinementFlags {
    fn refinement_flags(&self) -> &'static [Flag];
}

impl RefinementFlags for BinaryOp {
    fn refinement_flags(&self) -> &'static [Flag] {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Shl => OVERFLOW_FLAGS,
            BinaryOp::UDiv | BinaryOp::SDiv | BinaryOp::LShr | BinaryOp::AShr => &[Flag::Exact],
            BinaryOp::Or => &[Flag::Disjoint],
            op if op.is_float() => FP_MATH_FLAGS,
            _ => &[],
        }
    }
}

impl RefinementFlags for CastOp {
    fn refinement_flags(&self) -> &'static [Flag] {
        match self {
            CastOp::Trunc => OVERFLOW_FLAGS,
            CastOp::ZExt | CastOp::UIToFP => &[Flag::NonNeg],
            CastOp::FPTrunc | CastOp::FPExt => FP_MATH_FLAGS,
            _ => &[],
        }
    }
}

/// Instruction categories. Operands live in the instruction's operand list;
/// successors and phi incoming blocks live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    /// `lhs op rhs`
    Binary(BinaryOp),
    FNeg,
    Cast(CastOp),
    ICmp(IntPredicate),
    FCmp(FloatPredicate),
    /// Operands: condition, true value, false value
    Select,
    /// Operand `i` flows in from `incoming[i]`
    Phi { incoming: Vec<Block> },
    Call { callee: Callee, ret_noundef: bool },
    /// Operand: address
    Load,
    /// Operands: stored value, address
    Store,
    /// Operands: base address, indices
    GetElementPtr { source_ty: crate::types::Type },
    ExtractValue { index: u32 },
    Br { dest: Block },
    /// Operand: condition
    CondBr { then_dest: Block, else_dest: Block },
    /// Operand: returned value, if any
    Ret,
    Unreachable,
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Br { .. } | InstKind::CondBr { .. } | InstKind::Ret | InstKind::Unreachable
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi { .. })
    }

    /// Refinement flags this instruction may carry given its result type
    pub fn refinement_flags(&self, result_ty: &crate::types::Type) -> &'static [Flag] {
        match self {
            InstKind::Binary(op) => op.refinement_flags(),
            InstKind::Cast(op) => op.refinement_flags(),
            InstKind::ICmp(_) => &[Flag::SameSign],
            InstKind::FNeg | InstKind::FCmp(_) => FP_MATH_FLAGS,
            InstKind::GetElementPtr { .. } => GEP_FLAGS,
            InstKind::Select | InstKind::Phi { .. } | InstKind::Call { .. }
                if result_ty.is_fp_or_fp_vector() =>
            {
                FP_MATH_FLAGS
            }
            _ => &[],
        }
    }

    /// Successor blocks named by a terminator
    pub fn successors(&self) -> Vec<Block> {
        match self {
            InstKind::Br { dest } => vec![*dest],
            InstKind::CondBr {
                then_dest,
                else_dest,
            } => vec![*then_dest, *else_dest],
            _ => Vec::new(),
        }
    }

    pub fn opcode_name(&self) -> &'static str {
        match self {
            InstKind::Binary(op) => op.name(),
            InstKind::FNeg => "fneg",
            InstKind::Cast(op) => op.name(),
            InstKind::ICmp(_) => "icmp",
            InstKind::FCmp(_) => "fcmp",
            InstKind::Select => "select",
            InstKind::Phi { .. } => "phi",
            InstKind::Call { .. } => "call",
            InstKind::Load => "load",
            InstKind::Store => "store",
            InstKind::GetElementPtr { .. } => "getelementptr",
            InstKind::ExtractValue { .. } => "extractvalue",
            InstKind::Br { .. } | InstKind::CondBr { .. } => "br",
            InstKind::Ret => "ret",
            InstKind::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode_name())
    }
}

/// A single instruction in a function's arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstData {
    pub kind: InstKind,
    pub flags: FlagSet,
    pub(crate) args: Vec<Value>,
    pub(crate) result: Option<Value>,
    pub(crate) block: Block,
}

impl InstData {
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, slot: usize) -> Option<Value> {
        self.args.get(slot).copied()
    }

    pub fn result(&self) -> Option<Value> {
        self.result
    }

    pub fn block(&self) -> Block {
        self.block
    }

    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }
}
