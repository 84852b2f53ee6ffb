use std::fmt;

use util::Id;

/// The sixteen x86-64 general-purpose registers. `rsp` is reserved for
/// the stack and never participates in liveness or coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rdi,
    Rsi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl Reg {
    pub const fn name(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rbx => "rbx",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rdi => "rdi",
            Reg::Rsi => "rsi",
            Reg::Rbp => "rbp",
            Reg::Rsp => "rsp",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::R13 => "r13",
            Reg::R14 => "r14",
            Reg::R15 => "r15",
        }
    }

    /// The low byte of the register, as used by `setCC` and shifts.
    pub const fn name8(self) -> &'static str {
        match self {
            Reg::Rax => "al",
            Reg::Rbx => "bl",
            Reg::Rcx => "cl",
            Reg::Rdx => "dl",
            Reg::Rdi => "dil",
            Reg::Rsi => "sil",
            Reg::Rbp => "bpl",
            Reg::Rsp => "spl",
            Reg::R8 => "r8b",
            Reg::R9 => "r9b",
            Reg::R10 => "r10b",
            Reg::R11 => "r11b",
            Reg::R12 => "r12b",
            Reg::R13 => "r13b",
            Reg::R14 => "r14b",
            Reg::R15 => "r15b",
        }
    }

    pub fn from_name(name: &str) -> Option<Reg> {
        let r = match name {
            "rax" => Reg::Rax,
            "rbx" => Reg::Rbx,
            "rcx" => Reg::Rcx,
            "rdx" => Reg::Rdx,
            "rdi" => Reg::Rdi,
            "rsi" => Reg::Rsi,
            "rbp" => Reg::Rbp,
            "rsp" => Reg::Rsp,
            "r8" => Reg::R8,
            "r9" => Reg::R9,
            "r10" => Reg::R10,
            "r11" => Reg::R11,
            "r12" => Reg::R12,
            "r13" => Reg::R13,
            "r14" => Reg::R14,
            "r15" => Reg::R15,
            _ => return None,
        };
        Some(r)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Argument registers, in argument order.
pub static ARG_REGISTERS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

/// Clobbered by every call.
pub static CALLER_SAVE: [Reg; 9] = [
    Reg::R10,
    Reg::R11,
    Reg::R8,
    Reg::R9,
    Reg::Rax,
    Reg::Rcx,
    Reg::Rdi,
    Reg::Rdx,
    Reg::Rsi,
];

/// Expected intact by every caller on return.
pub static CALLEE_SAVE: [Reg; 6] = [Reg::Rbx, Reg::Rbp, Reg::R12, Reg::R13, Reg::R14, Reg::R15];

/// A writable operand: a register or a symbolic variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum W {
    Reg(Reg),
    Var(Id),
}

impl fmt::Display for W {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            W::Reg(r) => write!(f, "{}", r),
            W::Var(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Val {
    Reg(Reg),
    Var(Id),
    Num(i64),
    Label(Id),
    Func(Id),
}

impl From<W> for Val {
    fn from(w: W) -> Val {
        match w {
            W::Reg(r) => Val::Reg(r),
            W::Var(x) => Val::Var(x),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Val::Reg(r) => write!(f, "{}", r),
            Val::Var(x) | Val::Label(x) | Val::Func(x) => write!(f, "{}", x),
            Val::Num(n) => write!(f, "{}", n),
        }
    }
}

/// `mem base offset`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mem {
    pub base: W,
    pub offset: i64,
}

impl Mem {
    pub fn new(base: W, offset: i64) -> Self {
        Self { base, offset }
    }

    pub fn rsp(offset: i64) -> Self {
        Self::new(W::Reg(Reg::Rsp), offset)
    }
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "mem {} {}", self.base, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aop {
    Add,
    Sub,
    Mul,
    And,
}

impl fmt::Display for Aop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Aop::Add => "+=",
            Aop::Sub => "-=",
            Aop::Mul => "*=",
            Aop::And => "&=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sop {
    Shl,
    Shr,
}

impl fmt::Display for Sop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Sop::Shl => "<<=",
            Sop::Shr => ">>=",
        };
        write!(f, "{}", s)
    }
}

/// L2 has no `>` or `>=`; the tiler swaps operands instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Lt,
    Le,
    Eq,
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Eq => "=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callee {
    Func(Id),
    Indirect(W),
    Print,
    Input,
    Allocate,
    TupleError,
    TensorError,
}

impl Callee {
    pub fn is_terminating(&self) -> bool {
        matches!(self, Callee::TupleError | Callee::TensorError)
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callee::Func(x) => write!(f, "{}", x),
            Callee::Indirect(w) => write!(f, "{}", w),
            Callee::Print => write!(f, "print"),
            Callee::Input => write!(f, "input"),
            Callee::Allocate => write!(f, "allocate"),
            Callee::TupleError => write!(f, "tuple-error"),
            Callee::TensorError => write!(f, "tensor-error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// `w <- s`
    Assign(W, Val),
    /// `w <- mem x M`
    Load(W, Mem),
    /// `mem x M <- s`
    Store(Mem, Val),
    /// `w <- stack-arg M`; resolved against the frame once its size is known.
    StackArg(W, i64),
    /// `w aop t`
    Aop(W, Aop, Val),
    /// `mem x M aop t`
    MemAop(Mem, Aop, Val),
    /// `w aop mem x M`
    AopMem(W, Aop, Mem),
    /// `w sop sx|N`; a variable count must end up in `rcx`.
    Sop(W, Sop, Val),
    /// `w <- t cmp t`
    CmpAssign(W, Val, Cmp, Val),
    /// `cjump t cmp t :l`
    Cjump(Val, Cmp, Val, Id),
    Label(Id),
    Goto(Id),
    Return,
    /// `call callee N`
    Call(Callee, i64),
    Inc(W),
    Dec(W),
    /// `w @ w w E`
    Lea(W, W, W, i64),
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Inst::*;
        match self {
            Assign(w, s) => write!(f, "{} <- {}", w, s),
            Load(w, m) => write!(f, "{} <- {}", w, m),
            Store(m, s) => write!(f, "{} <- {}", m, s),
            StackArg(w, n) => write!(f, "{} <- stack-arg {}", w, n),
            Aop(w, op, t) => write!(f, "{} {} {}", w, op, t),
            MemAop(m, op, t) => write!(f, "{} {} {}", m, op, t),
            AopMem(w, op, m) => write!(f, "{} {} {}", w, op, m),
            Sop(w, op, t) => write!(f, "{} {} {}", w, op, t),
            CmpAssign(w, l, c, r) => write!(f, "{} <- {} {} {}", w, l, c, r),
            Cjump(l, c, r, lbl) => write!(f, "cjump {} {} {} {}", l, c, r, lbl),
            Label(l) => write!(f, "{}", l),
            Goto(l) => write!(f, "goto {}", l),
            Return => write!(f, "return"),
            Call(c, n) => write!(f, "call {} {}", c, n),
            Inc(w) => write!(f, "{}++", w),
            Dec(w) => write!(f, "{}--", w),
            Lea(d, a, b, e) => write!(f, "{} @ {} {} {}", d, a, b, e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// `@`-prefixed function name.
    pub name: Id,
    pub arguments: i64,
    pub insts: Vec<Inst>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "  ({}\n    {}\n", self.name, self.arguments)?;
        for i in &self.insts {
            write!(f, "    {}\n", i)?;
        }
        write!(f, "  )")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(\n")?;
        for func in &self.functions {
            write!(f, "{}\n", func)?;
        }
        write!(f, ")")
    }
}
