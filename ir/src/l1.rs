use std::fmt;

use util::Id;

pub use crate::l2::{Aop, Cmp, Reg, Sop};

/// L1 mirrors L2 with every variable resolved to a register and no
/// unresolved stack-argument slots remaining.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Val {
    Reg(Reg),
    Num(i64),
    Label(Id),
    Func(Id),
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Val::Reg(r) => write!(f, "{}", r),
            Val::Num(n) => write!(f, "{}", n),
            Val::Label(x) | Val::Func(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mem {
    pub base: Reg,
    pub offset: i64,
}

impl Mem {
    pub fn new(base: Reg, offset: i64) -> Self {
        Self { base, offset }
    }
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "mem {} {}", self.base, self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callee {
    Func(Id),
    Indirect(Reg),
    Print,
    Input,
    Allocate,
    TupleError,
    TensorError,
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callee::Func(x) => write!(f, "{}", x),
            Callee::Indirect(r) => write!(f, "{}", r),
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
    Assign(Reg, Val),
    Load(Reg, Mem),
    Store(Mem, Val),
    Aop(Reg, Aop, Val),
    MemAop(Mem, Aop, Val),
    AopMem(Reg, Aop, Mem),
    Sop(Reg, Sop, Val),
    CmpAssign(Reg, Val, Cmp, Val),
    Cjump(Val, Cmp, Val, Id),
    Label(Id),
    Goto(Id),
    Return,
    Call(Callee, i64),
    Inc(Reg),
    Dec(Reg),
    Lea(Reg, Reg, Reg, i64),
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Inst::*;
        match self {
            Assign(r, s) => write!(f, "{} <- {}", r, s),
            Load(r, m) => write!(f, "{} <- {}", r, m),
            Store(m, s) => write!(f, "{} <- {}", m, s),
            Aop(r, op, t) => write!(f, "{} {} {}", r, op, t),
            MemAop(m, op, t) => write!(f, "{} {} {}", m, op, t),
            AopMem(r, op, m) => write!(f, "{} {} {}", r, op, m),
            Sop(r, op, t) => write!(f, "{} {} {}", r, op, t),
            CmpAssign(r, l, c, rr) => write!(f, "{} <- {} {} {}", r, l, c, rr),
            Cjump(l, c, r, lbl) => write!(f, "cjump {} {} {} {}", l, c, r, lbl),
            Label(l) => write!(f, "{}", l),
            Goto(l) => write!(f, "goto {}", l),
            Return => write!(f, "return"),
            Call(c, n) => write!(f, "call {} {}", c, n),
            Inc(r) => write!(f, "{}++", r),
            Dec(r) => write!(f, "{}--", r),
            Lea(d, a, b, e) => write!(f, "{} @ {} {} {}", d, a, b, e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Id,
    pub arguments: i64,
    /// Spill slots allocated by register allocation; sizes the frame.
    pub locals: i64,
    pub insts: Vec<Inst>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "  ({}\n    {} {}\n", self.name, self.arguments, self.locals)?;
        for i in &self.insts {
            write!(f, "    {}\n", i)?;
        }
        write!(f, "  )")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub entry_point_label: Id,
    pub functions: Vec<Function>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}\n", self.entry_point_label)?;
        for func in &self.functions {
            write!(f, "{}\n", func)?;
        }
        write!(f, ")")
    }
}
