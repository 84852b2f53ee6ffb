use std::fmt;

use util::{Id, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    And,
    Shl,
    Shr,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::And => "&",
            Op::Shl => "<<",
            Op::Shr => ">>",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Eq => "=",
            Cmp::Ge => ">=",
            Cmp::Gt => ">",
        };
        write!(f, "{}", s)
    }
}

/// A leaf operand. Names keep their sigil (`%v`, `:lbl`, `@f`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Num(i64),
    Var(Id),
    Label(Id),
    Func(Id),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Item::Num(n) => write!(f, "{}", n),
            Item::Var(x) | Item::Label(x) | Item::Func(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callee {
    Func(Id),
    Var(Id),
    Print,
    Input,
    Allocate,
    TupleError,
    TensorError,
}

impl Callee {
    /// The runtime error calls never return to the caller.
    pub fn is_terminating(&self) -> bool {
        matches!(self, Callee::TupleError | Callee::TensorError)
    }
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Callee::Func(x) | Callee::Var(x) => write!(f, "{}", x),
            Callee::Print => write!(f, "print"),
            Callee::Input => write!(f, "input"),
            Callee::Allocate => write!(f, "allocate"),
            Callee::TupleError => write!(f, "tuple-error"),
            Callee::TensorError => write!(f, "tensor-error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// `%v <- s`
    Assign(Id, Item),
    /// `%v <- t op t`
    Op(Id, Item, Op, Item),
    /// `%v <- t cmp t`
    Cmp(Id, Item, Cmp, Item),
    /// `%v <- load %u`
    Load(Id, Id),
    /// `store %v <- s`
    Store(Id, Item),
    Return,
    /// `return t`
    ReturnValue(Item),
    /// `:l`
    Label(Id),
    /// `br :l`
    Goto(Id),
    /// `br t :l`
    Branch(Item, Id),
    /// `call callee(args)`
    Call(Callee, Vec<Item>),
    /// `%v <- call callee(args)`
    CallAssign(Id, Callee, Vec<Item>),
}

pub type Inst = Spanned<InstKind>;

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use InstKind::*;
        match self {
            Assign(d, s) => write!(f, "{} <- {}", d, s),
            Op(d, l, op, r) => write!(f, "{} <- {} {} {}", d, l, op, r),
            Cmp(d, l, c, r) => write!(f, "{} <- {} {} {}", d, l, c, r),
            Load(d, s) => write!(f, "{} <- load {}", d, s),
            Store(d, s) => write!(f, "store {} <- {}", d, s),
            Return => write!(f, "return"),
            ReturnValue(t) => write!(f, "return {}", t),
            Label(l) => write!(f, "{}", l),
            Goto(l) => write!(f, "br {}", l),
            Branch(t, l) => write!(f, "br {} {}", t, l),
            Call(c, args) => {
                write!(f, "call {}", c)?;
                util::format_vec(f, args, "(", ", ", ")")
            }
            CallAssign(d, c, args) => {
                write!(f, "{} <- call {}", d, c)?;
                util::format_vec(f, args, "(", ", ", ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// `@`-prefixed function name.
    pub name: Id,
    /// `%`-prefixed parameter names, in declaration order.
    pub params: Vec<Id>,
    pub body: Vec<Inst>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "define {}", self.name)?;
        util::format_vec(f, &self.params, "(", ", ", ")")?;
        write!(f, " {{\n")?;
        for i in &self.body {
            write!(f, "  {}\n", i)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
