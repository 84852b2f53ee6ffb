//! AT&T-syntax x86-64 emission for L1 programs. The runtime library
//! provides `print`, `input`, `allocate`, and the error entry points;
//! emitted code calls them by name.

use std::io::{self, Write};

use ir::l1::{Callee, Cmp, Function, Inst, Mem, Program, Reg, Val};
use ir::l2::{Aop, Sop};
use util::id::base_name;

fn reg(r: Reg) -> String {
    format!("%{}", r.name())
}

fn reg8(r: Reg) -> String {
    format!("%{}", r.name8())
}

/// An instruction operand: numbers, label addresses, and function
/// addresses are immediates.
fn operand(v: &Val) -> String {
    match v {
        Val::Reg(r) => reg(*r),
        Val::Num(n) => format!("${}", n),
        Val::Label(l) => format!("$_{}", base_name(l)),
        Val::Func(f) => format!("$_{}", base_name(f)),
    }
}

fn mem(m: &Mem) -> String {
    format!("{}({})", m.offset, reg(m.base))
}

fn label(l: &str) -> String {
    format!("_{}", base_name(l))
}

fn aop(op: Aop) -> &'static str {
    match op {
        Aop::Add => "addq",
        Aop::Sub => "subq",
        Aop::Mul => "imulq",
        Aop::And => "andq",
    }
}

fn sop(op: Sop) -> &'static str {
    match op {
        Sop::Shl => "salq",
        Sop::Shr => "sarq",
    }
}

fn set_from_cmp(c: Cmp, flip: bool) -> &'static str {
    match c {
        Cmp::Lt => {
            if flip {
                "setg"
            } else {
                "setl"
            }
        }
        Cmp::Le => {
            if flip {
                "setge"
            } else {
                "setle"
            }
        }
        Cmp::Eq => "sete",
    }
}

fn jump_from_cmp(c: Cmp, flip: bool) -> &'static str {
    match c {
        Cmp::Lt => {
            if flip {
                "jg"
            } else {
                "jl"
            }
        }
        Cmp::Le => {
            if flip {
                "jge"
            } else {
                "jle"
            }
        }
        Cmp::Eq => "je",
    }
}

fn comp(lhs: i64, rhs: i64, c: Cmp) -> bool {
    match c {
        Cmp::Lt => lhs < rhs,
        Cmp::Le => lhs <= rhs,
        Cmp::Eq => lhs == rhs,
    }
}

/// Compare operand order for `cmpq`, with the flip applied when only
/// the left side is a constant (x86 immediates must come first).
fn cmp_operands<'a>(l: &'a Val, r: &'a Val) -> (bool, &'a Val, &'a Val) {
    let flip = matches!(l, Val::Num(_)) && !matches!(r, Val::Num(_));
    if flip {
        (true, l, r)
    } else {
        (false, r, l)
    }
}

struct CodeGen<'w, W: Write> {
    out: &'w mut W,
    frame_size: i64,
}

impl<'w, W: Write> CodeGen<'w, W> {
    fn program(&mut self, p: &Program) -> io::Result<()> {
        writeln!(self.out, ".text")?;
        writeln!(self.out, "  .globl go")?;
        writeln!(self.out, "go:")?;
        for r in ir::l2::CALLEE_SAVE {
            writeln!(self.out, "  pushq {}", reg(r))?;
        }
        writeln!(self.out, "  call {}", label(&p.entry_point_label))?;
        for r in ir::l2::CALLEE_SAVE.iter().rev() {
            writeln!(self.out, "  popq {}", reg(*r))?;
        }
        writeln!(self.out, "  retq")?;

        for f in &p.functions {
            self.function(f)?;
        }
        Ok(())
    }

    fn function(&mut self, f: &Function) -> io::Result<()> {
        writeln!(self.out, "{}:", label(&f.name))?;
        let locals_space = f.locals * 8;
        let stack_args_space = (f.arguments - 6).max(0) * 8;
        if locals_space != 0 {
            writeln!(self.out, "  subq ${}, %rsp", locals_space)?;
        }
        self.frame_size = locals_space + stack_args_space;
        for i in &f.insts {
            self.inst(i)?;
        }
        Ok(())
    }

    fn inst(&mut self, i: &Inst) -> io::Result<()> {
        match i {
            Inst::Assign(r, v) => writeln!(self.out, "  movq {}, {}", operand(v), reg(*r)),
            Inst::Load(r, m) => writeln!(self.out, "  movq {}, {}", mem(m), reg(*r)),
            Inst::Store(m, v) => writeln!(self.out, "  movq {}, {}", operand(v), mem(m)),
            Inst::Aop(r, op, v) => {
                writeln!(self.out, "  {} {}, {}", aop(*op), operand(v), reg(*r))
            }
            Inst::MemAop(m, op, v) => {
                writeln!(self.out, "  {} {}, {}", aop(*op), operand(v), mem(m))
            }
            Inst::AopMem(r, op, m) => {
                writeln!(self.out, "  {} {}, {}", aop(*op), mem(m), reg(*r))
            }
            Inst::Sop(r, op, v) => {
                let count = match v {
                    Val::Reg(c) => reg8(*c),
                    v => operand(v),
                };
                writeln!(self.out, "  {} {}, {}", sop(*op), count, reg(*r))
            }
            Inst::CmpAssign(d, l, c, r) => self.cmp_assign(*d, l, *c, r),
            Inst::Cjump(l, c, r, lbl) => self.cjump(l, *c, r, lbl),
            Inst::Label(l) => writeln!(self.out, "  {}:", label(l)),
            Inst::Goto(l) => writeln!(self.out, "  jmp {}", label(l)),
            Inst::Return => {
                if self.frame_size != 0 {
                    writeln!(self.out, "  addq ${}, %rsp", self.frame_size)?;
                }
                writeln!(self.out, "  retq")
            }
            Inst::Call(c, n) => self.call(c, *n),
            Inst::Inc(r) => writeln!(self.out, "  inc {}", reg(*r)),
            Inst::Dec(r) => writeln!(self.out, "  dec {}", reg(*r)),
            Inst::Lea(d, a, b, e) => {
                writeln!(self.out, "  lea ({}, {}, {}), {}", reg(*a), reg(*b), e, reg(*d))
            }
        }
    }

    fn cmp_assign(&mut self, d: Reg, l: &Val, c: Cmp, r: &Val) -> io::Result<()> {
        if let (Val::Num(a), Val::Num(b)) = (l, r) {
            let v = comp(*a, *b, c) as i64;
            return writeln!(self.out, "  movq ${}, {}", v, reg(d));
        }

        let (flip, left, right) = cmp_operands(l, r);
        writeln!(self.out, "  cmpq {}, {}", operand(left), operand(right))?;
        writeln!(self.out, "  {} {}", set_from_cmp(c, flip), reg8(d))?;
        writeln!(self.out, "  movzbq {}, {}", reg8(d), reg(d))
    }

    fn cjump(&mut self, l: &Val, c: Cmp, r: &Val, lbl: &str) -> io::Result<()> {
        if let (Val::Num(a), Val::Num(b)) = (l, r) {
            if comp(*a, *b, c) {
                writeln!(self.out, "  jmp {}", label(lbl))?;
            }
            return Ok(());
        }

        let (flip, left, right) = cmp_operands(l, r);
        writeln!(self.out, "  cmpq {}, {}", operand(left), operand(right))?;
        writeln!(self.out, "  {} {}", jump_from_cmp(c, flip), label(lbl))
    }

    fn call(&mut self, c: &Callee, n: i64) -> io::Result<()> {
        match c {
            Callee::Func(f) => {
                let space = if n >= 6 { (n - 6) * 8 + 8 } else { 8 };
                writeln!(self.out, "  subq ${}, %rsp", space)?;
                writeln!(self.out, "  jmp {}", label(f))
            }
            Callee::Indirect(r) => {
                let space = if n >= 6 { (n - 6) * 8 + 8 } else { 8 };
                writeln!(self.out, "  subq ${}, %rsp", space)?;
                writeln!(self.out, "  jmp *{}", reg(*r))
            }
            Callee::Print => writeln!(self.out, "  call print"),
            Callee::Input => writeln!(self.out, "  call input"),
            Callee::Allocate => writeln!(self.out, "  call allocate"),
            Callee::TupleError => writeln!(self.out, "  call tuple_error"),
            Callee::TensorError => match n {
                1 => writeln!(self.out, "  call array_tensor_error_null"),
                3 => writeln!(self.out, "  call array_error"),
                4 => writeln!(self.out, "  call tensor_error"),
                _ => panic!("tensor-error takes 1, 3, or 4 arguments, got {}", n),
            },
        }
    }
}

pub fn write_program<W: Write>(out: &mut W, p: &Program) -> io::Result<()> {
    let mut gen = CodeGen { out, frame_size: 0 };
    gen.program(p)
}

pub fn program_string(p: &Program) -> String {
    let mut buf = Vec::new();
    write_program(&mut buf, p).unwrap();
    String::from_utf8(buf).unwrap()
}
