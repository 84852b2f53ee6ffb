use crate::context::{Context, Node};
use crate::tree::{Leaf, Tree};
use ir::l2::{self, Mem, Reg, Val, W, ARG_REGISTERS};
use ir::l3::{self, InstKind, Item};
use util::{Id, Map};

/// Emits L2 instructions, minting fresh temporaries and globally
/// unique labels. One emitter serves a whole program so that label
/// numbering never collides across functions.
pub struct Emitter {
    insts: Vec<l2::Inst>,
    temp_counter: usize,
    label_counter: usize,
    label_prefix: String,
    label_map: Map<(Id, Id), Id>,
}

impl Emitter {
    pub fn new(label_prefix: String) -> Self {
        Self {
            insts: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            label_prefix,
            label_map: Map::default(),
        }
    }

    fn line(&mut self, inst: l2::Inst) {
        self.insts.push(inst);
    }

    fn fresh_temp(&mut self) -> Id {
        let t = format!("%__tmp{}", self.temp_counter);
        self.temp_counter += 1;
        t
    }

    fn fresh_label(&mut self) -> Id {
        let l = format!("{}{}", self.label_prefix, self.label_counter);
        self.label_counter += 1;
        l
    }

    /// The globalized form of a function-local label. The first use of
    /// a (function, label) pair mints the name; later uses agree.
    fn global_label(&mut self, func: &Id, local: &Id) -> Id {
        let key = (func.clone(), local.clone());
        if let Some(g) = self.label_map.get(&key) {
            return g.clone();
        }
        let g = self.fresh_label();
        self.label_map.insert(key, g.clone());
        g
    }

    fn take_insts(&mut self) -> Vec<l2::Inst> {
        std::mem::take(&mut self.insts)
    }
}

/// Label names are reused across functions, so emitted labels are
/// rewritten to `PREFIX_N`. Deriving the prefix from the longest label
/// in the program guarantees no collision with user-written labels.
pub fn label_prefix(p: &l3::Program) -> String {
    fn consider<'a>(longest: &mut &'a str, l: &'a str) {
        if l.len() > longest.len() {
            *longest = l;
        }
    }
    fn consider_item<'a>(longest: &mut &'a str, item: &'a Item) {
        if let Item::Label(l) = item {
            consider(longest, l);
        }
    }

    let mut longest: &str = "";
    for f in &p.functions {
        for inst in &f.body {
            match &inst.item {
                InstKind::Label(l) | InstKind::Goto(l) | InstKind::Branch(_, l) => {
                    consider(&mut longest, l)
                }
                InstKind::Assign(_, s) | InstKind::Store(_, s) => consider_item(&mut longest, s),
                InstKind::ReturnValue(t) => consider_item(&mut longest, t),
                InstKind::Call(_, args) | InstKind::CallAssign(_, _, args) => {
                    for a in args {
                        consider_item(&mut longest, a);
                    }
                }
                _ => {}
            }
        }
    }

    if longest.is_empty() {
        ":L_global_".to_string()
    } else {
        format!("{}_global_", longest)
    }
}

/// Tiles one function's contexts into an L2 function, prefixed with
/// the materialization of its parameters out of the calling convention.
pub fn tile_function(em: &mut Emitter, f: &l3::Function, contexts: &[Context]) -> l2::Function {
    let n = f.params.len();
    for (i, p) in f.params.iter().enumerate() {
        if i < 6 {
            em.line(l2::Inst::Assign(
                W::Var(p.clone()),
                Val::Reg(ARG_REGISTERS[i]),
            ));
        } else {
            em.line(l2::Inst::StackArg(
                W::Var(p.clone()),
                8 * (n - 1 - i) as i64,
            ));
        }
    }

    for ctx in contexts {
        for node in &ctx.nodes {
            match node {
                Node::Label(l) => {
                    let g = em.global_label(&f.name, l);
                    em.line(l2::Inst::Label(g));
                }
                Node::Call { callee, args } => lower_call(em, &f.name, callee, args, None),
                Node::CallAssign { dst, callee, args } => {
                    lower_call(em, &f.name, callee, args, Some(dst))
                }
                Node::Tree { tree, .. } => tile_tree(em, &f.name, tree),
            }
        }
    }

    l2::Function {
        name: f.name.clone(),
        arguments: f.params.len() as i64,
        insts: em.take_insts(),
    }
}

fn tile_tree(em: &mut Emitter, func: &Id, t: &Tree) {
    match t {
        Tree::Assign(dst, rhs) => {
            let d = leaf_w(dst);
            match rhs.as_ref() {
                Tree::Leaf(leaf) => {
                    let s = leaf_val(em, func, leaf);
                    em.line(l2::Inst::Assign(d, s));
                }
                Tree::BinOp(op, l, r) => tile_binop(em, func, d, *op, l, r),
                Tree::Cmp(c, l, r) => {
                    let lv = lower_expr(em, func, l);
                    let rv = lower_expr(em, func, r);
                    let (a, c2, b) = normalize_cmp(*c, lv, rv);
                    em.line(l2::Inst::CmpAssign(d, a, c2, b));
                }
                other => {
                    let v = lower_expr(em, func, other);
                    em.line(l2::Inst::Assign(d, v));
                }
            }
        }
        Tree::Load(dst, addr) => {
            let d = leaf_w(dst);
            let base = lower_to_w(em, func, addr);
            em.line(l2::Inst::Load(d, Mem::new(base, 0)));
        }
        Tree::Store(addr, src) => {
            let base = lower_to_w(em, func, addr);
            let v = lower_expr(em, func, src);
            em.line(l2::Inst::Store(Mem::new(base, 0), v));
        }
        Tree::Return(None) => em.line(l2::Inst::Return),
        Tree::Return(Some(e)) => {
            let v = lower_expr(em, func, e);
            em.line(l2::Inst::Assign(W::Reg(Reg::Rax), v));
            em.line(l2::Inst::Return);
        }
        Tree::Break(lbl, None) => {
            let g = em.global_label(func, leaf_label(lbl));
            em.line(l2::Inst::Goto(g));
        }
        Tree::Break(lbl, Some(cond)) => {
            let c = lower_expr(em, func, cond);
            let g = em.global_label(func, leaf_label(lbl));
            em.line(l2::Inst::Cjump(c, l2::Cmp::Eq, Val::Num(1), g));
        }
        Tree::Leaf(_) | Tree::BinOp(..) | Tree::Cmp(..) => {
            panic!("no tile matches tree at statement position: {:?}", t)
        }
    }
}

/// `dst <- lhs; dst op= rhs`, except when dst aliases one of the
/// operands: `dst = lhs` skips the move, `dst = rhs` detours through a
/// fresh temporary so the first move cannot clobber it.
fn tile_binop(em: &mut Emitter, func: &Id, d: W, op: l3::Op, l: &Tree, r: &Tree) {
    let lv = lower_expr(em, func, l);
    let rv = lower_expr(em, func, r);
    let dv: Val = d.clone().into();

    if lv == dv {
        emit_op(em, d, op, rv);
    } else if rv == dv {
        let tmp = em.fresh_temp();
        em.line(l2::Inst::Assign(W::Var(tmp.clone()), rv));
        em.line(l2::Inst::Assign(d.clone(), lv));
        emit_op(em, d, op, Val::Var(tmp));
    } else {
        em.line(l2::Inst::Assign(d.clone(), lv));
        emit_op(em, d, op, rv);
    }
}

fn emit_op(em: &mut Emitter, d: W, op: l3::Op, t: Val) {
    let inst = match op {
        l3::Op::Add => l2::Inst::Aop(d, l2::Aop::Add, t),
        l3::Op::Sub => l2::Inst::Aop(d, l2::Aop::Sub, t),
        l3::Op::Mul => l2::Inst::Aop(d, l2::Aop::Mul, t),
        l3::Op::And => l2::Inst::Aop(d, l2::Aop::And, t),
        l3::Op::Shl => l2::Inst::Sop(d, l2::Sop::Shl, t),
        l3::Op::Shr => l2::Inst::Sop(d, l2::Sop::Shr, t),
    };
    em.line(inst);
}

/// L2 has no `>` or `>=`; rewrite by swapping the operands.
fn normalize_cmp(c: l3::Cmp, lv: Val, rv: Val) -> (Val, l2::Cmp, Val) {
    match c {
        l3::Cmp::Lt => (lv, l2::Cmp::Lt, rv),
        l3::Cmp::Le => (lv, l2::Cmp::Le, rv),
        l3::Cmp::Eq => (lv, l2::Cmp::Eq, rv),
        l3::Cmp::Gt => (rv, l2::Cmp::Lt, lv),
        l3::Cmp::Ge => (rv, l2::Cmp::Le, lv),
    }
}

/// Reduces an expression tree to a value, emitting code for interior
/// nodes into fresh temporaries.
fn lower_expr(em: &mut Emitter, func: &Id, t: &Tree) -> Val {
    match t {
        Tree::Leaf(leaf) => leaf_val(em, func, leaf),
        Tree::BinOp(op, l, r) => {
            let lv = lower_expr(em, func, l);
            let rv = lower_expr(em, func, r);
            let tmp = em.fresh_temp();
            em.line(l2::Inst::Assign(W::Var(tmp.clone()), lv));
            emit_op(em, W::Var(tmp.clone()), *op, rv);
            Val::Var(tmp)
        }
        Tree::Cmp(c, l, r) => {
            let lv = lower_expr(em, func, l);
            let rv = lower_expr(em, func, r);
            let (a, c2, b) = normalize_cmp(*c, lv, rv);
            let tmp = em.fresh_temp();
            em.line(l2::Inst::CmpAssign(W::Var(tmp.clone()), a, c2, b));
            Val::Var(tmp)
        }
        Tree::Load(_, addr) => {
            let base = lower_to_w(em, func, addr);
            let tmp = em.fresh_temp();
            em.line(l2::Inst::Load(W::Var(tmp.clone()), Mem::new(base, 0)));
            Val::Var(tmp)
        }
        Tree::Assign(..) | Tree::Store(..) | Tree::Return(_) | Tree::Break(..) => {
            panic!("no tile matches tree at expression position: {:?}", t)
        }
    }
}

/// Like `lower_expr` but guarantees a register-or-variable result, as
/// required by memory operand bases.
fn lower_to_w(em: &mut Emitter, func: &Id, t: &Tree) -> W {
    match lower_expr(em, func, t) {
        Val::Var(v) => W::Var(v),
        Val::Reg(r) => W::Reg(r),
        v => {
            let tmp = em.fresh_temp();
            em.line(l2::Inst::Assign(W::Var(tmp.clone()), v));
            W::Var(tmp)
        }
    }
}

fn leaf_w(t: &Tree) -> W {
    match t {
        Tree::Leaf(Leaf::Var(v)) => W::Var(v.clone()),
        _ => panic!("destination is not a variable leaf: {:?}", t),
    }
}

fn leaf_label(t: &Tree) -> &Id {
    match t {
        Tree::Leaf(Leaf::Label(l)) => l,
        _ => panic!("branch target is not a label leaf: {:?}", t),
    }
}

fn leaf_val(em: &mut Emitter, func: &Id, leaf: &Leaf) -> Val {
    match leaf {
        Leaf::Num(n) => Val::Num(*n),
        Leaf::Var(v) => Val::Var(v.clone()),
        Leaf::Func(f) => Val::Func(f.clone()),
        Leaf::Label(l) => Val::Label(em.global_label(func, l)),
    }
}

fn item_val(em: &mut Emitter, func: &Id, item: &Item) -> Val {
    match item {
        Item::Num(n) => Val::Num(*n),
        Item::Var(v) => Val::Var(v.clone()),
        Item::Func(f) => Val::Func(f.clone()),
        Item::Label(l) => Val::Label(em.global_label(func, l)),
    }
}

/// Lowers a call node. The first six arguments ride in registers, the
/// rest go below the return-address slot. A call to L3 code brackets
/// the call with a freshly minted return label; runtime calls need
/// neither the label nor the return-address store.
fn lower_call(
    em: &mut Emitter,
    func: &Id,
    callee: &l3::Callee,
    args: &[Item],
    dst: Option<&Id>,
) {
    for (i, a) in args.iter().enumerate() {
        let v = item_val(em, func, a);
        if i < 6 {
            em.line(l2::Inst::Assign(W::Reg(ARG_REGISTERS[i]), v));
        } else {
            let offset = -(16 + 8 * (i as i64 - 6));
            em.line(l2::Inst::Store(Mem::rsp(offset), v));
        }
    }

    let n = args.len() as i64;
    match callee {
        l3::Callee::Func(f) => {
            let ret = em.fresh_label();
            em.line(l2::Inst::Store(Mem::rsp(-8), Val::Label(ret.clone())));
            em.line(l2::Inst::Call(l2::Callee::Func(f.clone()), n));
            em.line(l2::Inst::Label(ret));
        }
        l3::Callee::Var(v) => {
            let ret = em.fresh_label();
            em.line(l2::Inst::Store(Mem::rsp(-8), Val::Label(ret.clone())));
            em.line(l2::Inst::Call(l2::Callee::Indirect(W::Var(v.clone())), n));
            em.line(l2::Inst::Label(ret));
        }
        l3::Callee::Print => em.line(l2::Inst::Call(l2::Callee::Print, n)),
        l3::Callee::Input => em.line(l2::Inst::Call(l2::Callee::Input, n)),
        l3::Callee::Allocate => em.line(l2::Inst::Call(l2::Callee::Allocate, n)),
        l3::Callee::TupleError => em.line(l2::Inst::Call(l2::Callee::TupleError, n)),
        l3::Callee::TensorError => em.line(l2::Inst::Call(l2::Callee::TensorError, n)),
    }

    if let Some(d) = dst {
        em.line(l2::Inst::Assign(W::Var(d.clone()), Val::Reg(Reg::Rax)));
    }
}
