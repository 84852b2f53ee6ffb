use ir::l2::{Callee, Function, Inst, Mem, Reg, Val, W, ARG_REGISTERS, CALLEE_SAVE, CALLER_SAVE};
use util::{Id, Map, Set};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LivenessSets {
    pub gen: Set<Id>,
    pub kill: Set<Id>,
    pub live_in: Set<Id>,
    pub live_out: Set<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    Zero,
    One(usize),
    Two(usize, usize),
}

/// The liveness name of a writable operand; `rsp` never participates.
fn name_of_w(w: &W) -> Option<Id> {
    match w {
        W::Reg(Reg::Rsp) => None,
        W::Reg(r) => Some(r.name().to_string()),
        W::Var(v) => Some(v.clone()),
    }
}

fn name_of_val(v: &Val) -> Option<Id> {
    match v {
        Val::Reg(Reg::Rsp) => None,
        Val::Reg(r) => Some(r.name().to_string()),
        Val::Var(x) => Some(x.clone()),
        Val::Num(_) | Val::Label(_) | Val::Func(_) => None,
    }
}

fn insert_w(set: &mut Set<Id>, w: &W) {
    if let Some(n) = name_of_w(w) {
        set.insert(n);
    }
}

fn insert_val(set: &mut Set<Id>, v: &Val) {
    if let Some(n) = name_of_val(v) {
        set.insert(n);
    }
}

fn insert_mem_base(set: &mut Set<Id>, m: &Mem) {
    insert_w(set, &m.base);
}

fn gen_kill(inst: &Inst) -> LivenessSets {
    let mut ls = LivenessSets::default();
    match inst {
        Inst::Assign(w, s) => {
            insert_w(&mut ls.kill, w);
            insert_val(&mut ls.gen, s);
        }
        Inst::Load(w, m) => {
            insert_w(&mut ls.kill, w);
            insert_mem_base(&mut ls.gen, m);
        }
        // a write through memory GENs the base, it kills nothing
        Inst::Store(m, s) => {
            insert_mem_base(&mut ls.gen, m);
            insert_val(&mut ls.gen, s);
        }
        Inst::StackArg(w, _) => {
            insert_w(&mut ls.kill, w);
        }
        Inst::Aop(w, _, t) | Inst::Sop(w, _, t) => {
            insert_w(&mut ls.gen, w);
            insert_w(&mut ls.kill, w);
            insert_val(&mut ls.gen, t);
        }
        Inst::MemAop(m, _, t) => {
            insert_mem_base(&mut ls.gen, m);
            insert_val(&mut ls.gen, t);
        }
        Inst::AopMem(w, _, m) => {
            insert_w(&mut ls.gen, w);
            insert_w(&mut ls.kill, w);
            insert_mem_base(&mut ls.gen, m);
        }
        Inst::CmpAssign(w, l, _, r) => {
            insert_w(&mut ls.kill, w);
            insert_val(&mut ls.gen, l);
            insert_val(&mut ls.gen, r);
        }
        Inst::Cjump(l, _, r, _) => {
            insert_val(&mut ls.gen, l);
            insert_val(&mut ls.gen, r);
        }
        Inst::Label(_) | Inst::Goto(_) => {}
        Inst::Return => {
            ls.gen.insert(Reg::Rax.name().to_string());
            for r in CALLEE_SAVE {
                ls.gen.insert(r.name().to_string());
            }
        }
        Inst::Call(callee, n_args) => {
            for r in CALLER_SAVE {
                ls.kill.insert(r.name().to_string());
            }
            for r in ARG_REGISTERS.iter().take((*n_args).min(6).max(0) as usize) {
                ls.gen.insert(r.name().to_string());
            }
            if let Callee::Indirect(w) = callee {
                insert_w(&mut ls.gen, w);
            }
        }
        Inst::Inc(w) | Inst::Dec(w) => {
            insert_w(&mut ls.gen, w);
            insert_w(&mut ls.kill, w);
        }
        Inst::Lea(d, a, b, _) => {
            insert_w(&mut ls.kill, d);
            insert_w(&mut ls.gen, a);
            insert_w(&mut ls.gen, b);
        }
    }
    ls
}

fn build_successors(f: &Function) -> Vec<Follow> {
    let mut labels: Map<&Id, usize> = Map::default();
    for (idx, inst) in f.insts.iter().enumerate() {
        if let Inst::Label(l) = inst {
            labels.insert(l, idx);
        }
    }

    let n = f.insts.len();
    let target = |l: &Id| {
        *labels
            .get(l)
            .unwrap_or_else(|| panic!("dangling label `{}` in `{}`", l, f.name))
    };
    let fallthrough = |i: usize| if i + 1 < n { Follow::One(i + 1) } else { Follow::Zero };

    f.insts
        .iter()
        .enumerate()
        .map(|(i, inst)| match inst {
            Inst::Return => Follow::Zero,
            Inst::Call(c, _) if c.is_terminating() => Follow::Zero,
            Inst::Goto(l) => Follow::One(target(l)),
            Inst::Cjump(_, _, _, l) => {
                let t = target(l);
                match fallthrough(i) {
                    Follow::One(next) => Follow::Two(next, t),
                    _ => Follow::One(t),
                }
            }
            _ => fallthrough(i),
        })
        .collect()
}

/// Per-instruction liveness with L2 calling-convention semantics.
pub fn analyze(f: &Function) -> Vec<LivenessSets> {
    let mut data: Vec<LivenessSets> = f.insts.iter().map(gen_kill).collect();
    let follow = build_successors(f);

    let mut changed = true;
    while changed {
        changed = false;
        for idx in (0..data.len()).rev() {
            let mut new_out = Set::default();
            match follow[idx] {
                Follow::Zero => {}
                Follow::One(s) => new_out.extend(data[s].live_in.iter().cloned()),
                Follow::Two(s1, s2) => {
                    new_out.extend(data[s1].live_in.iter().cloned());
                    new_out.extend(data[s2].live_in.iter().cloned());
                }
            }

            let ls = &data[idx];
            let mut new_in = ls.gen.clone();
            for v in &new_out {
                if !ls.kill.contains(v) {
                    new_in.insert(v.clone());
                }
            }

            if new_out != ls.live_out || new_in != ls.live_in {
                let ls = &mut data[idx];
                ls.live_out = new_out;
                ls.live_in = new_in;
                changed = true;
            }
        }
    }

    data
}

fn paren_set(out: &mut String, s: &Set<Id>) {
    let mut v: Vec<&Id> = s.iter().collect();
    v.sort();
    out.push('(');
    for (i, name) in v.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(name);
    }
    out.push_str(")\n");
}

/// The `((in ...) (out ...))` form printed by `-l`.
pub fn format_liveness(data: &[LivenessSets]) -> String {
    let mut out = String::from("(\n(in\n");
    for ls in data {
        paren_set(&mut out, &ls.live_in);
    }
    out.push_str(")\n\n(out\n");
    for ls in data {
        paren_set(&mut out, &ls.live_out);
    }
    out.push_str(")\n\n)\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::l2::Aop;

    fn set(names: &[&str]) -> Set<Id> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn function(insts: Vec<Inst>) -> Function {
        Function {
            name: "@f".to_string(),
            arguments: 0,
            insts,
        }
    }

    #[test]
    fn return_gens_rax_and_callee_saves() {
        let f = function(vec![Inst::Return]);
        let live = analyze(&f);
        assert_eq!(
            live[0].gen,
            set(&["rax", "rbx", "rbp", "r12", "r13", "r14", "r15"])
        );
    }

    #[test]
    fn call_kills_caller_saves_and_gens_argument_registers() {
        let f = function(vec![
            Inst::Call(Callee::Func("@g".to_string()), 8),
            Inst::Return,
        ]);
        let live = analyze(&f);
        assert_eq!(
            live[0].kill,
            set(&["r10", "r11", "r8", "r9", "rax", "rcx", "rdi", "rdx", "rsi"])
        );
        // only the first six arguments ride in registers
        assert_eq!(live[0].gen, set(&["rdi", "rsi", "rdx", "rcx", "r8", "r9"]));
    }

    #[test]
    fn store_gens_its_base_instead_of_killing() {
        let f = function(vec![
            Inst::Store(
                Mem::new(W::Var("%p".to_string()), 0),
                Val::Var("%v".to_string()),
            ),
            Inst::Return,
        ]);
        let live = analyze(&f);
        assert_eq!(live[0].gen, set(&["%p", "%v"]));
        assert!(live[0].kill.is_empty());
    }

    #[test]
    fn rsp_never_participates() {
        let f = function(vec![
            Inst::Load(W::Var("%v".to_string()), Mem::rsp(8)),
            Inst::Aop(W::Reg(Reg::Rsp), Aop::Add, Val::Num(8)),
            Inst::Return,
        ]);
        let live = analyze(&f);
        assert_eq!(live[0].gen, Set::default());
        assert!(live[1].gen.is_empty() && live[1].kill.is_empty());
    }

    #[test]
    fn cjump_flows_through_both_successors() {
        let f = function(vec![
            Inst::Assign(W::Var("%a".to_string()), Val::Num(1)),
            Inst::Cjump(
                Val::Var("%a".to_string()),
                ir::l2::Cmp::Eq,
                Val::Num(1),
                ":done".to_string(),
            ),
            Inst::Assign(W::Var("%b".to_string()), Val::Var("%a".to_string())),
            Inst::Label(":done".to_string()),
            Inst::Return,
        ]);
        let live = analyze(&f);
        // %a is read by the cjump and on the fallthrough path
        assert!(live[0].live_out.contains("%a"));
        assert!(live[1].live_out.contains("%a"));
        assert!(!live[3].live_in.contains("%a"));
    }
}
