use ir::l2::{Callee, Function, Inst, Mem, Val, W};
use util::{Id, Map, Set};

/// Counters threaded across spill rounds. `spill_counter` grows by one
/// per spilled name and never resets; its final value is the
/// function's local (spill slot) count for frame arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpillState {
    pub temp_counter: usize,
    pub spill_counter: i64,
}

struct Spiller<'a> {
    offsets: Map<Id, i64>,
    state: &'a mut SpillState,
    out: Vec<Inst>,
}

/// Rewrites the function so every spilled variable lives in a stack
/// slot: loads into a fresh `%SN` temporary before each read, stores
/// after each write. Instructions without spilled operands are kept
/// unchanged.
pub fn spill_function(f: &mut Function, spilled: &Set<Id>, state: &mut SpillState) {
    let mut names: Vec<&Id> = spilled.iter().collect();
    names.sort();

    let mut offsets = Map::default();
    for v in names {
        offsets.insert(v.clone(), state.spill_counter * 8);
        state.spill_counter += 1;
    }

    let mut spiller = Spiller {
        offsets,
        state,
        out: Vec::with_capacity(f.insts.len()),
    };
    for inst in &f.insts {
        spiller.rewrite(inst);
    }
    f.insts = spiller.out;
}

impl<'a> Spiller<'a> {
    fn fresh_temp(&mut self) -> Id {
        let t = format!("%S{}", self.state.temp_counter);
        self.state.temp_counter += 1;
        t
    }

    fn slot(&self, v: &str) -> Mem {
        Mem::rsp(self.offsets[v])
    }

    fn spilled_w(&self, w: &W) -> Option<Id> {
        match w {
            W::Var(v) if self.offsets.contains_key(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn spilled_val(&self, v: &Val) -> Option<Id> {
        match v {
            Val::Var(x) if self.offsets.contains_key(x) => Some(x.clone()),
            _ => None,
        }
    }

    /// A readable copy of `v`: loads spilled variables into a temp.
    fn read_val(&mut self, v: &Val) -> Val {
        match self.spilled_val(v) {
            Some(name) => {
                let t = self.fresh_temp();
                self.out.push(Inst::Load(W::Var(t.clone()), self.slot(&name)));
                Val::Var(t)
            }
            None => v.clone(),
        }
    }

    fn read_w(&mut self, w: &W) -> W {
        match self.spilled_w(w) {
            Some(name) => {
                let t = self.fresh_temp();
                self.out.push(Inst::Load(W::Var(t.clone()), self.slot(&name)));
                W::Var(t)
            }
            None => w.clone(),
        }
    }

    /// Memory bases recurse: a spilled base is loaded first and the
    /// operand rebuilt around the temp.
    fn read_mem(&mut self, m: &Mem) -> Mem {
        Mem {
            base: self.read_w(&m.base),
            offset: m.offset,
        }
    }

    /// A destination for a pure (non-reading) definition of `w`, and
    /// the store-back it requires, if any.
    fn write_target(&mut self, w: &W) -> (W, Option<Inst>) {
        match self.spilled_w(w) {
            Some(name) => {
                let t = self.fresh_temp();
                let store = Inst::Store(self.slot(&name), Val::Var(t.clone()));
                (W::Var(t), Some(store))
            }
            None => (w.clone(), None),
        }
    }

    fn push_store_back(&mut self, store: Option<Inst>) {
        if let Some(s) = store {
            self.out.push(s);
        }
    }

    fn rewrite(&mut self, inst: &Inst) {
        match inst {
            Inst::Assign(w, s) => {
                let s = self.read_val(s);
                match self.spilled_w(w) {
                    Some(name) => self.out.push(Inst::Store(self.slot(&name), s)),
                    None => self.out.push(Inst::Assign(w.clone(), s)),
                }
            }
            Inst::Load(w, m) => {
                let m = self.read_mem(m);
                let (dst, store) = self.write_target(w);
                self.out.push(Inst::Load(dst, m));
                self.push_store_back(store);
            }
            Inst::Store(m, s) => {
                let m = self.read_mem(m);
                let s = self.read_val(s);
                self.out.push(Inst::Store(m, s));
            }
            Inst::StackArg(w, k) => {
                let (dst, store) = self.write_target(w);
                self.out.push(Inst::StackArg(dst, *k));
                self.push_store_back(store);
            }
            Inst::Aop(w, op, t) => {
                let dst = self.read_w(w);
                let t = self.read_val(t);
                self.out.push(Inst::Aop(dst.clone(), *op, t));
                if let Some(name) = self.spilled_w(w) {
                    self.out.push(Inst::Store(self.slot(&name), dst.into()));
                }
            }
            Inst::Sop(w, op, t) => {
                let dst = self.read_w(w);
                let t = self.read_val(t);
                self.out.push(Inst::Sop(dst.clone(), *op, t));
                if let Some(name) = self.spilled_w(w) {
                    self.out.push(Inst::Store(self.slot(&name), dst.into()));
                }
            }
            Inst::MemAop(m, op, t) => {
                let m = self.read_mem(m);
                let t = self.read_val(t);
                self.out.push(Inst::MemAop(m, *op, t));
            }
            Inst::AopMem(w, op, m) => {
                let dst = self.read_w(w);
                let m = self.read_mem(m);
                self.out.push(Inst::AopMem(dst.clone(), *op, m));
                if let Some(name) = self.spilled_w(w) {
                    self.out.push(Inst::Store(self.slot(&name), dst.into()));
                }
            }
            Inst::CmpAssign(w, l, c, r) => {
                let l = self.read_val(l);
                let r = self.read_val(r);
                let (dst, store) = self.write_target(w);
                self.out.push(Inst::CmpAssign(dst, l, *c, r));
                self.push_store_back(store);
            }
            Inst::Cjump(l, c, r, lbl) => {
                let l = self.read_val(l);
                let r = self.read_val(r);
                self.out.push(Inst::Cjump(l, *c, r, lbl.clone()));
            }
            Inst::Call(Callee::Indirect(w), n) => {
                let w = self.read_w(w);
                self.out.push(Inst::Call(Callee::Indirect(w), *n));
            }
            Inst::Inc(w) => {
                let dst = self.read_w(w);
                self.out.push(Inst::Inc(dst.clone()));
                if let Some(name) = self.spilled_w(w) {
                    self.out.push(Inst::Store(self.slot(&name), dst.into()));
                }
            }
            Inst::Dec(w) => {
                let dst = self.read_w(w);
                self.out.push(Inst::Dec(dst.clone()));
                if let Some(name) = self.spilled_w(w) {
                    self.out.push(Inst::Store(self.slot(&name), dst.into()));
                }
            }
            Inst::Lea(d, a, b, e) => {
                let a = self.read_w(a);
                let b = self.read_w(b);
                let (dst, store) = self.write_target(d);
                self.out.push(Inst::Lea(dst, a, b, *e));
                self.push_store_back(store);
            }
            Inst::Label(_) | Inst::Goto(_) | Inst::Return | Inst::Call(..) => {
                self.out.push(inst.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::l2::Aop;

    fn spill_one(insts: Vec<Inst>, var: &str) -> (Vec<Inst>, SpillState) {
        let mut f = Function {
            name: "@f".to_string(),
            arguments: 0,
            insts,
        };
        let mut state = SpillState::default();
        let spilled: Set<Id> = std::iter::once(var.to_string()).collect();
        spill_function(&mut f, &spilled, &mut state);
        (f.insts, state)
    }

    #[test]
    fn reads_load_and_writes_store() {
        let (insts, state) = spill_one(
            vec![
                Inst::Assign(W::Var("%v".to_string()), Val::Num(7)),
                Inst::Assign(W::Var("%u".to_string()), Val::Var("%v".to_string())),
                Inst::Return,
            ],
            "%v",
        );

        assert_eq!(
            insts[0],
            Inst::Store(Mem::rsp(0), Val::Num(7))
        );
        assert_eq!(insts[1], Inst::Load(W::Var("%S0".to_string()), Mem::rsp(0)));
        assert_eq!(
            insts[2],
            Inst::Assign(W::Var("%u".to_string()), Val::Var("%S0".to_string()))
        );
        assert_eq!(state.temp_counter, 1);
        assert_eq!(state.spill_counter, 1);
    }

    #[test]
    fn read_modify_write_loads_then_stores() {
        let (insts, _) = spill_one(
            vec![
                Inst::Aop(W::Var("%v".to_string()), Aop::Add, Val::Num(1)),
                Inst::Return,
            ],
            "%v",
        );

        assert_eq!(insts[0], Inst::Load(W::Var("%S0".to_string()), Mem::rsp(0)));
        assert_eq!(
            insts[1],
            Inst::Aop(W::Var("%S0".to_string()), Aop::Add, Val::Num(1))
        );
        assert_eq!(
            insts[2],
            Inst::Store(Mem::rsp(0), Val::Var("%S0".to_string()))
        );
    }

    #[test]
    fn spilled_memory_base_is_rebuilt_around_a_temp() {
        let (insts, _) = spill_one(
            vec![
                Inst::Store(
                    Mem::new(W::Var("%p".to_string()), 16),
                    Val::Num(3),
                ),
                Inst::Return,
            ],
            "%p",
        );

        assert_eq!(insts[0], Inst::Load(W::Var("%S0".to_string()), Mem::rsp(0)));
        assert_eq!(
            insts[1],
            Inst::Store(Mem::new(W::Var("%S0".to_string()), 16), Val::Num(3))
        );
    }

    #[test]
    fn untouched_instructions_are_cloned() {
        let original = vec![
            Inst::Assign(W::Var("%a".to_string()), Val::Num(1)),
            Inst::Goto(":x".to_string()),
            Inst::Label(":x".to_string()),
            Inst::Return,
        ];
        let (insts, state) = spill_one(original.clone(), "%zzz");
        assert_eq!(insts, original);
        assert_eq!(state.temp_counter, 0);
        // the slot is still reserved for the requested name
        assert_eq!(state.spill_counter, 1);
    }

    #[test]
    fn offsets_advance_across_rounds() {
        let mut f = Function {
            name: "@f".to_string(),
            arguments: 0,
            insts: vec![
                Inst::Assign(W::Var("%a".to_string()), Val::Num(1)),
                Inst::Assign(W::Var("%b".to_string()), Val::Var("%a".to_string())),
                Inst::Return,
            ],
        };
        let mut state = SpillState::default();

        let first: Set<Id> = std::iter::once("%a".to_string()).collect();
        spill_function(&mut f, &first, &mut state);
        let second: Set<Id> = std::iter::once("%b".to_string()).collect();
        spill_function(&mut f, &second, &mut state);

        // %a took slot 0, %b slot 8
        assert!(f
            .insts
            .iter()
            .any(|i| matches!(i, Inst::Store(m, _) if *m == Mem::rsp(8))));
        assert_eq!(state.spill_counter, 2);
    }
}
