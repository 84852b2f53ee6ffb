use thiserror::Error;

use ir::l3::{Callee, Function, InstKind, Item};
use util::{Id, Map, Set};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LivenessSets {
    pub gen: Set<Id>,
    pub kill: Set<Id>,
    pub live_in: Set<Id>,
    pub live_out: Set<Id>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LivenessError {
    #[error("branch to undefined label `{label}` in function `{function}`")]
    DanglingLabel { label: Id, function: Id },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Follow {
    Zero,
    One(usize),
    Two(usize, usize),
}

/// Per-instruction GEN/KILL/IN/OUT over the function body, in
/// instruction order.
pub fn analyze(f: &Function) -> Result<Vec<LivenessSets>, LivenessError> {
    let labels = build_label_map(f);
    let mut data: Vec<LivenessSets> = f.body.iter().map(|i| gen_kill(&i.item)).collect();
    let follow = build_successors(f, &labels)?;
    fixed_point(&mut data, &follow);
    Ok(data)
}

/// Maps each label name to the index of its defining instruction.
pub fn build_label_map(f: &Function) -> Map<Id, usize> {
    let mut labels = Map::default();
    for (idx, inst) in f.body.iter().enumerate() {
        if let InstKind::Label(l) = &inst.item {
            labels.insert(l.clone(), idx);
        }
    }
    labels
}

fn add_if_var(set: &mut Set<Id>, item: &Item) {
    if let Item::Var(v) = item {
        set.insert(v.clone());
    }
}

fn gen_kill(inst: &InstKind) -> LivenessSets {
    let mut ls = LivenessSets::default();
    match inst {
        InstKind::Assign(d, s) => {
            ls.kill.insert(d.clone());
            add_if_var(&mut ls.gen, s);
        }
        InstKind::Op(d, l, _, r) | InstKind::Cmp(d, l, _, r) => {
            ls.kill.insert(d.clone());
            add_if_var(&mut ls.gen, l);
            add_if_var(&mut ls.gen, r);
        }
        InstKind::Load(d, s) => {
            ls.kill.insert(d.clone());
            ls.gen.insert(s.clone());
        }
        InstKind::Store(d, s) => {
            ls.gen.insert(d.clone());
            add_if_var(&mut ls.gen, s);
        }
        InstKind::Return | InstKind::Label(_) | InstKind::Goto(_) => {}
        InstKind::ReturnValue(t) | InstKind::Branch(t, _) => {
            add_if_var(&mut ls.gen, t);
        }
        InstKind::Call(c, args) => {
            if let Callee::Var(v) = c {
                ls.gen.insert(v.clone());
            }
            for a in args {
                add_if_var(&mut ls.gen, a);
            }
        }
        InstKind::CallAssign(d, c, args) => {
            ls.kill.insert(d.clone());
            if let Callee::Var(v) = c {
                ls.gen.insert(v.clone());
            }
            for a in args {
                add_if_var(&mut ls.gen, a);
            }
        }
    }
    ls
}

fn build_successors(f: &Function, labels: &Map<Id, usize>) -> Result<Vec<Follow>, LivenessError> {
    let n = f.body.len();
    let target = |l: &Id| {
        labels.get(l).copied().ok_or_else(|| LivenessError::DanglingLabel {
            label: l.clone(),
            function: f.name.clone(),
        })
    };
    let fallthrough = |i: usize| if i + 1 < n { Follow::One(i + 1) } else { Follow::Zero };

    let mut follow = Vec::with_capacity(n);
    for (i, inst) in f.body.iter().enumerate() {
        let fw = match &inst.item {
            InstKind::Return | InstKind::ReturnValue(_) => Follow::Zero,
            InstKind::Call(c, _) | InstKind::CallAssign(_, c, _) if c.is_terminating() => {
                Follow::Zero
            }
            InstKind::Goto(l) => Follow::One(target(l)?),
            InstKind::Branch(_, l) => {
                let t = target(l)?;
                match fallthrough(i) {
                    Follow::One(next) => Follow::Two(next, t),
                    _ => Follow::One(t),
                }
            }
            _ => fallthrough(i),
        };
        follow.push(fw);
    }
    Ok(follow)
}

fn fixed_point(data: &mut [LivenessSets], follow: &[Follow]) {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(src: &str) -> Function {
        parser::parse(src).unwrap().functions.remove(0)
    }

    fn set(names: &[&str]) -> Set<Id> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn straight_line_gen_kill() {
        let f = function(
            "define @f(%a) {\n\
             %b <- %a + 1\n\
             store %b <- %a\n\
             return %b\n\
             }\n",
        );
        let live = analyze(&f).unwrap();

        assert_eq!(live[0].gen, set(&["%a"]));
        assert_eq!(live[0].kill, set(&["%b"]));
        assert_eq!(live[1].gen, set(&["%a", "%b"]));
        assert!(live[1].kill.is_empty());
        assert_eq!(live[2].gen, set(&["%b"]));
        assert!(live[2].live_out.is_empty());
    }

    #[test]
    fn loop_keeps_induction_variable_live() {
        let f = function(
            "define @loop(%n) {\n\
             %i <- 0\n\
             :top\n\
             %c <- %i < %n\n\
             br %c :body\n\
             br :end\n\
             :body\n\
             %i <- %i + 1\n\
             br :top\n\
             :end\n\
             return %i\n\
             }\n",
        );
        let live = analyze(&f).unwrap();

        // %i is live around the back edge and across the exit branch
        assert!(live[1].live_in.contains("%i"));
        assert!(live[3].live_out.contains("%i"));
        assert!(live[3].live_out.contains("%n"));
        // the conditional branch reads the flag
        assert!(live[3].gen.contains("%c"));
    }

    #[test]
    fn terminating_runtime_call_has_no_successor() {
        let f = function(
            "define @f(%a) {\n\
             call tensor-error(%a)\n\
             return %a\n\
             }\n",
        );
        let live = analyze(&f).unwrap();
        // nothing flows back from the unreachable return
        assert!(live[0].live_out.is_empty());
    }

    #[test]
    fn dangling_label_is_reported() {
        let f = function(
            "define @f() {\n\
             br :nowhere\n\
             return\n\
             }\n",
        );
        let err = analyze(&f).unwrap_err();
        assert_eq!(
            err,
            LivenessError::DanglingLabel {
                label: ":nowhere".to_string(),
                function: "@f".to_string()
            }
        );
    }
}
