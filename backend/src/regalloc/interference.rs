use super::liveness::LivenessSets;
use crate::common::GP_REGISTERS;
use ir::l2::{Callee, Function, Inst, Reg, Val, W};
use util::{Id, Map, Set};

/// Undirected conflict graph over variable and register names. Nodes
/// are indices into `names`; variables come first in order of first
/// appearance, then the fifteen general-purpose registers.
#[derive(Debug, Clone)]
pub struct InterferenceGraph {
    pub names: Vec<Id>,
    pub index: Map<Id, usize>,
    pub adjacency: Vec<Set<usize>>,
    pub degrees: Vec<usize>,
}

impl InterferenceGraph {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_variable(&self, node: usize) -> bool {
        self.names[node].starts_with('%')
    }

    fn add_edge(&mut self, u: usize, v: usize) {
        if u == v {
            return;
        }
        self.adjacency[u].insert(v);
        self.adjacency[v].insert(u);
    }

    fn add_cross_edges(&mut self, a: &Set<Id>, b: &Set<Id>) {
        for u in a {
            let u = self.index[u];
            for v in b {
                let v = self.index[v];
                self.add_edge(u, v);
            }
        }
    }

    /// One sorted line per node: the node's name followed by its
    /// neighbors' names. The `-i` output format.
    pub fn format(&self) -> String {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.names[a].cmp(&self.names[b]));

        let mut out = String::new();
        for u in order {
            out.push_str(&self.names[u]);
            let mut neighbors: Vec<&Id> = self.adjacency[u].iter().map(|&v| &self.names[v]).collect();
            neighbors.sort();
            for n in neighbors {
                out.push(' ');
                out.push_str(n);
            }
            out.push('\n');
        }
        out
    }
}

fn collect_w(names: &mut Vec<Id>, seen: &mut Set<Id>, w: &W) {
    if let W::Var(v) = w {
        if seen.insert(v.clone()) {
            names.push(v.clone());
        }
    }
}

fn collect_val(names: &mut Vec<Id>, seen: &mut Set<Id>, v: &Val) {
    if let Val::Var(x) = v {
        if seen.insert(x.clone()) {
            names.push(x.clone());
        }
    }
}

/// Every variable mentioned by the function, in first-appearance order.
fn collect_variables(f: &Function) -> Vec<Id> {
    let mut names = Vec::new();
    let mut seen = Set::default();
    for inst in &f.insts {
        match inst {
            Inst::Assign(w, s) => {
                collect_w(&mut names, &mut seen, w);
                collect_val(&mut names, &mut seen, s);
            }
            Inst::Load(w, m) => {
                collect_w(&mut names, &mut seen, w);
                collect_w(&mut names, &mut seen, &m.base);
            }
            Inst::Store(m, s) => {
                collect_w(&mut names, &mut seen, &m.base);
                collect_val(&mut names, &mut seen, s);
            }
            Inst::StackArg(w, _) => collect_w(&mut names, &mut seen, w),
            Inst::Aop(w, _, t) | Inst::Sop(w, _, t) => {
                collect_w(&mut names, &mut seen, w);
                collect_val(&mut names, &mut seen, t);
            }
            Inst::MemAop(m, _, t) => {
                collect_w(&mut names, &mut seen, &m.base);
                collect_val(&mut names, &mut seen, t);
            }
            Inst::AopMem(w, _, m) => {
                collect_w(&mut names, &mut seen, w);
                collect_w(&mut names, &mut seen, &m.base);
            }
            Inst::CmpAssign(w, l, _, r) => {
                collect_w(&mut names, &mut seen, w);
                collect_val(&mut names, &mut seen, l);
                collect_val(&mut names, &mut seen, r);
            }
            Inst::Cjump(l, _, r, _) => {
                collect_val(&mut names, &mut seen, l);
                collect_val(&mut names, &mut seen, r);
            }
            Inst::Call(Callee::Indirect(w), _) => collect_w(&mut names, &mut seen, w),
            Inst::Inc(w) | Inst::Dec(w) => collect_w(&mut names, &mut seen, w),
            Inst::Lea(d, a, b, _) => {
                collect_w(&mut names, &mut seen, d);
                collect_w(&mut names, &mut seen, a);
                collect_w(&mut names, &mut seen, b);
            }
            _ => {}
        }
    }
    names
}

/// Builds the interference graph from per-instruction liveness:
/// a clique over the registers, conflicts between simultaneously live
/// names, kill-vs-out conflicts, and the `rcx` shift constraint.
pub fn build(f: &Function, live: &[LivenessSets]) -> InterferenceGraph {
    let mut names = collect_variables(f);
    for r in GP_REGISTERS {
        names.push(r.name().to_string());
    }

    let index: Map<Id, usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), i))
        .collect();
    let n = names.len();

    let mut graph = InterferenceGraph {
        names,
        index,
        adjacency: vec![Set::default(); n],
        degrees: vec![0; n],
    };

    // registers conflict pairwise
    let first_reg = n - GP_REGISTERS.len();
    for u in first_reg..n {
        for v in (u + 1)..n {
            graph.add_edge(u, v);
        }
    }

    for (inst, ls) in f.insts.iter().zip(live) {
        graph.add_cross_edges(&ls.live_in, &ls.live_in);
        graph.add_cross_edges(&ls.live_out, &ls.live_out);
        graph.add_cross_edges(&ls.kill, &ls.live_out);

        // a variable shift count must land in rcx
        if let Inst::Sop(_, _, Val::Var(v)) = inst {
            let u = graph.index[v];
            for r in GP_REGISTERS {
                if r != Reg::Rcx {
                    let w = graph.index[r.name()];
                    graph.add_edge(u, w);
                }
            }
        }
    }

    for u in 0..graph.len() {
        graph.degrees[u] = graph.adjacency[u].len();
    }

    graph
}
