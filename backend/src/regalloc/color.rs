use super::interference::InterferenceGraph;
use crate::common::{COLOR_ORDER, NUM_COLORS};
use ir::l2::Reg;
use util::{Id, Map};

#[derive(Debug, Clone, PartialEq)]
pub enum ColorResult {
    /// Every variable is bound to exactly one register.
    Colored(Map<Id, Reg>),
    /// Coloring failed; rewrite this variable and start over.
    Spill(Id),
}

/// A spill temporary is never the first-choice candidate.
fn is_spill_temp(name: &str) -> bool {
    name.as_bytes().get(1) == Some(&b'S')
}

/// The next variable to simplify: any node of degree < 15, preferring
/// the largest such degree; otherwise the largest-degree variable
/// still in the graph.
fn pick_node(graph: &InterferenceGraph, removed: &[bool], degree: &[usize]) -> Option<usize> {
    let candidate = |below_k: bool| {
        let mut best: Option<usize> = None;
        for u in 0..graph.len() {
            if removed[u] || !graph.is_variable(u) {
                continue;
            }
            if below_k && degree[u] >= NUM_COLORS {
                continue;
            }
            match best {
                Some(b) if degree[u] <= degree[b] => {}
                _ => best = Some(u),
            }
        }
        best
    };

    candidate(true).or_else(|| candidate(false))
}

/// Chaitin-style simplify/select. Physical registers are pre-bound to
/// themselves and never pushed onto the stack.
pub fn color(graph: &InterferenceGraph) -> ColorResult {
    let n = graph.len();
    let mut removed = vec![false; n];
    let mut degree = graph.degrees.clone();
    let mut stack = Vec::new();

    while let Some(u) = pick_node(graph, &removed, &degree) {
        stack.push(u);
        removed[u] = true;
        for &v in &graph.adjacency[u] {
            if !removed[v] && degree[v] > 0 {
                degree[v] -= 1;
            }
        }
    }

    let mut colored: Map<usize, Reg> = Map::default();
    for u in 0..n {
        if !graph.is_variable(u) {
            let r = Reg::from_name(&graph.names[u])
                .unwrap_or_else(|| panic!("unknown register node `{}`", graph.names[u]));
            colored.insert(u, r);
        }
    }

    let mut candidate: Option<usize> = None;
    while let Some(u) = stack.pop() {
        let mut assigned = None;
        'colors: for &c in &COLOR_ORDER {
            for &v in &graph.adjacency[u] {
                if colored.get(&v) == Some(&c) {
                    continue 'colors;
                }
            }
            assigned = Some(c);
            break;
        }

        match assigned {
            Some(c) => {
                colored.insert(u, c);
            }
            None => {
                candidate = Some(match candidate {
                    None => u,
                    Some(b) => better_candidate(graph, b, u),
                });
            }
        }
    }

    match candidate {
        None => {
            let mut map = Map::default();
            for u in 0..n {
                if graph.is_variable(u) {
                    map.insert(graph.names[u].clone(), colored[&u]);
                }
            }
            ColorResult::Colored(map)
        }
        Some(u) => ColorResult::Spill(graph.names[u].clone()),
    }
}

/// A non-temporary replaces a temporary; among equals, the higher
/// original degree wins.
fn better_candidate(graph: &InterferenceGraph, b: usize, u: usize) -> usize {
    let b_temp = is_spill_temp(&graph.names[b]);
    let u_temp = is_spill_temp(&graph.names[u]);
    if b_temp != u_temp {
        return if b_temp { u } else { b };
    }
    if graph.degrees[u] > graph.degrees[b] {
        u
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regalloc::{interference, liveness};
    use ir::l2::{Function, Inst, Mem, Val, W};

    fn color_insts(insts: Vec<Inst>) -> ColorResult {
        let f = Function {
            name: "@f".to_string(),
            arguments: 0,
            insts,
        };
        let live = liveness::analyze(&f);
        color(&interference::build(&f, &live))
    }

    #[test]
    fn small_graph_colors_without_spilling() {
        let result = color_insts(vec![
            Inst::Assign(W::Var("%a".to_string()), Val::Num(1)),
            Inst::Assign(W::Var("%b".to_string()), Val::Num(2)),
            Inst::Store(Mem::new(W::Var("%a".to_string()), 0), Val::Var("%b".to_string())),
            Inst::Return,
        ]);

        match result {
            ColorResult::Colored(map) => {
                assert_ne!(map["%a"], map["%b"]);
            }
            ColorResult::Spill(v) => panic!("unexpected spill of {}", v),
        }
    }

    #[test]
    fn coloring_respects_every_edge() {
        let insts = vec![
            Inst::Assign(W::Var("%a".to_string()), Val::Num(1)),
            Inst::Assign(W::Var("%b".to_string()), Val::Num(2)),
            Inst::Assign(W::Var("%c".to_string()), Val::Num(3)),
            Inst::Store(Mem::new(W::Var("%a".to_string()), 0), Val::Var("%b".to_string())),
            Inst::Store(Mem::new(W::Var("%a".to_string()), 8), Val::Var("%c".to_string())),
            Inst::Return,
        ];
        let f = Function {
            name: "@f".to_string(),
            arguments: 0,
            insts,
        };
        let live = liveness::analyze(&f);
        let graph = interference::build(&f, &live);

        match color(&graph) {
            ColorResult::Colored(map) => {
                for u in 0..graph.len() {
                    if !graph.is_variable(u) {
                        continue;
                    }
                    let cu = map[&graph.names[u]];
                    for &v in &graph.adjacency[u] {
                        let other = &graph.names[v];
                        if graph.is_variable(v) {
                            assert_ne!(cu, map[other]);
                        } else {
                            assert_ne!(cu.name(), other.as_str());
                        }
                    }
                }
            }
            ColorResult::Spill(v) => panic!("unexpected spill of {}", v),
        }
    }

    #[test]
    fn spill_temporaries_lose_to_real_variables() {
        let mut g = InterferenceGraph {
            names: vec!["%S3".to_string(), "%v".to_string()],
            index: util::Map::default(),
            adjacency: vec![util::Set::default(), util::Set::default()],
            degrees: vec![100, 1],
        };
        assert_eq!(better_candidate(&g, 0, 1), 1);
        assert_eq!(better_candidate(&g, 1, 0), 1);

        // between two real variables the higher original degree wins
        g.names = vec!["%a".to_string(), "%v".to_string()];
        assert_eq!(better_candidate(&g, 0, 1), 0);
    }
}
