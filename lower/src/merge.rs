use crate::context::{Context, Node};
use crate::liveness::LivenessSets;
use crate::tree::Tree;

/// Coalesces producer/consumer tree pairs inside every context until a
/// full pass makes no further merge.
pub fn merge_contexts(contexts: &mut [Context]) {
    for ctx in contexts.iter_mut() {
        merge_context(ctx);
    }
}

fn merge_context(ctx: &mut Context) {
    let mut changed = true;
    while changed {
        changed = false;
        let mut j = 1;
        while j < ctx.nodes.len() {
            if try_merge(&mut ctx.nodes, j - 1, j) {
                changed = true;
                // the merged tree stays at j-1; retry it against the next node
            } else {
                j += 1;
            }
        }
    }
}

/// Merges the producer at `t2_idx` into the consumer directly after it
/// when it is safe to do so:
///   (a) T2 defines a variable v that T1 reads,
///   (b) v is dead after T1,
///   (c) out(T2) = in(T1), so nothing in between observes or clobbers,
///   (d) T2 is `Assign(Leaf v, rhs)` and v occurs in T1.
fn try_merge(nodes: &mut Vec<Node>, t2_idx: usize, t1_idx: usize) -> bool {
    let (head, tail) = nodes.split_at_mut(t1_idx);
    let (t2, l2, t1, l1) = match (&mut head[t2_idx], &mut tail[0]) {
        (
            Node::Tree { tree: t2, live: l2 },
            Node::Tree { tree: t1, live: l1 },
        ) => (t2, l2, t1, l1),
        _ => return false,
    };

    let v = match t2.defined_var() {
        Some(v) if l1.gen.contains(v) => v.clone(),
        _ => return false,
    };
    if l1.live_out.contains(&v) {
        return false;
    }
    if l2.live_out != l1.live_in {
        return false;
    }
    if !t1.uses_var(&v) {
        return false;
    }

    let rhs = match t2 {
        Tree::Assign(_, rhs) => (**rhs).clone(),
        _ => return false,
    };

    t1.substitute_uses(&v, &rhs);
    *l1 = merged_liveness(l2, l1);

    nodes.remove(t2_idx);
    true
}

fn merged_liveness(l2: &LivenessSets, l1: &LivenessSets) -> LivenessSets {
    // kill21 = kill2 ∪ kill1
    let mut kill = l2.kill.clone();
    kill.extend(l1.kill.iter().cloned());

    // gen21 = gen1 ∪ (gen2 \ kill1)
    let mut gen = l1.gen.clone();
    for v in &l2.gen {
        if !l1.kill.contains(v) {
            gen.insert(v.clone());
        }
    }

    // out21 = out1, in21 = gen21 ∪ (out21 \ kill21)
    let live_out = l1.live_out.clone();
    let mut live_in = gen.clone();
    for v in &live_out {
        if !kill.contains(v) {
            live_in.insert(v.clone());
        }
    }

    LivenessSets {
        gen,
        kill,
        live_in,
        live_out,
    }
}
