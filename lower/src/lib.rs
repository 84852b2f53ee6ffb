mod context;
mod liveness;
mod merge;
mod tile;
mod tree;

pub use context::{build_contexts, Context, Node};
pub use liveness::{analyze as analyze_liveness, LivenessError, LivenessSets};
pub use merge::merge_contexts;
pub use tree::{Leaf, Tree};

use ir::{l2, l3};

/// Lowers an L3 program to L2: liveness, context partitioning, tree
/// construction and merging, then tiling. One emitter spans the whole
/// program so temporaries and globalized labels never collide.
pub fn lower(p: &l3::Program) -> Result<l2::Program, LivenessError> {
    let prefix = tile::label_prefix(p);
    let mut em = tile::Emitter::new(prefix);

    let mut functions = Vec::with_capacity(p.functions.len());
    for f in &p.functions {
        let live = liveness::analyze(f)?;
        let mut contexts = context::build_contexts(f, &live);
        merge::merge_contexts(&mut contexts);
        functions.push(tile::tile_function(&mut em, f, &contexts));
        log::debug!("lowered `{}` ({} contexts)", f.name, contexts.len());
    }

    Ok(l2::Program { functions })
}
