mod common;
mod emit;
mod regalloc;

pub use common::{COLOR_ORDER, GP_REGISTERS, NUM_COLORS};
pub use emit::{emit_function, emit_program};
pub use regalloc::color::{color, ColorResult};
pub use regalloc::interference::{build as build_interference, InterferenceGraph};
pub use regalloc::liveness::{analyze as analyze_liveness, format_liveness, LivenessSets};
pub use regalloc::spill::{spill_function, SpillState};
pub use regalloc::{allocate_function, Allocation};
