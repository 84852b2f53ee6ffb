pub mod color;
pub mod interference;
pub mod liveness;
pub mod spill;

use ir::l2::{Function, Reg};
use util::{Id, Map, Set};

use color::ColorResult;
use spill::SpillState;

/// The result of a successful allocation for one function.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub coloring: Map<Id, Reg>,
    /// Spill slots in the frame, in 8-byte units.
    pub locals: i64,
}

const MAX_ROUNDS: usize = 1000;

/// Runs liveness, interference, and coloring; on failure spills the
/// chosen candidate and starts over. Terminates because each round
/// either succeeds or strictly grows the spill counter.
pub fn allocate_function(f: &mut Function) -> Allocation {
    let mut state = SpillState::default();

    for _ in 0..MAX_ROUNDS {
        let live = liveness::analyze(f);
        let graph = interference::build(f, &live);
        match color::color(&graph) {
            ColorResult::Colored(coloring) => {
                return Allocation {
                    coloring,
                    locals: state.spill_counter,
                };
            }
            ColorResult::Spill(v) => {
                log::info!("spilling `{}` in `{}`", v, f.name);
                let spilled: Set<Id> = std::iter::once(v).collect();
                spill::spill_function(f, &spilled, &mut state);
            }
        }
    }

    panic!("register allocation did not converge for `{}`", f.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::l2::{CALLEE_SAVE, CALLER_SAVE};

    fn lower_src(src: &str) -> ir::l2::Program {
        lower::lower(&parser::parse(src).unwrap()).unwrap()
    }

    #[test]
    fn loop_function_colors_without_spill() {
        let mut p = lower_src(
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
        let alloc = allocate_function(&mut p.functions[0]);

        assert_eq!(alloc.locals, 0);
        assert_ne!(alloc.coloring["%i"], alloc.coloring["%n"]);
    }

    #[test]
    fn variable_shift_count_is_assigned_rcx() {
        let mut p = lower_src(
            "define @f(%x, %y) {\n\
             %r <- %x << %y\n\
             return %r\n\
             }\n",
        );
        let alloc = allocate_function(&mut p.functions[0]);

        assert_eq!(alloc.coloring["%y"], Reg::Rcx);
    }

    #[test]
    fn value_live_across_a_call_never_sits_in_a_caller_save() {
        let mut p = lower_src(
            "define @f(%x) {\n\
             %v <- %x + 1\n\
             call print(%x)\n\
             return %v\n\
             }\n",
        );
        let alloc = allocate_function(&mut p.functions[0]);

        // %v conflicts with every register that a call clobbers, so it
        // is realized in the frame rather than in a caller-save
        assert!(alloc.locals >= 1);
        assert!(!alloc.coloring.contains_key("%v"));

        // the reloads around the call are short-lived and colored
        for (name, reg) in &alloc.coloring {
            if name.starts_with("%S") {
                assert!(CALLEE_SAVE.contains(reg) || CALLER_SAVE.contains(reg));
            }
        }
    }

    #[test]
    fn twenty_simultaneously_live_variables_force_a_spill() {
        let mut src = String::from("define @f() {\n");
        for i in 0..20 {
            src.push_str(&format!("%v{} <- {}\n", i, i));
        }
        src.push_str("%s <- %v0 + %v1\n");
        for i in 2..20 {
            src.push_str(&format!("%s <- %s + %v{}\n", i));
        }
        src.push_str("return %s\n}\n");

        let mut p = lower_src(&src);
        let alloc = allocate_function(&mut p.functions[0]);

        assert!(alloc.locals >= 1);
        // every surviving variable is register-colored
        for inst in &p.functions[0].insts {
            if let ir::l2::Inst::Assign(ir::l2::W::Var(v), _) = inst {
                assert!(alloc.coloring.contains_key(v));
            }
        }
    }
}
