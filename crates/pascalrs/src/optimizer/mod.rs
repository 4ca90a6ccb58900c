// Quadruple optimizer
// Rewrites a raw position-addressed sequence into a smaller equivalent one:
// label normalization, basic blocks + liveness, per-block rewrites, loop
// transformations, and a final jump fix-up back to physical indices

mod block;
mod labels;
mod liveness;
mod local;
mod loops;

pub use block::BasicBlock;

#[cfg(test)]
pub(crate) use block::{build_basic_blocks, flatten};
#[cfg(test)]
pub(crate) use labels::{fix_jump_targets, normalize_labels};
#[cfg(test)]
pub(crate) use liveness::{compute_def_use, compute_liveness};
#[cfg(test)]
pub(crate) use local::optimize_blocks;
#[cfg(test)]
pub(crate) use loops::{hoist_loop_invariants, reduce_strength};

use crate::compiler::Program;
use crate::ir::{Operand, Quadruple};
use crate::symbols::SymbolTable;

/// Defensive cap on driver iterations. The pass battery is monotone, so the
/// fixpoint is reached long before this on any real program.
const MAX_PASSES: usize = 64;

/// Per-invocation optimizer state: the shadow-temporary counter used by
/// strength reduction lives here rather than in any global
pub(crate) struct OptContext {
    shadow_temps: usize,
}

impl OptContext {
    fn new() -> OptContext {
        OptContext { shadow_temps: 0 }
    }

    pub(crate) fn new_shadow_temp(&mut self) -> Operand {
        let id = self.shadow_temps;
        self.shadow_temps += 1;
        Operand::Temporary {
            id,
            name: format!("s{}", id),
        }
    }
}

/// Optimize one quadruple sequence.
///
/// Takes the raw sequence (jump targets are instruction indices, as emitted
/// by the backpatching front end) and returns a new position-addressed
/// sequence with no `LABEL` instructions. The input is never mutated; the
/// constant table may gain entries for folded values.
pub fn optimize(quads: &[Quadruple], table: &mut SymbolTable) -> Vec<Quadruple> {
    if quads.is_empty() {
        return Vec::new();
    }

    // Position-indexed targets would be corrupted by every insertion and
    // deletion below, so convert them to stable label identities once
    let mut quads = labels::normalize_labels(quads);
    let mut ctx = OptContext::new();

    for _ in 0..MAX_PASSES {
        let mut changed = false;

        let mut blocks = block::build_basic_blocks(&quads);
        liveness::compute_def_use(&mut blocks, table);
        liveness::compute_liveness(&mut blocks, table);
        changed |= local::optimize_blocks(&mut blocks, table);
        quads = block::flatten(blocks);

        // Each loop pass applies at most one structural edit and reports
        // back, so the next iteration sees consistent indices
        changed |= loops::hoist_loop_invariants(&mut quads);
        changed |= loops::reduce_strength(&mut quads, table, &mut ctx);

        if !changed {
            break;
        }
    }

    labels::fix_jump_targets(&mut quads);
    quads
}

/// Optimize every sequence of a compiled program in place: the main chunk
/// and each procedure/function body independently
pub fn optimize_program(program: &mut Program) {
    program.quads = optimize(&program.quads, &mut program.table);
    let mut procs = std::mem::take(&mut program.procs);
    for proc in &mut procs {
        proc.quads = optimize(&proc.quads, &mut program.table);
    }
    program.procs = procs;
}
