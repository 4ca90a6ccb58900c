// Liveness analysis
// Per-block def/use followed by the standard backward may-live fixpoint:
//   live_out(B) = U live_in(S) over successors S
//   live_in(B)  = use(B) U (live_out(B) - def(B))

use ahash::AHashSet;

use crate::ir::OpCode;
use crate::optimizer::block::BasicBlock;
use crate::symbols::SymbolTable;

/// Compute each block's `use` (read before any write in the block) and
/// `def` (written anywhere in the block) sets.
///
/// A `CALL` counts as a possible read of every declared symbol: a callee
/// body may read any global, and nothing in the sequence says which.
pub(crate) fn compute_def_use(blocks: &mut [BasicBlock], table: &SymbolTable) {
    for block in blocks.iter_mut() {
        block.uses.clear();
        block.defs.clear();
        let mut defined: AHashSet<&str> = AHashSet::new();

        for quad in &block.quads {
            for arg in [&quad.arg1, &quad.arg2] {
                if let Some(name) = arg.var_name() {
                    if !defined.contains(name) {
                        block.uses.insert(name.to_string());
                    }
                }
            }
            if quad.op == OpCode::Call {
                for entry in table.entries() {
                    if !defined.contains(entry.name.as_str()) {
                        block.uses.insert(entry.name.clone());
                    }
                }
            }
            if let Some(name) = quad.result.var_name() {
                block.defs.insert(name.to_string());
                defined.insert(name);
            }
        }
    }
}

/// Iterate the backward dataflow equations to a fixpoint.
///
/// Exit blocks (no successors) are seeded with every declared symbol: the
/// conservative assumption that all of them are observable at program end.
/// The lattice is finite and the transfer monotone, so the loop terminates;
/// the iteration bound is defensive only.
pub(crate) fn compute_liveness(blocks: &mut [BasicBlock], table: &SymbolTable) {
    let exit_live: AHashSet<String> = table
        .entries()
        .iter()
        .map(|entry| entry.name.clone())
        .collect();

    for block in blocks.iter_mut() {
        block.live_in.clear();
        block.live_out = if block.successors.is_empty() {
            exit_live.clone()
        } else {
            AHashSet::new()
        };
    }

    let var_bound: usize = blocks
        .iter()
        .map(|b| b.uses.len() + b.defs.len())
        .sum::<usize>()
        + exit_live.len();
    let iteration_limit = blocks.len().saturating_mul(var_bound) + 8;

    for _ in 0..iteration_limit {
        let mut changed = false;

        for i in 0..blocks.len() {
            let new_out: AHashSet<String> = if blocks[i].successors.is_empty() {
                blocks[i].live_out.clone()
            } else {
                let mut out = AHashSet::new();
                let successors: Vec<usize> = blocks[i].successors.iter().copied().collect();
                for s in successors {
                    if let Some(successor) = blocks.get(s) {
                        out.extend(successor.live_in.iter().cloned());
                    }
                }
                out
            };

            let mut new_in = blocks[i].uses.clone();
            for name in &new_out {
                if !blocks[i].defs.contains(name) {
                    new_in.insert(name.clone());
                }
            }

            if new_in != blocks[i].live_in || new_out != blocks[i].live_out {
                blocks[i].live_in = new_in;
                blocks[i].live_out = new_out;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}
