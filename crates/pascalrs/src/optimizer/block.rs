// Basic block construction
// Partitions a labeled sequence into maximal straight-line runs and links
// them into a control-flow graph

use ahash::{AHashMap, AHashSet};

use crate::ir::{OpCode, Quadruple};

/// A maximal straight-line run of quadruples plus its CFG edges and the
/// liveness sets computed over it. Rebuilt fresh on every driver iteration;
/// never survives past `flatten`.
pub struct BasicBlock {
    pub quads: Vec<Quadruple>,
    pub predecessors: AHashSet<usize>,
    pub successors: AHashSet<usize>,
    pub defs: AHashSet<String>,
    pub uses: AHashSet<String>,
    pub live_in: AHashSet<String>,
    pub live_out: AHashSet<String>,
}

impl BasicBlock {
    fn new() -> BasicBlock {
        BasicBlock {
            quads: Vec::new(),
            predecessors: AHashSet::new(),
            successors: AHashSet::new(),
            defs: AHashSet::new(),
            uses: AHashSet::new(),
            live_in: AHashSet::new(),
            live_out: AHashSet::new(),
        }
    }
}

/// Slice the sequence at block leaders and wire the CFG.
///
/// A leader is the first instruction, any instruction after a jump, and any
/// `LABEL`. A jump whose label has no known block keeps the block's other
/// edges and simply omits that one.
pub(crate) fn build_basic_blocks(quads: &[Quadruple]) -> Vec<BasicBlock> {
    if quads.is_empty() {
        return Vec::new();
    }

    let mut is_leader = vec![false; quads.len()];
    is_leader[0] = true;
    for (i, quad) in quads.iter().enumerate() {
        if quad.op.is_jump() && i + 1 < quads.len() {
            is_leader[i + 1] = true;
        }
        if quad.op == OpCode::Label {
            is_leader[i] = true;
        }
    }

    let mut blocks = Vec::new();
    let mut current = BasicBlock::new();
    for (i, quad) in quads.iter().enumerate() {
        if is_leader[i] && !current.quads.is_empty() {
            blocks.push(current);
            current = BasicBlock::new();
        }
        current.quads.push(quad.clone());
        if quad.op.is_jump() {
            blocks.push(current);
            current = BasicBlock::new();
        }
    }
    if !current.quads.is_empty() {
        blocks.push(current);
    }

    let mut label_to_block: AHashMap<usize, usize> = AHashMap::new();
    for (index, block) in blocks.iter().enumerate() {
        for quad in &block.quads {
            if quad.op == OpCode::Label {
                if let Some(id) = quad.result.label_id() {
                    label_to_block.insert(id, index);
                }
            }
        }
    }

    for i in 0..blocks.len() {
        let (op, target) = match blocks[i].quads.last() {
            Some(last) => (
                last.op,
                last.result
                    .label_id()
                    .and_then(|id| label_to_block.get(&id).copied()),
            ),
            None => continue,
        };
        match op {
            OpCode::Jump => {
                if let Some(t) = target {
                    add_edge(&mut blocks, i, t);
                }
            }
            OpCode::JumpIfFalse => {
                if let Some(t) = target {
                    add_edge(&mut blocks, i, t);
                }
                if i + 1 < blocks.len() {
                    add_edge(&mut blocks, i, i + 1);
                }
            }
            _ => {
                if i + 1 < blocks.len() {
                    add_edge(&mut blocks, i, i + 1);
                }
            }
        }
    }

    blocks
}

fn add_edge(blocks: &mut [BasicBlock], from: usize, to: usize) {
    blocks[from].successors.insert(to);
    blocks[to].predecessors.insert(from);
}

/// Concatenate the (locally rewritten) blocks back into one sequence
pub(crate) fn flatten(blocks: Vec<BasicBlock>) -> Vec<Quadruple> {
    let mut quads = Vec::new();
    for block in blocks {
        quads.extend(block.quads);
    }
    quads
}
