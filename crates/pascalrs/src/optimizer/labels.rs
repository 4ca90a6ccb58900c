// Jump target normalization
// The front end emits jumps whose targets are raw instruction indices; every
// later pass inserts and removes instructions, so targets are converted to
// label identities up front and resolved back to indices only at the very end

use ahash::{AHashMap, AHashSet};

use crate::ir::{OpCode, Operand, Quadruple};

/// Convert position-indexed jump targets into symbolic labels.
///
/// Every distinct target line gets a `LABEL` with a fresh dense id inserted
/// immediately before it; a jump past the last instruction gets a trailing
/// `LABEL`, so every jump in the output resolves to a real label.
pub(crate) fn normalize_labels(quads: &[Quadruple]) -> Vec<Quadruple> {
    let mut target_lines = AHashSet::new();
    for quad in quads {
        if quad.op.is_jump() {
            if let Some(line) = quad.result.label_id() {
                target_lines.insert(line);
            }
        }
    }

    let mut labeled = Vec::with_capacity(quads.len() + target_lines.len());
    let mut line_to_label: AHashMap<usize, usize> = AHashMap::new();
    let mut next_label = 0;

    for (line, quad) in quads.iter().enumerate() {
        if target_lines.contains(&line) {
            line_to_label.insert(line, next_label);
            labeled.push(Quadruple::label(next_label));
            next_label += 1;
        }
        labeled.push(quad.clone());
    }
    if target_lines.contains(&quads.len()) {
        line_to_label.insert(quads.len(), next_label);
        labeled.push(Quadruple::label(next_label));
    }

    for quad in &mut labeled {
        if quad.op.is_jump() {
            if let Some(line) = quad.result.label_id() {
                if let Some(&id) = line_to_label.get(&line) {
                    quad.result = Operand::label(id);
                }
            }
        }
    }

    labeled
}

/// Resolve every jump back to a physical instruction index and strip the
/// `LABEL` pseudo-instructions.
///
/// The final index discounts the labels about to be deleted; a label id with
/// no surviving definition resolves to one past the stripped sequence.
pub(crate) fn fix_jump_targets(quads: &mut Vec<Quadruple>) {
    let mut label_pos: AHashMap<usize, usize> = AHashMap::new();
    for (i, quad) in quads.iter().enumerate() {
        if quad.op == OpCode::Label {
            if let Some(id) = quad.result.label_id() {
                label_pos.insert(id, i);
            }
        }
    }

    let mut labels_before = vec![0usize; quads.len() + 1];
    for (i, quad) in quads.iter().enumerate() {
        labels_before[i + 1] = labels_before[i] + usize::from(quad.op == OpCode::Label);
    }
    let final_count = quads.len() - labels_before[quads.len()];

    for quad in quads.iter_mut() {
        if quad.op.is_jump() {
            let target = quad
                .result
                .label_id()
                .and_then(|id| label_pos.get(&id).copied());
            let index = match target {
                Some(pos) => pos - labels_before[pos],
                None => final_count,
            };
            quad.result = Operand::Label {
                id: index,
                name: index.to_string(),
            };
        }
    }

    quads.retain(|quad| quad.op != OpCode::Label);
}
