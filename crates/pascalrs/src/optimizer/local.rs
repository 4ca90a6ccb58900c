// Local (per-block) rewrites, applied in a fixed order:
// redundant-store elimination, temporary folding, constant folding, copy
// propagation, common-subexpression elimination, then backward dead-code
// elimination seeded by the block's live-out set.
//
// None of these passes fail: a malformed constant index skips that single
// rewrite and leaves the instruction untouched.

use ahash::{AHashMap, AHashSet};

use crate::ir::{OpCode, Operand, Quadruple};
use crate::optimizer::block::BasicBlock;
use crate::symbols::SymbolTable;

pub(crate) fn optimize_blocks(blocks: &mut [BasicBlock], table: &mut SymbolTable) -> bool {
    let mut changed = false;
    for block in blocks.iter_mut() {
        changed |= eliminate_redundant_stores(&mut block.quads);
        changed |= fold_temporaries(&mut block.quads, &block.live_out);
        changed |= fold_constants(&mut block.quads, table);
        changed |= propagate_copies(&mut block.quads);
        changed |= eliminate_common_subexpressions(&mut block.quads);
        changed |= eliminate_dead_code(&mut block.quads, &block.live_out, table);
    }
    changed
}

/// Drop a store that is overwritten before any read of the same name.
/// A `CALL` may read anything, so it pins every pending store.
fn eliminate_redundant_stores(quads: &mut Vec<Quadruple>) -> bool {
    let mut pending: AHashMap<String, usize> = AHashMap::new();
    let mut dead = vec![false; quads.len()];
    let mut changed = false;

    for (i, quad) in quads.iter().enumerate() {
        for arg in [&quad.arg1, &quad.arg2] {
            if let Some(name) = arg.var_name() {
                pending.remove(name);
            }
        }
        if quad.op == OpCode::Call {
            pending.clear();
        }
        if let Some(name) = quad.result.var_name() {
            if let Some(&earlier) = pending.get(name) {
                dead[earlier] = true;
                changed = true;
            }
            pending.insert(name.to_string(), i);
        }
    }

    if changed {
        let mut index = 0;
        quads.retain(|_| {
            let keep = !dead[index];
            index += 1;
            keep
        });
    }
    changed
}

/// Merge `t := op(a, b); x := t` into `x := op(a, b)` when `t` dies at the
/// copy. Scanned backward so chains of copies fold in one sweep.
fn fold_temporaries(quads: &mut Vec<Quadruple>, live_out: &AHashSet<String>) -> bool {
    if quads.is_empty() {
        return false;
    }

    let mut live: AHashSet<String> = live_out.clone();
    let mut folded = Vec::with_capacity(quads.len());
    let mut changed = false;

    let mut i = quads.len();
    while i > 0 {
        i -= 1;
        let quad = &quads[i];

        if i > 0 && quad.op == OpCode::Assign && quad.arg2.is_none() {
            if let Operand::Temporary { name: temp, .. } = &quad.arg1 {
                if !live.contains(temp) {
                    let prev = &quads[i - 1];
                    let prev_is_temp_def = matches!(&prev.result, Operand::Temporary { name, .. } if name == temp);
                    if prev.op.is_arith() && prev_is_temp_def {
                        let mut merged = prev.clone();
                        merged.result = quad.result.clone();
                        update_live(&mut live, &merged);
                        folded.push(merged);
                        changed = true;
                        i -= 1;
                        continue;
                    }
                }
            }
        }

        update_live(&mut live, quad);
        folded.push(quad.clone());
    }

    if changed {
        folded.reverse();
        *quads = folded;
    }
    changed
}

fn update_live(live: &mut AHashSet<String>, quad: &Quadruple) {
    if let Some(name) = quad.result.var_name() {
        live.remove(name);
    }
    for arg in [&quad.arg1, &quad.arg2] {
        if let Some(name) = arg.var_name() {
            live.insert(name.to_string());
        }
    }
}

/// Evaluate arithmetic over two constants and rewrite the instruction to a
/// plain constant assignment. Division by the exact constant zero stays
/// un-folded: that is a runtime concern, not a compile-time one.
fn fold_constants(quads: &mut [Quadruple], table: &mut SymbolTable) -> bool {
    let mut changed = false;

    for quad in quads.iter_mut() {
        if !quad.op.is_arith() {
            continue;
        }
        let (Some(i1), Some(i2)) = (quad.arg1.constant_index(), quad.arg2.constant_index())
        else {
            continue;
        };
        let (Some(v1), Some(v2)) = (table.constant(i1), table.constant(i2)) else {
            continue;
        };

        let value = match quad.op {
            OpCode::Add => v1 + v2,
            OpCode::Sub => v1 - v2,
            OpCode::Mul => v1 * v2,
            OpCode::Div => {
                if v2 == 0.0 {
                    continue;
                }
                v1 / v2
            }
            _ => continue,
        };

        let index = table.lookup_or_add_constant(value);
        quad.op = OpCode::Assign;
        quad.arg1 = Operand::constant(index, value);
        quad.arg2 = Operand::None;
        changed = true;
    }
    changed
}

/// Forward copy propagation: reads of `x` after `x := y` read `y` directly,
/// until either name is redefined.
fn propagate_copies(quads: &mut [Quadruple]) -> bool {
    let mut copies: AHashMap<String, Operand> = AHashMap::new();
    let mut changed = false;

    for quad in quads.iter_mut() {
        for arg in [&mut quad.arg1, &mut quad.arg2] {
            if let Some(name) = arg.var_name() {
                if let Some(source) = copies.get(name) {
                    if *arg != *source {
                        *arg = source.clone();
                        changed = true;
                    }
                }
            }
        }

        if let Some(defined) = quad.result.var_name() {
            let defined = defined.to_string();
            copies.remove(&defined);
            copies.retain(|_, source| source.var_name() != Some(defined.as_str()));
        }

        if quad.op == OpCode::Assign {
            if let (Some(dst), Some(src)) = (quad.result.var_name(), quad.arg1.var_name()) {
                if dst != src {
                    copies.insert(dst.to_string(), quad.arg1.clone());
                }
            }
        }
    }
    changed
}

/// Operand identity for expression matching: constants by table index,
/// variables by name
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ExprOperand {
    Constant(usize),
    Variable(String),
    Absent,
}

fn expr_operand(operand: &Operand) -> ExprOperand {
    match operand {
        Operand::Constant { index, .. } => ExprOperand::Constant(*index),
        Operand::Identifier { name, .. } | Operand::Temporary { name, .. } => {
            ExprOperand::Variable(name.clone())
        }
        _ => ExprOperand::Absent,
    }
}

/// Replace a recomputation of an already-available expression with a copy
/// from the variable still holding it. ADD/MUL operands are normalized so
/// `a + b` and `b + a` match. A redefinition of an operand or of the holding
/// variable invalidates the expression; `CALL` invalidates everything.
fn eliminate_common_subexpressions(quads: &mut [Quadruple]) -> bool {
    type ExprKey = (OpCode, ExprOperand, ExprOperand);
    let mut available: AHashMap<ExprKey, Operand> = AHashMap::new();
    let mut changed = false;

    for quad in quads.iter_mut() {
        let key = if quad.op.is_arith() {
            let mut a = expr_operand(&quad.arg1);
            let mut b = expr_operand(&quad.arg2);
            if matches!(quad.op, OpCode::Add | OpCode::Mul) && b < a {
                std::mem::swap(&mut a, &mut b);
            }
            Some((quad.op, a, b))
        } else {
            None
        };

        let mut rewritten = false;
        if let Some(key) = &key {
            if let Some(holder) = available.get(key) {
                quad.op = OpCode::Assign;
                quad.arg1 = holder.clone();
                quad.arg2 = Operand::None;
                changed = true;
                rewritten = true;
            }
        }

        if quad.op == OpCode::Call {
            available.clear();
        }

        if let Some(defined) = quad.result.var_name() {
            let defined_key = ExprOperand::Variable(defined.to_string());
            available.retain(|(_, a, b), holder| {
                *a != defined_key && *b != defined_key && holder.var_name() != Some(defined)
            });

            if !rewritten {
                if let Some((op, a, b)) = key {
                    // An expression reading its own result describes the old
                    // value; it is not available afterwards
                    if a != defined_key && b != defined_key {
                        available.insert((op, a, b), quad.result.clone());
                    }
                }
            }
        }
    }
    changed
}

/// Backward dead-code elimination seeded by the block's live-out set.
/// Control transfers and side-effecting instructions are always kept; a kept
/// instruction removes its result from the live set and adds its operands.
fn eliminate_dead_code(
    quads: &mut Vec<Quadruple>,
    live_out: &AHashSet<String>,
    table: &SymbolTable,
) -> bool {
    let mut live: AHashSet<String> = live_out.clone();
    let mut kept = Vec::with_capacity(quads.len());
    let mut changed = false;

    for quad in quads.iter().rev() {
        let side_effect = matches!(
            quad.op,
            OpCode::Print
                | OpCode::Call
                | OpCode::Return
                | OpCode::Param
                | OpCode::Jump
                | OpCode::JumpIfFalse
                | OpCode::Label
        );
        let dead = !side_effect
            && quad
                .result
                .var_name()
                .is_some_and(|name| !live.contains(name));
        if dead {
            changed = true;
            continue;
        }

        if quad.op == OpCode::Call {
            // The callee may read any declared variable
            for entry in table.entries() {
                live.insert(entry.name.clone());
            }
        }
        if let Some(name) = quad.result.var_name() {
            live.remove(name);
        }
        for arg in [&quad.arg1, &quad.arg2] {
            if let Some(name) = arg.var_name() {
                live.insert(name.to_string());
            }
        }
        kept.push(quad.clone());
    }

    if changed {
        kept.reverse();
        *quads = kept;
    }
    changed
}
