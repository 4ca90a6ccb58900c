// Whole-sequence loop transformations.
//
// Loop detection is deliberately simple: a jump whose label resolves to an
// earlier position demarcates a loop over that range. Loops entered through
// forward jumps into the middle, and irreducible flow generally, are not
// recognized; that is a documented limit of this design, not an oversight.
// Each pass applies at most one structural edit per invocation and reports
// "changed" so the driver restarts with consistent indices.

use ahash::{AHashMap, AHashSet};

use crate::ir::{OpCode, Operand, Quadruple};
use crate::optimizer::OptContext;
use crate::symbols::SymbolTable;

/// Inclusive `[head, back-jump]` ranges of every detected loop
fn find_loops(quads: &[Quadruple]) -> Vec<(usize, usize)> {
    let mut label_pos: AHashMap<usize, usize> = AHashMap::new();
    for (i, quad) in quads.iter().enumerate() {
        if quad.op == OpCode::Label {
            if let Some(id) = quad.result.label_id() {
                label_pos.insert(id, i);
            }
        }
    }

    let mut loops = Vec::new();
    for (i, quad) in quads.iter().enumerate() {
        if quad.op.is_jump() {
            if let Some(pos) = quad
                .result
                .label_id()
                .and_then(|id| label_pos.get(&id).copied())
            {
                if pos < i {
                    loops.push((pos, i));
                }
            }
        }
    }
    loops
}

fn operand_invariant(operand: &Operand, defined_in_loop: &AHashSet<String>) -> bool {
    match operand.var_name() {
        Some(name) => !defined_in_loop.contains(name),
        None => true,
    }
}

/// Loop-invariant code motion: arithmetic whose operands are constants or
/// variables never written inside the loop moves, in original order, to just
/// before the loop head. One loop per invocation.
pub(crate) fn hoist_loop_invariants(quads: &mut Vec<Quadruple>) -> bool {
    for (start, end) in find_loops(quads) {
        let mut defined_in_loop: AHashSet<String> = AHashSet::new();
        for quad in &quads[start..=end] {
            if let Some(name) = quad.result.var_name() {
                defined_in_loop.insert(name.to_string());
            }
        }

        let mut invariant: Vec<usize> = Vec::new();
        for (i, quad) in quads.iter().enumerate().take(end + 1).skip(start) {
            if quad.op.is_arith()
                && operand_invariant(&quad.arg1, &defined_in_loop)
                && operand_invariant(&quad.arg2, &defined_in_loop)
            {
                invariant.push(i);
            }
        }
        if invariant.is_empty() {
            continue;
        }

        let hoist_set: AHashSet<usize> = invariant.iter().copied().collect();
        let mut rebuilt = Vec::with_capacity(quads.len());
        rebuilt.extend_from_slice(&quads[..start]);
        for &i in &invariant {
            rebuilt.push(quads[i].clone());
        }
        for (i, quad) in quads.iter().enumerate().skip(start) {
            if !hoist_set.contains(&i) {
                rebuilt.push(quad.clone());
            }
        }
        *quads = rebuilt;
        return true;
    }
    false
}

/// Induction-variable strength reduction: for a loop with a basic induction
/// update `i := i + C`, a multiplication `t := i * K` becomes a copy from a
/// shadow temporary kept in lock-step:
///
/// ```text
///   s := i * K          (before the loop)
///   t := s              (at the multiplication site)
///   s := s + K*C        (right after the induction update)
/// ```
///
/// Exactly one substitution per invocation.
pub(crate) fn reduce_strength(
    quads: &mut Vec<Quadruple>,
    table: &mut SymbolTable,
    ctx: &mut OptContext,
) -> bool {
    for (start, end) in find_loops(quads) {
        let mut induction: Option<(usize, String, usize)> = None;
        for (i, quad) in quads.iter().enumerate().take(end + 1).skip(start) {
            if quad.op == OpCode::Add
                && quad.result.var_name().is_some()
                && quad.result.var_name() == quad.arg1.var_name()
            {
                if let (Some(name), Some(step_index)) =
                    (quad.result.var_name(), quad.arg2.constant_index())
                {
                    induction = Some((i, name.to_string(), step_index));
                    break;
                }
            }
        }
        let Some((update_pos, induction_var, step_index)) = induction else {
            continue;
        };

        for site in start..=end {
            let quad = &quads[site];
            if quad.op != OpCode::Mul {
                continue;
            }
            let factor_index = if quad.arg1.var_name() == Some(induction_var.as_str()) {
                quad.arg2.constant_index()
            } else if quad.arg2.var_name() == Some(induction_var.as_str()) {
                quad.arg1.constant_index()
            } else {
                None
            };
            let Some(factor_index) = factor_index else {
                continue;
            };
            // Malformed constant indices skip this site rather than abort
            let (Some(factor), Some(step)) =
                (table.constant(factor_index), table.constant(step_index))
            else {
                continue;
            };

            let shadow = ctx.new_shadow_temp();
            let init = Quadruple::new(
                OpCode::Mul,
                quad.arg1.clone(),
                quad.arg2.clone(),
                shadow.clone(),
            );
            let delta = factor * step;
            let delta_index = table.lookup_or_add_constant(delta);
            let advance = Quadruple::new(
                OpCode::Add,
                shadow.clone(),
                Operand::constant(delta_index, delta),
                shadow.clone(),
            );

            let target = quads[site].result.clone();
            quads[site] = Quadruple::new(OpCode::Assign, shadow, Operand::None, target);
            quads.insert(update_pos + 1, advance);
            quads.insert(start, init);
            return true;
        }
    }
    false
}
