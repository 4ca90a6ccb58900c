// Quadruple emission helpers

use super::Compiler;
use crate::ir::{OpCode, Operand, Quadruple};

/// Emit an instruction and return its position
pub(crate) fn emit(
    c: &mut Compiler,
    op: OpCode,
    arg1: Operand,
    arg2: Operand,
    result: Operand,
) -> usize {
    let pos = c.out.len();
    c.out.push(Quadruple::new(op, arg1, arg2, result));
    pos
}

/// Fresh compiler temporary, unique per chunk
pub(crate) fn new_temp(c: &mut Compiler) -> Operand {
    let id = c.temp_counter;
    c.temp_counter += 1;
    Operand::temporary(id)
}

/// Current code position, the target of a forthcoming backpatch
pub(crate) fn get_label(c: &Compiler) -> usize {
    c.out.len()
}

/// Emit a jump with an unresolved target
pub(crate) fn emit_jump(c: &mut Compiler, op: OpCode, cond: Operand) -> usize {
    emit(c, op, cond, Operand::None, Operand::None)
}

/// Point the jump at `at` to the raw instruction index `target`.
/// The optimizer's label normalizer later converts these position-indexed
/// targets into symbolic labels.
pub(crate) fn backpatch(c: &mut Compiler, at: usize, target: usize) {
    if let Some(quad) = c.out.get_mut(at) {
        quad.result = Operand::label(target);
    }
}
