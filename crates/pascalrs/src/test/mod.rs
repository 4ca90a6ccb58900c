// Test module organization
pub mod test_codegen;
pub mod test_lexer;
pub mod test_liveness;
pub mod test_vm;

use crate::ir::{OpCode, Operand, Quadruple};
use crate::symbols::{SymbolKind, SymbolTable, TypeKind};
use crate::vm::{QuadVm, VmOutcome};

pub(crate) fn ident(name: &str) -> Operand {
    Operand::identifier(0, name)
}

pub(crate) fn temp(id: usize) -> Operand {
    Operand::temporary(id)
}

pub(crate) fn konst(table: &mut SymbolTable, value: f64) -> Operand {
    let index = table.lookup_or_add_constant(value);
    Operand::constant(index, value)
}

pub(crate) fn quad(op: OpCode, arg1: Operand, arg2: Operand, result: Operand) -> Quadruple {
    Quadruple::new(op, arg1, arg2, result)
}

/// Unconditional jump to a raw instruction index, as the front end emits it
pub(crate) fn jump_to(line: usize) -> Quadruple {
    Quadruple::new(OpCode::Jump, Operand::None, Operand::None, Operand::label(line))
}

/// Conditional jump to a raw instruction index
pub(crate) fn jump_if_false(cond: Operand, line: usize) -> Quadruple {
    Quadruple::new(OpCode::JumpIfFalse, cond, Operand::None, Operand::label(line))
}

/// A table with the given names declared as integer variables
pub(crate) fn table_with_vars(names: &[&str]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for name in names {
        table.declare(name, SymbolKind::Variable, TypeKind::Integer);
    }
    table
}

pub(crate) fn run_raw(quads: &[Quadruple], table: &SymbolTable) -> VmOutcome {
    QuadVm::new()
        .run_quads(quads, table, &[])
        .expect("sequence should execute")
}

/// Final values of the declared variables, missing entries read as 0.0
pub(crate) fn observable_state(outcome: &VmOutcome, table: &SymbolTable) -> Vec<(String, f64)> {
    table
        .entries()
        .iter()
        .filter(|entry| entry.kind == SymbolKind::Variable)
        .map(|entry| {
            let value = outcome.globals.get(&entry.name).copied().unwrap_or(0.0);
            (entry.name.clone(), value)
        })
        .collect()
}

/// The core contract: optimizing must not change what a sequence does.
/// Runs the raw and the optimized sequence and compares variable end-state
/// and the PRINT trace.
pub(crate) fn assert_equivalent(quads: Vec<Quadruple>, mut table: SymbolTable) -> Vec<Quadruple> {
    let before = run_raw(&quads, &table);
    let optimized = crate::optimizer::optimize(&quads, &mut table);
    let after = run_raw(&optimized, &table);

    assert_eq!(before.output, after.output, "print traces diverged");
    assert_eq!(
        observable_state(&before, &table),
        observable_state(&after, &table),
        "variable end-states diverged"
    );
    optimized
}
