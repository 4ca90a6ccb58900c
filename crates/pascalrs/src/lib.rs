// Pascal-RS
// A compact compiler for a Pascal-like teaching language: quadruple IR,
// a basic-block/liveness optimizer and a small direct interpreter

#[cfg(test)]
mod test;

pub mod codegen;
pub mod compiler;
pub mod ir;
pub mod optimizer;
pub mod symbols;
pub mod vm;

#[cfg(feature = "serde")]
pub mod serde;

pub use compiler::{Compiler, ProcChunk, Program};
pub use ir::{OpCode, Operand, Quadruple};
pub use optimizer::{optimize, optimize_program};
pub use symbols::{SymbolEntry, SymbolKind, SymbolTable, TypeKind};
pub use vm::{ExecError, QuadVm, VmOutcome};
