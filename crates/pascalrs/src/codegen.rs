// Target-code printer
// Lowers an optimized (label-free, position-addressed) sequence into
// single-accumulator pseudo-assembly: LD/ST through R0, with a second pass
// backpatching jump targets from quad indices to target code line numbers

use ahash::AHashMap;

use crate::ir::{OpCode, Operand, Quadruple};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TargetLine {
    pub line: usize,
    pub code: String,
}

const REG: &str = "R0";

fn operand_name(operand: &Operand, table: &SymbolTable) -> String {
    if let Some(index) = operand.constant_index() {
        if let Some(value) = table.constant(index) {
            return crate::ir::display_number(value);
        }
    }
    operand.to_string()
}

/// Generate target code for an optimized sequence.
/// Jump operands must already be physical quad indices (the fixer's output).
pub fn generate_target(quads: &[Quadruple], table: &SymbolTable) -> Vec<TargetLine> {
    let mut lines: Vec<TargetLine> = Vec::new();
    let mut quad_to_line: AHashMap<usize, usize> = AHashMap::new();
    // (target code line, target quad index)
    let mut backpatch: Vec<(usize, usize)> = Vec::new();

    for (i, quad) in quads.iter().enumerate() {
        quad_to_line.insert(i, lines.len());

        let arg1 = operand_name(&quad.arg1, table);
        let result = operand_name(&quad.result, table);

        match quad.op {
            OpCode::Assign => {
                push(&mut lines, format!("LD {}, {}", REG, arg1));
                push(&mut lines, format!("ST {}, {}", REG, result));
            }
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Eq
            | OpCode::Ne
            | OpCode::Lt
            | OpCode::Le
            | OpCode::Gt
            | OpCode::Ge => {
                let arg2 = operand_name(&quad.arg2, table);
                push(&mut lines, format!("LD {}, {}", REG, arg1));
                push(
                    &mut lines,
                    format!("{} {}, {}", quad.op.mnemonic(), REG, arg2),
                );
                push(&mut lines, format!("ST {}, {}", REG, result));
            }
            OpCode::Jump => {
                push(&mut lines, "JMP".to_string());
                if let Some(target) = quad.result.label_id() {
                    backpatch.push((lines.len() - 1, target));
                }
            }
            OpCode::JumpIfFalse => {
                push(&mut lines, format!("FJ {}", arg1));
                if let Some(target) = quad.result.label_id() {
                    backpatch.push((lines.len() - 1, target));
                }
            }
            OpCode::Param => {
                push(&mut lines, format!("LD {}, {}", REG, arg1));
                push(&mut lines, "PARAM".to_string());
            }
            OpCode::Call => {
                let arg2 = operand_name(&quad.arg2, table);
                push(&mut lines, format!("CALL {}, {}", arg1, arg2));
                if !quad.result.is_none() {
                    push(&mut lines, format!("ST {}, {}", REG, result));
                }
            }
            OpCode::Return => {
                if !quad.arg1.is_none() {
                    push(&mut lines, format!("LD {}, {}", REG, arg1));
                }
                push(&mut lines, "RET".to_string());
            }
            OpCode::Print => {
                push(&mut lines, format!("LD {}, {}", REG, arg1));
                push(&mut lines, "OUT".to_string());
            }
            OpCode::Label | OpCode::NoOp => {}
        }
    }

    let mut buf = itoa::Buffer::new();
    let end_line = lines.len();
    for (line, target_quad) in backpatch {
        // A jump one past the last quad exits the program
        let target_line = quad_to_line
            .get(&target_quad)
            .copied()
            .unwrap_or(end_line);
        lines[line].code.push_str(" L");
        lines[line].code.push_str(buf.format(target_line));
    }

    for (i, line) in lines.iter_mut().enumerate() {
        line.line = i;
    }
    lines
}

fn push(lines: &mut Vec<TargetLine>, code: String) {
    lines.push(TargetLine { line: 0, code });
}
