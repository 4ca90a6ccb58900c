// Direct quadruple interpreter.
// Executes a compiled program (or a bare sequence) against name-keyed f64
// storage, capturing PRINT output. Used as the CLI `run` target and as the
// semantic-equivalence oracle in the optimizer tests: pre- and
// post-optimization sequences must leave identical identifier states and
// produce identical output traces.

use ahash::AHashMap;

use crate::compiler::{ProcChunk, Program};
use crate::ir::{OpCode, Operand, Quadruple, display_number};
use crate::symbols::SymbolTable;

/// Lightweight runtime error; detail beyond the variant is not kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    DivisionByZero,
    UnknownProcedure,
    MissingConstant,
    TooFewArguments,
    CallDepthExceeded,
    StepLimitExceeded,
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecError::DivisionByZero => write!(f, "division by zero"),
            ExecError::UnknownProcedure => write!(f, "call to unknown procedure"),
            ExecError::MissingConstant => write!(f, "constant index out of range"),
            ExecError::TooFewArguments => write!(f, "too few call arguments"),
            ExecError::CallDepthExceeded => write!(f, "call depth exceeded"),
            ExecError::StepLimitExceeded => write!(f, "step limit exceeded"),
        }
    }
}

/// Final state of a finished run
#[derive(Debug)]
pub struct VmOutcome {
    pub globals: AHashMap<String, f64>,
    pub output: Vec<String>,
}

const MAX_CALL_DEPTH: usize = 64;

pub struct QuadVm {
    pub max_steps: usize,
}

impl QuadVm {
    pub fn new() -> QuadVm {
        QuadVm {
            max_steps: 1_000_000,
        }
    }

    pub fn run(&self, program: &Program) -> Result<VmOutcome, ExecError> {
        self.run_quads(&program.quads, &program.table, &program.procs)
    }

    /// Execute one sequence with the given table and callable chunks.
    /// Jump targets are instruction indices; an index one past the end is a
    /// normal exit. `LABEL`/`NO_OP` are skipped, so both raw front-end
    /// output and fully optimized sequences execute directly.
    pub fn run_quads(
        &self,
        quads: &[Quadruple],
        table: &SymbolTable,
        procs: &[ProcChunk],
    ) -> Result<VmOutcome, ExecError> {
        let mut state = VmState {
            table,
            procs,
            globals: AHashMap::new(),
            output: Vec::new(),
            steps: 0,
            max_steps: self.max_steps,
        };
        exec_sequence(&mut state, quads, None, 0)?;
        Ok(VmOutcome {
            globals: state.globals,
            output: state.output,
        })
    }
}

impl Default for QuadVm {
    fn default() -> Self {
        QuadVm::new()
    }
}

struct VmState<'a> {
    table: &'a SymbolTable,
    procs: &'a [ProcChunk],
    globals: AHashMap<String, f64>,
    output: Vec<String>,
    steps: usize,
    max_steps: usize,
}

/// One call frame: parameters and chunk-local temporaries overlay the
/// globals; reads fall through, writes stick to where the name lives
struct Frame {
    locals: AHashMap<String, f64>,
}

/// Execute `quads`; returns the value passed to `RETURN`, if any
fn exec_sequence(
    state: &mut VmState,
    quads: &[Quadruple],
    mut frame: Option<Frame>,
    depth: usize,
) -> Result<Option<f64>, ExecError> {
    if depth > MAX_CALL_DEPTH {
        return Err(ExecError::CallDepthExceeded);
    }

    let mut pc = 0usize;
    let mut pending_args: Vec<f64> = Vec::new();

    while pc < quads.len() {
        state.steps += 1;
        if state.steps > state.max_steps {
            return Err(ExecError::StepLimitExceeded);
        }

        let quad = &quads[pc];
        match quad.op {
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                let a = read(state, &frame, &quad.arg1)?;
                let b = read(state, &frame, &quad.arg2)?;
                let value = match quad.op {
                    OpCode::Add => a + b,
                    OpCode::Sub => a - b,
                    OpCode::Mul => a * b,
                    _ => {
                        if b == 0.0 {
                            return Err(ExecError::DivisionByZero);
                        }
                        a / b
                    }
                };
                write(state, &mut frame, &quad.result, value);
            }
            OpCode::Assign => {
                let value = read(state, &frame, &quad.arg1)?;
                write(state, &mut frame, &quad.result, value);
            }
            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                let a = read(state, &frame, &quad.arg1)?;
                let b = read(state, &frame, &quad.arg2)?;
                let truth = match quad.op {
                    OpCode::Eq => a == b,
                    OpCode::Ne => a != b,
                    OpCode::Lt => a < b,
                    OpCode::Le => a <= b,
                    OpCode::Gt => a > b,
                    _ => a >= b,
                };
                write(state, &mut frame, &quad.result, if truth { 1.0 } else { 0.0 });
            }
            OpCode::Jump => {
                if let Some(target) = quad.result.label_id() {
                    pc = target;
                    continue;
                }
            }
            OpCode::JumpIfFalse => {
                let cond = read(state, &frame, &quad.arg1)?;
                if cond == 0.0 {
                    if let Some(target) = quad.result.label_id() {
                        pc = target;
                        continue;
                    }
                }
            }
            OpCode::Param => {
                let value = read(state, &frame, &quad.arg1)?;
                pending_args.push(value);
            }
            OpCode::Call => {
                let name = quad.arg1.var_name().unwrap_or_default();
                let procs = state.procs;
                let callee = procs
                    .iter()
                    .find(|p| p.name == name)
                    .ok_or(ExecError::UnknownProcedure)?;
                if pending_args.len() < callee.params.len() {
                    return Err(ExecError::TooFewArguments);
                }

                let mut locals = AHashMap::new();
                let bound = pending_args.split_off(pending_args.len() - callee.params.len());
                for (param, value) in callee.params.iter().zip(bound) {
                    locals.insert(param.clone(), value);
                }
                // The chunk writes its result variable and temporaries into
                // its own frame; everything else reaches the globals
                if callee.returns_value {
                    locals.insert(callee.name.clone(), 0.0);
                }
                let returned =
                    exec_sequence(state, &callee.quads, Some(Frame { locals }), depth + 1)?;
                if let Some(value) = returned {
                    write(state, &mut frame, &quad.result, value);
                }
            }
            OpCode::Return => {
                if quad.arg1.is_none() {
                    return Ok(None);
                }
                let value = read(state, &frame, &quad.arg1)?;
                return Ok(Some(value));
            }
            OpCode::Print => {
                let value = read(state, &frame, &quad.arg1)?;
                state.output.push(display_number(value));
            }
            OpCode::Label | OpCode::NoOp => {}
        }
        pc += 1;
    }

    Ok(None)
}

fn read(state: &VmState, frame: &Option<Frame>, operand: &Operand) -> Result<f64, ExecError> {
    match operand {
        Operand::Constant { index, .. } => state
            .table
            .constant(*index)
            .ok_or(ExecError::MissingConstant),
        Operand::Identifier { name, .. } | Operand::Temporary { name, .. } => {
            if let Some(frame) = frame {
                if let Some(&value) = frame.locals.get(name) {
                    return Ok(value);
                }
            }
            Ok(state.globals.get(name).copied().unwrap_or(0.0))
        }
        _ => Ok(0.0),
    }
}

fn write(state: &mut VmState, frame: &mut Option<Frame>, operand: &Operand, value: f64) {
    let name = match operand {
        Operand::Identifier { name, .. } => name,
        Operand::Temporary { name, .. } => name,
        _ => return,
    };
    if let Some(frame) = frame {
        // Temporaries are chunk-local; named variables stay local only when
        // the frame already binds them (parameters, result variable)
        if matches!(operand, Operand::Temporary { .. }) || frame.locals.contains_key(name) {
            frame.locals.insert(name.clone(), value);
            return;
        }
    }
    state.globals.insert(name.clone(), value);
}

