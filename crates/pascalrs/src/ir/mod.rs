// Quadruple (three-address) intermediate representation
// The common vocabulary shared by the front end, the optimizer, the
// interpreter and the target-code printer

use std::fmt;

/// Three-address opcode set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OpCode {
    // Arithmetic (result = arg1 op arg2)
    Add,
    Sub,
    Mul,
    Div,

    // Assignment (result = arg1)
    Assign,

    // Relational (result = arg1 op arg2, yielding 1.0 or 0.0)
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Control transfer (target in result)
    Jump,
    JumpIfFalse,

    // Procedure/function plumbing
    Param,  // pass arg1
    Call,   // call arg1, arg2 = argument count, result = return-value temp
    Return, // return arg1

    Print, // print arg1

    // Pseudo-instruction defining a jump target; stripped before emission
    Label,

    NoOp,
}

impl OpCode {
    pub fn is_jump(self) -> bool {
        matches!(self, OpCode::Jump | OpCode::JumpIfFalse)
    }

    pub fn is_arith(self) -> bool {
        matches!(self, OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge
        )
    }

    /// Printable mnemonic, as used by the quad printer and the target emitter
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Assign => ":=",
            OpCode::Eq => "=",
            OpCode::Ne => "<>",
            OpCode::Lt => "<",
            OpCode::Le => "<=",
            OpCode::Gt => ">",
            OpCode::Ge => ">=",
            OpCode::Jump => "j",
            OpCode::JumpIfFalse => "j<",
            OpCode::Param => "param",
            OpCode::Call => "call",
            OpCode::Return => "ret",
            OpCode::Print => "print",
            OpCode::Label => "label",
            OpCode::NoOp => "noop",
        }
    }
}

/// A typed reference to a value.
///
/// `Label.id` is a stable identity independent of physical position for the
/// whole lifetime of the optimizer; only the front end (before normalization)
/// and the final jump fix-up use it as a raw instruction index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Operand {
    Identifier { address: usize, name: String },
    Constant { index: usize, display: String },
    Temporary { id: usize, name: String },
    Label { id: usize, name: String },
    None,
}

impl Operand {
    pub fn identifier(address: usize, name: impl Into<String>) -> Operand {
        Operand::Identifier {
            address,
            name: name.into(),
        }
    }

    pub fn constant(index: usize, value: f64) -> Operand {
        Operand::Constant {
            index,
            display: display_number(value),
        }
    }

    pub fn temporary(id: usize) -> Operand {
        Operand::Temporary {
            id,
            name: format!("t{}", id),
        }
    }

    pub fn label(id: usize) -> Operand {
        Operand::Label {
            id,
            name: format!("L{}", id),
        }
    }

    /// The name this operand contributes to the liveness name space.
    /// Identifiers and temporaries share one space; everything else has none.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Operand::Identifier { name, .. } | Operand::Temporary { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn constant_index(&self) -> Option<usize> {
        match self {
            Operand::Constant { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn label_id(&self) -> Option<usize> {
        match self {
            Operand::Label { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Identifier { name, .. } => write!(f, "{}", name),
            Operand::Constant { display, .. } => write!(f, "{}", display),
            Operand::Temporary { name, .. } => write!(f, "{}", name),
            Operand::Label { name, .. } => write!(f, "{}", name),
            Operand::None => write!(f, "-"),
        }
    }
}

/// One three-address instruction: `(op, arg1, arg2, result)`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Quadruple {
    pub op: OpCode,
    pub arg1: Operand,
    pub arg2: Operand,
    pub result: Operand,
}

impl Quadruple {
    pub fn new(op: OpCode, arg1: Operand, arg2: Operand, result: Operand) -> Quadruple {
        Quadruple {
            op,
            arg1,
            arg2,
            result,
        }
    }

    pub fn label(id: usize) -> Quadruple {
        Quadruple {
            op: OpCode::Label,
            arg1: Operand::None,
            arg2: Operand::None,
            result: Operand::label(id),
        }
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.op.mnemonic(),
            self.arg1,
            self.arg2,
            self.result
        )
    }
}

/// Render a number the way the constant table displays it: integral values
/// without a decimal point
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        format!("{}", value)
    }
}
