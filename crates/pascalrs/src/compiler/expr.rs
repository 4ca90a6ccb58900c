// Expression compilation
// expression -> term { (+|-) term }, term -> factor { (*|/) factor },
// factor -> name | call | constant | '(' expression ')'

use super::code::{emit, new_temp};
use super::lexer::parse_number;
use super::token::TokenKind;
use super::Compiler;
use crate::ir::{OpCode, Operand};
use crate::symbols::SymbolKind;

pub(crate) fn expression(c: &mut Compiler) -> Result<Operand, String> {
    let mut left = term(c)?;
    loop {
        let op = match c.kind() {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Sub,
            _ => break,
        };
        c.advance();
        let right = term(c)?;
        let result = new_temp(c);
        emit(c, op, left, right, result.clone());
        left = result;
    }
    Ok(left)
}

pub(crate) fn term(c: &mut Compiler) -> Result<Operand, String> {
    let mut left = factor(c)?;
    loop {
        let op = match c.kind() {
            TokenKind::Star => OpCode::Mul,
            TokenKind::Slash => OpCode::Div,
            _ => break,
        };
        c.advance();
        let right = factor(c)?;
        let result = new_temp(c);
        emit(c, op, left, right, result.clone());
        left = result;
    }
    Ok(left)
}

pub(crate) fn factor(c: &mut Compiler) -> Result<Operand, String> {
    match c.kind() {
        TokenKind::Name => {
            let token = c.expect(TokenKind::Name)?;
            let name = c.token_text(&token).to_string();
            if c.check(TokenKind::LeftParen) {
                return call_expression(c, &name);
            }
            let entry = c
                .table
                .lookup(&name)
                .ok_or_else(|| c.error(format!("undeclared identifier '{}'", name)))?;
            if entry.kind != SymbolKind::Variable {
                return Err(c.error(format!("'{}' used as a value", name)));
            }
            Ok(Operand::identifier(entry.address, name))
        }
        TokenKind::Number => {
            let token = c.expect(TokenKind::Number)?;
            let value =
                parse_number(c.token_text(&token)).map_err(|e| c.error(e))?;
            let index = c.table.lookup_or_add_constant(value);
            Ok(Operand::constant(index, value))
        }
        TokenKind::LeftParen => {
            c.advance();
            let inner = expression(c)?;
            c.expect(TokenKind::RightParen)?;
            Ok(inner)
        }
        other => Err(c.error(format!("expected a factor, found {}", other.describe()))),
    }
}

/// `name(arg, ...)` in expression position; the callee must be a function
fn call_expression(c: &mut Compiler, name: &str) -> Result<Operand, String> {
    let entry = c
        .table
        .lookup_callable(name)
        .ok_or_else(|| c.error(format!("undeclared identifier '{}'", name)))?;
    if entry.kind != SymbolKind::Function {
        return Err(c.error(format!("'{}' is not a function", name)));
    }

    let argc = call_arguments(c)?;
    let result = new_temp(c);
    let argc_index = c.table.lookup_or_add_constant(argc as f64);
    emit(
        c,
        OpCode::Call,
        Operand::identifier(0, name),
        Operand::constant(argc_index, argc as f64),
        result.clone(),
    );
    Ok(result)
}

/// Parse `( [expr {, expr}] )`, emitting one PARAM per argument.
/// Returns the argument count.
pub(crate) fn call_arguments(c: &mut Compiler) -> Result<usize, String> {
    c.expect(TokenKind::LeftParen)?;
    let mut argc = 0;
    if !c.check(TokenKind::RightParen) {
        loop {
            let arg = expression(c)?;
            emit(c, OpCode::Param, arg, Operand::None, Operand::None);
            argc += 1;
            if !c.accept(TokenKind::Comma) {
                break;
            }
        }
    }
    c.expect(TokenKind::RightParen)?;
    Ok(argc)
}

pub(crate) fn condition(c: &mut Compiler) -> Result<Operand, String> {
    let left = expression(c)?;
    let op = relational_op(c)?;
    let right = expression(c)?;
    let result = new_temp(c);
    emit(c, op, left, right, result.clone());
    Ok(result)
}

fn relational_op(c: &mut Compiler) -> Result<OpCode, String> {
    let op = match c.kind() {
        TokenKind::Eq => OpCode::Eq,
        TokenKind::Ne => OpCode::Ne,
        TokenKind::Lt => OpCode::Lt,
        TokenKind::Le => OpCode::Le,
        TokenKind::Gt => OpCode::Gt,
        TokenKind::Ge => OpCode::Ge,
        other => {
            return Err(c.error(format!(
                "expected a relational operator, found {}",
                other.describe()
            )));
        }
    };
    c.advance();
    Ok(op)
}
