// Statement compilation
// Control flow is emitted with placeholder jumps backpatched to raw
// instruction indices once the target position is known

use super::code::{backpatch, emit, emit_jump, get_label};
use super::expr::{call_arguments, condition, expression};
use super::token::TokenKind;
use super::{Compiler, ProcChunk};
use crate::ir::{OpCode, Operand};
use crate::symbols::{SymbolKind, TypeKind};

/// program -> 'program' IDENT ';' block '.'
pub(crate) fn program(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::Program)?;
    c.expect(TokenKind::Name)?;
    c.expect(TokenKind::Semicolon)?;
    block(c)?;
    c.expect(TokenKind::Dot)?;
    c.expect(TokenKind::Eof)?;
    Ok(())
}

/// block -> [var-decls] {proc-decl} compound
fn block(c: &mut Compiler) -> Result<(), String> {
    c.table.enter_scope();
    if c.check(TokenKind::Var) {
        var_declarations(c)?;
    }
    while c.check(TokenKind::Procedure) || c.check(TokenKind::Function) {
        proc_declaration(c)?;
    }
    compound_statement(c)?;
    c.table.exit_scope();
    Ok(())
}

/// var-decls -> 'var' { ident-list ':' type ';' }
fn var_declarations(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::Var)?;
    while c.check(TokenKind::Name) {
        let names = identifier_list(c)?;
        c.expect(TokenKind::Colon)?;
        let ty = type_spec(c)?;
        c.expect(TokenKind::Semicolon)?;
        for name in names {
            declare_variable(c, &name, ty)?;
        }
    }
    Ok(())
}

fn identifier_list(c: &mut Compiler) -> Result<Vec<String>, String> {
    let mut names = Vec::new();
    let token = c.expect(TokenKind::Name)?;
    names.push(c.token_text(&token).to_string());
    while c.accept(TokenKind::Comma) {
        let token = c.expect(TokenKind::Name)?;
        names.push(c.token_text(&token).to_string());
    }
    Ok(names)
}

fn type_spec(c: &mut Compiler) -> Result<TypeKind, String> {
    match c.kind() {
        TokenKind::Integer => {
            c.advance();
            Ok(TypeKind::Integer)
        }
        TokenKind::Real => {
            c.advance();
            Ok(TypeKind::Real)
        }
        other => Err(c.error(format!("expected a type name, found {}", other.describe()))),
    }
}

fn declare_variable(c: &mut Compiler, name: &str, ty: TypeKind) -> Result<(), String> {
    if c.table.declare(name, SymbolKind::Variable, ty).is_none() {
        return Err(c.error(format!("redefinition of '{}'", name)));
    }
    Ok(())
}

/// proc-decl -> ('procedure' IDENT [params] | 'function' IDENT [params] ':' type) ';' block ';'
///
/// The body is compiled into its own chunk; `CALL` reaches it by name, so a
/// chunk's instruction indices never leak across sequence boundaries.
fn proc_declaration(c: &mut Compiler) -> Result<(), String> {
    let is_function = c.check(TokenKind::Function);
    c.advance();
    let name_token = c.expect(TokenKind::Name)?;
    let name = c.token_text(&name_token).to_string();

    let kind = if is_function {
        SymbolKind::Function
    } else {
        SymbolKind::Procedure
    };
    // Declared before the body so the chunk can call itself
    if c.table.declare(&name, kind, TypeKind::Real).is_none() {
        return Err(c.error(format!("redefinition of '{}'", name)));
    }

    c.table.enter_scope();
    let mut params = Vec::new();
    if c.check(TokenKind::LeftParen) {
        c.advance();
        loop {
            let names = identifier_list(c)?;
            c.expect(TokenKind::Colon)?;
            let ty = type_spec(c)?;
            for param in names {
                declare_variable(c, &param, ty)?;
                params.push(param);
            }
            if !c.accept(TokenKind::Semicolon) {
                break;
            }
        }
        c.expect(TokenKind::RightParen)?;
    }

    let result_ty = if is_function {
        c.expect(TokenKind::Colon)?;
        let ty = type_spec(c)?;
        // Pascal style: the function returns whatever was last assigned to
        // a variable spelled like the function itself
        declare_variable(c, &name, ty)?;
        Some(ty)
    } else {
        None
    };
    c.expect(TokenKind::Semicolon)?;

    let saved_out = std::mem::take(&mut c.out);
    let saved_temps = c.temp_counter;
    c.temp_counter = 0;

    block(c)?;

    if result_ty.is_some() {
        let entry = c
            .table
            .lookup(&name)
            .ok_or_else(|| c.error(format!("undeclared identifier '{}'", name)))?;
        let result_var = Operand::identifier(entry.address, name.clone());
        emit(c, OpCode::Return, result_var, Operand::None, Operand::None);
    }

    let body = std::mem::replace(&mut c.out, saved_out);
    c.temp_counter = saved_temps;
    c.table.exit_scope();
    c.expect(TokenKind::Semicolon)?;

    c.procs.push(ProcChunk {
        name,
        params,
        quads: body,
        returns_value: is_function,
    });
    Ok(())
}

/// compound -> 'begin' stmt-list 'end'
fn compound_statement(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::Begin)?;
    statement_list(c)?;
    c.expect(TokenKind::End)?;
    Ok(())
}

fn statement_list(c: &mut Compiler) -> Result<(), String> {
    statement(c)?;
    while c.accept(TokenKind::Semicolon) {
        if c.check(TokenKind::End) {
            break;
        }
        statement(c)?;
    }
    Ok(())
}

fn statement(c: &mut Compiler) -> Result<(), String> {
    match c.kind() {
        TokenKind::Name => name_statement(c),
        TokenKind::If => if_statement(c),
        TokenKind::While => while_statement(c),
        TokenKind::Begin => compound_statement(c),
        TokenKind::Print => print_statement(c),
        other => Err(c.error(format!("expected a statement, found {}", other.describe()))),
    }
}

/// Either an assignment or a procedure call, disambiguated by the token
/// after the name
fn name_statement(c: &mut Compiler) -> Result<(), String> {
    let token = c.expect(TokenKind::Name)?;
    let name = c.token_text(&token).to_string();
    if c.check(TokenKind::LeftParen) {
        return call_statement(c, &name);
    }
    assignment_statement(c, &name)
}

fn assignment_statement(c: &mut Compiler, name: &str) -> Result<(), String> {
    let entry = c
        .table
        .lookup(name)
        .ok_or_else(|| c.error(format!("undeclared identifier '{}'", name)))?;
    if entry.kind != SymbolKind::Variable {
        return Err(c.error(format!("cannot assign to '{}'", name)));
    }
    let left = Operand::identifier(entry.address, name);

    c.expect(TokenKind::Assign)?;
    let right = expression(c)?;

    // Emission-time peephole: when the expression just produced a dying
    // temporary, rewrite the producing instruction instead of copying it.
    // Constant arithmetic folds on the spot; a plain copy chain retargets.
    enum Peep {
        Fold(f64),
        Retarget,
    }
    if let Operand::Temporary { name: temp, .. } = &right {
        let peep = match c.out.last() {
            Some(last) if last.result.var_name() == Some(temp.as_str()) => {
                if last.op.is_arith() {
                    match (last.arg1.constant_index(), last.arg2.constant_index()) {
                        (Some(i1), Some(i2)) => {
                            fold_values(c, last.op, i1, i2).map(Peep::Fold)
                        }
                        _ => None,
                    }
                } else if last.op == OpCode::Assign {
                    Some(Peep::Retarget)
                } else {
                    None
                }
            }
            _ => None,
        };

        match peep {
            Some(Peep::Fold(folded)) => {
                let index = c.table.lookup_or_add_constant(folded);
                if let Some(quad) = c.out.last_mut() {
                    quad.op = OpCode::Assign;
                    quad.arg1 = Operand::constant(index, folded);
                    quad.arg2 = Operand::None;
                    quad.result = left;
                }
                return Ok(());
            }
            Some(Peep::Retarget) => {
                if let Some(quad) = c.out.last_mut() {
                    quad.result = left;
                }
                return Ok(());
            }
            None => {}
        }
    }

    emit(c, OpCode::Assign, right, Operand::None, left);
    Ok(())
}

/// Constant values for a fold, if both indices are in range and the fold is
/// allowed (division by exact zero stays a runtime concern)
fn fold_values(c: &Compiler, op: OpCode, i1: usize, i2: usize) -> Option<f64> {
    let v1 = c.table.constant(i1)?;
    let v2 = c.table.constant(i2)?;
    match op {
        OpCode::Add => Some(v1 + v2),
        OpCode::Sub => Some(v1 - v2),
        OpCode::Mul => Some(v1 * v2),
        OpCode::Div if v2 != 0.0 => Some(v1 / v2),
        _ => None,
    }
}

fn if_statement(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::If)?;
    let cond = condition(c)?;
    c.expect(TokenKind::Then)?;

    let false_jump = emit_jump(c, OpCode::JumpIfFalse, cond);
    statement(c)?;

    if c.accept(TokenKind::Else) {
        let exit_jump = emit_jump(c, OpCode::Jump, Operand::None);
        let else_start = get_label(c);
        backpatch(c, false_jump, else_start);
        statement(c)?;
        let after = get_label(c);
        backpatch(c, exit_jump, after);
    } else {
        let after = get_label(c);
        backpatch(c, false_jump, after);
    }
    Ok(())
}

fn while_statement(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::While)?;
    let loop_start = get_label(c);
    let cond = condition(c)?;
    c.expect(TokenKind::Do)?;

    let false_jump = emit_jump(c, OpCode::JumpIfFalse, cond);
    statement(c)?;

    let back_jump = emit_jump(c, OpCode::Jump, Operand::None);
    backpatch(c, back_jump, loop_start);
    let after = get_label(c);
    backpatch(c, false_jump, after);
    Ok(())
}

fn print_statement(c: &mut Compiler) -> Result<(), String> {
    c.expect(TokenKind::Print)?;
    c.expect(TokenKind::LeftParen)?;
    let value = expression(c)?;
    c.expect(TokenKind::RightParen)?;
    emit(c, OpCode::Print, value, Operand::None, Operand::None);
    Ok(())
}

/// `name(args)` in statement position; a function's return value is discarded
fn call_statement(c: &mut Compiler, name: &str) -> Result<(), String> {
    if c.table.lookup_callable(name).is_none() {
        if c.table.lookup(name).is_some() {
            return Err(c.error(format!("'{}' is not callable", name)));
        }
        return Err(c.error(format!("undeclared identifier '{}'", name)));
    }

    let argc = call_arguments(c)?;
    let argc_index = c.table.lookup_or_add_constant(argc as f64);
    emit(
        c,
        OpCode::Call,
        Operand::identifier(0, name),
        Operand::constant(argc_index, argc as f64),
        Operand::None,
    );
    Ok(())
}
