// Interpreter tests
use super::*;
use crate::ir::display_number;
use crate::vm::ExecError;
use crate::{Compiler, QuadVm};

#[test]
fn test_print_formatting() {
    assert_eq!(display_number(4.0), "4");
    assert_eq!(display_number(-12.0), "-12");
    assert_eq!(display_number(3.5), "3.5");
    assert_eq!(display_number(0.0), "0");
}

#[test]
fn test_arithmetic_and_print() {
    let program = Compiler::compile(
        "program p; var x, y: real;
         begin
           x := 7;
           y := x / 2;
           print(y)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["3.5"]);
}

#[test]
fn test_uninitialized_variables_read_zero() {
    let program = Compiler::compile(
        "program p; var x, y: integer; begin y := x + 1; print(y) end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["1"]);
}

#[test]
fn test_division_by_zero_is_a_runtime_error() {
    let program = Compiler::compile(
        "program p; var x, z: integer; begin x := 1 / z end.",
    )
    .unwrap();
    let err = QuadVm::new().run(&program).unwrap_err();
    assert_eq!(err, ExecError::DivisionByZero);
}

#[test]
fn test_while_loop_executes() {
    let program = Compiler::compile(
        "program p; var i, s: integer;
         begin
           i := 0; s := 0;
           while i < 5 do
           begin
             s := s + i;
             i := i + 1
           end;
           print(s)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["10"]);
    assert_eq!(outcome.globals.get("i"), Some(&5.0));
}

#[test]
fn test_if_else_branches() {
    let program = Compiler::compile(
        "program p; var x: integer;
         begin
           x := 3;
           if x > 2 then print(1) else print(2);
           if x > 5 then print(3) else print(4)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["1", "4"]);
}

#[test]
fn test_procedure_call_binds_parameters() {
    let program = Compiler::compile(
        "program p; var x: integer;
         procedure show(v, w: integer);
         begin
           print(v + w)
         end;
         begin
           x := 2;
           show(x, 5)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["7"]);
}

#[test]
fn test_function_return_value() {
    let program = Compiler::compile(
        "program p; var y: integer;
         function double(v: integer): integer;
         begin
           double := v + v
         end;
         begin
           y := double(4) + 1;
           print(y)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["9"]);
}

#[test]
fn test_procedure_writes_reach_globals() {
    let program = Compiler::compile(
        "program p; var x: integer;
         procedure bump;
         begin
           x := x + 1
         end;
         begin
           x := 10;
           bump();
           bump();
           print(x)
         end.",
    )
    .unwrap();
    let outcome = QuadVm::new().run(&program).unwrap();
    assert_eq!(outcome.output, vec!["12"]);
}

#[test]
fn test_unbounded_recursion_hits_depth_limit() {
    let program = Compiler::compile(
        "program p;
         procedure spin;
         begin
           spin()
         end;
         begin
           spin()
         end.",
    )
    .unwrap();
    let err = QuadVm::new().run(&program).unwrap_err();
    assert_eq!(err, ExecError::CallDepthExceeded);
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let program = Compiler::compile(
        "program p; var x: integer;
         begin
           while 0 < 1 do x := x + 1
         end.",
    )
    .unwrap();
    let mut vm = QuadVm::new();
    vm.max_steps = 1_000;
    let err = vm.run(&program).unwrap_err();
    assert_eq!(err, ExecError::StepLimitExceeded);
}

#[test]
fn test_unknown_procedure_is_a_runtime_error() {
    let mut table = table_with_vars(&["x"]);
    let quads = vec![quad(
        OpCode::Call,
        ident("nowhere"),
        Operand::None,
        Operand::None,
    )];
    let err = QuadVm::new().run_quads(&quads, &mut table, &[]).unwrap_err();
    assert_eq!(err, ExecError::UnknownProcedure);
}
