// Target-code printer tests
use crate::codegen::generate_target;
use crate::{Compiler, optimize_program};

fn lines_for(source: &str) -> Vec<String> {
    let mut program = Compiler::compile(source).unwrap();
    optimize_program(&mut program);
    generate_target(&program.quads, &program.table)
        .into_iter()
        .map(|l| l.code)
        .collect()
}

#[test]
fn test_assignment_lowers_to_load_store() {
    let lines = lines_for("program p; var x: integer; begin x := 5 end.");
    assert_eq!(lines, vec!["LD R0, 5", "ST R0, x"]);
}

#[test]
fn test_arithmetic_lowers_through_accumulator() {
    let lines = lines_for(
        "program p; var a, b, x: integer; begin x := a + b end.",
    );
    assert_eq!(lines, vec!["LD R0, a", "+ R0, b", "ST R0, x"]);
}

#[test]
fn test_jump_targets_backpatched_to_code_lines() {
    let lines = lines_for(
        "program p; var i: integer;
         begin
           i := 0;
           while i < 3 do i := i + 1
         end.",
    );
    // i := 0            -> lines 0..2
    // t := i < 3        -> lines 2..5
    // JPF t             -> line 5, jumps past everything
    // i := i + 1        -> lines 6..9
    // JMP               -> line 9, back to the comparison
    let jpf = lines.iter().find(|l| l.starts_with("FJ")).unwrap();
    assert!(jpf.ends_with(&format!("L{}", lines.len())), "{}", jpf);
    let jmp = lines.iter().find(|l| l.starts_with("JMP")).unwrap();
    assert!(jmp.ends_with("L2"), "{}", jmp);
}

#[test]
fn test_print_emits_out() {
    let lines = lines_for("program p; var x: integer; begin print(x) end.");
    assert_eq!(lines, vec!["LD R0, x", "OUT"]);
}

#[test]
fn test_line_numbers_are_dense() {
    let mut program = Compiler::compile(
        "program p; var a, x: integer; begin x := a; print(x) end.",
    )
    .unwrap();
    optimize_program(&mut program);
    let lines = generate_target(&program.quads, &program.table);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line.line, i);
    }
}
