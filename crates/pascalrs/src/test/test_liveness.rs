// CFG construction and liveness dataflow tests
use super::*;
use crate::optimizer::{build_basic_blocks, compute_def_use, compute_liveness, normalize_labels};

/// A counting loop:
///   0: t0 := i < 10
///   1: JPF t0 -> 5
///   2: x := x + 1
///   3: i := i + 1
///   4: JUMP -> 0
fn loop_sequence() -> (Vec<crate::ir::Quadruple>, crate::symbols::SymbolTable) {
    let mut table = table_with_vars(&["i", "x"]);
    let ten = konst(&mut table, 10.0);
    let one = konst(&mut table, 1.0);
    let quads = vec![
        quad(OpCode::Lt, ident("i"), ten, temp(0)),
        jump_if_false(temp(0), 5),
        quad(OpCode::Add, ident("x"), one.clone(), ident("x")),
        quad(OpCode::Add, ident("i"), one, ident("i")),
        jump_to(0),
    ];
    (quads, table)
}

#[test]
fn test_block_partition_and_edges() {
    let (quads, _table) = loop_sequence();
    let labeled = normalize_labels(&quads);
    let blocks = build_basic_blocks(&labeled);

    // [L0, t0 := i < 10, JPF] / [x := x+1, i := i+1, JUMP] / [L1]
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].quads.len(), 3);
    assert_eq!(blocks[1].quads.len(), 3);
    assert_eq!(blocks[2].quads.len(), 1);

    // Conditional: fall-through plus target; back edge closes the loop
    assert!(blocks[0].successors.contains(&1));
    assert!(blocks[0].successors.contains(&2));
    assert!(blocks[1].successors.contains(&0));
    assert!(blocks[2].successors.is_empty());

    // Edges are mutual
    assert!(blocks[0].predecessors.contains(&1));
    assert!(blocks[1].predecessors.contains(&0));
    assert!(blocks[2].predecessors.contains(&0));
}

#[test]
fn test_def_use_first_use_before_def() {
    let (quads, table) = loop_sequence();
    let labeled = normalize_labels(&quads);
    let mut blocks = build_basic_blocks(&labeled);
    compute_def_use(&mut blocks, &table);

    // Head block reads i, then defines t0 and reads it afterwards: t0 is
    // def-only, i is use-only
    assert!(blocks[0].uses.contains("i"));
    assert!(!blocks[0].uses.contains("t0"));
    assert!(blocks[0].defs.contains("t0"));

    // Body reads and writes both x and i
    assert!(blocks[1].uses.contains("x"));
    assert!(blocks[1].uses.contains("i"));
    assert!(blocks[1].defs.contains("x"));
    assert!(blocks[1].defs.contains("i"));
}

#[test]
fn test_liveness_fixpoint_solution() {
    let (quads, table) = loop_sequence();
    let labeled = normalize_labels(&quads);
    let mut blocks = build_basic_blocks(&labeled);
    compute_def_use(&mut blocks, &table);
    compute_liveness(&mut blocks, &table);

    // Exit liveness is seeded with every declared symbol
    assert!(blocks[2].live_out.contains("i"));
    assert!(blocks[2].live_out.contains("x"));

    // Both variables circulate through the loop
    assert!(blocks[0].live_in.contains("i"));
    assert!(blocks[0].live_in.contains("x"));
    // The condition temporary never crosses a block boundary
    assert!(!blocks[0].live_in.contains("t0"));
    assert!(!blocks[1].live_out.contains("t0"));
}

#[test]
fn test_dataflow_equations_hold() {
    let (quads, table) = loop_sequence();
    let labeled = normalize_labels(&quads);
    let mut blocks = build_basic_blocks(&labeled);
    compute_def_use(&mut blocks, &table);
    compute_liveness(&mut blocks, &table);

    for (i, block) in blocks.iter().enumerate() {
        // use(B) is a subset of live_in(B)
        for name in &block.uses {
            assert!(block.live_in.contains(name), "use ⊄ live_in in block {}", i);
        }
        // live_in(B) covers live_out(B) − def(B)
        for name in &block.live_out {
            if !block.defs.contains(name) {
                assert!(
                    block.live_in.contains(name),
                    "live_out − def ⊄ live_in in block {}",
                    i
                );
            }
        }
        // live_out(B) is exactly the union of successors' live_in
        if !block.successors.is_empty() {
            for s in &block.successors {
                for name in &blocks[*s].live_in {
                    assert!(
                        block.live_out.contains(name),
                        "missing successor live-in in block {}",
                        i
                    );
                }
            }
        }
    }
}

#[test]
fn test_unresolvable_jump_target_keeps_other_edges() {
    let mut table = table_with_vars(&["x"]);
    let one = konst(&mut table, 1.0);
    // The conditional's target line never gets a label because we skip
    // normalization and hand it a dangling label id instead
    let quads = vec![
        quad(
            OpCode::JumpIfFalse,
            ident("x"),
            Operand::None,
            Operand::label(99),
        ),
        quad(OpCode::Assign, one, Operand::None, ident("x")),
    ];
    let blocks = build_basic_blocks(&quads);

    assert_eq!(blocks.len(), 2);
    // The broken edge is omitted; the fall-through edge survives
    assert_eq!(blocks[0].successors.len(), 1);
    assert!(blocks[0].successors.contains(&1));
}
