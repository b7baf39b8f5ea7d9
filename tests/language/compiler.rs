//! Integration tests for the expression compiler
//!
//! Tests instruction emission, capacity limits, and disassembly.

use diceling_language::{Compiler, DEFAULT_CAPACITY, Instruction, compile};

// =============================================================================
// Emission
// =============================================================================

#[test]
fn left_marks_follow_every_left_operand() {
    let program = compile("1+2-3*4").unwrap();
    let marks = program
        .instructions()
        .iter()
        .filter(|i| **i == Instruction::LeftValueMark)
        .count();
    assert_eq!(marks, 3);
}

#[test]
fn every_program_ends_in_halt() {
    for source in ["1", "d", "hp += 2", "`{1}{2}`", "\"text\""] {
        let program = compile(source).unwrap();
        assert_eq!(program.instructions().last(), Some(&Instruction::Halt), "{source}");
    }
}

#[test]
fn identifiers_keep_scope_prefixes_and_unicode() {
    let program = compile("$mLuck + 力量 + $gRound").unwrap();
    let names: Vec<&str> = program
        .instructions()
        .iter()
        .filter_map(|i| match i {
            Instruction::LoadVariable(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["$mLuck", "力量", "$gRound"]);
}

// =============================================================================
// Capacity
// =============================================================================

#[test]
fn small_capacity_overflows_early() {
    let program = Compiler::new().with_capacity(4).compile("1+2+3").unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(program.capacity(), 4);
    let err = program.error().expect("sticky error");
    assert_eq!(err.code(), "E1");
}

#[test]
fn program_that_fits_has_no_error() {
    let source = vec!["1"; 100].join("+");
    let program = compile(&source).unwrap();
    assert!(program.error().is_none());
    assert!(program.len() < DEFAULT_CAPACITY);
}

// =============================================================================
// Disassembly
// =============================================================================

#[test]
fn disassembly_lists_mnemonics() {
    let program = compile("hp = 2d6 + `x{1}`").unwrap();
    assert_eq!(
        program.disassemble(),
        "=== VM Code ===\n\
         push.str hp\n\
         push 2\n\
         push 6\n\
         dice\n\
         mark.left\n\
         push 1\n\
         ld.fs 1\n\
         add\n\
         store\n\
         halt\n\
         === VM Code End===\n"
    );
}
