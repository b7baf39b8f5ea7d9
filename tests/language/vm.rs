//! Integration tests for evaluation
//!
//! Tests compile-and-run behavior, variables, limits, and dice ranges.

use diceling_foundation::{ComputedValue, Value};
use diceling_language::{
    Compiler, MapContext, RngDice, ScriptedDice, VariableContext, Vm, compile, eval,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Helper Functions
// =============================================================================

fn scripted(faces: &[i64]) -> Vm<ScriptedDice> {
    Vm::with_dice(ScriptedDice::new(faces.to_vec()))
}

// =============================================================================
// Values and Traces
// =============================================================================

#[test]
fn eval_reports_value_and_trace() {
    let result = eval("3+2").unwrap();
    assert_eq!(result.value, Value::Int(5));
    assert_eq!(result.trace, "3 + 2");
}

#[test]
fn chained_trace_accumulates_left() {
    let result = eval("1+2+3").unwrap();
    assert_eq!(result.value, Value::Int(6));
    assert_eq!(result.trace, "1 + 2 + 3");
}

#[test]
fn roll_then_constant() {
    let mut vm = scripted(&[4]);
    let result = vm.eval_source("1d6+2", &mut MapContext::new()).unwrap();
    assert_eq!(result.value, Value::Int(6));
    assert_eq!(result.trace, "4[1d6=4] + 2");
}

#[test]
fn lone_dice_leave_no_trace() {
    let mut vm = scripted(&[13]);
    let result = vm.eval_source("1d20", &mut MapContext::new()).unwrap();
    assert_eq!(result.value, Value::Int(13));
    assert!(result.trace.is_empty());
}

#[test]
fn same_seed_same_rolls() {
    let first = Vm::seeded(42)
        .eval_source("10d100", &mut MapContext::new())
        .unwrap();
    let second = Vm::seeded(42)
        .eval_source("10d100", &mut MapContext::new())
        .unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Variables
// =============================================================================

#[test]
fn assignments_persist_across_evaluations() {
    let mut vm = Vm::seeded(3);
    let mut ctx = MapContext::new();
    vm.eval_source("hp = 10", &mut ctx).unwrap();
    vm.eval_source("hp -= 3", &mut ctx).unwrap();
    let result = vm.eval_source("hp", &mut ctx).unwrap();
    assert_eq!(result.value, Value::Int(7));
}

#[test]
fn computed_values_expand_on_read() {
    let mut vm = Vm::seeded(3);
    let mut ctx = MapContext::new().with(
        "dodge",
        ComputedValue::new(Value::Int(30), "$tVal / 2"),
    );
    let result = vm.eval_source("dodge + 1", &mut ctx).unwrap();
    assert_eq!(result.value, Value::Int(16));
    // The stored base is untouched.
    assert!(matches!(ctx.get("dodge"), Some(Value::Computed(_))));
}

#[test]
fn substituted_text_is_not_searched_again() {
    let mut vm = Vm::seeded(3);
    let mut ctx = MapContext::new().with("a", "{b}").with("b", 2_i64);
    let result = vm.eval_source("`{a} and {b}`", &mut ctx).unwrap();
    assert_eq!(result.value, Value::from("{b} and 2"));
}

#[test]
fn undefined_names_become_sentinels_in_text() {
    let result = eval("`hi {who}`").unwrap();
    assert_eq!(result.value, Value::from("hi <%undefined-who%>"));
}

// =============================================================================
// Errors and Limits
// =============================================================================

#[test]
fn malformed_source_is_e2() {
    for source in ["1+", "(1", "2 3", "*4", ""] {
        let err = eval(source).unwrap_err();
        assert_eq!(err.code(), "E2", "{source}");
    }
}

#[test]
fn oversized_program_is_rejected_before_running() {
    let mut vm = Vm::seeded(1).with_compiler(Compiler::new().with_capacity(8));
    let mut ctx = MapContext::new();
    let err = vm.eval_source("hp = 1+1+1+1", &mut ctx).unwrap_err();
    assert_eq!(err.code(), "E1");
    assert_eq!(ctx.get("hp"), None);
}

#[test]
fn default_dice_budget() {
    assert_eq!(eval("30000d1").unwrap().value, Value::Int(30_000));
    assert_eq!(eval("30001d1").unwrap_err().code(), "E5");
}

#[test]
fn integer_overflow_is_e4() {
    assert_eq!(eval("9223372036854775807 + 1").unwrap_err().code(), "E4");
    assert_eq!(eval("1 / 0").unwrap_err().code(), "E4");
}

#[test]
fn compiled_program_is_reusable() {
    let program = compile("2d6").unwrap();
    let mut vm = scripted(&[1, 2, 3, 4]);
    let mut ctx = MapContext::new();
    assert_eq!(vm.evaluate(&program, &mut ctx).unwrap().value, Value::Int(3));
    assert_eq!(vm.evaluate(&program, &mut ctx).unwrap().value, Value::Int(7));
}

#[test]
fn one_sided_dice_always_roll_their_count() {
    let program = compile("7d1").unwrap();
    let mut vm = Vm::seeded(11);
    let mut ctx = MapContext::new();
    for _ in 0..10_000 {
        assert_eq!(vm.evaluate(&program, &mut ctx).unwrap().value, Value::Int(7));
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn dice_sums_stay_in_range(count in 1i64..20, sides in 1i64..100, seed in any::<u64>()) {
        let dice = RngDice::new(ChaCha8Rng::seed_from_u64(seed));
        let mut vm = Vm::with_dice(dice);
        let result = vm
            .eval_source(&format!("{count}d{sides}"), &mut MapContext::new())
            .unwrap();
        let Value::Int(sum) = result.value else {
            panic!("dice produce integers");
        };
        prop_assert!(sum >= count && sum <= count * sides);
    }
}
