//! Integration tests for tiered variables
//!
//! Tests the store, aliases, cards and fallbacks through the VM.

use diceling_foundation::Value;
use diceling_language::{MapContext, VariableContext, Vm};
use diceling_runtime::{
    AliasTable, ScopeTier, ScopedVariables, Seat, TextTemplates, VarMap, VariableStore,
};

// =============================================================================
// Helper Functions
// =============================================================================

const ALICE: &str = "QQ:1";
const TABLE_A: &str = "QQ-Group:100";
const TABLE_B: &str = "QQ-Group:200";

/// Evaluates `source` for `seat` against `store`, returning the value.
fn eval_at(store: &mut VariableStore, seat: Seat<'_>, source: &str) -> Value {
    let mut transient = VarMap::new();
    let aliases = AliasTable::new().with("hp", ["HitPoints", "生命"]);
    let mut templates = TextTemplates::seeded(5);
    let mut ctx = store.scoped(seat, &mut transient, &aliases, &mut templates);
    Vm::seeded(5).eval_source(source, &mut ctx).unwrap().value
}

fn value(vm: &mut Vm, ctx: &mut ScopedVariables<'_>, source: &str) -> Value {
    vm.eval_source(source, ctx).unwrap().value
}

// =============================================================================
// Tier Routing
// =============================================================================

#[test]
fn prefixes_pick_the_tier() {
    for (name, tier) in [
        ("$tTemp", ScopeTier::Transient),
        ("$mGold", ScopeTier::PlayerGlobal),
        ("$gRound", ScopeTier::GroupGlobal),
        ("hp", ScopeTier::PlayerInGroup),
        ("tHp", ScopeTier::PlayerInGroup),
    ] {
        assert_eq!(ScopeTier::of(name), tier, "{name}");
    }
}

#[test]
fn writes_land_in_their_tier() {
    let mut store = VariableStore::new();
    let seat = Seat::new(TABLE_A, ALICE);
    eval_at(&mut store, seat, "$mGold = 30");
    eval_at(&mut store, seat, "$gRound = 2");
    eval_at(&mut store, seat, "hp = 11");
    eval_at(&mut store, seat, "$tScratch = 1");

    assert_eq!(store.player(ALICE).unwrap().get("$mGold"), Some(&Value::Int(30)));
    assert_eq!(store.group(TABLE_A).unwrap().get("$gRound"), Some(&Value::Int(2)));
    assert_eq!(store.local(seat).unwrap().get("hp"), Some(&Value::Int(11)));
    assert_eq!(store.local(seat).unwrap().len(), 1);
}

#[test]
fn player_tier_follows_the_player_between_groups() {
    let mut store = VariableStore::new();
    eval_at(&mut store, Seat::new(TABLE_A, ALICE), "$mGold = 30");
    eval_at(&mut store, Seat::new(TABLE_A, ALICE), "hp = 11");

    let other = Seat::new(TABLE_B, ALICE);
    assert_eq!(eval_at(&mut store, other, "$mGold"), Value::Int(30));
    assert_eq!(eval_at(&mut store, other, "hp"), Value::from("<%undefined-hp%>"));
}

#[test]
fn group_tier_is_shared_by_players() {
    let mut store = VariableStore::new();
    eval_at(&mut store, Seat::new(TABLE_A, ALICE), "$gRound = 3");
    let bob = Seat::new(TABLE_A, "QQ:2");
    assert_eq!(eval_at(&mut store, bob, "$gRound += 1"), Value::Int(4));
}

#[test]
fn delete_dispatches_like_reads() {
    let mut transient = VarMap::new();
    let mut player = VarMap::new();
    let mut group = VarMap::new();
    let mut local = VarMap::new();
    let aliases = AliasTable::new().with("hp", ["HitPoints"]);
    {
        let mut ctx =
            ScopedVariables::new(&mut transient, &mut player, &mut group, &mut local)
                .with_aliases(&aliases);
        ctx.set("HITPOINTS", Value::Int(9));
        ctx.set("$gRound", Value::Int(1));
        assert_eq!(ctx.delete("hitpoints"), Some(Value::Int(9)));
        assert_eq!(ctx.delete("$gRound"), Some(Value::Int(1)));
        assert_eq!(ctx.delete("$gRound"), None);
    }
    assert!(local.is_empty());
    assert!(group.is_empty());
}

// =============================================================================
// Aliases
// =============================================================================

#[test]
fn aliases_apply_to_unprefixed_names_only() {
    let mut store = VariableStore::new();
    let seat = Seat::new(TABLE_A, ALICE);
    eval_at(&mut store, seat, "生命 = 8");
    eval_at(&mut store, seat, "$mHitPoints = 1");

    assert_eq!(eval_at(&mut store, seat, "HP"), Value::Int(8));
    assert!(store.local(seat).unwrap().contains_key("hp"));
    assert!(store.player(ALICE).unwrap().contains_key("$mHitPoints"));
}

// =============================================================================
// Character Cards
// =============================================================================

#[test]
fn bound_card_replaces_the_seat_map() {
    let mut store = VariableStore::new();
    let seat = Seat::new(TABLE_A, ALICE);
    eval_at(&mut store, seat, "hp = 5");

    store.bind_card(seat, "Investigator");
    assert_eq!(store.bound_card(seat), Some("Investigator"));
    eval_at(&mut store, seat, "hp = 12");
    assert_eq!(
        store.card_value(ALICE, "Investigator", "hp"),
        Some(&Value::Int(12))
    );

    // The same card at another table sees the same attributes.
    let elsewhere = Seat::new(TABLE_B, ALICE);
    store.bind_card(elsewhere, "Investigator");
    assert_eq!(eval_at(&mut store, elsewhere, "hp"), Value::Int(12));

    assert_eq!(store.unbind_card(seat).as_deref(), Some("Investigator"));
    assert_eq!(eval_at(&mut store, seat, "hp"), Value::Int(5));
}

// =============================================================================
// Fallbacks
// =============================================================================

#[test]
fn legacy_integers_then_templates_then_sentinel() {
    let mut store = VariableStore::new();
    store.set_legacy_int(ALICE, "oldLuck", 40);
    let seat = Seat::new(TABLE_A, ALICE);

    let mut transient = VarMap::new();
    transient.insert("$tName".to_string(), Value::from("Ada"));
    let aliases = AliasTable::new();
    let mut templates = TextTemplates::seeded(1).with("greeting", [("hello {$tName}", 1)]);
    let mut ctx = store.scoped(seat, &mut transient, &aliases, &mut templates);
    let mut vm = Vm::seeded(1);

    assert_eq!(value(&mut vm, &mut ctx, "oldLuck + 1"), Value::Int(41));
    assert_eq!(value(&mut vm, &mut ctx, "greeting"), Value::from("hello Ada"));
    assert_eq!(value(&mut vm, &mut ctx, "nothing"), Value::from("<%undefined-nothing%>"));
}

#[test]
fn stored_values_win_over_fallbacks() {
    let mut ctx = MapContext::new().with("greeting", "stored");
    let mut vm = Vm::seeded(1);
    let value = vm.eval_source("greeting", &mut ctx).unwrap().value;
    assert_eq!(value, Value::from("stored"));
}
