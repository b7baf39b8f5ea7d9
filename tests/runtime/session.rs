//! Integration tests for message handling
//!
//! Tests whole conversations through a session with scripted dice.

use diceling_foundation::Value;
use diceling_language::ScriptedDice;
use diceling_runtime::{BotConfig, Message, Seat, Session};

// =============================================================================
// Helper Functions
// =============================================================================

const TABLE: &str = "QQ-Group:100";

fn session_with(config: BotConfig, faces: &[i64]) -> Session<ScriptedDice> {
    Session::with_dice(config.with_seed(9), ScriptedDice::new(faces.to_vec()))
}

fn session(faces: &[i64]) -> Session<ScriptedDice> {
    session_with(BotConfig::default(), faces)
}

fn alice(text: &str) -> Message {
    Message::new(text).from_sender("QQ:1", "Alice").in_group(TABLE)
}

fn bob(text: &str) -> Message {
    Message::new(text).from_sender("QQ:2", "Bob").in_group(TABLE)
}

fn reply(session: &mut Session<ScriptedDice>, message: &Message) -> String {
    session.handle(message).unwrap_or_default()
}

// =============================================================================
// Conversations
// =============================================================================

#[test]
fn character_sheet_then_checks() {
    let mut s = session(&[15]);
    assert_eq!(
        reply(&mut s, &alice(".st str60 dex50")),
        "<Alice> recorded str=60 dex=50"
    );
    assert_eq!(
        reply(&mut s, &alice(".r 1d20+str")),
        "<Alice> rolled 1d20+str=15[1d20=15] + 60[str=60]=75"
    );
    // Bob has no sheet at this table.
    assert_eq!(
        reply(&mut s, &bob(".r str")),
        "For str, <Bob> rolled D100=15"
    );
}

#[test]
fn mentions_and_full_width_prefix() {
    let mut s = session(&[4]);
    assert_eq!(
        reply(&mut s, &alice("[CQ:at,qq=12345] 。r d6")),
        "<Alice> rolled d6=4"
    );
}

#[test]
fn player_globals_cross_tables() {
    let mut s = session(&[1]);
    assert_eq!(
        reply(&mut s, &alice(".r $mGold=25")),
        "<Alice> rolled $mGold=25=25"
    );
    let elsewhere = alice("").in_group("QQ-Group:200");
    let gold = s.evaluate("$mGold", &elsewhere).unwrap();
    assert_eq!(gold.value, Value::Int(25));
}

#[test]
fn private_messages_have_their_own_sheet() {
    let mut s = session(&[1]);
    let private = Message::new(".st hp9").from_sender("QQ:1", "Alice");
    assert_eq!(reply(&mut s, &private), "<Alice> recorded hp=9");
    assert_eq!(
        reply(&mut s, &alice(".st show")),
        "<Alice> has no attributes yet"
    );
}

#[test]
fn bound_card_receives_attributes() {
    let mut s = session(&[1]);
    s.store_mut().bind_card(Seat::new(TABLE, "QQ:1"), "Harvey");
    reply(&mut s, &alice(".st san45"));
    assert_eq!(
        s.store().card_value("QQ:1", "Harvey", "san"),
        Some(&Value::Int(45))
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn custom_prefix_replaces_defaults() {
    let mut s = session_with(BotConfig::default().with_prefixes(["!"]), &[2]);
    assert_eq!(reply(&mut s, &alice("!r d6")), "<Alice> rolled d6=2");
    assert_eq!(s.handle(&alice(".r d6")), None);
}

#[test]
fn default_die_follows_configuration() {
    let mut s = session_with(BotConfig::default().with_default_dice_sides(20), &[99]);
    assert_eq!(reply(&mut s, &alice(".r")), "<Alice> rolled D20=20");
}

#[test]
fn limits_come_from_configuration() {
    let mut s = session_with(
        BotConfig::default()
            .with_dice_budget(5)
            .with_program_capacity(6),
        &[1],
    );
    assert!(reply(&mut s, &alice(".r 10d6")).starts_with("<Alice> could not roll: E5:"));
    assert!(reply(&mut s, &alice(".r 1+1+1+1")).starts_with("<Alice> could not roll: E1:"));
}

#[test]
fn repeat_limit_from_configuration() {
    let mut s = session_with(BotConfig::default().with_max_repeat(2), &[3]);
    assert!(reply(&mut s, &alice(".2#r d6")).starts_with("<Alice> rolled 2 times:"));
    assert!(reply(&mut s, &alice(".3#r d6")).contains("Diceling"));
}

// =============================================================================
// Templates
// =============================================================================

#[test]
fn reply_templates_can_be_replaced() {
    let mut s = session(&[6]);
    s.templates_mut()
        .set("core:roll", [("{core:botName} saw {$tPlayer} roll {$tResultText}", 1)]);
    assert_eq!(
        reply(&mut s, &alice(".r d6")),
        "Diceling saw Alice roll d6=6"
    );
}

#[test]
fn braces_in_reasons_are_not_evaluated() {
    let mut s = session(&[5]);
    assert_eq!(
        reply(&mut s, &alice(".r d6 {$tPlayer}")),
        "For {$tPlayer}, <Alice> rolled d6=5"
    );
}
