//! Integration tests for command tokenization
//!
//! Tests whole chat lines as they arrive from a platform.

use diceling_parser::{CommandInvocation, has_command_prefix, tokenize_command};

// =============================================================================
// Helper Functions
// =============================================================================

const PREFIXES: &[&str] = &[".", "。"];
const KEYWORDS: &[&str] = &["r", "rd", "roll", "st", "help"];

fn tokenize(text: &str) -> Option<CommandInvocation> {
    tokenize_command(text, "QQ", PREFIXES, KEYWORDS, true)
}

// =============================================================================
// Keywords and Arguments
// =============================================================================

#[test]
fn glued_and_spaced_dice_commands() {
    let glued = tokenize_command(".rd20", "QQ", &["."], &["r", "rd", "roll"], true).unwrap();
    assert_eq!(glued.command, "rd");
    assert_eq!(glued.args, vec!["20"]);
    assert!(!glued.is_space_before_args);

    let spaced = tokenize_command(".rd 20", "QQ", &["."], &["r", "rd", "roll"], true).unwrap();
    assert_eq!(spaced.command, "rd");
    assert_eq!(spaced.args, vec!["20"]);
    assert!(spaced.is_space_before_args);
}

#[test]
fn roll_with_reason_and_flags() {
    let cmd = tokenize(".r 1d20+5 sneak attack --asm --hidden=false").unwrap();
    assert_eq!(cmd.command, "r");
    assert_eq!(cmd.args, vec!["1d20+5", "sneak", "attack"]);
    assert_eq!(cmd.clean_args, "1d20+5 sneak attack");
    assert_eq!(cmd.suffix_from(2), "sneak attack");

    let asm = cmd.kwarg("asm").unwrap();
    assert!(!asm.value_exists);
    assert!(asm.as_bool);

    let hidden = cmd.kwarg("hidden").unwrap();
    assert!(hidden.value_exists);
    assert_eq!(hidden.value.as_deref(), Some("false"));
    assert!(!hidden.as_bool);
}

#[test]
fn st_subcommand_glued_to_its_argument() {
    let mut cmd = tokenize(".st delhp san").unwrap();
    assert_eq!(cmd.command, "st");
    assert!(cmd.chop_prefix_to_args_with(&["del", "rm"]));
    assert_eq!(cmd.args, vec!["del", "hp", "san"]);
    assert_eq!(cmd.clean_args_chop_rest, "hp san");
    assert!(cmd.is_arg_equal(1, &["DEL"]));
}

#[test]
fn full_width_prefix_and_mixed_case_keyword() {
    let cmd = tokenize("。HELP r").unwrap();
    assert_eq!(cmd.prefix, "。");
    assert_eq!(cmd.command, "help");
    assert_eq!(cmd.arg(1), Some("r"));
}

#[test]
fn chat_lines_are_not_commands() {
    for text in ["hello there", "r 1d6", ".", "  。  ", "", "[CQ:at,qq=1]"] {
        assert!(tokenize(text).is_none(), "{text:?}");
    }
}

// =============================================================================
// Repeat Markers
// =============================================================================

#[test]
fn repeat_marker_requires_the_prefix() {
    assert!(tokenize_command("3#r 1d6", "QQ", &["."], KEYWORDS, true).is_none());

    let cmd = tokenize_command(".3#r 1d6", "QQ", &["."], KEYWORDS, true).unwrap();
    assert_eq!(cmd.special_execute_times, 3);
    assert_eq!(cmd.command, "r");
    assert_eq!(cmd.args, vec!["1d6"]);
}

#[test]
fn rederive_restores_the_marker() {
    let consumed = tokenize(".r 4#1d6").unwrap();
    assert_eq!(consumed.special_execute_times, 4);
    assert_eq!(consumed.clean_args, "1d6");

    let kept = consumed.rederive(false).unwrap();
    assert_eq!(kept.command, consumed.command);
    assert_eq!(kept.special_execute_times, 0);
    assert_eq!(kept.clean_args, "4#1d6");
}

#[test]
fn prefix_check_sees_through_mentions_and_markers() {
    assert!(has_command_prefix("[CQ:at,qq=9] 2#.r d6", "QQ", PREFIXES));
    assert!(!has_command_prefix("2# r d6", "QQ", PREFIXES));
}

// =============================================================================
// Platform Markup
// =============================================================================

#[test]
fn mention_is_recorded_and_removed() {
    let cmd = tokenize_command("[CQ:at,qq=123] .help", "QQ", &["."], &["help"], true).unwrap();
    assert_eq!(cmd.command, "help");
    assert_eq!(cmd.mentions.len(), 1);
    assert_eq!(cmd.mentions[0].as_str(), "QQ:123");
    assert!(!cmd.raw_args.contains("[CQ:"));
    assert!(cmd.args.is_empty());
}

#[test]
fn quoted_reply_does_not_hide_the_command() {
    let cmd = tokenize("[CQ:reply,id=77][CQ:at,qq=5] .r d6").unwrap();
    assert_eq!(cmd.command, "r");
    assert_eq!(cmd.args, vec!["d6"]);
    assert_eq!(cmd.mentions[0].user_id(), "5");
}

#[test]
fn discord_mentions() {
    let cmd = tokenize_command("<@!42> <@7> .roll 2d6", "Discord", PREFIXES, KEYWORDS, true).unwrap();
    let ids: Vec<&str> = cmd.mentions.iter().map(|m| m.user_id()).collect();
    assert_eq!(ids, vec!["42", "7"]);
    assert_eq!(cmd.command, "roll");
    assert_eq!(cmd.args, vec!["2d6"]);
}
