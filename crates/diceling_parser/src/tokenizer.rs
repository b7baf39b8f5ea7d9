//! Chat line to [`CommandInvocation`].
//!
//! The pipeline, in order:
//!
//! 1. normalise `\r\n` and drop `[CQ:reply,...]` quote markers;
//! 2. strip mentions for the platform and trim;
//! 3. optionally consume the first `N#` (or `N＃`) repeat marker;
//! 4. match a prefix, strip it and trim;
//! 5. apply legacy rewrites, then match the longest keyword;
//! 6. split off the command and tokenize the tail into positional and
//!    keyword arguments.
//!
//! Text that fails any matching step is simply not a command.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::command::{CommandInvocation, KeywordArgument, strip_prefix_ignore_case};
use crate::mention::{Mention, extract_mentions};
use crate::microcode::strip_cq_kind;

static REPEAT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+?[#＃]").expect("Invalid Regex"));
static COMMAND_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S+)\s*([^\n]*)").expect("Invalid Regex"));

/// Multi-word spellings folded into a single keyword before matching.
const LEGACY_REWRITES: &[(&str, &str)] = &[("bot list", "botlist")];

/// Tokenizes one chat message.
///
/// `keywords` are the currently recognised command words; the longest
/// one that prefixes the text (ignoring case) wins, ties going to the
/// earlier entry. Returns `None` if no prefix matches or nothing follows
/// the prefix.
#[must_use]
pub fn tokenize_command<P, K>(
    text: &str,
    platform: &str,
    prefixes: &[P],
    keywords: &[K],
    consume_repeat: bool,
) -> Option<CommandInvocation>
where
    P: AsRef<str>,
    K: AsRef<str>,
{
    let (mut rest, mentions) = normalize(text, platform);

    let mut times = 0;
    if consume_repeat {
        (rest, times) = take_repeat_marker(&rest);
    }

    let prefix = prefixes
        .iter()
        .map(AsRef::as_ref)
        .find(|p| !p.is_empty() && rest.starts_with(p))?;
    let rest = apply_legacy_rewrites(rest[prefix.len()..].trim());

    // One space is always inserted after a matched keyword; whether the
    // user typed one is remembered separately.
    let matched = longest_keyword(&rest, keywords).map(|(keyword, tail)| {
        (
            format!("{keyword} {tail}"),
            tail.starts_with(char::is_whitespace),
        )
    });
    let (body, keyword_space) = match matched {
        Some((body, spaced)) => (body, Some(spaced)),
        None => (rest, None),
    };

    let caps = COMMAND_SPLIT.captures(&body)?;
    let command = caps[1].to_string();
    let raw_args = caps[2].to_string();
    let is_space_before_args = keyword_space.unwrap_or_else(|| {
        body.trim_start()[command.len()..].starts_with(char::is_whitespace)
    });

    let (args, kwargs) = split_args(&raw_args);
    let clean_args = args.join(" ").trim().to_string();

    trace!(
        command = %command,
        times,
        args = args.len(),
        kwargs = kwargs.len(),
        "tokenized command"
    );

    Some(CommandInvocation {
        command,
        args,
        kwargs,
        mentions,
        raw_args,
        raw_text: text.to_string(),
        prefix: prefix.to_string(),
        platform: platform.to_string(),
        keywords: keywords.iter().map(|k| k.as_ref().to_string()).collect(),
        is_space_before_args,
        special_execute_times: times,
        clean_args,
        clean_args_chop_rest: String::new(),
    })
}

/// True if `text` starts with one of `prefixes` once reply markers and
/// mentions are removed and any repeat marker is consumed.
#[must_use]
pub fn has_command_prefix<P: AsRef<str>>(text: &str, platform: &str, prefixes: &[P]) -> bool {
    let (stripped, _) = normalize(text, platform);
    let (rest, _) = take_repeat_marker(&stripped);
    prefixes
        .iter()
        .map(AsRef::as_ref)
        .any(|p| !p.is_empty() && rest.starts_with(p))
}

/// Removes the first `N#` marker anywhere in the text and returns `N`.
///
/// Counts too large for `u32` saturate.
#[must_use]
pub fn take_repeat_marker(text: &str) -> (String, u32) {
    let Some(m) = REPEAT_MARKER.find(text) else {
        return (text.to_string(), 0);
    };
    let digits = m.as_str().trim_end_matches(['#', '＃']);
    let times = digits.parse().unwrap_or(u32::MAX);
    let mut rest = text.to_string();
    rest.replace_range(m.range(), "");
    (rest, times)
}

/// Splits an argument tail on whitespace into positional and keyword
/// arguments.
#[must_use]
pub fn split_args(tail: &str) -> (Vec<String>, Vec<KeywordArgument>) {
    let mut args = Vec::new();
    let mut kwargs = Vec::new();
    for token in tail.split_whitespace() {
        match KeywordArgument::parse(token) {
            Some(kwarg) => kwargs.push(kwarg),
            None => args.push(token.to_string()),
        }
    }
    (args, kwargs)
}

/// Normalises line endings, drops reply quote markers and strips
/// mentions, returning the trimmed text and the mentions found.
fn normalize(text: &str, platform: &str) -> (String, Vec<Mention>) {
    let normalized = strip_cq_kind(&text.replace("\r\n", "\n"), "reply");
    let (stripped, mentions) = extract_mentions(&normalized, platform);
    (stripped.trim().to_string(), mentions)
}

fn apply_legacy_rewrites(text: &str) -> String {
    for (from, to) in LEGACY_REWRITES {
        if let Some(rest) = strip_prefix_ignore_case(text, from) {
            return format!("{to}{rest}");
        }
    }
    text.to_string()
}

/// Finds the longest keyword prefixing `text`, returning it and the text
/// after it.
fn longest_keyword<'t, 'k, K: AsRef<str>>(
    text: &'t str,
    keywords: &'k [K],
) -> Option<(&'k str, &'t str)> {
    let mut best: Option<(&str, &str)> = None;
    for keyword in keywords.iter().map(AsRef::as_ref) {
        if keyword.is_empty() || best.is_some_and(|(b, _)| b.len() >= keyword.len()) {
            continue;
        }
        if let Some(tail) = strip_prefix_ignore_case(text, keyword) {
            best = Some((keyword, tail));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: &[&str] = &["r", "rd", "roll", "help", "botlist"];

    fn tokenize(text: &str) -> Option<CommandInvocation> {
        tokenize_command(text, "QQ", &[".", "。"], KEYWORDS, true)
    }

    #[test]
    fn glued_and_spaced_arguments() {
        let glued = tokenize(".rd20").expect("command");
        assert_eq!(glued.command, "rd");
        assert_eq!(glued.args, vec!["20"]);
        assert!(!glued.is_space_before_args);

        let spaced = tokenize(".rd 20").expect("command");
        assert_eq!(spaced.command, "rd");
        assert_eq!(spaced.args, vec!["20"]);
        assert!(spaced.is_space_before_args);
    }

    #[test]
    fn longest_keyword_wins() {
        assert_eq!(tokenize(".roll 1d6").expect("cmd").command, "roll");
        assert_eq!(tokenize(".r1d6").expect("cmd").command, "r");
    }

    #[test]
    fn ties_go_to_earlier_keyword() {
        let cmd = tokenize_command(".ab", "QQ", &["."], &["A", "a"], true).expect("cmd");
        assert_eq!(cmd.command, "A");
    }

    #[test]
    fn keyword_match_ignores_case() {
        let cmd = tokenize(".HELP me").expect("command");
        assert_eq!(cmd.command, "help");
        assert_eq!(cmd.args, vec!["me"]);
    }

    #[test]
    fn full_width_prefix() {
        let cmd = tokenize("。r 2d6").expect("command");
        assert_eq!(cmd.prefix, "。");
        assert_eq!(cmd.command, "r");
    }

    #[test]
    fn repeat_marker_before_keyword() {
        let cmd = tokenize(".3#r 1d6").expect("command");
        assert_eq!(cmd.special_execute_times, 3);
        assert_eq!(cmd.command, "r");
        assert_eq!(cmd.args, vec!["1d6"]);
    }

    #[test]
    fn repeat_marker_needs_prefix() {
        assert!(tokenize("3#r 1d6").is_none());
    }

    #[test]
    fn full_width_repeat_marker() {
        let cmd = tokenize(".r 12＃d20").expect("command");
        assert_eq!(cmd.special_execute_times, 12);
        assert_eq!(cmd.args, vec!["d20"]);
    }

    #[test]
    fn repeat_marker_left_alone_when_not_consumed() {
        let cmd = tokenize_command(".r 3#1d6", "QQ", &["."], KEYWORDS, false).expect("cmd");
        assert_eq!(cmd.special_execute_times, 0);
        assert_eq!(cmd.clean_args, "3#1d6");
    }

    #[test]
    fn unknown_keyword_still_splits() {
        let cmd = tokenize(".jrrp today").expect("command");
        assert_eq!(cmd.command, "jrrp");
        assert_eq!(cmd.args, vec!["today"]);
        assert!(cmd.is_space_before_args);
    }

    #[test]
    fn legacy_rewrite() {
        let cmd = tokenize(".bot list").expect("command");
        assert_eq!(cmd.command, "botlist");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn no_prefix_is_not_a_command() {
        assert!(tokenize("hello there").is_none());
        assert!(tokenize("").is_none());
    }

    #[test]
    fn bare_prefix_is_not_a_command() {
        assert!(tokenize(".").is_none());
        assert!(tokenize(" . ").is_none());
    }

    #[test]
    fn mentions_are_collected() {
        let cmd = tokenize("[CQ:at,qq=123] .help").expect("command");
        assert_eq!(cmd.mentions.len(), 1);
        assert_eq!(cmd.mentions[0].as_str(), "QQ:123");
        assert_eq!(cmd.command, "help");
        assert!(!cmd.raw_args.contains("CQ"));
    }

    #[test]
    fn reply_markers_are_dropped() {
        let cmd = tokenize("[CQ:reply,id=77].r 1d6").expect("command");
        assert_eq!(cmd.command, "r");
        assert_eq!(cmd.args, vec!["1d6"]);
    }

    #[test]
    fn crlf_is_normalized() {
        let cmd = tokenize(".r 1d6\r\nsecond line").expect("command");
        assert_eq!(cmd.raw_args, "1d6");
    }

    #[test]
    fn kwargs_are_separated() {
        let cmd = tokenize(".r 1d6 --asm --n=2 extra").expect("command");
        assert_eq!(cmd.args, vec!["1d6", "extra"]);
        assert_eq!(cmd.kwargs.len(), 2);
        assert_eq!(cmd.clean_args, "1d6 extra");
    }

    #[test]
    fn split_args_skips_empty_runs() {
        let (args, kwargs) = split_args("  a \t b  ");
        assert_eq!(args, vec!["a", "b"]);
        assert!(kwargs.is_empty());
    }

    #[test]
    fn repeat_marker_anywhere() {
        let (rest, times) = take_repeat_marker(".r 1d6 5#");
        assert_eq!(rest, ".r 1d6 ");
        assert_eq!(times, 5);
        assert_eq!(take_repeat_marker("no marker"), ("no marker".to_string(), 0));
    }

    #[test]
    fn prefix_check() {
        assert!(has_command_prefix("[CQ:at,qq=1] .r", "QQ", &["."]));
        assert!(has_command_prefix("2#.r", "QQ", &["."]));
        assert!(!has_command_prefix("r", "QQ", &["."]));
    }

    #[test]
    fn prefix_check_drops_reply_markers() {
        let text = "[CQ:reply,id=1].r d6";
        assert!(tokenize(text).is_some());
        assert!(has_command_prefix(text, "QQ", &["."]));
        assert!(has_command_prefix("[CQ:reply,id=2]\r\n2#.r", "QQ", &["."]));
    }

    #[test]
    fn rederive_round_trip() {
        let consumed = tokenize(".r 3#1d6").expect("command");
        assert_eq!(consumed.special_execute_times, 3);
        assert_eq!(consumed.args, vec!["1d6"]);

        let kept = consumed.rederive(false).expect("rederived");
        assert_eq!(kept.command, consumed.command);
        assert_eq!(kept.special_execute_times, 0);
        assert_eq!(kept.clean_args, "3#1d6");

        let again = kept.rederive(true).expect("rederived");
        assert_eq!(again, consumed);
    }

    #[test]
    fn rederive_keeps_mentions() {
        let first = tokenize("[CQ:at,qq=9] .r 2#d6").expect("command");
        let second = first.rederive(false).expect("rederived");
        assert_eq!(second.mentions, first.mentions);
    }
}
