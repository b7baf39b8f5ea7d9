//! Tokenized command invocations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::mention::Mention;
use crate::tokenizer::tokenize_command;

static KEYWORD_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--([^\s=]+)(?:=(\S+))?$").expect("Invalid Regex"));

/// A `--name` or `--name=value` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordArgument {
    /// Name without the leading dashes.
    pub name: String,
    /// Raw value, if one followed `=`.
    pub value: Option<String>,
    /// Whether a value was given.
    pub value_exists: bool,
    /// Boolean reading: true unless the value is exactly `false`.
    pub as_bool: bool,
}

impl KeywordArgument {
    /// Parses one whitespace-free token. Returns `None` for anything that
    /// is not a keyword argument.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let caps = KEYWORD_ARG.captures(token)?;
        let value = caps.get(2).map(|m| m.as_str().to_string());
        Some(Self {
            name: caps[1].to_string(),
            value_exists: value.is_some(),
            as_bool: value.as_deref() != Some("false"),
            value,
        })
    }
}

/// One chat message recognised as a bot command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Command keyword, as spelled in the keyword list when one matched.
    pub command: String,
    /// Positional arguments in order.
    pub args: Vec<String>,
    /// Keyword arguments in order.
    pub kwargs: Vec<KeywordArgument>,
    /// Mentions stripped from the message, in text order.
    pub mentions: Vec<Mention>,
    /// Everything after the command keyword, untokenized.
    pub raw_args: String,
    /// The message exactly as received.
    pub raw_text: String,
    /// The prefix that introduced the command.
    pub prefix: String,
    /// Platform tag used for mention parsing.
    pub platform: String,
    /// Keyword list the command was matched against.
    pub keywords: Vec<String>,
    /// True if whitespace directly followed the keyword (`.rd 20` but not
    /// `.rd20`).
    pub is_space_before_args: bool,
    /// Repeat count from an `N#` marker; 0 when none was consumed.
    pub special_execute_times: u32,
    /// Positional arguments joined by single spaces.
    pub clean_args: String,
    /// `clean_args` after the sub-command chopped by
    /// [`chop_prefix_to_args_with`](Self::chop_prefix_to_args_with).
    pub clean_args_chop_rest: String,
}

impl CommandInvocation {
    /// Tokenizes the stored raw text again with a different repeat-marker
    /// policy. Mentions found the first time are kept.
    ///
    /// Returns `None` only if the text no longer starts with the stored
    /// prefix under the new policy (e.g. `3#.r` without consuming `3#`).
    #[must_use]
    pub fn rederive(&self, consume_repeat: bool) -> Option<Self> {
        let mut next = tokenize_command(
            &self.raw_text,
            &self.platform,
            &[self.prefix.as_str()],
            &self.keywords,
            consume_repeat,
        )?;
        next.mentions.clone_from(&self.mentions);
        Some(next)
    }

    /// Returns the `n`th positional argument, 1-indexed.
    #[must_use]
    pub fn arg(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.args.get(i))
            .map(String::as_str)
    }

    /// True if the `n`th argument (1-indexed) equals any candidate,
    /// ignoring case. False when there is no `n`th argument.
    #[must_use]
    pub fn is_arg_equal(&self, n: usize, candidates: &[&str]) -> bool {
        self.arg(n)
            .is_some_and(|arg| candidates.iter().any(|c| eq_ignore_case(arg, c)))
    }

    /// Returns the keyword argument with this name.
    #[must_use]
    pub fn kwarg(&self, name: &str) -> Option<&KeywordArgument> {
        self.kwargs.iter().find(|kw| kw.name == name)
    }

    /// If `clean_args` starts with a candidate (ignoring case), returns
    /// what follows it, trimmed.
    #[must_use]
    pub fn eat_prefix_with(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find_map(|candidate| {
            strip_prefix_ignore_case(&self.clean_args, candidate).map(|rest| rest.trim().to_string())
        })
    }

    /// Splits a glued sub-command off the first argument.
    ///
    /// If the first argument starts with a candidate, it is replaced by the
    /// candidate plus the remainder as its own argument, so `reloadall`
    /// with candidate `reload` becomes `["reload", "all", ...]`. Also sets
    /// [`clean_args_chop_rest`](Self::clean_args_chop_rest).
    pub fn chop_prefix_to_args_with(&mut self, candidates: &[&str]) -> bool {
        let Some(first) = self.args.first().cloned() else {
            return false;
        };
        for candidate in candidates {
            let Some(rest) = strip_prefix_ignore_case(&first, candidate) else {
                continue;
            };
            let mut promoted = vec![(*candidate).to_string()];
            let rest = rest.trim();
            if !rest.is_empty() {
                promoted.push(rest.to_string());
            }
            promoted.extend(self.args.drain(1..));
            self.args = promoted;
            self.clean_args_chop_rest = strip_prefix_ignore_case(&self.clean_args, candidate)
                .unwrap_or_default()
                .trim()
                .to_string();
            return true;
        }
        false
    }

    /// Joins positional arguments from the `n`th (1-indexed) onward,
    /// stopping at the first empty one.
    #[must_use]
    pub fn suffix_from(&self, n: usize) -> String {
        self.args
            .iter()
            .skip(n.saturating_sub(1))
            .take_while(|arg| !arg.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Strips `prefix` from `text` ignoring case.
pub(crate) fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    eq_ignore_case(head, prefix).then(|| &text[prefix.len()..])
}
