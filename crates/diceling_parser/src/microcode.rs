//! Bracketed inline codes embedded in chat text.
//!
//! Two families are recognised: `[CQ:type,key=value,...]` micro-codes and
//! the `[img:path]` / `[图:path]` image shorthand. Rewriting always walks
//! matches from last to first, so replacing one match never shifts the
//! byte offsets of the matches still waiting to be replaced.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static CQ_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[CQ:.+?\]").expect("Invalid Regex"));
static CQ_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[CQ:([^\],]+)(,[^\]]+)?\]").expect("Invalid Regex"));
static IMAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(img|图):.+?\]").expect("Invalid Regex"));

/// A parsed `[CQ:...]` micro-code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CqCode {
    /// Code type, e.g. `at`, `image`, `reply`.
    pub kind: String,
    /// `key=value` pairs in source order.
    pub args: Vec<(String, String)>,
    /// When set, [`compile`](Self::compile) emits this text verbatim
    /// instead of rebuilding the code.
    pub overwrite: Option<String>,
}

impl CqCode {
    /// Parses one micro-code. Text that is not a micro-code yields an
    /// empty code with no kind.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Some(caps) = CQ_PARTS.captures(text) else {
            return Self::default();
        };
        let args = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            kind: caps[1].to_string(),
            args,
            overwrite: None,
        }
    }

    /// Returns the value of an argument.
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an argument, keeping its position if it already exists.
    pub fn set_arg(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.args.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.args.push((key, value)),
        }
    }

    /// Renders the code back to text.
    #[must_use]
    pub fn compile(&self) -> String {
        if let Some(text) = &self.overwrite {
            return text.clone();
        }
        self.to_string()
    }
}

impl fmt::Display for CqCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[CQ:{}", self.kind)?;
        for (k, v) in &self.args {
            write!(f, ",{k}={v}")?;
        }
        f.write_str("]")
    }
}

/// Replaces every match of `pattern` with `solve(matched_text)`.
///
/// Matches are found on the original text and replaced last-first.
pub fn rewrite_matches(
    text: &str,
    pattern: &Regex,
    mut solve: impl FnMut(&str) -> String,
) -> String {
    let ranges: Vec<_> = pattern.find_iter(text).map(|m| m.range()).collect();
    let mut out = text.to_string();
    for range in ranges.into_iter().rev() {
        let replacement = solve(&text[range.clone()]);
        out.replace_range(range, &replacement);
    }
    out
}

/// Parses each `[CQ:...]` code, lets `solve` edit it, and writes it back.
pub fn cq_rewrite(text: &str, mut solve: impl FnMut(&mut CqCode)) -> String {
    rewrite_matches(text, &CQ_CODE, |matched| {
        let mut code = CqCode::parse(matched);
        solve(&mut code);
        code.compile()
    })
}

/// Replaces each `[img:...]` / `[图:...]` shorthand with `solve(code)`.
pub fn image_rewrite(text: &str, solve: impl FnMut(&str) -> String) -> String {
    rewrite_matches(text, &IMAGE_CODE, solve)
}

/// Removes every micro-code of the given kind.
#[must_use]
pub fn strip_cq_kind(text: &str, kind: &str) -> String {
    rewrite_matches(text, &CQ_CODE, |matched| {
        if CqCode::parse(matched).kind == kind {
            String::new()
        } else {
            matched.to_string()
        }
    })
}

/// Returns every micro-code in the text, in order.
#[must_use]
pub fn cq_codes(text: &str) -> Vec<CqCode> {
    CQ_CODE
        .find_iter(text)
        .map(|m| CqCode::parse(m.as_str()))
        .collect()
}
