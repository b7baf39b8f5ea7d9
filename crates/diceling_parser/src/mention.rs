//! Platform-specific "@user" markup.
//!
//! Each platform encodes mentions differently. The table below picks one
//! pattern per platform tag; its single capture group is the raw user id.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("Invalid Regex")
}

static CQ_AT: Lazy<Regex> = Lazy::new(|| pattern(r"\[CQ:at,qq=(\d+?)\]"));
static KOOK_MET: Lazy<Regex> = Lazy::new(|| pattern(r"\(met\)(\d+)\(met\)"));
static DISCORD_AT: Lazy<Regex> = Lazy::new(|| pattern(r"<@!?(\d+)>"));
static DODO_AT: Lazy<Regex> = Lazy::new(|| pattern(r"<@!(\d+)>"));
static SLACK_AT: Lazy<Regex> = Lazy::new(|| pattern(r"<@([A-Z0-9]+)>"));
static SATORI_AT: Lazy<Regex> = Lazy::new(|| pattern(r#"<at id="([^"]+)"\s*/?>"#));
static TG_USER: Lazy<Regex> = Lazy::new(|| pattern(r"tg://user\?id=(\d+)"));

/// Returns the mention pattern for a platform tag.
///
/// Tags are matched case-insensitively; unknown tags use the CQ at-code.
#[must_use]
pub fn mention_pattern(platform: &str) -> &'static Regex {
    match platform.to_ascii_uppercase().as_str() {
        "KOOK" => &*KOOK_MET,
        "DISCORD" => &*DISCORD_AT,
        "DODO" => &*DODO_AT,
        "SLACK" => &*SLACK_AT,
        "SATORI" | "SEALCHAT" => &*SATORI_AT,
        "TG" => &*TG_USER,
        _ => &*CQ_AT,
    }
}

/// A platform-qualified user id such as `QQ:123`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mention(String);

impl Mention {
    /// Creates a mention record.
    #[must_use]
    pub fn new(platform: &str, user_id: &str) -> Self {
        Self(format!("{platform}:{user_id}"))
    }

    /// The full `platform:id` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The platform part.
    #[must_use]
    pub fn platform(&self) -> &str {
        self.0.split_once(':').map_or("", |(p, _)| p)
    }

    /// The raw user id part.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, id)| id)
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips mention markup from `text`.
///
/// Returns the text with every match removed, plus the mentions in text
/// order.
#[must_use]
pub fn extract_mentions(text: &str, platform: &str) -> (String, Vec<Mention>) {
    let re = mention_pattern(platform);
    let mentions = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|id| Mention::new(platform, id.as_str()))
        .collect();
    (re.replace_all(text, "").into_owned(), mentions)
}
