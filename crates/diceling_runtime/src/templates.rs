//! Weighted-random text templates.
//!
//! A template name maps to one or more candidate texts with integer weights.
//! [`TextTemplates::pick`] draws one candidate per call; the VM then formats
//! it, so candidates may contain `{expr}` placeholders of their own.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// One weighted candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateItem {
    /// Template text.
    pub text: String,
    /// Relative weight; zero disables the candidate.
    pub weight: u32,
}

/// Named groups of weighted text candidates.
#[derive(Clone, Debug)]
pub struct TextTemplates {
    entries: HashMap<String, Vec<TemplateItem>>,
    rng: ChaCha8Rng,
}

impl Default for TextTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTemplates {
    /// Creates an empty set drawing from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Creates an empty set with a deterministic draw order.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates an empty set drawing from `rng`.
    #[must_use]
    pub fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            entries: HashMap::new(),
            rng,
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with<I, S>(mut self, name: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        self.set(name, candidates);
        self
    }

    /// Replaces every candidate of `name`.
    pub fn set<I, S>(&mut self, name: &str, candidates: I)
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let items = candidates
            .into_iter()
            .map(|(text, weight)| TemplateItem {
                text: text.into(),
                weight,
            })
            .collect();
        self.entries.insert(name.to_string(), items);
    }

    /// Adds one candidate to `name`.
    pub fn push(&mut self, name: &str, text: impl Into<String>, weight: u32) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(TemplateItem {
                text: text.into(),
                weight,
            });
    }

    /// Returns the candidates registered under `name`.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Option<&[TemplateItem]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Returns true if `name` has at least one candidate.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|items| !items.is_empty())
    }

    /// Draws one candidate of `name` by weight.
    ///
    /// Returns `None` for unknown names and for names whose weights are all
    /// zero.
    pub fn pick(&mut self, name: &str) -> Option<String> {
        let items = self.entries.get(name)?;
        match WeightedIndex::new(items.iter().map(|item| item.weight)) {
            Ok(index) => Some(items[index.sample(&mut self.rng)].text.clone()),
            Err(e) => {
                debug!(template = name, error = %e, "template has no drawable candidate");
                None
            }
        }
    }

    /// Number of template names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reply templates used by the built-in commands.
///
/// Every name here is referenced by [`Session`](crate::Session); callers may
/// override any of them with [`TextTemplates::set`].
#[must_use]
pub fn builtin_templates(templates: TextTemplates) -> TextTemplates {
    templates
        .with("core:botName", [("Diceling", 1)])
        .with("core:rollReason", [("For {$tReason}, ", 1)])
        .with("core:roll", [("{$tReasonText}<{$tPlayer}> rolled {$tResultText}", 1)])
        .with(
            "core:rollMulti",
            [("{$tReasonText}<{$tPlayer}> rolled {$tTimes} times:\n{$tResultText}", 1)],
        )
        .with(
            "core:rollTooMany",
            [
                ("So many rounds? {core:botName} is keeping an eye on you.", 1),
                ("{$tTimes} rounds? {core:botName} does not have that many dice.", 1),
            ],
        )
        .with("core:rollFailed", [("<{$tPlayer}> could not roll: {$tError}", 1)])
        .with("core:stSet", [("<{$tPlayer}> recorded {$tResultText}", 1)])
        .with("core:stShow", [("<{$tPlayer}>: {$tResultText}", 1)])
        .with("core:stShowEmpty", [("<{$tPlayer}> has no attributes yet", 1)])
        .with("core:stDeleted", [("<{$tPlayer}> removed {$tResultText}", 1)])
        .with("core:stCleared", [("<{$tPlayer}> cleared {$tCount} attributes", 1)])
        .with("core:stFailed", [("<{$tPlayer}> could not set {$tResultText}: {$tError}", 1)])
}
