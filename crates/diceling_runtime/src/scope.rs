//! Four-tier variable scoping.
//!
//! Every variable lives in exactly one tier, chosen by its name prefix:
//!
//! | Prefix | Tier | Lifetime |
//! |--------|------|----------|
//! | `$t` | [`ScopeTier::Transient`] | one command invocation |
//! | `$m` | [`ScopeTier::PlayerGlobal`] | the player, across groups |
//! | `$g` | [`ScopeTier::GroupGlobal`] | the group |
//! | none | [`ScopeTier::PlayerInGroup`] | the player in this group, or the bound card |
//!
//! [`ScopedVariables`] parses the prefix once and dispatches on the tier for
//! reads, writes and deletes alike. Only unprefixed names go through the
//! [`AliasTable`].

use std::borrow::Cow;
use std::collections::HashMap;

use diceling_foundation::Value;
use diceling_language::VariableContext;

use crate::templates::TextTemplates;

/// A single tier's backing map.
pub type VarMap = HashMap<String, Value>;

// =============================================================================
// ScopeTier
// =============================================================================

/// The storage tier a variable name resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeTier {
    /// `$t` names, cleared after every invocation.
    Transient,
    /// `$m` names, owned by the player.
    PlayerGlobal,
    /// `$g` names, owned by the group.
    GroupGlobal,
    /// Unprefixed names, owned by the player within one group.
    PlayerInGroup,
}

impl ScopeTier {
    /// Classifies a variable name by its prefix.
    #[must_use]
    pub fn of(name: &str) -> Self {
        if name.starts_with("$t") {
            Self::Transient
        } else if name.starts_with("$m") {
            Self::PlayerGlobal
        } else if name.starts_with("$g") {
            Self::GroupGlobal
        } else {
            Self::PlayerInGroup
        }
    }

    /// The name prefix selecting this tier, if any.
    #[must_use]
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Transient => Some("$t"),
            Self::PlayerGlobal => Some("$m"),
            Self::GroupGlobal => Some("$g"),
            Self::PlayerInGroup => None,
        }
    }
}

// =============================================================================
// AliasTable
// =============================================================================

/// Case-insensitive map from attribute aliases to canonical names.
///
/// ```
/// use diceling_runtime::AliasTable;
///
/// let aliases = AliasTable::new().with("hp", ["HitPoints", "生命"]);
/// assert_eq!(aliases.canonicalize("hitpoints"), "hp");
/// assert_eq!(aliases.canonicalize("HP"), "hp");
/// assert_eq!(aliases.canonicalize("mp"), "mp");
/// ```
#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    /// Lowercased alias (and lowercased canonical name) to canonical name.
    lookup: HashMap<String, String>,
}

impl AliasTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<I, S>(mut self, canonical: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(canonical, aliases);
        self
    }

    /// Registers `aliases` as alternative spellings of `canonical`.
    ///
    /// A later registration of the same alias wins.
    pub fn insert<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lookup
            .insert(canonical.to_lowercase(), canonical.to_string());
        for alias in aliases {
            self.lookup
                .insert(alias.as_ref().to_lowercase(), canonical.to_string());
        }
    }

    /// Returns the canonical spelling of `name`, or `name` itself.
    #[must_use]
    pub fn canonicalize<'n>(&self, name: &'n str) -> Cow<'n, str> {
        match self.lookup.get(&name.to_lowercase()) {
            Some(canonical) => Cow::Owned(canonical.clone()),
            None => Cow::Borrowed(name),
        }
    }

    /// Number of registered spellings, canonical names included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

// =============================================================================
// ScopedVariables
// =============================================================================

/// A [`VariableContext`] over borrowed tier maps.
///
/// Built per invocation by the session: the player-in-group map is already
/// redirected to the bound character card when one is active.
pub struct ScopedVariables<'a> {
    transient: &'a mut VarMap,
    player: &'a mut VarMap,
    group: &'a mut VarMap,
    local: &'a mut VarMap,
    aliases: Option<&'a AliasTable>,
    legacy: Option<&'a HashMap<String, i64>>,
    templates: Option<&'a mut TextTemplates>,
}

impl<'a> ScopedVariables<'a> {
    /// Creates a resolver over the four tier maps.
    pub fn new(
        transient: &'a mut VarMap,
        player: &'a mut VarMap,
        group: &'a mut VarMap,
        local: &'a mut VarMap,
    ) -> Self {
        Self {
            transient,
            player,
            group,
            local,
            aliases: None,
            legacy: None,
            templates: None,
        }
    }

    /// Canonicalizes unprefixed names through `aliases`.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &'a AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Falls back to the legacy integer store on a miss.
    #[must_use]
    pub fn with_legacy(mut self, legacy: &'a HashMap<String, i64>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    /// Falls back to weighted text templates after the legacy store.
    #[must_use]
    pub fn with_templates(mut self, templates: &'a mut TextTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Resolves `name` to its tier and the key used inside that tier.
    #[must_use]
    pub fn resolve<'n>(&self, name: &'n str) -> (ScopeTier, Cow<'n, str>) {
        let tier = ScopeTier::of(name);
        let key = match (tier, self.aliases) {
            (ScopeTier::PlayerInGroup, Some(aliases)) => aliases.canonicalize(name),
            _ => Cow::Borrowed(name),
        };
        (tier, key)
    }

    fn tier(&self, tier: ScopeTier) -> &VarMap {
        match tier {
            ScopeTier::Transient => &*self.transient,
            ScopeTier::PlayerGlobal => &*self.player,
            ScopeTier::GroupGlobal => &*self.group,
            ScopeTier::PlayerInGroup => &*self.local,
        }
    }

    fn tier_mut(&mut self, tier: ScopeTier) -> &mut VarMap {
        match tier {
            ScopeTier::Transient => &mut *self.transient,
            ScopeTier::PlayerGlobal => &mut *self.player,
            ScopeTier::GroupGlobal => &mut *self.group,
            ScopeTier::PlayerInGroup => &mut *self.local,
        }
    }
}

impl VariableContext for ScopedVariables<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        let (tier, key) = self.resolve(name);
        self.tier(tier).get(key.as_ref()).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        let (tier, key) = self.resolve(name);
        let key = key.into_owned();
        self.tier_mut(tier).insert(key, value);
    }

    fn delete(&mut self, name: &str) -> Option<Value> {
        let (tier, key) = self.resolve(name);
        let key = key.into_owned();
        self.tier_mut(tier).remove(&key)
    }

    fn legacy_int(&self, name: &str) -> Option<i64> {
        let (_, key) = self.resolve(name);
        self.legacy?.get(key.as_ref()).copied()
    }

    fn text_template(&mut self, name: &str) -> Option<String> {
        self.templates.as_deref_mut()?.pick(name)
    }
}
