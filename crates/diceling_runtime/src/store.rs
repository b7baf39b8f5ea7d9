//! In-memory backing maps for the persistent variable tiers.
//!
//! Player and group identifiers are platform-qualified strings such as
//! `QQ:123`. Private conversations use an empty group identifier, so the
//! player-in-group tier doubles as a per-player private scope.

use std::collections::HashMap;

use diceling_foundation::Value;

use crate::scope::{AliasTable, ScopedVariables, VarMap};
use crate::templates::TextTemplates;

/// A `(group, player)` pair.
pub type SeatKey = (String, String);

/// Storage for every tier except the transient one.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    players: HashMap<String, VarMap>,
    groups: HashMap<String, VarMap>,
    seats: HashMap<SeatKey, VarMap>,
    /// Character cards keyed by `(player, card name)`.
    cards: HashMap<SeatKey, VarMap>,
    /// Card bound to a seat, if any.
    bindings: HashMap<SeatKey, String>,
    legacy: HashMap<String, HashMap<String, i64>>,
}

/// Who is speaking, and where.
#[derive(Clone, Copy, Debug)]
pub struct Seat<'s> {
    /// Group identifier; empty for private conversations.
    pub group: &'s str,
    /// Player identifier.
    pub player: &'s str,
}

impl<'s> Seat<'s> {
    /// Creates a seat.
    #[must_use]
    pub const fn new(group: &'s str, player: &'s str) -> Self {
        Self { group, player }
    }

    fn key(self) -> SeatKey {
        (self.group.to_string(), self.player.to_string())
    }
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the resolver for one invocation at `seat`.
    ///
    /// The player-in-group tier is the bound card when one exists,
    /// otherwise the seat's own map.
    pub fn scoped<'a>(
        &'a mut self,
        seat: Seat<'_>,
        transient: &'a mut VarMap,
        aliases: &'a AliasTable,
        templates: &'a mut TextTemplates,
    ) -> ScopedVariables<'a> {
        let key = seat.key();
        let local = match self.bindings.get(&key) {
            Some(card) => self
                .cards
                .entry((seat.player.to_string(), card.clone()))
                .or_default(),
            None => self.seats.entry(key).or_default(),
        };
        let player = self.players.entry(seat.player.to_string()).or_default();
        let group = self.groups.entry(seat.group.to_string()).or_default();

        let scoped = ScopedVariables::new(transient, player, group, local)
            .with_aliases(aliases)
            .with_templates(templates);
        match self.legacy.get(seat.player) {
            Some(legacy) => scoped.with_legacy(legacy),
            None => scoped,
        }
    }

    /// The player-in-group map at `seat`, following any bound card.
    #[must_use]
    pub fn local(&self, seat: Seat<'_>) -> Option<&VarMap> {
        let key = seat.key();
        match self.bindings.get(&key) {
            Some(card) => self.cards.get(&(seat.player.to_string(), card.clone())),
            None => self.seats.get(&key),
        }
    }

    /// Mutable form of [`local`](Self::local), creating the map if needed.
    pub fn local_mut(&mut self, seat: Seat<'_>) -> &mut VarMap {
        let key = seat.key();
        match self.bindings.get(&key) {
            Some(card) => self
                .cards
                .entry((seat.player.to_string(), card.clone()))
                .or_default(),
            None => self.seats.entry(key).or_default(),
        }
    }

    /// The player-global map.
    #[must_use]
    pub fn player(&self, player: &str) -> Option<&VarMap> {
        self.players.get(player)
    }

    /// The group-global map.
    #[must_use]
    pub fn group(&self, group: &str) -> Option<&VarMap> {
        self.groups.get(group)
    }

    /// Binds the player's card `card` to `seat`, creating it empty if new.
    pub fn bind_card(&mut self, seat: Seat<'_>, card: &str) {
        self.cards
            .entry((seat.player.to_string(), card.to_string()))
            .or_default();
        self.bindings.insert(seat.key(), card.to_string());
    }

    /// Unbinds the card at `seat`, returning its name.
    pub fn unbind_card(&mut self, seat: Seat<'_>) -> Option<String> {
        self.bindings.remove(&seat.key())
    }

    /// Name of the card bound at `seat`.
    #[must_use]
    pub fn bound_card(&self, seat: Seat<'_>) -> Option<&str> {
        self.bindings.get(&seat.key()).map(String::as_str)
    }

    /// Reads one attribute of a player's card.
    #[must_use]
    pub fn card_value(&self, player: &str, card: &str, name: &str) -> Option<&Value> {
        self.cards
            .get(&(player.to_string(), card.to_string()))?
            .get(name)
    }

    /// Writes into the legacy integer store.
    pub fn set_legacy_int(&mut self, player: &str, name: &str, value: i64) {
        self.legacy
            .entry(player.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }
}
