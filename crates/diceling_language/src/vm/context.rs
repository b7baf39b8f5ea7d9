//! Variable access for VM execution.
//!
//! The VM resolves every name through a [`VariableContext`]. The runtime
//! crate implements it over the four variable tiers; [`MapContext`] is a
//! flat map for tests and one-off evaluations.

use std::collections::HashMap;

use diceling_foundation::Value;

// =============================================================================
// VariableContext Trait
// =============================================================================

/// Name resolution and assignment for `LoadVariable` and `Store`.
///
/// Lookups fall through three sources in order: [`get`](Self::get), then
/// [`legacy_int`](Self::legacy_int), then
/// [`text_template`](Self::text_template). A name none of them knows
/// evaluates to the placeholder string `<%undefined-NAME%>`.
pub trait VariableContext {
    /// Reads a variable.
    fn get(&self, name: &str) -> Option<Value>;

    /// Writes a variable, replacing any previous value.
    fn set(&mut self, name: &str, value: Value);

    /// Removes a variable, returning its old value.
    fn delete(&mut self, name: &str) -> Option<Value>;

    /// Reads an integer from the legacy per-player store.
    fn legacy_int(&self, _name: &str) -> Option<i64> {
        None
    }

    /// Picks a text template for `name`. Implementations may choose among
    /// several weighted candidates, hence `&mut self`.
    fn text_template(&mut self, _name: &str) -> Option<String> {
        None
    }
}

// =============================================================================
// MapContext
// =============================================================================

/// A single flat variable map.
#[derive(Clone, Debug, Default)]
pub struct MapContext {
    vars: HashMap<String, Value>,
}

impl MapContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`VariableContext::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Number of variables held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if no variables are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VariableContext for MapContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    fn delete(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }
}
