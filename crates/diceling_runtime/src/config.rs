//! Bot configuration.

use diceling_language::{Compiler, DEFAULT_CAPACITY, DEFAULT_DICE_SIDES, EvalOptions};

/// Configuration for a [`Session`](crate::Session).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotConfig {
    /// Command prefixes, tried in order.
    pub prefixes: Vec<String>,
    /// Platform tag selecting the mention syntax.
    pub platform: String,
    /// Instruction slots per compiled expression.
    pub program_capacity: usize,
    /// Most dice one evaluation may roll.
    pub dice_budget: u64,
    /// Largest accepted `N#` repeat count.
    pub max_repeat: u32,
    /// Sides of a bare `d`.
    pub default_dice_sides: i64,
    /// Seed for dice and template draws; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![".".to_string(), "。".to_string()],
            platform: "QQ".to_string(),
            program_capacity: DEFAULT_CAPACITY,
            dice_budget: EvalOptions::default().dice_budget,
            max_repeat: 12,
            default_dice_sides: DEFAULT_DICE_SIDES,
            seed: None,
        }
    }
}

impl BotConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to replace the command prefixes.
    #[must_use]
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the platform tag.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Builder method to set the instruction capacity.
    #[must_use]
    pub const fn with_program_capacity(mut self, capacity: usize) -> Self {
        self.program_capacity = capacity;
        self
    }

    /// Builder method to set the dice budget.
    #[must_use]
    pub const fn with_dice_budget(mut self, budget: u64) -> Self {
        self.dice_budget = budget;
        self
    }

    /// Builder method to set the largest repeat count.
    #[must_use]
    pub const fn with_max_repeat(mut self, max_repeat: u32) -> Self {
        self.max_repeat = max_repeat;
        self
    }

    /// Builder method to fix the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method to set the sides of a bare `d`.
    #[must_use]
    pub const fn with_default_dice_sides(mut self, sides: i64) -> Self {
        self.default_dice_sides = sides;
        self
    }

    /// The compiler this configuration describes.
    #[must_use]
    pub const fn compiler(&self) -> Compiler {
        Compiler::new()
            .with_capacity(self.program_capacity)
            .with_default_sides(self.default_dice_sides)
    }

    /// The evaluation limits this configuration describes.
    #[must_use]
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            dice_budget: self.dice_budget,
            ..EvalOptions::default()
        }
    }
}
