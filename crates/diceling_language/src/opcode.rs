//! Instruction set and fixed-capacity program container.
//!
//! The VM is stack-based. A [`CompiledProgram`] owns a preallocated slot
//! array; appending past its capacity does not grow it but records a
//! sticky overflow error that later rejects evaluation.

use std::fmt;

use diceling_foundation::Error;
use tracing::debug;

/// Instruction slots allocated when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 512;

/// A single bytecode instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Instruction {
    // === Stack Operations ===
    /// Push an integer: `[] -> [n]`
    Number(i64),
    /// Push a string: `[] -> [s]`
    PushString(String),
    /// Exchange the two top values: `[a, b] -> [b, a]`
    Swap,

    // === Arithmetic ===
    /// Negate: `[a] -> [-a]`
    Negation,
    /// Add: `[a, b] -> [a + b]`
    Add,
    /// Subtract: `[a, b] -> [a - b]`
    Subtract,
    /// Multiply: `[a, b] -> [a * b]`
    Multiply,
    /// Truncating divide: `[a, b] -> [a / b]`
    Divide,
    /// Remainder: `[a, b] -> [a % b]`
    Modulus,
    /// Power: `[a, b] -> [a ^ b]`
    Exponentiation,

    // === Dice ===
    /// Roll one die: `[sides] -> [roll]`
    DiceUnary,
    /// Roll and sum dice: `[count, sides] -> [sum]`
    Dice,

    // === Variables ===
    /// Resolve a name through the variable context: `[] -> [value]`
    LoadVariable(String),
    /// Substitute placeholders into a template.
    ///
    /// `[v1 .. vn] -> [s]` where `n` is the number of placeholders; the
    /// values are substituted in order.
    LoadFormatString {
        /// Template text with placeholders still in place.
        template: String,
        /// Placeholder texts (braces included), in source order.
        placeholders: Vec<String>,
    },
    /// Assign: `[name, value] -> [value]`
    Store,

    // === Tracing ===
    /// Snapshot pending roll details as the left operand's details.
    LeftValueMark,

    /// End of program.
    #[default]
    Halt,
}

impl Instruction {
    /// Returns the operator symbol shown in calculation traces.
    ///
    /// Non-arithmetic instructions return an empty string.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Negation | Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulus => "%",
            Self::Exponentiation => "**",
            _ => "",
        }
    }

    /// Returns true for the operators that take part in trace building.
    #[must_use]
    pub const fn is_traced_binary(&self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Subtract
                | Self::Multiply
                | Self::Divide
                | Self::Modulus
                | Self::Exponentiation
                | Self::Dice
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "push {n}"),
            Self::PushString(s) => write!(f, "push.str {s}"),
            Self::Swap => f.write_str("swap"),
            Self::Negation => f.write_str("neg"),
            Self::Add => f.write_str("add"),
            Self::Subtract => f.write_str("sub"),
            Self::Multiply => f.write_str("mul"),
            Self::Divide => f.write_str("div"),
            Self::Modulus => f.write_str("mod"),
            Self::Exponentiation => f.write_str("pow"),
            Self::DiceUnary => f.write_str("dice1"),
            Self::Dice => f.write_str("dice"),
            Self::LoadVariable(name) => write!(f, "ld.v {name}"),
            Self::LoadFormatString { placeholders, .. } => {
                write!(f, "ld.fs {}", placeholders.len())
            }
            Self::Store => f.write_str("store"),
            Self::LeftValueMark => f.write_str("mark.left"),
            Self::Halt => f.write_str("halt"),
        }
    }
}

/// A compiled expression: a fixed number of instruction slots plus the
/// count of slots in use.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    slots: Box<[Instruction]>,
    top: usize,
    error: Option<Error>,
    force_max: bool,
}

impl CompiledProgram {
    /// Creates an empty program with room for `capacity` instructions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Instruction::Halt; capacity].into_boxed_slice(),
            top: 0,
            error: None,
            force_max: false,
        }
    }

    /// Appends an instruction and returns its index.
    ///
    /// Returns `None` without writing anything once the program is full or
    /// already carries an error. The first failed append records an `E1`
    /// overflow error that stays with the program.
    pub fn emit(&mut self, instruction: Instruction) -> Option<usize> {
        if self.error.is_some() {
            return None;
        }
        if self.top >= self.slots.len() {
            debug!(capacity = self.slots.len(), "instruction capacity exceeded");
            self.error = Some(Error::program_overflow(self.slots.len()));
            return None;
        }
        let idx = self.top;
        self.slots[idx] = instruction;
        self.top += 1;
        Some(idx)
    }

    /// Returns the instructions appended so far.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.slots[..self.top]
    }

    /// Returns the number of instructions appended so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.top
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Returns the fixed instruction capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the sticky error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns true if every die in this program rolls its maximum face.
    #[must_use]
    pub const fn force_max(&self) -> bool {
        self.force_max
    }

    /// Makes every die roll its maximum face (or the normal random roll
    /// when `false`).
    pub fn set_force_max(&mut self, on: bool) {
        self.force_max = on;
    }

    /// Builder form of [`set_force_max`](Self::set_force_max).
    #[must_use]
    pub fn with_force_max(mut self, on: bool) -> Self {
        self.force_max = on;
        self
    }

    /// Renders the program one mnemonic per line between banner lines.
    #[must_use]
    pub fn disassemble(&self) -> String {
        let mut out = String::from("=== VM Code ===\n");
        for instruction in self.instructions() {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out.push_str("=== VM Code End===\n");
        out
    }
}

impl Default for CompiledProgram {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
