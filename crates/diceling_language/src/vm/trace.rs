//! Calculation trace built alongside evaluation.
//!
//! Only operators whose result lands at the bottom of the stack are
//! written, so the trace reads as the outermost chain of the expression
//! (`3 + 2`, `4[1d6=4] + 2`). Roll and variable details gathered while the
//! right operand was computed are attached in brackets after it. Details
//! gathered for the left operand are buffered by `LeftValueMark` and
//! printed before the operator.

use std::fmt::Write;

use crate::opcode::Instruction;

#[derive(Debug, Default)]
pub(crate) struct Trace {
    text: String,
    pending: Vec<String>,
    left: Vec<String>,
    /// Binary operators (dice included) seen so far.
    combined: u32,
}

impl Trace {
    pub(crate) fn detail(&mut self, detail: String) {
        self.pending.push(detail);
    }

    /// `depth` is the stack height at the mark.
    pub(crate) fn mark_left(&mut self, depth: usize) {
        if depth == 1 {
            self.left = std::mem::take(&mut self.pending);
        }
    }

    /// Records a binary operator. `depth` is the stack height once the
    /// result has replaced both operands.
    pub(crate) fn record(&mut self, instruction: &Instruction, left: i64, right: i64, depth: usize) {
        self.combined += 1;
        if *instruction == Instruction::Dice || depth != 1 {
            return;
        }
        let symbol = instruction.symbol();

        if self.combined == 1 {
            let _ = write!(self.text, "{left} {symbol} {right}");
            return;
        }

        if self.text.is_empty() {
            let _ = write!(self.text, "{left}");
        }
        if !self.left.is_empty() {
            let _ = write!(self.text, "[{}]", self.left.join(","));
            self.left.clear();
        }
        let _ = write!(self.text, " {symbol} {right}");
        if !self.pending.is_empty() {
            let _ = write!(self.text, "[{}]", self.pending.join(","));
            self.pending.clear();
        }
    }

    pub(crate) fn finish(self) -> String {
        self.text
    }
}
