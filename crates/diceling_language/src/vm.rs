//! Stack-based virtual machine for dice bytecode.
//!
//! The VM executes a [`CompiledProgram`] against a [`VariableContext`] and
//! a [`DiceSource`], producing the final value plus a human-readable
//! calculation trace.
//!
//! # Limits
//!
//! Arithmetic is checked 64-bit. A single evaluation may roll at most
//! [`EvalOptions::dice_budget`] dice, and computed values or text
//! templates may nest at most [`EvalOptions::max_depth`] levels.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

mod context;
mod trace;

pub use context::{MapContext, VariableContext};

use diceling_foundation::{ComputedValue, Error, ErrorKind, EvalLimit, Result, Type, Value};
use tracing::debug;

use crate::compiler::Compiler;
use crate::dice::{DiceSource, RngDice};
use crate::opcode::{CompiledProgram, Instruction};
use trace::Trace;

/// Transient variable holding a computed value's base while its
/// expression runs.
pub const COMPUTED_BASE_VAR: &str = "$tVal";

/// Evaluation limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Most dice one evaluation may roll.
    pub dice_budget: u64,
    /// Deepest chain of computed values and templates.
    pub max_depth: u32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            dice_budget: 30_000,
            max_depth: 8,
        }
    }
}

/// Result of a successful evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    /// The value left at the bottom of the stack.
    pub value: Value,
    /// Calculation trace; empty when there was nothing to show.
    pub trace: String,
}

/// Stack-based virtual machine.
pub struct Vm<D = RngDice> {
    dice: D,
    options: EvalOptions,
    /// Compiles computed expressions and templates met during evaluation.
    compiler: Compiler,
    /// Dice rolled so far in the current evaluation.
    rolled: u64,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a VM rolling dice seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dice(RngDice::from_entropy())
    }

    /// Creates a VM with deterministic dice.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_dice(RngDice::seeded(seed))
    }
}

impl<D: DiceSource> Vm<D> {
    /// Creates a VM rolling through the given source.
    #[must_use]
    pub fn with_dice(dice: D) -> Self {
        Self {
            dice,
            options: EvalOptions::default(),
            compiler: Compiler::new(),
            rolled: 0,
        }
    }

    /// Replaces the evaluation limits.
    #[must_use]
    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the compiler used for computed values and templates.
    #[must_use]
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Returns the evaluation limits.
    #[must_use]
    pub const fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Returns the compiler used for nested sources.
    #[must_use]
    pub const fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Returns the dice source.
    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// Compiles and evaluates `source` in one step.
    ///
    /// # Errors
    ///
    /// Returns compile errors and any error from [`evaluate`](Self::evaluate).
    pub fn eval_source<C>(&mut self, source: &str, ctx: &mut C) -> Result<Evaluation>
    where
        C: VariableContext + ?Sized,
    {
        let program = self.compiler.compile(source)?;
        self.evaluate(&program, ctx)
    }

    /// Evaluates a compiled program.
    ///
    /// A program carrying a sticky error is rejected with that error before
    /// any instruction runs.
    ///
    /// # Errors
    ///
    /// Returns the program's sticky error, type mismatches, division by
    /// zero, overflow, and exceeded limits.
    pub fn evaluate<C>(&mut self, program: &CompiledProgram, ctx: &mut C) -> Result<Evaluation>
    where
        C: VariableContext + ?Sized,
    {
        self.rolled = 0;
        let result = self.run(program, ctx, 0);
        if let Err(e) = &result {
            debug!(code = e.code(), error = %e, "evaluation failed");
        }
        result
    }

    fn run<C>(&mut self, program: &CompiledProgram, ctx: &mut C, depth: u32) -> Result<Evaluation>
    where
        C: VariableContext + ?Sized,
    {
        if let Some(err) = program.error() {
            return Err(err.clone());
        }

        let mut stack: Vec<Value> = Vec::with_capacity(program.len());
        let mut trace = Trace::default();

        for instruction in program.instructions() {
            match instruction {
                Instruction::Number(n) => stack.push(Value::Int(*n)),

                Instruction::PushString(s) => stack.push(Value::String(s.clone())),

                Instruction::Negation => {
                    let a = int_operand("-", &pop(&mut stack, instruction)?)?;
                    let negated = a.checked_neg().ok_or_else(|| overflow("-"))?;
                    stack.push(Value::Int(negated));
                }

                Instruction::Add
                | Instruction::Subtract
                | Instruction::Multiply
                | Instruction::Divide
                | Instruction::Modulus
                | Instruction::Exponentiation => {
                    let symbol = instruction.symbol();
                    let b = pop(&mut stack, instruction)?;
                    let a = pop(&mut stack, instruction)?;
                    let (a, b) = (int_operand(symbol, &a)?, int_operand(symbol, &b)?);
                    trace.record(instruction, a, b, stack.len() + 1);
                    stack.push(Value::Int(arithmetic(instruction, a, b)?));
                }

                Instruction::Dice => {
                    let sides = pop(&mut stack, instruction)?;
                    let count = pop(&mut stack, instruction)?;
                    let (count, sides) = (int_operand("d", &count)?, int_operand("d", &sides)?);
                    trace.record(instruction, count, sides, stack.len() + 1);
                    let sum = self.roll(count, sides, program.force_max())?;
                    trace.detail(format!("{count}d{sides}={sum}"));
                    stack.push(Value::Int(sum));
                }

                Instruction::DiceUnary => {
                    let sides = int_operand("d", &pop(&mut stack, instruction)?)?;
                    let face = self.roll(1, sides, program.force_max())?;
                    stack.push(Value::Int(face));
                }

                Instruction::LoadVariable(name) => {
                    let value = self.load(name, ctx, depth)?;
                    if let Value::Int(n) = value {
                        trace.detail(format!("{name}={n}"));
                    }
                    stack.push(value);
                }

                Instruction::LoadFormatString {
                    template,
                    placeholders,
                } => {
                    if stack.len() < placeholders.len() {
                        return Err(underflow(instruction));
                    }
                    let values = stack.split_off(stack.len() - placeholders.len());
                    // Substituted text is never searched again.
                    let mut text = String::with_capacity(template.len());
                    let mut rest = template.as_str();
                    for (placeholder, value) in placeholders.iter().zip(values) {
                        let Some(at) = rest.find(placeholder.as_str()) else {
                            break;
                        };
                        text.push_str(&rest[..at]);
                        text.push_str(&value.to_string());
                        rest = &rest[at + placeholder.len()..];
                    }
                    text.push_str(rest);
                    stack.push(Value::String(text));
                }

                Instruction::Store => {
                    let value = pop(&mut stack, instruction)?;
                    let name = match pop(&mut stack, instruction)? {
                        Value::String(name) => name,
                        other => {
                            return Err(Error::type_mismatch("=", Type::String, other.value_type()));
                        }
                    };
                    tracing::trace!(name = %name, value = %value, "store");
                    ctx.set(&name, value.clone());
                    stack.push(value);
                }

                Instruction::Swap => {
                    let len = stack.len();
                    if len < 2 {
                        return Err(underflow(instruction));
                    }
                    stack.swap(len - 1, len - 2);
                }

                Instruction::LeftValueMark => trace.mark_left(stack.len()),

                Instruction::Halt => {}
            }
        }

        Ok(Evaluation {
            value: stack.into_iter().next().unwrap_or_default(),
            trace: trace.finish(),
        })
    }

    /// Rolls `count` dice of `sides` faces and sums them.
    fn roll(&mut self, count: i64, sides: i64, force_max: bool) -> Result<i64> {
        if count <= 0 {
            return Ok(0);
        }
        let wanted = u64::try_from(count).unwrap_or(u64::MAX);
        let budget = self.options.dice_budget;
        if wanted > budget.saturating_sub(self.rolled) {
            return Err(Error::limit_exceeded(EvalLimit::DiceBudget { limit: budget }));
        }
        self.rolled += wanted;

        let mut sum: i64 = 0;
        for _ in 0..count {
            let face = if force_max {
                sides.max(0)
            } else {
                self.dice.roll(sides)
            };
            sum = sum.checked_add(face).ok_or_else(|| overflow("d"))?;
        }
        Ok(sum)
    }

    /// Resolves a name: context, then legacy ints, then text templates,
    /// then the undefined placeholder. Computed values are expanded.
    fn load<C>(&mut self, name: &str, ctx: &mut C, depth: u32) -> Result<Value>
    where
        C: VariableContext + ?Sized,
    {
        let value = if let Some(value) = ctx.get(name) {
            value
        } else if let Some(n) = ctx.legacy_int(name) {
            Value::Int(n)
        } else if let Some(template) = ctx.text_template(name) {
            debug!(name, "variable resolved to a text template");
            self.expand_template(name, &template, ctx, depth)?
        } else {
            debug!(name, "variable undefined");
            Value::String(format!("<%undefined-{name}%>"))
        };

        match value {
            Value::Computed(computed) => self.expand_computed(name, computed, ctx, depth),
            other => Ok(other),
        }
    }

    fn enter(&self, depth: u32) -> Result<u32> {
        let limit = self.options.max_depth;
        if depth >= limit {
            return Err(Error::limit_exceeded(EvalLimit::RecursionDepth { limit }));
        }
        Ok(depth + 1)
    }

    fn expand_computed<C>(
        &mut self,
        name: &str,
        computed: ComputedValue,
        ctx: &mut C,
        depth: u32,
    ) -> Result<Value>
    where
        C: VariableContext + ?Sized,
    {
        let depth = self.enter(depth)?;
        ctx.set(COMPUTED_BASE_VAR, *computed.base);
        let frame = || format!("computed `{name}`");
        let program = self
            .compiler
            .compile(&computed.expr)
            .map_err(|e| push_frame(e, frame()))?;
        let result = self
            .run(&program, ctx, depth)
            .map_err(|e| push_frame(e, frame()))?;
        Ok(result.value)
    }

    fn expand_template<C>(
        &mut self,
        name: &str,
        template: &str,
        ctx: &mut C,
        depth: u32,
    ) -> Result<Value>
    where
        C: VariableContext + ?Sized,
    {
        let depth = self.enter(depth)?;
        let frame = || format!("template `{name}`");
        let program = self
            .compiler
            .compile_template(template)
            .map_err(|e| push_frame(e, frame()))?;
        let result = self
            .run(&program, ctx, depth)
            .map_err(|e| push_frame(e, frame()))?;
        Ok(result.value)
    }
}

/// Compiles and evaluates `source` with fresh random dice and no variables.
///
/// # Errors
///
/// Returns compile and evaluation errors.
pub fn eval(source: &str) -> Result<Evaluation> {
    Vm::new().eval_source(source, &mut MapContext::new())
}

fn pop(stack: &mut Vec<Value>, instruction: &Instruction) -> Result<Value> {
    stack.pop().ok_or_else(|| underflow(instruction))
}

fn underflow(instruction: &Instruction) -> Error {
    Error::new(ErrorKind::StackUnderflow {
        instruction: instruction.to_string(),
    })
}

fn overflow(op: &'static str) -> Error {
    Error::new(ErrorKind::ArithmeticOverflow { op })
}

fn int_operand(op: &'static str, value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch(op, Type::Int, value.value_type()))
}

/// Applies an arithmetic operator with checked semantics.
fn arithmetic(instruction: &Instruction, a: i64, b: i64) -> Result<i64> {
    let op = instruction.symbol();
    let result = match instruction {
        Instruction::Add => a.checked_add(b),
        Instruction::Subtract => a.checked_sub(b),
        Instruction::Multiply => a.checked_mul(b),
        Instruction::Divide | Instruction::Modulus if b == 0 => {
            return Err(Error::division_by_zero(op));
        }
        Instruction::Divide => a.checked_div(b),
        Instruction::Modulus => a.checked_rem(b),
        Instruction::Exponentiation => return Ok(power(a, b)),
        other => {
            return Err(Error::new(ErrorKind::Internal(format!(
                "`{other}` is not arithmetic"
            ))));
        }
    };
    result.ok_or_else(|| overflow(op))
}

/// Floating-point power truncated back to an integer. Results beyond the
/// `i64` range saturate.
fn power(a: i64, b: i64) -> i64 {
    (a as f64).powf(b as f64) as i64
}

/// Records a computed-value or template frame, outermost first.
fn push_frame(mut err: Error, frame: String) -> Error {
    let mut context = err.context.take().unwrap_or_default();
    context.stack.insert(0, frame);
    err.with_context(context)
}
