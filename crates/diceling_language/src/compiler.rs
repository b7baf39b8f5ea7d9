//! Single-pass compiler from expression text to bytecode.
//!
//! Precedence, lowest first:
//!
//! | level      | operators                        | associativity |
//! |------------|----------------------------------|---------------|
//! | assignment | `=` `+=` `-=` `*=` `/=`          | right         |
//! | additive   | `+` `-`                          | left          |
//! | product    | `*` `/` `%`                      | left          |
//! | unary      | prefix `-`                       |               |
//! | power      | `^` `**`                         | right         |
//! | dice       | `A d B`, `d B`, `d`              | left          |
//!
//! Arithmetic binary operators emit a `LeftValueMark` after their left
//! operand so the VM can attribute pending roll details to the left side.

use diceling_foundation::{Error, ErrorContext, Result};
use tracing::trace;

use crate::lexer::Lexer;
use crate::opcode::{CompiledProgram, DEFAULT_CAPACITY, Instruction};
use crate::token::{Token, TokenKind};

/// Sides used by `d` when no side count follows it.
pub const DEFAULT_DICE_SIDES: i64 = 100;

/// Deepest nesting of parentheses, unary minus and right-associative
/// operators accepted before the compiler gives up.
pub const MAX_NESTING: usize = 64;

/// Compiler settings. Each call to [`compile`](Self::compile) produces a
/// fresh program.
#[derive(Clone, Debug)]
pub struct Compiler {
    capacity: usize,
    default_sides: i64,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a compiler with the default capacity and dice sides.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_sides: DEFAULT_DICE_SIDES,
        }
    }

    /// Sets the instruction capacity of compiled programs.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the side count used by a bare `d`.
    #[must_use]
    pub const fn with_default_sides(mut self, sides: i64) -> Self {
        self.default_sides = sides;
        self
    }

    /// Returns the instruction capacity of compiled programs.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Compiles an expression.
    ///
    /// Syntax errors are returned as `E2`. Running out of instruction
    /// slots is not a compile error: the program comes back `Ok` with its
    /// sticky `E1` set, and evaluating it is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not a well-formed expression.
    pub fn compile(&self, source: &str) -> Result<CompiledProgram> {
        let mut program = CompiledProgram::with_capacity(self.capacity);
        let mut parser = Parser::new(Lexer::tokenize_all(source), &mut program, self, 0);
        parser
            .parse_expression()
            .and_then(|()| parser.expect_end())
            .map_err(|e| e.with_context(ErrorContext::new().with_source(source)))?;
        program.emit(Instruction::Halt);
        trace!(source, len = program.len(), "compiled expression");
        Ok(program)
    }

    /// Compiles a whole text as a format string, so every `{expr}` in it
    /// is evaluated and substituted. Text templates are compiled this way.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder is not a well-formed expression.
    pub fn compile_template(&self, template: &str) -> Result<CompiledProgram> {
        let mut program = CompiledProgram::with_capacity(self.capacity);
        let mut parser = Parser::new(Vec::new(), &mut program, self, 0);
        parser
            .format_string(template, 0)
            .map_err(|e| e.with_context(ErrorContext::new().with_source(template)))?;
        program.emit(Instruction::Halt);
        Ok(program)
    }
}

enum AssignOp {
    Plain,
    Compound(Instruction),
}

struct Parser<'p> {
    tokens: Vec<Token>,
    pos: usize,
    program: &'p mut CompiledProgram,
    default_sides: i64,
    depth: usize,
    /// Offset of this token stream inside the outermost source.
    base: usize,
}

impl<'p> Parser<'p> {
    fn new(
        tokens: Vec<Token>,
        program: &'p mut CompiledProgram,
        compiler: &Compiler,
        base: usize,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            program,
            default_sides: compiler.default_sides,
            depth: 0,
            base,
        }
    }

    fn peek(&self) -> &TokenKind {
        self.peek_n(0)
    }

    fn peek_n(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.base + self.tokens.get(self.pos).map_or(0, |t| t.span.start)
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, crate::span::Span::default()));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn emit(&mut self, instruction: Instruction) {
        self.program.emit(instruction);
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(message, self.offset())
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            TokenKind::Error(msg) => Err(self.error_here(msg.clone())),
            other => Err(self.error_here(format!("unexpected {}", other.describe()))),
        }
    }

    fn parse_expression(&mut self) -> Result<()> {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> Result<()> {
        let target = match (self.peek(), self.peek_n(1)) {
            (TokenKind::Ident(name), op) => assign_op(op).map(|op| (name.clone(), op)),
            _ => None,
        };
        let Some((name, op)) = target else {
            return self.parse_additive();
        };
        self.advance();
        self.advance();

        match op {
            AssignOp::Plain => {
                self.emit(Instruction::PushString(name));
                self.parse_expression()?;
                self.emit(Instruction::Store);
            }
            AssignOp::Compound(instruction) => {
                self.emit(Instruction::LoadVariable(name.clone()));
                self.emit(Instruction::LeftValueMark);
                self.parse_expression()?;
                self.emit(instruction);
                self.emit(Instruction::PushString(name));
                self.emit(Instruction::Swap);
                self.emit(Instruction::Store);
            }
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<()> {
        self.parse_product()?;
        loop {
            let instruction = match self.peek() {
                TokenKind::Plus => Instruction::Add,
                TokenKind::Minus => Instruction::Subtract,
                _ => return Ok(()),
            };
            self.advance();
            self.emit(Instruction::LeftValueMark);
            self.parse_product()?;
            self.emit(instruction);
        }
    }

    fn parse_product(&mut self) -> Result<()> {
        self.parse_unary()?;
        loop {
            let instruction = match self.peek() {
                TokenKind::Star => Instruction::Multiply,
                TokenKind::Slash => Instruction::Divide,
                TokenKind::Percent => Instruction::Modulus,
                _ => return Ok(()),
            };
            self.advance();
            self.emit(Instruction::LeftValueMark);
            self.parse_unary()?;
            self.emit(instruction);
        }
    }

    fn parse_unary(&mut self) -> Result<()> {
        if *self.peek() == TokenKind::Minus {
            self.advance();
            self.nested(Self::parse_unary)?;
            self.emit(Instruction::Negation);
            return Ok(());
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<()> {
        self.parse_dice()?;
        if *self.peek() == TokenKind::Caret {
            self.advance();
            self.emit(Instruction::LeftValueMark);
            self.nested(Self::parse_unary)?;
            self.emit(Instruction::Exponentiation);
        }
        Ok(())
    }

    fn parse_dice(&mut self) -> Result<()> {
        if *self.peek() == TokenKind::Dice {
            self.advance();
            self.parse_sides()?;
            self.emit(Instruction::DiceUnary);
        } else {
            self.parse_primary()?;
        }
        while *self.peek() == TokenKind::Dice {
            self.advance();
            self.parse_sides()?;
            self.emit(Instruction::Dice);
        }
        Ok(())
    }

    fn parse_sides(&mut self) -> Result<()> {
        if self.tokens.get(self.pos).is_some_and(Token::starts_operand) {
            self.parse_primary()
        } else {
            self.emit(Instruction::Number(self.default_sides));
            Ok(())
        }
    }

    fn parse_primary(&mut self) -> Result<()> {
        let start = self.offset();
        let token = self.advance();
        match token.kind {
            TokenKind::Int(n) => self.emit(Instruction::Number(n)),
            TokenKind::Ident(name) => self.emit(Instruction::LoadVariable(name)),
            TokenKind::Str(text) => self.emit(Instruction::PushString(text)),
            TokenKind::FormatStr(template) => {
                // Skip the opening backtick.
                self.format_string(&template, token.span.start + 1)?;
            }
            TokenKind::LParen => {
                self.parse_expression()?;
                if *self.peek() != TokenKind::RParen {
                    return Err(self.error_here(format!(
                        "expected `)`, found {}",
                        self.peek().describe()
                    )));
                }
                self.advance();
            }
            TokenKind::Error(msg) => return Err(Error::parse(msg, start)),
            other => {
                return Err(Error::parse(
                    format!("expected a value, found {}", other.describe()),
                    start,
                ));
            }
        }
        Ok(())
    }

    /// Emits code for each placeholder followed by the substitution.
    /// `offset` locates `template` within this parser's token stream.
    fn format_string(&mut self, template: &str, offset: usize) -> Result<()> {
        let placeholders = find_placeholders(template);
        for (at, text) in &placeholders {
            let inner = &text[1..text.len() - 1];
            let mut nested = Parser {
                tokens: Lexer::tokenize_all(inner),
                pos: 0,
                program: &mut *self.program,
                default_sides: self.default_sides,
                depth: self.depth,
                base: self.base + offset + at + 1,
            };
            nested.parse_expression()?;
            nested.expect_end()?;
        }
        self.emit(Instruction::LoadFormatString {
            template: template.to_string(),
            placeholders: placeholders.into_iter().map(|(_, text)| text).collect(),
        });
        Ok(())
    }
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Assign => Some(AssignOp::Plain),
        TokenKind::PlusAssign => Some(AssignOp::Compound(Instruction::Add)),
        TokenKind::MinusAssign => Some(AssignOp::Compound(Instruction::Subtract)),
        TokenKind::StarAssign => Some(AssignOp::Compound(Instruction::Multiply)),
        TokenKind::SlashAssign => Some(AssignOp::Compound(Instruction::Divide)),
        _ => None,
    }
}

/// Finds `{expr}` placeholders, returning each with its byte offset.
/// Braces around blank text are left alone as literal text.
#[must_use]
pub fn find_placeholders(template: &str) -> Vec<(usize, String)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(open) = template[from..].find('{').map(|i| i + from) {
        let Some(close) = template[open..].find('}').map(|i| i + open) else {
            break;
        };
        if !template[open + 1..close].trim().is_empty() {
            found.push((open, template[open..=close].to_string()));
        }
        from = close + 1;
    }
    found
}
