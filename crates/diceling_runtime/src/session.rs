//! Message handling for one bot instance.
//!
//! A [`Session`] owns the variable store, alias table and reply templates,
//! and turns each inbound [`Message`] into an optional reply. Replies are
//! rendered from [`TextTemplates`] through the VM, so the `$t` variables a
//! command sets are visible to its templates. Every transient variable is
//! dropped once the command finishes.

use std::cmp::Reverse;

use diceling_foundation::{Error, ErrorKind, Result, Value};
use diceling_language::{CompiledProgram, DiceSource, Evaluation, RngDice, Vm};
use diceling_parser::{CommandInvocation, tokenize_command};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::scope::{AliasTable, VarMap};
use crate::store::{Seat, VariableStore};
use crate::templates::{TextTemplates, builtin_templates};

// =============================================================================
// Message
// =============================================================================

/// One inbound chat message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Raw message text, markup included.
    pub text: String,
    /// Group identifier; empty for private conversations.
    pub group_id: String,
    /// Sender identifier.
    pub sender_id: String,
    /// Sender display name.
    pub sender_name: String,
}

impl Message {
    /// Creates a private message from an anonymous sender.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the sender.
    #[must_use]
    pub fn from_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_id = id.into();
        self.sender_name = name.into();
        self
    }

    /// Builder method to set the group.
    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    fn seat(&self) -> Seat<'_> {
        Seat::new(&self.group_id, &self.sender_id)
    }
}

// =============================================================================
// Built-in commands
// =============================================================================

/// Help entry for a built-in command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltinCommand {
    /// Keywords, primary first.
    pub names: &'static [&'static str],
    /// One-line summary.
    pub brief: &'static str,
    /// Usage lines.
    pub usage: &'static str,
}

/// Commands every session understands.
pub const BUILTIN_COMMANDS: &[BuiltinCommand] = &[
    BuiltinCommand {
        names: &["r", "rd", "roll"],
        brief: "roll a dice expression",
        usage: ".r <expr> [reason]   roll, e.g. .r 2d6+3 attack\n\
                .r 3#1d20            roll three times\n\
                .rd20                roll one d20\n\
                .r 1d6 --asm         also show the compiled program",
    },
    BuiltinCommand {
        names: &["st"],
        brief: "record character attributes",
        usage: ".st hp10 san:50 str=60   set attributes\n\
                .st hp+1d6 mp-2          adjust attributes\n\
                .st show [names]         list attributes\n\
                .st del <names>          remove attributes\n\
                .st clr                  remove every attribute",
    },
    BuiltinCommand {
        names: &["help"],
        brief: "show this help",
        usage: ".help [command]",
    },
];

/// One `name[op]expr` entry of an `st` command.
static ST_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<name>[^\s\d:=+\-*/()]+)\s*(?P<op>[:=+\-]?)\s*(?P<expr>[0-9(][0-9dD+\-*/()]*)")
        .expect("Invalid Regex")
});

const ST_SUBCOMMANDS: &[&str] = &["show", "list", "del", "rm", "clr", "clear"];

// =============================================================================
// Session
// =============================================================================

/// State of one bot instance.
pub struct Session<D = RngDice> {
    config: BotConfig,
    vm: Vm<D>,
    store: VariableStore,
    aliases: AliasTable,
    templates: TextTemplates,
    /// `$t` variables of the command being handled.
    transient: VarMap,
    /// Recognized keywords, longest first.
    keywords: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(BotConfig::default())
    }
}

impl Session {
    /// Creates a session rolling seeded dice when the configuration has a
    /// seed, and OS entropy otherwise.
    #[must_use]
    pub fn new(config: BotConfig) -> Self {
        let dice = config.seed.map_or_else(RngDice::from_entropy, RngDice::seeded);
        Self::with_dice(config, dice)
    }
}

impl<D: DiceSource> Session<D> {
    /// Creates a session rolling through `dice`.
    #[must_use]
    pub fn with_dice(config: BotConfig, dice: D) -> Self {
        let vm = Vm::with_dice(dice)
            .with_options(config.eval_options())
            .with_compiler(config.compiler());
        let templates = config.seed.map_or_else(TextTemplates::new, |seed| {
            TextTemplates::seeded(seed.wrapping_add(1))
        });

        let mut keywords: Vec<String> = BUILTIN_COMMANDS
            .iter()
            .flat_map(|cmd| cmd.names.iter().map(|name| (*name).to_string()))
            .collect();
        keywords.sort_by_key(|keyword| Reverse(keyword.len()));

        Self {
            config,
            vm,
            store: VariableStore::new(),
            aliases: AliasTable::new(),
            templates: builtin_templates(templates),
            transient: VarMap::new(),
            keywords,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Returns the recognized command keywords, longest first.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the variable store.
    #[must_use]
    pub const fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Returns a mutable reference to the variable store.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// Returns a mutable reference to the alias table.
    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.aliases
    }

    /// Returns a mutable reference to the reply templates.
    pub fn templates_mut(&mut self) -> &mut TextTemplates {
        &mut self.templates
    }

    /// Handles one message, returning the reply if it was a command.
    pub fn handle(&mut self, message: &Message) -> Option<String> {
        let mut cmd = tokenize_command(
            &message.text,
            &self.config.platform,
            &self.config.prefixes,
            &self.keywords,
            true,
        )?;
        debug!(command = %cmd.command, sender = %message.sender_id, "dispatching command");

        self.set_transient("$tPlayer", message.sender_name.as_str());
        let command = cmd.command.clone();
        let reply = match command.as_str() {
            "r" | "rd" | "roll" => Some(self.roll(&cmd, message)),
            "st" => Some(self.st(&mut cmd, message)),
            "help" => Some(help(&cmd)),
            _ => None,
        };
        self.transient.clear();
        reply
    }

    /// Evaluates `source` at the message's seat without replying.
    ///
    /// # Errors
    ///
    /// Returns compile and evaluation errors.
    pub fn evaluate(&mut self, source: &str, message: &Message) -> Result<Evaluation> {
        let result = self.run(source, message.seat()).map(|(eval, _)| eval);
        self.transient.clear();
        result
    }

    // -------------------------------------------------------------------------
    // roll
    // -------------------------------------------------------------------------

    fn roll(&mut self, cmd: &CommandInvocation, message: &Message) -> String {
        let seat = message.seat();
        let times = cmd.special_execute_times.max(1);
        if times > self.config.max_repeat {
            self.set_transient("$tTimes", i64::from(times));
            return self.render("core:rollTooMany", seat);
        }

        let default_source = "d";
        let default_label = format!("D{}", self.config.default_dice_sides);

        let (expr, mut reason) = self.split_expression(cmd);
        let (mut source, mut label) = if expr.is_empty() {
            (default_source.to_string(), default_label.clone())
        } else {
            (expr.clone(), expr)
        };

        // Text that is not an expression, or does not yield a number, is
        // the reason for a default roll.
        let mut first = self.run(&source, seat);
        let not_a_roll = match &first {
            Ok((eval, _)) => eval.value.as_int().is_none(),
            Err(e) => matches!(e.kind, ErrorKind::Parse { .. }),
        };
        if not_a_roll && source != default_source {
            reason.clone_from(&cmd.clean_args);
            source = default_source.to_string();
            label = default_label;
            first = self.run(&source, seat);
        }

        let mut first = Some(first);
        let mut lines = Vec::with_capacity(times as usize);
        let mut asm = None;
        for _ in 0..times {
            let outcome = match first.take() {
                Some(outcome) => outcome,
                None => self.run(&source, seat),
            };
            match outcome {
                Ok((eval, program)) => {
                    lines.push(result_line(&label, &eval));
                    asm.get_or_insert_with(|| program.disassemble());
                }
                Err(e) => return self.roll_failed(&e, seat),
            }
        }

        let reason_text = if reason.is_empty() {
            String::new()
        } else {
            self.set_transient("$tReason", reason);
            self.render("core:rollReason", seat)
        };
        self.set_transient("$tReasonText", reason_text);
        self.set_transient("$tResultText", lines.join("\n"));

        let mut reply = if times == 1 {
            self.render("core:roll", seat)
        } else {
            self.set_transient("$tTimes", i64::from(times));
            self.render("core:rollMulti", seat)
        };
        if let (Some(_), Some(asm)) = (cmd.kwarg("asm"), asm) {
            reply.push('\n');
            reply.push_str(asm.trim_end());
        }
        reply
    }

    /// Splits the arguments into the longest leading run that compiles as
    /// an expression and the reason text after it. When no run compiles,
    /// the first argument is returned as the expression.
    fn split_expression(&self, cmd: &CommandInvocation) -> (String, String) {
        let glue = |mut expr: String| {
            if cmd.command == "rd" && expr.starts_with(|c: char| c.is_ascii_digit()) {
                expr.insert(0, 'd');
            }
            expr
        };
        for n in (1..=cmd.args.len()).rev() {
            let expr = glue(cmd.args[..n].join(" "));
            if self.vm.compiler().compile(&expr).is_ok() {
                return (expr, cmd.args[n..].join(" "));
            }
        }
        (
            glue(cmd.arg(1).unwrap_or_default().to_string()),
            cmd.suffix_from(2),
        )
    }

    fn roll_failed(&mut self, error: &Error, seat: Seat<'_>) -> String {
        warn!(code = error.code(), error = %error, "roll failed");
        self.set_transient("$tError", error.to_string());
        self.render("core:rollFailed", seat)
    }

    // -------------------------------------------------------------------------
    // st
    // -------------------------------------------------------------------------

    fn st(&mut self, cmd: &mut CommandInvocation, message: &Message) -> String {
        let seat = message.seat();
        cmd.chop_prefix_to_args_with(ST_SUBCOMMANDS);
        let names: Vec<String> = cmd
            .args
            .iter()
            .skip(1)
            .map(|name| self.aliases.canonicalize(name).into_owned())
            .collect();

        if cmd.is_arg_equal(1, &["show", "list"]) {
            let Some(local) = self.store.local(seat).filter(|m| !m.is_empty()) else {
                return self.render("core:stShowEmpty", seat);
            };
            let mut shown: Vec<String> = local
                .iter()
                .filter(|(name, _)| names.is_empty() || names.contains(*name))
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            shown.sort();
            self.set_transient("$tResultText", shown.join(" "));
            return self.render("core:stShow", seat);
        }

        if cmd.is_arg_equal(1, &["del", "rm"]) {
            let local = self.store.local_mut(seat);
            let removed: Vec<String> = names
                .into_iter()
                .filter(|name| local.remove(name).is_some())
                .collect();
            self.set_transient("$tResultText", removed.join(" "));
            return self.render("core:stDeleted", seat);
        }

        if cmd.is_arg_equal(1, &["clr", "clear"]) {
            let local = self.store.local_mut(seat);
            let count = local.len();
            local.clear();
            self.set_transient("$tCount", i64::try_from(count).unwrap_or(i64::MAX));
            return self.render("core:stCleared", seat);
        }

        let entries: Vec<(String, String, String)> = ST_ENTRY
            .captures_iter(&cmd.clean_args)
            .map(|caps| (caps["name"].to_string(), caps["op"].to_string(), caps["expr"].to_string()))
            .collect();
        if entries.is_empty() {
            return help_for("st");
        }

        let mut recorded = Vec::with_capacity(entries.len());
        for (name, op, expr) in entries {
            let source = match op.as_str() {
                "+" => format!("{name} += ({expr})"),
                "-" => format!("{name} -= ({expr})"),
                _ => format!("{name} = ({expr})"),
            };
            match self.run(&source, seat) {
                Ok((eval, _)) => {
                    let shown = self.aliases.canonicalize(&name).into_owned();
                    recorded.push(format!("{shown}={}", eval.value));
                }
                Err(e) => {
                    warn!(code = e.code(), error = %e, attribute = %name, "st failed");
                    self.set_transient("$tResultText", name);
                    self.set_transient("$tError", e.to_string());
                    return self.render("core:stFailed", seat);
                }
            }
        }
        self.set_transient("$tResultText", recorded.join(" "));
        self.render("core:stSet", seat)
    }

    // -------------------------------------------------------------------------
    // Evaluation plumbing
    // -------------------------------------------------------------------------

    fn run(&mut self, source: &str, seat: Seat<'_>) -> Result<(Evaluation, CompiledProgram)> {
        let program = self.vm.compiler().compile(source)?;
        let eval = self.run_program(&program, seat)?;
        Ok((eval, program))
    }

    fn run_program(&mut self, program: &CompiledProgram, seat: Seat<'_>) -> Result<Evaluation> {
        let mut ctx = self.store.scoped(
            seat,
            &mut self.transient,
            &self.aliases,
            &mut self.templates,
        );
        self.vm.evaluate(program, &mut ctx)
    }

    /// Draws template `name` and formats it against the current variables.
    fn render(&mut self, name: &str, seat: Seat<'_>) -> String {
        let Some(template) = self.templates.pick(name) else {
            debug!(template = name, "no reply template");
            return String::new();
        };
        let rendered = self
            .vm
            .compiler()
            .compile_template(&template)
            .and_then(|program| self.run_program(&program, seat));
        match rendered {
            Ok(eval) => eval.value.to_string(),
            Err(e) => {
                warn!(template = name, error = %e, "template failed to render");
                template
            }
        }
    }

    fn set_transient(&mut self, name: &str, value: impl Into<Value>) {
        self.transient.insert(name.to_string(), value.into());
    }
}

/// `label=trace=value`, or `label=value` when there is no trace.
fn result_line(label: &str, eval: &Evaluation) -> String {
    if eval.trace.is_empty() {
        format!("{label}={}", eval.value)
    } else {
        format!("{label}={}={}", eval.trace, eval.value)
    }
}

fn help(cmd: &CommandInvocation) -> String {
    if let Some(topic) = cmd.arg(1) {
        return help_for(topic);
    }
    let mut text = String::from("Commands:");
    for builtin in BUILTIN_COMMANDS {
        text.push_str(&format!("\n.{}  {}", builtin.names.join("/"), builtin.brief));
    }
    text
}

fn help_for(topic: &str) -> String {
    let topic = topic.trim_start_matches(['.', '。']).to_lowercase();
    BUILTIN_COMMANDS
        .iter()
        .find(|builtin| builtin.names.contains(&topic.as_str()))
        .map_or_else(
            || format!("No help for `{topic}`"),
            |builtin| builtin.usage.to_string(),
        )
}
