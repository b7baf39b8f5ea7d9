//! Diceling console entry point.

use std::env;
use std::process::ExitCode;

use diceling_runtime::{BotConfig, Repl, Session, init_logging};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    platform: Option<String>,
    seed: Option<u64>,
    prefixes: Vec<String>,
    name: Option<String>,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn value_of(args: &[String], i: usize, flag: &str) -> Result<String, Box<dyn std::error::Error>> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--platform" => {
                i += 1;
                config.platform = Some(value_of(&args, i, "--platform")?);
            }
            "--seed" => {
                i += 1;
                let raw = value_of(&args, i, "--seed")?;
                config.seed = Some(
                    raw.parse()
                        .map_err(|_| format!("invalid --seed value: {raw}"))?,
                );
            }
            "--prefix" => {
                i += 1;
                config.prefixes.push(value_of(&args, i, "--prefix")?);
            }
            "--name" => {
                i += 1;
                config.name = Some(value_of(&args, i, "--name")?);
            }
            arg => return Err(format!("unknown option: {arg}").into()),
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args(args)?;

    if cli.show_help {
        print_help();
        return Ok(());
    }

    if cli.show_version {
        println!("diceling {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = BotConfig::default();
    if let Some(platform) = cli.platform {
        config = config.with_platform(platform);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if !cli.prefixes.is_empty() {
        config = config.with_prefixes(cli.prefixes);
    }

    let mut repl = Repl::new(Session::new(config))?;
    if let Some(name) = cli.name {
        repl = repl.with_user_name(name);
    }
    repl.run()?;
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mDiceling\x1b[0m - dice-rolling chat bot console

\x1b[1mUSAGE:\x1b[0m
    diceling [OPTIONS]

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    --platform TAG       Platform whose mention syntax to accept (default QQ)
    --seed N             Roll deterministic dice
    --prefix P           Command prefix; repeat for several (default . and 。)
    --name NAME          Your display name in replies

\x1b[1mEXAMPLES:\x1b[0m
    diceling                         Start the console
    diceling --seed 42               Reproducible rolls
    diceling --prefix ! --prefix .   Accept !r as well as .r

\x1b[1mCONSOLE COMMANDS:\x1b[0m
    .r 2d6+3 attack      Roll an expression with a reason
    .r 3#1d20            Roll three times
    .st hp10 san50       Record attributes
    .help                List commands
    Ctrl+D               Exit

Set RUST_LOG=diceling_language=trace to watch evaluation."
    );
}
