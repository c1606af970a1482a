//! Debase driver binary.
//!
//! The IR rewrite itself runs elsewhere; this driver exercises the pattern
//! core end to end: it loads a config and command-line patterns, installs
//! each input as the current module, classifies nm-style symbol lists, and
//! reports which functions would be debased.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use bumpalo::Bump;
use clap::{Parser, ValueEnum};

use debase::core::SymbolMatcher;
use debase::driver::triple::mangling_abi_for;
use debase::driver::{DebaseOracle, Hardening};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Mode {
    /// The default, exits only when required.
    #[default]
    Normal,
    /// Extra checks, exits instead of warning.
    Strict,
    /// Less checks, warns when possible.
    Permissive,
}

impl From<Mode> for Hardening {
    fn from(mode: Mode) -> Hardening {
        match mode {
            Mode::Normal => Hardening::Normal,
            Mode::Strict => Hardening::Strict,
            Mode::Permissive => Hardening::Permissive,
        }
    }
}

#[derive(Parser)]
#[command(name = "debase")]
#[command(about = "Match C++ ctor/dtor symbols against debase patterns", long_about = None)]
struct Cli {
    /// Symbol-list files, one mangled name per line (reads stdin if none
    /// and the config names no files).
    inputs: Vec<PathBuf>,

    /// JSON config with file paths and ctor/dtor/all pattern lists.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Defines the program's correctness requirements.
    #[arg(long, value_enum, default_value_t = Mode::Normal)]
    mode: Mode,

    /// Pattern added to both the ctor and dtor sets. Repeatable.
    #[arg(long = "pattern", value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Constructor-only pattern. Repeatable.
    #[arg(long = "ctor", value_name = "PATTERN")]
    ctor_patterns: Vec<String>,

    /// Destructor-only pattern. Repeatable.
    #[arg(long = "dtor", value_name = "PATTERN")]
    dtor_patterns: Vec<String>,

    /// Target triple deciding the demangler back end.
    #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
    triple: String,

    /// Dump the compiled patterns once loading is finished.
    #[arg(long, hide = true)]
    dump_patterns: bool,

    /// Output more runtime information.
    #[arg(long, short = 'V')]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("debase: error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let hardening = Hardening::from(cli.mode);
    let arena = Bump::new();
    let mut matcher = SymbolMatcher::new(&arena, hardening.is_permissive());

    let mut inputs = cli.inputs.clone();
    if let Some(config) = &cli.config {
        matcher
            .load_config(config, Some(&mut inputs))
            .map_err(|e| e.to_string())?;
    }

    for pattern in &cli.patterns {
        let result = matcher.add_pattern(pattern);
        handle_pattern_result(pattern, result, hardening)?;
    }
    for pattern in &cli.ctor_patterns {
        let result = matcher.add_ctor_pattern(pattern);
        handle_pattern_result(pattern, result, hardening)?;
    }
    for pattern in &cli.dtor_patterns {
        let result = matcher.add_dtor_pattern(pattern);
        handle_pattern_result(pattern, result, hardening)?;
    }

    if matcher.ctor_pattern_count() == 0 && matcher.dtor_pattern_count() == 0 {
        return Err("no patterns were provided (use --config or --pattern)".to_string());
    }

    if cli.dump_patterns {
        eprintln!("{}", matcher.dump());
    }

    let abi = mangling_abi_for(&cli.triple)
        .ok_or_else(|| format!("unrecognized target triple '{}'", cli.triple))?;
    let mut oracle = DebaseOracle::new(&mut matcher, abi);

    if inputs.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        scan_symbols(&mut oracle, "<stdin>", &text)?;
    } else {
        for input in &inputs {
            let display = input.display().to_string();
            let text = match fs::read_to_string(input) {
                Ok(text) => text,
                Err(err) => {
                    if hardening.is_permissive() {
                        log::warn!("skipping '{display}': {err}");
                        continue;
                    }
                    return Err(format!("failed to read '{display}': {err}"));
                }
            };
            scan_symbols(&mut oracle, &display, &text)?;
        }
    }

    if cli.verbose {
        eprint!("{}", oracle.matcher().stats());
        eprintln!(
            "  Symbols classified: {} ({} matched)",
            oracle.symbols_seen(),
            oracle.symbols_matched()
        );
    }

    // Strict mode requires every pattern to have been encountered.
    if hardening.is_strict() {
        let unmatched = oracle.matcher().unmatched_patterns();
        if !unmatched.is_empty() {
            return Err(format!(
                "in --mode strict every pattern is required to match a symbol; \
                 {} never matched: {}",
                unmatched.len(),
                unmatched.join(", ")
            ));
        }
    }
    Ok(())
}

fn handle_pattern_result(
    pattern: &str,
    result: debase::PatternResult<()>,
    hardening: Hardening,
) -> Result<(), String> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if hardening.is_permissive() => {
            log::warn!("skipping pattern '{pattern}': {err}");
            Ok(())
        }
        Err(err) => Err(err.to_string()),
    }
}

/// Runs every symbol of one nm-style listing through the oracle and prints
/// the hits.
fn scan_symbols(
    oracle: &mut DebaseOracle<'_, '_>,
    path: &str,
    text: &str,
) -> Result<(), String> {
    oracle
        .begin_module(path)
        .map_err(|e| format!("in '{path}': {e}"))?;
    for line in text.lines() {
        // nm prints `<addr> <kind> <symbol>`; bare listings are just the
        // symbol.
        let Some(symbol) = line.split_whitespace().last() else {
            continue;
        };
        if oracle.should_debase(symbol) {
            println!("{path}: {symbol}");
        }
    }
    Ok(())
}
