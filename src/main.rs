mod debug_report;

use atn_profiler::sample::{self, SampleParser, SamplePredicates};
use atn_profiler::{CommonTokenStream, ParserAtnSimulator, PredictionMode, ProfilingAtnSimulator, Simulator, logging};
use chrono::Local;
use std::io::{self, IsTerminal, Read};

const DEFAULT_TOP: usize = 5;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = logging::init_logging(config.verbosity) {
        eprintln!("warning: {err}");
    }

    let tokens = match sample::tokenize(&config.input) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let started_at = Local::now();
    let sim = ParserAtnSimulator::new(sample::atn()).with_mode(config.mode).with_predicates(config.predicates);
    let mut parser = SampleParser::new(ProfilingAtnSimulator::new(sim));
    let mut input = CommonTokenStream::new("<cli>", tokens);
    let statements = parser.parse(&mut input);
    tracing::info!(statements = statements.len(), "parsed");

    let profiler = parser.simulator();
    let report = debug_report::Report {
        input: &config.input,
        atn: profiler.atn(),
        mode: config.mode,
        started_at,
        statements: &statements,
        info: profiler.parse_info(),
        top: config.top,
    };
    debug_report::print_profile(&report, config.color);
}

#[derive(Debug)]
struct CliConfig {
    input: String,
    mode: PredictionMode,
    predicates: SamplePredicates,
    top: usize,
    color: bool,
    verbosity: u8,
}

fn parse_args() -> Result<CliConfig, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from(args: impl IntoIterator<Item = String>) -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut mode = PredictionMode::default();
    let mut predicates = SamplePredicates::default();
    let mut top = DEFAULT_TOP;
    let mut color = io::stdout().is_terminal();
    let mut verbosity = 0u8;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("atn-profile {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--qualified" => predicates.qualified = true,
            "--no-bare-ints" => predicates.bare_ints = false,
            "--mode" => {
                let value = args.next().ok_or_else(|| "error: --mode expects a value".to_string())?;
                mode = parse_mode(&value)?;
            }
            "--top" => {
                let value = args.next().ok_or_else(|| "error: --top expects a value".to_string())?;
                top = parse_top(&value)?;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--mode=") => mode = parse_mode(arg.trim_start_matches("--mode="))?,
            _ if arg.starts_with("--top=") => top = parse_top(arg.trim_start_matches("--top="))?,
            _ if arg.starts_with("--input=") => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(arg.trim_start_matches("--input=").to_string());
            }
            _ if arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((arg.len() - 1) as u8);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, mode, predicates, top, color, verbosity })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_mode(value: &str) -> Result<PredictionMode, String> {
    value.parse().map_err(|err| format!("error: {err}"))
}

fn parse_top(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --top '{value}' (expected a non-negative integer)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "atn-profile {version}

Profile adaptive prediction over the built-in sample grammar.

Usage:
  atn-profile [OPTIONS] [--] <input...>
  atn-profile [OPTIONS] --input <text>

Input is a sequence of ';'-terminated statements, for example:
  atn-profile 'x ; x . ; a = 1 ; f ( ) ; 1 + 2 ;'

Options:
  -i, --input <text>         Input text to parse. If omitted, reads remaining args
                             or stdin when no args are provided.
  --mode <mode>              Prediction mode: sll, ll or ll-exact. Default: ll
  --qualified                Make the context-dependent {{qualified}}? predicate true.
  --no-bare-ints             Make the {{bare_ints}}? predicate false.
  --top <n>                  Rows in ranked sections. Default: {default_top}
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -v, -vv, -vvv              Log verbosity (info, debug, trace). RUST_LOG overrides.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success (prediction failures are part of the report).
  2  Invalid arguments, missing input, or unrecognized input text.
",
        version = env!("CARGO_PKG_VERSION"),
        default_top = DEFAULT_TOP
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliConfig, String> {
        parse_args_from(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn predicate_switches_and_options_are_parsed() {
        let config = parse(&["--qualified", "--no-bare-ints", "--mode=sll", "--top", "3", "-vv", "x", ";"]).unwrap();
        assert_eq!(config.predicates, SamplePredicates { qualified: true, bare_ints: false });
        assert_eq!(config.mode, PredictionMode::Sll);
        assert_eq!(config.top, 3);
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.input, "x ;");
    }

    #[test]
    fn unknown_options_and_repeated_input_are_rejected() {
        assert!(parse(&["--types", "x ;"]).unwrap_err().contains("unknown option '--types'"));
        assert!(parse(&["-i", "x ;", "y ;"]).unwrap_err().contains("multiple times"));
        assert!(parse(&["--mode", "fast", "x ;"]).is_err());
    }
}
