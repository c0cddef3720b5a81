use atn_profiler::sample::{Statement, StatementOutcome};
use atn_profiler::{Atn, DecisionEvent, DecisionInfo, ParseInfo, PredictionMode};
use chrono::{DateTime, Local};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Everything one CLI run prints.
pub struct Report<'a> {
    pub input: &'a str,
    pub atn: &'a Atn,
    pub mode: PredictionMode,
    pub started_at: DateTime<Local>,
    pub statements: &'a [Statement],
    pub info: ParseInfo<'a>,
    /// Rows per ranked section.
    pub top: usize,
}

pub fn print_profile(report: &Report<'_>, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Profiling: \"{}\"", report.input.trim()), ansi::CYAN)));
    println!(
        "{}",
        palette.dim(format!("   mode {}  │  {}", report.mode, report.started_at.format("%Y-%m-%d %H:%M:%S")))
    );

    println!("\n{}", palette.paint("━━━ Statements ━━━", ansi::GRAY));
    print_statements(report.statements, &palette);

    println!("\n{}", palette.paint("━━━ Decisions ━━━", ansi::GRAY));
    if report.info.summaries().is_empty() {
        println!("{}", palette.dim("  No decisions invoked"));
    } else {
        for info in report.info.decision_info().iter().filter(|d| d.invocations > 0) {
            print_decision(report, info, &palette);
        }
        println!("\n  {}", palette.dim("flags: F full-context  C context-sensitive  A ambiguous  E errors  P predicates"));
    }

    println!("\n{}", palette.paint("━━━ Events ━━━", ansi::GRAY));
    print_events(report, &palette);

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Prediction: {}  │  SLL lookahead: {}  │  LL lookahead: {}  │  DFA states: {}",
        palette.paint(format!("{:?}", report.info.total_time_in_prediction()), ansi::GREEN),
        palette.paint(report.info.total_sll_lookahead_ops().to_string(), ansi::CYAN),
        palette.paint(report.info.total_ll_lookahead_ops().to_string(), ansi::MAGENTA),
        palette.dim(report.info.dfa_size().to_string()),
    );
    for info in report.info.slowest(report.top) {
        println!(
            "  {} {}  {}",
            palette.paint(decision_name(report.atn, info.decision), ansi::BLUE),
            palette.paint(format!("{:?}", info.time_in_prediction), ansi::GREEN),
            palette.dim(format!("over {} calls", info.invocations)),
        );
    }
    println!();
}

fn print_statements(statements: &[Statement], palette: &ansi::Palette) {
    if statements.is_empty() {
        println!("{}", palette.dim("  No statements"));
        return;
    }
    for (idx, stmt) in statements.iter().enumerate() {
        let outcome = match &stmt.outcome {
            StatementOutcome::Parsed(alt) => palette.paint(format!("✓ alt {alt}"), ansi::GREEN),
            StatementOutcome::NoViableAlt(err) => palette.paint(format!("✗ {err}"), ansi::RED),
            StatementOutcome::Mismatch { alt, index } => {
                palette.paint(format!("✗ alt {alt} did not match at token {index}"), ansi::RED)
            }
        };
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.bold(&stmt.text),
            palette.dim("│"),
            outcome
        );
    }
}

fn print_decision(report: &Report<'_>, info: &DecisionInfo, palette: &ansi::Palette) {
    println!(
        "  {} {}  {} {}  {} {}",
        palette.paint(decision_name(report.atn, info.decision), ansi::BLUE),
        palette.dim(info.flags().markers()),
        palette.dim("calls:"),
        palette.paint(info.invocations.to_string(), ansi::YELLOW),
        palette.dim("dfa states:"),
        palette.paint(report.info.dfa_size_of(info.decision).to_string(), ansi::YELLOW),
    );
    println!(
        "      {} {}  {} {}",
        palette.dim("SLL k:"),
        palette.paint(fmt_look(info.sll.min_look, info.sll.max_look, info.sll.total_look), ansi::CYAN),
        palette.dim("│ dfa/atn steps:"),
        palette.paint(format!("{}/{}", info.sll_dfa_transitions, info.sll_atn_transitions), ansi::CYAN),
    );
    if info.ll.is_set() {
        println!(
            "      {} {}  {} {}  {} {}",
            palette.dim("LL  k:"),
            palette.paint(fmt_look(info.ll.min_look, info.ll.max_look, info.ll.total_look), ansi::MAGENTA),
            palette.dim("│ atn steps:"),
            palette.paint(info.ll_atn_transitions.to_string(), ansi::MAGENTA),
            palette.dim("│ fallbacks:"),
            palette.paint(info.ll_fallback.to_string(), ansi::MAGENTA),
        );
    }
    if let Some(event) = &info.sll.max_look_event {
        println!("      {} {}", palette.dim("deepest:"), palette.dim(format!("'{}'", event.text())));
    }
}

fn print_events(report: &Report<'_>, palette: &ansi::Palette) {
    let mut printed = 0;
    for info in report.info.decision_info() {
        for event in &info.ambiguities {
            println!("  {} {}", palette.paint("ambiguity  ", ansi::YELLOW), event);
        }
        for event in &info.context_sensitivities {
            println!("  {} {}", palette.paint("context    ", ansi::MAGENTA), event);
        }
        for event in &info.errors {
            println!("  {} {}", palette.paint("error      ", ansi::RED), event);
        }
        printed += info.ambiguities.len() + info.context_sensitivities.len() + info.errors.len();
    }

    for (decision, evals) in report.info.predicate_hot_spots(report.top) {
        println!(
            "  {} {} {}",
            palette.paint("predicates ", ansi::CYAN),
            decision_name(report.atn, decision),
            palette.dim(format!("{evals} distinct evaluations")),
        );
        printed += 1;
    }

    if printed == 0 {
        println!("{}", palette.dim("  No events recorded"));
    }
}

fn decision_name(atn: &Atn, decision: usize) -> String {
    format!("{}#{decision}", atn.decision(decision).name)
}

fn fmt_look(min: Option<u64>, max: Option<u64>, total: u64) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("min {min} max {max} total {total}"),
        _ => "unset".to_string(),
    }
}
