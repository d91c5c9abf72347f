//! kanagi CLI
//!
//! Usage:
//!   kanagi --text "your text here"                # Single turn, no session
//!   kanagi --text "text" --session s1             # Single turn in a session
//!   kanagi --interactive                          # Interactive mode (one session)
//!   kanagi --serve                                # HTTP API server
//!   kanagi --text "text" --json                   # JSON trace output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use kanagi::core::{run_server, FusionReasoner};
use kanagi::types::ReasoningTrace;
use kanagi::{ReasonerConfig, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "kanagi",
    version = VERSION,
    about = "Kanagi - symbolic fire/water reasoning with spiral recursion",
    long_about = "Kanagi reads an utterance as fire, water and center evidence,\n\
                  resolves its phase and returns a provisional reasoning trace.\n\n\
                  Modes:\n  \
                  --text         Single turn\n  \
                  --interactive  One session, line by line\n  \
                  --serve        HTTP API server mode\n\n\
                  Forms:\n  \
                  WELL   - Center: contradictions held\n  \
                  LINE   - Rising fire\n  \
                  DOT    - Falling water\n  \
                  CIRCLE - Balanced, or the fallback state"
)]
struct Args {
    /// Text to reason over (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Session id for spiral and fermentation state
    #[arg(long)]
    session: Option<String>,

    /// Interactive mode - read lines from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show evidence breakdown
    #[arg(long)]
    verbose: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(!args.no_color)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => ReasonerConfig::load_or_default(path),
        None => ReasonerConfig::default(),
    };
    let reasoner = match FusionReasoner::new(config) {
        Ok(reasoner) => Arc::new(reasoner),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    if args.serve {
        run_serve(&args, reasoner).await;
    } else if args.interactive {
        run_interactive(&args, &reasoner).await;
    } else if let Some(ref text) = args.text {
        let trace = reasoner.reason(text, args.session.as_deref()).await;
        print_trace(&trace, &args);
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args, &reasoner).await;
    }
}

/// Run interactive mode: every line is one turn of the same session
async fn run_interactive(args: &Args, reasoner: &FusionReasoner) {
    let session = args
        .session
        .clone()
        .unwrap_or_else(|| "interactive".to_string());

    print_header(&session);
    println!("Type text and press Enter to reason. Type 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut depth = 0;

    loop {
        print!("{}", format_prompt(depth));
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended at depth {}.", depth);
            break;
        }
        if line.is_empty() {
            continue;
        }

        let trace = reasoner.reason(line, Some(&session)).await;
        depth = trace.spiral.depth;
        print_trace(&trace, args);
    }
}

fn print_trace(trace: &ReasoningTrace, args: &Args) {
    if args.json {
        match serde_json::to_string_pretty(trace) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Could not serialize trace: {}", e),
        }
    } else if args.verbose {
        print_verbose(trace, args.no_color);
    } else if args.no_color {
        println!("{}", trace.to_parseable_string());
    } else {
        println!("{}", trace.to_terminal_string());
    }
}

/// Print header
fn print_header(session: &str) {
    let title = format!("kanagi v{} - session {}", VERSION, session);
    let rule = "=".repeat(title.chars().count() + 4);
    println!("{}", rule.bold());
    println!("  {}", title.bold());
    println!("{}", rule.bold());
    println!();
}

fn format_prompt(depth: u32) -> String {
    format!("[depth {}] > ", depth).bright_black().to_string()
}

/// Print the evidence and phase breakdown of one trace
fn print_verbose(trace: &ReasoningTrace, no_color: bool) {
    let head = if no_color {
        trace.to_parseable_string()
    } else {
        trace.to_terminal_string()
    };
    println!("┌─────────────────────────────────────");
    println!("│ {}", head);
    println!("├─────────────────────────────────────");
    println!(
        "│ fire={} water={} center={} spirit={}",
        trace.tally.fire,
        trace.tally.water,
        trace.tally.center,
        trace
            .ledger
            .spirit
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("│ phase: {}", trace.phase_flags());
    println!("│ evidence:");
    for tag in &trace.tally.detected_by {
        println!("│   {}", tag);
    }
    if !trace.contradictions.is_empty() {
        println!("│ contradictions:");
        for c in &trace.contradictions {
            println!("│   {} ⇄ {} (tension {:.2})", c.thesis, c.antithesis, c.tension);
        }
    }
    if let Some(ref ferment) = trace.fermentation {
        println!(
            "│ fermenting since depth {} (energy {})",
            ferment.started_at_depth, ferment.unresolved_energy
        );
    }
    println!("├─────────────────────────────────────");
    println!("│ {}", trace.observation.description);
    for point in &trace.observation.unresolved {
        println!("│   ? {}", point);
    }
    let reasons: Vec<&str> = trace.reasons.iter().map(|r| r.code()).collect();
    println!("│ reasons: {}", reasons.join(", "));
    println!("└─────────────────────────────────────");
}

/// Run HTTP API server
async fn run_serve(args: &Args, reasoner: Arc<FusionReasoner>) {
    println!();
    println!("╔══════════════════════════════════════╗");
    println!("║  🜂 kanagi API Server                 ║");
    println!("║  Version: {:<27}║", VERSION);
    println!("╚══════════════════════════════════════╝");
    println!();

    if let Err(e) = run_server(&args.addr, reasoner).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
