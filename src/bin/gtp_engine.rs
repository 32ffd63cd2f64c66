use std::io::{self, BufRead, Write as _};

use clap::Parser;
use gokifu::game::Rules;
use gokifu::gtp::Dispatcher;
use log::info;

/// A GTP-speaking Go engine: reads commands on stdin, writes framed
/// responses on stdout, until `quit` or end of input.
#[derive(Parser, Debug)]
#[command(name = "gtp_engine", version, about)]
struct Args {
    /// Initial board side.
    #[arg(long, default_value_t = 19)]
    size: usize,

    /// Initial ruleset.
    #[arg(long, default_value = "japanese")]
    rules: String,

    /// Initial komi.
    #[arg(long, default_value_t = 6.5)]
    komi: f64,

    /// Logging verbosity (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    let rules: Rules = args.rules.parse().unwrap_or(Rules::Japanese);
    let mut dispatcher = Dispatcher::new("gokifu", env!("CARGO_PKG_VERSION"), args.size, rules, args.komi);

    info!("gtp_engine listening on stdin ({}x{}, {rules}, komi {})", args.size, args.size, args.komi);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let response = dispatcher.execute_line(&line);
        if !response.is_empty() {
            stdout.write_all(response.as_bytes())?;
            stdout.flush()?;
        }
        if !dispatcher.is_active() {
            break;
        }
    }

    Ok(())
}
