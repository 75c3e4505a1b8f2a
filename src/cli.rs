use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use order_book_engine::grammar;
use order_book_engine::orderbook::OrderBook;

/// Runs a test-grammar script (see `grammar`) against a fresh order
/// book and reports whether the final state matched the script's `R`
/// line.
#[derive(Parser)]
#[command(name = "order-book-cli")]
#[command(version, about = "Drives a limit order book through a scripted sequence of orders")]
pub struct Cli {
    /// Path to a script file. Omit to read the script from stdin.
    path: Option<PathBuf>,
}

fn read_script(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Entry point used by `main`. Returns the process exit code: `0` if
/// the script's expected final state matched, `1` otherwise (parse
/// failure, I/O failure, or a state mismatch).
pub fn run() -> i32 {
    let cli = Cli::parse();

    let contents = match read_script(cli.path.as_ref()) {
        Ok(contents) => contents,
        Err(err) => {
            error!(error = %err, "failed to read script");
            return 1;
        }
    };

    let book = OrderBook::new();
    let outcome = match grammar::run_script(&book, contents.lines()) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "failed to run script");
            return 1;
        }
    };

    info!(trades = outcome.trades.len(), "script finished");
    for trade in &outcome.trades {
        println!(
            "trade: bid(id={}, price={}, qty={}) ask(id={}, price={}, qty={})",
            trade.bid.order_id, trade.bid.price, trade.bid.quantity,
            trade.ask.order_id, trade.ask.price, trade.ask.quantity,
        );
    }

    println!(
        "expected: resting={} bid_levels={} ask_levels={}",
        outcome.expected.total_resting, outcome.expected.bid_levels, outcome.expected.ask_levels,
    );
    println!(
        "actual:   resting={} bid_levels={} ask_levels={}",
        outcome.actual.total_resting, outcome.actual.bid_levels, outcome.actual.ask_levels,
    );

    if outcome.passed() {
        println!("PASS");
        0
    } else {
        println!("FAIL");
        1
    }
}
