//! Parser and runner for the line-oriented order book test grammar:
//!
//! ```text
//! A <B|S> <OrderType> <price> <quantity> <id>   -- add
//! M <id> <B|S> <price> <quantity>               -- modify
//! C <id>                                        -- cancel
//! R <total_resting> <bid_levels> <ask_levels>   -- expected final state
//! ```
//!
//! `R` always terminates a script; any lines after it are ignored.
//! This grammar is an external collaborator to the book itself — the
//! book has no idea this text format exists — so it lives in its own
//! module rather than inside `orderbook`.

use thiserror::Error;

use crate::orderbook::OrderBook;
use crate::orders::{Order, OrderId, OrderType, Price, Quantity, Side};
use crate::trade::Trade;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("line {line_number}: empty line")]
    EmptyLine { line_number: usize },

    #[error("line {line_number}: unknown action {token:?}")]
    UnknownAction { line_number: usize, token: String },

    #[error("line {line_number}: unknown side {token:?}, expected B or S")]
    UnknownSide { line_number: usize, token: String },

    #[error("line {line_number}: unknown order type {token:?}")]
    UnknownOrderType { line_number: usize, token: String },

    #[error("line {line_number}: expected {expected} fields, found {found}")]
    WrongFieldCount {
        line_number: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line_number}: could not parse {field} as an integer: {source}")]
    InvalidInteger {
        line_number: usize,
        field: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("script has no terminating R line")]
    MissingResultLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add {
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        order_id: OrderId,
    },
    Modify {
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Cancel {
        order_id: OrderId,
    },
}

/// The terminal `R` line: the resting-order count and per-side level
/// counts a script expects to see once every preceding action has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub total_resting: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
}

enum Line {
    Action(Action),
    Result(ExpectedState),
}

fn parse_side(token: &str, line_number: usize) -> Result<Side, GrammarError> {
    match token {
        "B" => Ok(Side::Buy),
        "S" => Ok(Side::Sell),
        _ => Err(GrammarError::UnknownSide {
            line_number,
            token: token.to_string(),
        }),
    }
}

fn parse_order_type(token: &str, line_number: usize) -> Result<OrderType, GrammarError> {
    match token {
        "GoodTillCancel" => Ok(OrderType::GoodTillCancel),
        "FillAndKill" => Ok(OrderType::FillAndKill),
        "FillOrKill" => Ok(OrderType::FillOrKill),
        "GoodForDay" => Ok(OrderType::GoodForDay),
        "Market" => Ok(OrderType::Market),
        _ => Err(GrammarError::UnknownOrderType {
            line_number,
            token: token.to_string(),
        }),
    }
}

fn parse_i32(token: &str, field: &'static str, line_number: usize) -> Result<i32, GrammarError> {
    token
        .parse::<i32>()
        .map_err(|source| GrammarError::InvalidInteger {
            line_number,
            field,
            source,
        })
}

fn parse_u32(token: &str, field: &'static str, line_number: usize) -> Result<u32, GrammarError> {
    token
        .parse::<u32>()
        .map_err(|source| GrammarError::InvalidInteger {
            line_number,
            field,
            source,
        })
}

fn parse_u64(token: &str, field: &'static str, line_number: usize) -> Result<u64, GrammarError> {
    token
        .parse::<u64>()
        .map_err(|source| GrammarError::InvalidInteger {
            line_number,
            field,
            source,
        })
}

fn parse_usize(token: &str, field: &'static str, line_number: usize) -> Result<usize, GrammarError> {
    token
        .parse::<usize>()
        .map_err(|source| GrammarError::InvalidInteger {
            line_number,
            field,
            source,
        })
}

fn parse_line(raw: &str, line_number: usize) -> Result<Line, GrammarError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let Some(&action) = tokens.first() else {
        return Err(GrammarError::EmptyLine { line_number });
    };

    match action {
        "A" => {
            if tokens.len() != 6 {
                return Err(GrammarError::WrongFieldCount {
                    line_number,
                    expected: 6,
                    found: tokens.len(),
                });
            }
            Ok(Line::Action(Action::Add {
                side: parse_side(tokens[1], line_number)?,
                order_type: parse_order_type(tokens[2], line_number)?,
                price: parse_i32(tokens[3], "price", line_number)?,
                quantity: parse_u32(tokens[4], "quantity", line_number)?,
                order_id: parse_u64(tokens[5], "id", line_number)?,
            }))
        }
        "M" => {
            if tokens.len() != 5 {
                return Err(GrammarError::WrongFieldCount {
                    line_number,
                    expected: 5,
                    found: tokens.len(),
                });
            }
            Ok(Line::Action(Action::Modify {
                order_id: parse_u64(tokens[1], "id", line_number)?,
                side: parse_side(tokens[2], line_number)?,
                price: parse_i32(tokens[3], "price", line_number)?,
                quantity: parse_u32(tokens[4], "quantity", line_number)?,
            }))
        }
        "C" => {
            if tokens.len() != 2 {
                return Err(GrammarError::WrongFieldCount {
                    line_number,
                    expected: 2,
                    found: tokens.len(),
                });
            }
            Ok(Line::Action(Action::Cancel {
                order_id: parse_u64(tokens[1], "id", line_number)?,
            }))
        }
        "R" => {
            if tokens.len() != 4 {
                return Err(GrammarError::WrongFieldCount {
                    line_number,
                    expected: 4,
                    found: tokens.len(),
                });
            }
            Ok(Line::Result(ExpectedState {
                total_resting: parse_usize(tokens[1], "total_resting", line_number)?,
                bid_levels: parse_usize(tokens[2], "bid_levels", line_number)?,
                ask_levels: parse_usize(tokens[3], "ask_levels", line_number)?,
            }))
        }
        other => Err(GrammarError::UnknownAction {
            line_number,
            token: other.to_string(),
        }),
    }
}

/// The outcome of running a whole script against a fresh book: every
/// trade produced along the way, plus the expected vs. actual final
/// state so a caller can decide pass/fail.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub trades: Vec<Trade>,
    pub expected: ExpectedState,
    pub actual: ExpectedState,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Applies a whole script, line by line, to `book`. Blank lines are
/// skipped; the first `R` line ends the script and everything after
/// it is ignored, matching the grammar's "terminated by a single
/// result line" contract.
pub fn run_script<'a>(
    book: &OrderBook,
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<Outcome, GrammarError> {
    let mut trades = Vec::new();

    for (index, raw) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        match parse_line(raw, line_number)? {
            Line::Action(Action::Add {
                side,
                order_type,
                price,
                quantity,
                order_id,
            }) => {
                let order = if order_type == OrderType::Market {
                    Order::new_market(order_id, side, quantity)
                } else {
                    Order::new(order_type, order_id, side, price, quantity)
                };
                trades.extend(book.add_order(order));
            }
            Line::Action(Action::Modify {
                order_id,
                side,
                price,
                quantity,
            }) => {
                trades.extend(book.modify_order(order_id, side, price, quantity));
            }
            Line::Action(Action::Cancel { order_id }) => {
                book.cancel_order(order_id);
            }
            Line::Result(expected) => {
                let infos = book.get_order_infos();
                let actual = ExpectedState {
                    total_resting: book.size(),
                    bid_levels: infos.bids.len(),
                    ask_levels: infos.asks.len(),
                };
                return Ok(Outcome {
                    trades,
                    expected,
                    actual,
                });
            }
        }
    }

    Err(GrammarError::MissingResultLine)
}
