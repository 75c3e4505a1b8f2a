//! A single-symbol limit order book with a continuous, price-time
//! priority matching engine.
//!
//! [`orderbook::OrderBook`] is the entry point: construct one, submit
//! orders with [`orderbook::OrderBook::add_order`], and read back
//! trades and book depth. A background thread sweeps `GoodForDay`
//! orders at the daily session cutoff for the lifetime of the book.

pub mod arena;
pub mod errors;
pub mod grammar;
pub mod levels;
pub mod orderbook;
pub mod orders;
pub mod sweeper;
pub mod trade;
