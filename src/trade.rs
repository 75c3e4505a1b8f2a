use crate::orders::{OrderId, Price, Quantity};

/// One side of a [`Trade`]: the id of the order that traded, the price
/// it traded at (its own resting price, not necessarily the other
/// side's), and the quantity filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeInfo {
    pub order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

/// A matched transaction: one bid-side fill paired with one ask-side
/// fill of equal quantity. The two prices differ only when the
/// incoming order crossed the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub bid: TradeInfo,
    pub ask: TradeInfo,
}
