use thiserror::Error;

use crate::orders::{OrderId, Quantity};

/// Errors that can only arise from a defect in the book itself — a
/// caller never triggers these through any legal sequence of public
/// operations. Call sites treat them as fatal (`.expect(...)`), the
/// Rust analogue of the original engine's `throw std::logic_error`.
#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("order {order_id} cannot be filled for {quantity} units; only {remaining} remain")]
    Overfill {
        order_id: OrderId,
        quantity: Quantity,
        remaining: Quantity,
    },

    #[error("order {order_id} cannot be rewritten to a limit price: only market orders rewrite")]
    NotAMarketOrder { order_id: OrderId },
}
