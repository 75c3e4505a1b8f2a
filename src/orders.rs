use crate::errors::OrderBookError;

pub type Price = i32;
pub type Quantity = u32;
pub type OrderId = u64;

/// Sentinel price carried by a freshly constructed [`OrderType::Market`]
/// order. It is never read by the matching engine — [`Order::rewrite_to_limit`]
/// replaces it with a real price before the order can rest or trade.
pub(crate) const INVALID_PRICE: Price = Price::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

/// The closed set of order types the book accepts. See the admission
/// policy in `orderbook::Book::add_order` for how each is gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    /// Rests until cancelled.
    GoodTillCancel,
    /// Trades what it can immediately; the remainder is dropped.
    FillAndKill,
    /// Trades its full size immediately or is dropped entirely.
    FillOrKill,
    /// A `GoodTillCancel` that is also cancelled at the daily cutoff.
    GoodForDay,
    /// Takes liquidity at any price; rewritten to a limit at the worst
    /// price on the opposite side before it can rest or trade.
    Market,
}

/// A single order, resting or in flight.
///
/// `remaining_quantity` only ever decreases. A `Market` order's price
/// is [`INVALID_PRICE`] until [`Order::rewrite_to_limit`] assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    order_type: OrderType,
    order_id: OrderId,
    side: Side,
    price: Price,
    initial_quantity: Quantity,
    remaining_quantity: Quantity,
}

impl Order {
    pub fn new(
        order_type: OrderType,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_type,
            order_id,
            side,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// A market order carries no meaningful price until it is rewritten
    /// on admission (see `orderbook::Book::add_order`).
    pub fn new_market(order_id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(OrderType::Market, order_id, side, INVALID_PRICE, quantity)
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub(crate) fn fill(&mut self, quantity: Quantity) -> Result<(), OrderBookError> {
        if quantity > self.remaining_quantity {
            return Err(OrderBookError::Overfill {
                order_id: self.order_id,
                quantity,
                remaining: self.remaining_quantity,
            });
        }
        self.remaining_quantity -= quantity;
        Ok(())
    }

    /// Rewrites a `Market` order to a resting `GoodTillCancel` at `price`.
    /// Only legal while the order is still `Market`.
    pub(crate) fn rewrite_to_limit(&mut self, price: Price) -> Result<(), OrderBookError> {
        if self.order_type != OrderType::Market {
            return Err(OrderBookError::NotAMarketOrder {
                order_id: self.order_id,
            });
        }
        self.price = price;
        self.order_type = OrderType::GoodTillCancel;
        Ok(())
    }
}
