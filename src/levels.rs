use std::collections::BTreeMap;

use crate::orders::{Price, Quantity};

/// The three events a price ladder mutation can raise against the
/// level table. `Match` and `Remove` both shrink a level, but they are
/// kept distinct because a level that hits zero quantity via `Remove`
/// erases its price key, while one that hits zero via `Match` may
/// still have the erase deferred to the caller (see the ladder-key
/// erasure timing decision in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelAction {
    Add,
    Remove,
    Match,
}

/// Running totals for one price level: how much quantity rests there
/// and how many distinct orders contribute to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelAggregate {
    pub total_quantity: Quantity,
    pub order_count: u32,
}

/// A `BTreeMap<Price, LevelAggregate>` kept in sync with a price
/// ladder's contents by the matching engine and cancel/modify paths —
/// never touched directly by anything that isn't already mutating the
/// corresponding ladder.
#[derive(Debug, Clone, Default)]
pub(crate) struct LevelTable(BTreeMap<Price, LevelAggregate>);

impl LevelTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Applies one order-level event to the aggregate at `price`.
    ///
    /// `Add` creates the entry if needed and increments both fields.
    /// `Remove` subtracts `quantity` and decrements `order_count` —
    /// the order is leaving the queue entirely. `Match` subtracts only
    /// `quantity`; `order_count` is untouched because the order stays
    /// resting with a smaller remaining quantity. Only `Remove` can
    /// empty a level out to zero orders, at which point the entry is
    /// dropped so the table never reports a phantom level.
    pub fn update(&mut self, price: Price, quantity: Quantity, action: LevelAction) {
        match action {
            LevelAction::Add => {
                let level = self.0.entry(price).or_default();
                level.total_quantity += quantity;
                level.order_count += 1;
            }
            LevelAction::Remove => {
                if let Some(level) = self.0.get_mut(&price) {
                    level.total_quantity = level.total_quantity.saturating_sub(quantity);
                    level.order_count = level.order_count.saturating_sub(1);
                    if level.order_count == 0 {
                        self.0.remove(&price);
                    }
                }
            }
            LevelAction::Match => {
                if let Some(level) = self.0.get_mut(&price) {
                    level.total_quantity = level.total_quantity.saturating_sub(quantity);
                }
            }
        }
    }

    pub fn get(&self, price: Price) -> Option<&LevelAggregate> {
        self.0.get(&price)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Price, &LevelAggregate)> {
        self.0.iter().map(|(&price, level)| (price, level))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One price/quantity pair in a public book snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub price: Price,
    pub quantity: Quantity,
}

/// A full-depth snapshot of both sides of the book, best price first
/// on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderbookLevelInfos {
    pub bids: Vec<LevelInfo>,
    pub asks: Vec<LevelInfo>,
}
