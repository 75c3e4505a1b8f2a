use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::arena::{Fifo, Handle};
use crate::levels::{LevelAction, LevelInfo, LevelTable, OrderbookLevelInfos};
use crate::orders::{Order, OrderId, OrderType, Price, Quantity, Side};
use crate::sweeper::{self, SweeperConfig};
use crate::trade::{Trade, TradeInfo};

/// Where a resting order lives: which side's ladder, which price key
/// within it, and the stable handle into that price's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrderLocation {
    side: Side,
    price: Price,
    handle: Handle,
}

/// The book itself: two price ladders, the order index, and the
/// per-side level-aggregate tables, all kept in lockstep. Every method
/// here assumes its caller already holds the book lock — `Book` has
/// no internal synchronization of its own; that lives one layer up in
/// [`Inner`].
pub(crate) struct Book {
    bids: BTreeMap<Price, Fifo<Order>>,
    asks: BTreeMap<Price, Fifo<Order>>,
    index: HashMap<OrderId, OrderLocation>,
    bid_levels: LevelTable,
    ask_levels: LevelTable,
}

impl Book {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            bid_levels: LevelTable::new(),
            ask_levels: LevelTable::new(),
        }
    }

    fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    fn worst_bid(&self) -> Option<Price> {
        self.bids.keys().next().copied()
    }

    fn worst_ask(&self) -> Option<Price> {
        self.asks.keys().next_back().copied()
    }

    /// Would an incoming order of `side` at `price` cross the book at
    /// all (i.e. touch the opposite side's best price)?
    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.best_ask().is_some_and(|ask| price >= ask),
            Side::Sell => self.best_bid().is_some_and(|bid| price <= bid),
        }
    }

    /// Walks the opposite side's level-aggregate table from its best
    /// price outward, stopping at `price`, accumulating quantity until
    /// either it covers `quantity` (true) or the table is exhausted
    /// (false). See DESIGN.md for why every boundary here is written
    /// with an explicit, fully parenthesized comparison.
    fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        if !self.can_match(side, price) {
            return false;
        }
        let mut remaining = quantity;
        match side {
            Side::Buy => {
                // Best ask first; stop once a level is strictly worse than `price`.
                for (level_price, level) in self.ask_levels.iter() {
                    if level_price > price {
                        break;
                    }
                    remaining = remaining.saturating_sub(level.total_quantity);
                    if remaining == 0 {
                        return true;
                    }
                }
            }
            Side::Sell => {
                // Best bid first (highest), stop once strictly worse than `price`.
                for (level_price, level) in self.bid_levels.iter().rev() {
                    if level_price < price {
                        break;
                    }
                    remaining = remaining.saturating_sub(level.total_quantity);
                    if remaining == 0 {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn insert_resting(&mut self, order: Order) -> Handle {
        let order_id = order.order_id();
        let side = order.side();
        let price = order.price();
        let quantity = order.remaining_quantity();

        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let queue = ladder.entry(price).or_insert_with(Fifo::new);
        let handle = queue.push_back(order);

        let levels = match side {
            Side::Buy => &mut self.bid_levels,
            Side::Sell => &mut self.ask_levels,
        };
        levels.update(price, quantity, LevelAction::Add);

        self.index.insert(order_id, OrderLocation { side, price, handle });
        handle
    }

    /// Unlinks a resting order from its ladder, its level aggregate,
    /// and the index. Erases the ladder's price key if the queue it
    /// backed is now empty.
    ///
    /// `level_debit` is the quantity to subtract from the level
    /// aggregate's `total_quantity`. For a plain cancel it's the
    /// order's own `remaining_quantity` (`None` here means "use that
    /// default"). For a match-completing removal it must instead be
    /// the quantity just traded: by the time `match_orders` calls
    /// this, the order's `remaining_quantity` has already been
    /// decremented to zero by `fill`, so reading it here would
    /// silently under-debit the level total.
    fn remove_at(&mut self, location: OrderLocation, level_debit: Option<Quantity>) -> Option<Order> {
        let OrderLocation { side, price, handle } = location;
        let ladder = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let queue = ladder.get_mut(&price)?;
        let order = queue.remove(handle)?;
        let emptied = queue.is_empty();
        if emptied {
            ladder.remove(&price);
        }

        let levels = match side {
            Side::Buy => &mut self.bid_levels,
            Side::Sell => &mut self.ask_levels,
        };
        let debit = level_debit.unwrap_or_else(|| order.remaining_quantity());
        levels.update(price, debit, LevelAction::Remove);

        self.index.remove(&order.order_id());
        Some(order)
    }

    /// Drains crossing liquidity until the book is no longer crossed.
    /// Each iteration trades the exact quantity `min(bid, ask)
    /// remaining`, so at least one side empties every pass — this is
    /// what keeps the loop terminating without a separate fill-count
    /// bound.
    fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();

        loop {
            let (Some(bid_price), Some(ask_price)) = (self.best_bid(), self.best_ask()) else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            let bid_handle = self.bids[&bid_price]
                .front_handle()
                .expect("non-empty ladder price key implies a non-empty queue");
            let ask_handle = self.asks[&ask_price]
                .front_handle()
                .expect("non-empty ladder price key implies a non-empty queue");

            let quantity = {
                let bid = self.bids[&bid_price].get(bid_handle).unwrap();
                let ask = self.asks[&ask_price].get(ask_handle).unwrap();
                bid.remaining_quantity().min(ask.remaining_quantity())
            };

            self.bids
                .get_mut(&bid_price)
                .unwrap()
                .get_mut(bid_handle)
                .unwrap()
                .fill(quantity)
                .expect("quantity is bounded by the bid's own remaining_quantity above");
            self.asks
                .get_mut(&ask_price)
                .unwrap()
                .get_mut(ask_handle)
                .unwrap()
                .fill(quantity)
                .expect("quantity is bounded by the ask's own remaining_quantity above");

            let (bid_id, bid_filled) = {
                let bid = self.bids[&bid_price].get(bid_handle).unwrap();
                (bid.order_id(), bid.is_filled())
            };
            let (ask_id, ask_filled) = {
                let ask = self.asks[&ask_price].get(ask_handle).unwrap();
                (ask.order_id(), ask.is_filled())
            };

            if bid_filled {
                self.remove_at(
                    OrderLocation { side: Side::Buy, price: bid_price, handle: bid_handle },
                    Some(quantity),
                );
            } else {
                self.bid_levels.update(bid_price, quantity, LevelAction::Match);
            }
            if ask_filled {
                self.remove_at(
                    OrderLocation { side: Side::Sell, price: ask_price, handle: ask_handle },
                    Some(quantity),
                );
            } else {
                self.ask_levels.update(ask_price, quantity, LevelAction::Match);
            }

            debug!(bid_id, ask_id, bid_price, ask_price, quantity, "matched");
            trades.push(Trade {
                bid: TradeInfo {
                    order_id: bid_id,
                    price: bid_price,
                    quantity,
                },
                ask: TradeInfo {
                    order_id: ask_id,
                    price: ask_price,
                    quantity,
                },
            });
        }

        trades
    }

    /// The five-step admission gate from the order-type policy, run
    /// before any new order is allowed into a ladder.
    fn add_order(&mut self, mut order: Order) -> Vec<Trade> {
        let order_id = order.order_id();
        if self.index.contains_key(&order_id) {
            debug!(order_id, "rejected duplicate order id");
            return Vec::new();
        }

        if order.order_type() == OrderType::Market {
            let worst = match order.side() {
                Side::Buy => self.worst_ask(),
                Side::Sell => self.worst_bid(),
            };
            let Some(worst) = worst else {
                debug!(order_id, "dropped market order: opposite side empty");
                return Vec::new();
            };
            order
                .rewrite_to_limit(worst)
                .expect("order_type() == Market guarantees rewrite_to_limit succeeds");
        }

        if order.order_type() == OrderType::FillAndKill
            && !self.can_match(order.side(), order.price())
        {
            debug!(order_id, "dropped fill-and-kill: cannot cross immediately");
            return Vec::new();
        }

        if order.order_type() == OrderType::FillOrKill
            && !self.can_fully_fill(order.side(), order.price(), order.remaining_quantity())
        {
            debug!(order_id, "dropped fill-or-kill: book cannot fully absorb it");
            return Vec::new();
        }

        let side = order.side();
        let price = order.price();
        let order_type = order.order_type();
        self.insert_resting(order);

        let trades = self.match_orders();

        if order_type == OrderType::FillAndKill {
            if let Some(location) = self.index.get(&order_id).copied() {
                debug_assert_eq!(location.side, side);
                debug_assert_eq!(location.price, price);
                info!(order_id, "cancelling fill-and-kill residual left resting");
                self.remove_at(location, None);
            }
        }

        trades
    }

    fn cancel_order(&mut self, order_id: OrderId) {
        if let Some(location) = self.index.get(&order_id).copied() {
            self.remove_at(location, None);
        }
    }

    fn cancel_orders(&mut self, order_ids: &[OrderId]) {
        for &order_id in order_ids {
            self.cancel_order(order_id);
        }
    }

    /// Cancels the existing order and resubmits it under the original
    /// type with the new side/price/quantity. This loses queue
    /// priority at the new price and may re-trigger the admission
    /// gates (a modified `FillOrKill` can still be dropped).
    fn modify_order(&mut self, order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> Vec<Trade> {
        let Some(location) = self.index.get(&order_id).copied() else {
            return Vec::new();
        };
        let order_type = {
            let ladder = match location.side {
                Side::Buy => &self.bids,
                Side::Sell => &self.asks,
            };
            ladder
                .get(&location.price)
                .and_then(|queue| queue.get(location.handle))
                .map(Order::order_type)
                .expect("index entry must point at a live, resting order")
        };
        self.remove_at(location, None);
        self.add_order(Order::new(order_type, order_id, side, price, quantity))
    }

    fn size(&self) -> usize {
        self.index.len()
    }

    fn get_order_infos(&self) -> OrderbookLevelInfos {
        let bids = self
            .bid_levels
            .iter()
            .rev()
            .map(|(price, level)| LevelInfo {
                price,
                quantity: level.total_quantity,
            })
            .collect();
        let asks = self
            .ask_levels
            .iter()
            .map(|(price, level)| LevelInfo {
                price,
                quantity: level.total_quantity,
            })
            .collect();
        OrderbookLevelInfos { bids, asks }
    }

    fn good_for_day_ids(&self) -> Vec<OrderId> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(Fifo::iter)
            .filter(|order| order.order_type() == OrderType::GoodForDay)
            .map(Order::order_id)
            .collect()
    }
}

/// State shared between the public [`OrderBook`] facade and the
/// background sweeper thread: the book itself, a condvar bound to the
/// *same* mutex (not a dummy one — the sweeper's timed wait must
/// release the real book lock), and the shutdown flag.
pub(crate) struct Inner {
    pub(crate) book: Mutex<Book>,
    pub(crate) condvar: Condvar,
    pub(crate) shutdown: AtomicBool,
}

impl Inner {
    pub(crate) fn good_for_day_ids(&self) -> Vec<OrderId> {
        self.book
            .lock()
            .expect("order book mutex poisoned")
            .good_for_day_ids()
    }

    pub(crate) fn cancel_orders(&self, order_ids: &[OrderId]) {
        self.book
            .lock()
            .expect("order book mutex poisoned")
            .cancel_orders(order_ids);
    }
}

/// A single-symbol limit order book with a continuous matching engine.
///
/// All mutating and query operations acquire one exclusive lock for
/// their full duration; a background thread sweeps `GoodForDay`
/// orders at the daily cutoff under the same lock. Dropping the book
/// signals and joins that thread before releasing its orders.
pub struct OrderBook {
    inner: Arc<Inner>,
    sweeper: Option<JoinHandle<()>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::with_sweeper_config(SweeperConfig::default())
    }

    /// Constructs a book whose sweeper uses a non-default cutoff hour
    /// or guard duration. Exposed mainly so tests don't have to wait
    /// for a real 16:00 local rollover.
    pub fn with_sweeper_config(config: SweeperConfig) -> Self {
        let inner = Arc::new(Inner {
            book: Mutex::new(Book::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let sweeper_inner = Arc::clone(&inner);
        let sweeper = thread::Builder::new()
            .name("order-book-sweeper".into())
            .spawn(move || sweeper::run(sweeper_inner, config))
            .expect("failed to spawn session sweeper thread");

        Self {
            inner,
            sweeper: Some(sweeper),
        }
    }

    pub fn add_order(&self, order: Order) -> Vec<Trade> {
        self.inner
            .book
            .lock()
            .expect("order book mutex poisoned")
            .add_order(order)
    }

    pub fn cancel_order(&self, order_id: OrderId) {
        self.inner
            .book
            .lock()
            .expect("order book mutex poisoned")
            .cancel_order(order_id);
    }

    pub fn cancel_orders(&self, order_ids: &[OrderId]) {
        self.inner
            .book
            .lock()
            .expect("order book mutex poisoned")
            .cancel_orders(order_ids);
    }

    pub fn modify_order(&self, order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> Vec<Trade> {
        self.inner
            .book
            .lock()
            .expect("order book mutex poisoned")
            .modify_order(order_id, side, price, quantity)
    }

    pub fn size(&self) -> usize {
        self.inner.book.lock().expect("order book mutex poisoned").size()
    }

    pub fn get_order_infos(&self) -> OrderbookLevelInfos {
        self.inner
            .book
            .lock()
            .expect("order book mutex poisoned")
            .get_order_infos()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OrderBook {
    fn drop(&mut self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.condvar.notify_all();
        if let Some(handle) = self.sweeper.take() {
            if handle.join().is_err() {
                warn!("session sweeper thread panicked during shutdown");
            }
        }
    }
}
