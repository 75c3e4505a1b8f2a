use std::sync::Arc;
use std::thread;
use std::time::Duration;

use order_book_engine::orderbook::OrderBook;
use order_book_engine::orders::{Order, OrderType, Side};
use order_book_engine::sweeper::SweeperConfig;

#[test]
fn test_concurrent_submissions_never_leave_the_book_crossed() {
    let book = Arc::new(OrderBook::new());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let book = Arc::clone(&book);
            thread::spawn(move || {
                for i in 0..50u64 {
                    let id = worker * 1_000 + i;
                    let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                    let price = 100 + (i % 5) as i32;
                    book.add_order(Order::new(OrderType::GoodTillCancel, id, side, price, 1));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let infos = book.get_order_infos();
    if let (Some(best_bid), Some(best_ask)) = (infos.bids.first(), infos.asks.last()) {
        assert!(best_bid.price < best_ask.price);
    }
}

/// Dropping the book must signal and join the sweeper thread rather
/// than leaking it or hanging forever. A short cutoff guard keeps this
/// test fast without needing to wait for a real 16:00 rollover.
#[test]
fn test_dropping_the_book_joins_the_sweeper_promptly() {
    let config = SweeperConfig {
        cutoff_hour: 23,
        guard: Duration::from_millis(10),
        wait_override: None,
    };
    let book = OrderBook::with_sweeper_config(config);
    book.add_order(Order::new(OrderType::GoodForDay, 1, Side::Buy, 100, 5));
    drop(book);
}

/// Exercises the sweeper's cutoff firing end to end: once it actually
/// fires, every resting `GoodForDay` order is gone and every other
/// order type is untouched. `wait_override` forces the cutoff to land
/// a few milliseconds out instead of waiting for a real 16:00 local
/// rollover.
#[test]
fn test_sweeper_cancels_good_for_day_orders_once_the_cutoff_fires() {
    let config = SweeperConfig {
        cutoff_hour: 16,
        guard: Duration::from_millis(1),
        wait_override: Some(Duration::from_millis(30)),
    };
    let book = OrderBook::with_sweeper_config(config);
    book.add_order(Order::new(OrderType::GoodForDay, 1, Side::Buy, 100, 5));
    book.add_order(Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 99, 5));
    assert_eq!(book.size(), 2);

    thread::sleep(Duration::from_millis(300));

    assert_eq!(book.size(), 1);
    let infos = book.get_order_infos();
    assert_eq!(infos.bids.iter().map(|l| l.quantity).sum::<u32>(), 5);
    assert_eq!(infos.bids.len(), 1);
    assert_eq!(infos.bids[0].price, 99);
}
