use order_book_engine::grammar::run_script;
use order_book_engine::orderbook::OrderBook;
use order_book_engine::trade::TradeInfo;

#[test]
fn test_good_till_cancel_orders_cross_at_the_common_price() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        ["A B GoodTillCancel 100 10 1", "A S GoodTillCancel 100 10 2", "R 0 0 0"],
    )
    .unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].bid, TradeInfo { order_id: 1, price: 100, quantity: 10 });
    assert_eq!(outcome.trades[0].ask, TradeInfo { order_id: 2, price: 100, quantity: 10 });
}

#[test]
fn test_fill_and_kill_against_an_empty_book_trades_nothing() {
    let book = OrderBook::new();
    let outcome = run_script(&book, ["A B FillAndKill 100 5 1", "R 0 0 0"]).unwrap();
    assert!(outcome.passed());
    assert!(outcome.trades.is_empty());
}

#[test]
fn test_fill_and_kill_trades_what_it_can_and_drops_the_remainder() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        ["A S GoodTillCancel 101 20 1", "A B FillAndKill 101 30 2", "R 0 0 0"],
    )
    .unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].bid, TradeInfo { order_id: 2, price: 101, quantity: 20 });
    assert_eq!(outcome.trades[0].ask, TradeInfo { order_id: 1, price: 101, quantity: 20 });
}

#[test]
fn test_fill_or_kill_absorbs_liquidity_spread_across_two_levels() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        [
            "A S GoodTillCancel 101 3 1",
            "A S GoodTillCancel 101 4 2",
            "A B FillOrKill 101 7 3",
            "R 0 0 0",
        ],
    )
    .unwrap();
    assert!(outcome.passed());
    let total: u32 = outcome.trades.iter().map(|t| t.bid.quantity).sum();
    assert_eq!(total, 7);
}

#[test]
fn test_fill_or_kill_is_dropped_and_leaves_the_resting_order_untouched() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        ["A S GoodTillCancel 101 3 1", "A B FillOrKill 101 7 2", "R 1 0 1"],
    )
    .unwrap();
    assert!(outcome.passed());
    assert!(outcome.trades.is_empty());
}

#[test]
fn test_cancel_removes_a_resting_order_cleanly() {
    let book = OrderBook::new();
    let outcome = run_script(&book, ["A B GoodTillCancel 99 10 1", "C 1", "R 0 0 0"]).unwrap();
    assert!(outcome.passed());
}

#[test]
fn test_modify_preserves_type_and_reinserts_at_the_back_of_the_queue() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        [
            "A B GoodTillCancel 100 10 1",
            "A B GoodTillCancel 100 10 2",
            "M 1 B 100 10",
            "R 2 1 0",
        ],
    )
    .unwrap();
    assert!(outcome.passed());
}

#[test]
fn test_market_buy_into_an_empty_book_is_simply_dropped() {
    let book = OrderBook::new();
    let outcome = run_script(&book, ["A B Market 0 5 1", "R 0 0 0"]).unwrap();
    assert!(outcome.passed());
}

#[test]
fn test_market_buy_rewrites_to_the_worst_resting_ask_and_trades_at_each_sides_price() {
    let book = OrderBook::new();
    let outcome = run_script(
        &book,
        [
            "A S GoodTillCancel 100 5 1",
            "A S GoodTillCancel 110 5 2",
            "A B Market 0 3 3",
            "R 2 0 2",
        ],
    )
    .unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].bid, TradeInfo { order_id: 3, price: 110, quantity: 3 });
    assert_eq!(outcome.trades[0].ask, TradeInfo { order_id: 1, price: 100, quantity: 3 });
}
