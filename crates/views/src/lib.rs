//! Read-only projections over a completed result set.
//!
//! Everything here is pure: the projector never mutates the results it is
//! handed. Resetting the current page when a new result set arrives or the
//! page size changes is the caller's policy, not enforced here.

use core_types::{BacktestResults, TradeRecord};

/// Number of pages needed to show every trade at `page_size` per page.
/// Always at least 1, even for an empty trade list.
pub fn total_pages(results: &BacktestResults, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    results.trades.len().div_ceil(page_size).max(1)
}

/// The trades on page `page_number` (1-based). A page past the end, a zero
/// page number or a zero page size all yield an empty slice.
pub fn page(results: &BacktestResults, page_number: usize, page_size: usize) -> &[TradeRecord] {
    if page_number == 0 || page_size == 0 {
        return &[];
    }
    let start = (page_number - 1).saturating_mul(page_size);
    if start >= results.trades.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(results.trades.len());
    &results.trades[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use core_types::Side;
    use rust_decimal_macros::dec;

    fn results_with_trades(count: u64) -> BacktestResults {
        let first_entry: DateTime<Utc> = "2024-03-01T00:00:00Z".parse().unwrap();
        let trades = (0..count)
            .map(|i| TradeRecord {
                id: i + 1,
                entry_time: first_entry + Duration::hours(i as i64),
                entry_price: dec!(100),
                exit_time: first_entry + Duration::hours(i as i64 + 1),
                exit_price: dec!(101),
                side: Side::Buy,
                amount: dec!(1),
                profit: dec!(1),
                profit_percentage: dec!(1),
            })
            .collect();
        BacktestResults {
            initial_capital: dec!(10_000),
            final_capital: dec!(10_000),
            profit: dec!(0),
            profit_percentage: dec!(0),
            total_trades: count as u32,
            winning_trades: count as u32,
            losing_trades: 0,
            win_rate: dec!(100),
            max_drawdown: dec!(0),
            sharpe_ratio: dec!(0),
            backtest_id: "bt-pages".into(),
            trades,
        }
    }

    #[test]
    fn twenty_trades_at_thirteen_per_page_is_two_pages() {
        let results = results_with_trades(20);
        assert_eq!(total_pages(&results, 13), 2);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let results = results_with_trades(20);
        let second = page(&results, 2, 13);
        assert_eq!(second.len(), 7);
        assert_eq!(second[0].id, 14);
        assert_eq!(second[6].id, 20);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let results = results_with_trades(20);
        assert!(page(&results, 3, 13).is_empty());
    }

    #[test]
    fn empty_trade_list_still_has_one_page() {
        let results = results_with_trades(0);
        assert_eq!(total_pages(&results, 10), 1);
        assert!(page(&results, 1, 10).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        let results = results_with_trades(26);
        assert_eq!(total_pages(&results, 13), 2);
        assert!(page(&results, 3, 13).is_empty());
    }
}
