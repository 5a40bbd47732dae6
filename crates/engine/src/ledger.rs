//! Ledger recalculation.
//!
//! The single place where a batch's derived fields are computed. Every path
//! that changes a batch's transactions or opening balance ends here.

use crate::{EngineError, MoneyCents, ResultEngine, Transaction, money::AMOUNT_TOO_LARGE};

/// Derived fields of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub total_expense: MoneyCents,
    /// `opening_balance - total_expense`; may be negative.
    pub closing_balance: MoneyCents,
}

/// Computes the total expense and closing balance of a ledger.
///
/// Fails with a validation error on `amount` when the totals do not fit in
/// `i64` cents.
///
/// # Examples
///
/// ```rust
/// use engine::{MoneyCents, recompute};
///
/// let totals = recompute(MoneyCents::new(100_000), &[]).unwrap();
/// assert_eq!(totals.total_expense, MoneyCents::ZERO);
/// assert_eq!(totals.closing_balance, MoneyCents::new(100_000));
/// ```
pub fn recompute<'a, I>(opening_balance: MoneyCents, transactions: I) -> ResultEngine<LedgerTotals>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let too_large = || EngineError::invalid("amount", AMOUNT_TOO_LARGE);
    let total_expense = transactions
        .into_iter()
        .try_fold(MoneyCents::ZERO, |total, tx| total.checked_add(tx.amount))
        .ok_or_else(too_large)?;
    let closing_balance = opening_balance
        .checked_sub(total_expense)
        .ok_or_else(too_large)?;
    Ok(LedgerTotals {
        total_expense,
        closing_balance,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn tx(amount: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            particulars: "Tea".to_string(),
            amount: MoneyCents::new(amount),
            place: "Office".to_string(),
            remarks: String::new(),
        }
    }

    #[test]
    fn empty_ledger_keeps_opening_balance() {
        let totals = recompute(MoneyCents::new(1_000), &[]).unwrap();
        assert_eq!(totals.total_expense, MoneyCents::ZERO);
        assert_eq!(totals.closing_balance, MoneyCents::new(1_000));
    }

    #[test]
    fn sums_amounts_and_subtracts_from_opening() {
        let txs = vec![tx(25_000), tx(10_000)];
        let totals = recompute(MoneyCents::new(100_000), &txs).unwrap();
        assert_eq!(totals.total_expense, MoneyCents::new(35_000));
        assert_eq!(totals.closing_balance, MoneyCents::new(65_000));
    }

    #[test]
    fn order_does_not_change_totals() {
        let mut txs: Vec<Transaction> = [1, 7, 333, 12_345, 10, 99_999].map(tx).into();
        let forward = recompute(MoneyCents::new(5_000), &txs).unwrap();
        txs.reverse();
        let backward = recompute(MoneyCents::new(5_000), &txs).unwrap();
        txs.swap(0, 3);
        let shuffled = recompute(MoneyCents::new(5_000), &txs).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn closing_balance_may_go_negative() {
        let txs = vec![tx(1_500)];
        let totals = recompute(MoneyCents::new(1_000), &txs).unwrap();
        assert_eq!(totals.closing_balance, MoneyCents::new(-500));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let txs = vec![tx(i64::MAX - 10), tx(11)];
        let Err(EngineError::Validation(errors)) = recompute(MoneyCents::ZERO, &txs) else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.message("amount"), Some("amount too large"));

        let txs = vec![tx(i64::MAX)];
        assert!(recompute(MoneyCents::new(-2), &txs).is_err());
    }
}
