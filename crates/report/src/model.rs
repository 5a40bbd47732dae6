//! Report content, independent of the output format.

use chrono::NaiveDate;
use engine::{Batch, MoneyCents};

pub const TITLE: &str = "Expense Batch Report";
pub const COLUMNS: [&str; 5] = ["Date", "Particulars", "Amount", "Place", "Remarks"];

#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub currency_symbol: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub particulars: String,
    pub amount: String,
    pub place: String,
    /// Empty when the transaction has no remarks.
    pub remarks: String,
}

impl ReportRow {
    pub fn cells(&self) -> [&str; 5] {
        [
            self.date.as_str(),
            self.particulars.as_str(),
            self.amount.as_str(),
            self.place.as_str(),
            self.remarks.as_str(),
        ]
    }
}

/// A batch formatted for export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub batch_name: String,
    pub start_date: String,
    pub end_date: String,
    pub opening_balance: String,
    pub total_expense: String,
    pub closing_balance: String,
    /// One row per transaction, in stored order.
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn from_batch(batch: &Batch, options: &ReportOptions) -> Self {
        let money = |amount: MoneyCents| amount.localized(&options.currency_symbol);
        Self {
            batch_name: batch.name().to_string(),
            start_date: format_date(batch.start_date()),
            end_date: format_date(batch.end_date()),
            opening_balance: money(batch.opening_balance()),
            total_expense: money(batch.total_expense()),
            closing_balance: money(batch.closing_balance()),
            rows: batch
                .transactions()
                .iter()
                .map(|tx| ReportRow {
                    date: format_date(tx.date),
                    particulars: tx.particulars.clone(),
                    amount: money(tx.amount),
                    place: tx.place.clone(),
                    remarks: tx.remarks.clone(),
                })
                .collect(),
        }
    }

    /// Label/value pairs heading the spreadsheet layouts.
    pub fn summary(&self) -> [(&'static str, &str); 6] {
        [
            ("Batch Name", self.batch_name.as_str()),
            ("Start Date", self.start_date.as_str()),
            ("End Date", self.end_date.as_str()),
            ("Opening Balance", self.opening_balance.as_str()),
            ("Total Expenses", self.total_expense.as_str()),
            ("Closing Balance", self.closing_balance.as_str()),
        ]
    }

    pub fn balances(&self) -> [(&'static str, &str); 3] {
        [
            ("Opening Balance", self.opening_balance.as_str()),
            ("Total Expenses", self.total_expense.as_str()),
            ("Closing Balance", self.closing_balance.as_str()),
        ]
    }

    pub fn period(&self) -> String {
        format!("{} - {}", self.start_date, self.end_date)
    }
}

/// `Jan 5, 2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use engine::BatchDraft;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn dates_use_short_month_names() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "Jan 5, 2024");
        let date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        assert_eq!(format_date(date), "Dec 25, 2023");
    }

    #[test]
    fn empty_batch_closes_at_opening_balance() {
        let batch = Batch::new(
            Uuid::new_v4(),
            BatchDraft {
                name: "Empty".to_string(),
                opening_balance: MoneyCents::new(125_000),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            },
            Utc::now(),
        )
        .unwrap();

        let report = Report::from_batch(&batch, &ReportOptions::default());
        assert!(report.rows.is_empty());
        assert_eq!(report.opening_balance, "₹1,250.00");
        assert_eq!(report.total_expense, "₹0.00");
        assert_eq!(report.closing_balance, report.opening_balance);
        assert_eq!(report.period(), "Jan 1, 2024 - Jan 31, 2024");
    }

    #[test]
    fn currency_symbol_is_configurable() {
        let batch = Batch::new(
            Uuid::new_v4(),
            BatchDraft {
                name: "Euro".to_string(),
                opening_balance: MoneyCents::new(1_000_050),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            },
            Utc::now(),
        )
        .unwrap();
        let options = ReportOptions {
            currency_symbol: "€".to_string(),
        };

        let report = Report::from_batch(&batch, &options);
        assert_eq!(report.opening_balance, "€10,000.50");
    }
}
