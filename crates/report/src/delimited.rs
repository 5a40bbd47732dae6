//! Comma-separated export, laid out like the spreadsheet.

use csv::WriterBuilder;

use crate::{
    Result,
    model::{COLUMNS, Report},
};

pub fn render(report: &Report) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(vec![]);
    for (label, value) in report.summary() {
        writer.write_record([label, value])?;
    }
    writer.write_record([""; COLUMNS.len()])?;
    writer.write_record(COLUMNS)?;
    for tx in &report.rows {
        writer.write_record(tx.cells())?;
    }
    writer
        .into_inner()
        .map_err(|err| err.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_report;

    #[test]
    fn layout_matches_spreadsheet() {
        let bytes = render(&sample_report(2)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Batch Name,Goa trip");
        assert_eq!(lines[1], "Start Date,\"Jan 1, 2024\"");
        assert_eq!(lines[5], "Closing Balance,\"₹9,700.00\"");
        assert_eq!(lines[6], ",,,,");
        assert_eq!(lines[7], "Date,Particulars,Amount,Place,Remarks");
        assert_eq!(lines[8], "\"Jan 2, 2024\",Taxi 1,₹100.00,Panaji,");
        assert_eq!(lines.len(), 10);
    }
}
