//! Spreadsheet export.

use rust_xlsxwriter::{Format, Workbook};

use crate::{
    Result,
    model::{COLUMNS, Report},
};

pub const SHEET_NAME: &str = "Batch Report";
const COLUMN_WIDTHS: [f64; 5] = [15.0, 30.0, 15.0, 20.0, 25.0];

/// Summary block, a blank row, then the bold header and one row per
/// transaction.
pub fn render(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, width) in (0u16..).zip(COLUMN_WIDTHS) {
        sheet.set_column_width(col, width)?;
    }

    let mut row = 0u32;
    for (label, value) in report.summary() {
        sheet.write_string(row, 0, label)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }
    row += 1;

    for (col, title) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(row, col, title, &bold)?;
    }
    for tx in &report.rows {
        row += 1;
        for (col, cell) in (0u16..).zip(tx.cells()) {
            sheet.write_string(row, col, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_report;

    #[test]
    fn renders_a_zip_container() {
        let bytes = render(&sample_report(3)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
