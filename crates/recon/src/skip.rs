use chrono::NaiveDate;
use regcheck_engine::Sheet;

use crate::config::SheetConfig;

/// True when the row's last-checked cell holds a date less than
/// `skip_days` days before `today`.
///
/// Empty or unparseable cells never skip, and `skip_days == 0` disables
/// skipping. A last-checked date in the future counts as recent.
pub fn should_skip(
    sheet: &Sheet,
    row: usize,
    config: &SheetConfig,
    skip_days: u32,
    today: NaiveDate,
) -> bool {
    if skip_days == 0 {
        return false;
    }
    let Some(checked) = sheet.get(row, config.last_checked_index).as_datetime() else {
        return false;
    };
    (today - checked.date()).num_days() < i64::from(skip_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcheck_engine::CellValue;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn sheet_with(value: CellValue) -> (Sheet, SheetConfig) {
        let mut sheet = Sheet::new("QBCC");
        sheet.set(1, 3, value);
        (sheet, SheetConfig::new(2, 3).with_column("license", 1))
    }

    fn days_ago(days: i64) -> CellValue {
        let date = today() - chrono::Duration::days(days);
        CellValue::DateTime(date.and_hms_opt(9, 30, 0).unwrap())
    }

    #[test]
    fn recent_rows_skip() {
        for days in [0, 1, 6] {
            let (sheet, cfg) = sheet_with(days_ago(days));
            assert!(should_skip(&sheet, 1, &cfg, 7, today()), "{days} days ago");
        }
    }

    #[test]
    fn old_rows_are_processed() {
        for days in [7, 8, 400] {
            let (sheet, cfg) = sheet_with(days_ago(days));
            assert!(!should_skip(&sheet, 1, &cfg, 7, today()), "{days} days ago");
        }
    }

    #[test]
    fn future_date_skips() {
        let (sheet, cfg) = sheet_with(days_ago(-3));
        assert!(should_skip(&sheet, 1, &cfg, 7, today()));
    }

    #[test]
    fn zero_interval_never_skips() {
        let (sheet, cfg) = sheet_with(days_ago(0));
        assert!(!should_skip(&sheet, 1, &cfg, 0, today()));
    }

    #[test]
    fn empty_and_garbage_cells_do_not_skip() {
        let (sheet, cfg) = sheet_with(CellValue::Empty);
        assert!(!should_skip(&sheet, 1, &cfg, 7, today()));

        let (sheet, cfg) = sheet_with(CellValue::text("last week"));
        assert!(!should_skip(&sheet, 1, &cfg, 7, today()));

        let (sheet, cfg) = sheet_with(CellValue::Number(46094.0));
        assert!(!should_skip(&sheet, 1, &cfg, 7, today()));
    }

    #[test]
    fn text_dates_are_read() {
        let (sheet, cfg) = sheet_with(CellValue::text("2026-03-13"));
        assert!(should_skip(&sheet, 1, &cfg, 7, today()));

        let (sheet, cfg) = sheet_with(CellValue::text("01/02/2026"));
        assert!(!should_skip(&sheet, 1, &cfg, 7, today()));
    }
}
