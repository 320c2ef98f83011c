use std::collections::HashSet;
use tabbench::core::cleaning::CleaningConfig;
use tabbench::domain::model::{ColumnData, RawTable};
use tabbench::TableCleaner;

fn cell(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn table(rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        rows.iter()
            .map(|row| row.iter().map(|value| cell(value)).collect())
            .collect(),
    )
}

/// Tables shaped like what the detectors pull out of sustainability reports.
fn report_tables() -> Vec<RawTable> {
    vec![
        table(&[
            &["Scope", "2021", "2022", "2023"],
            &["Scope 1", "12,400", "11,900", "11,020"],
            &["Scope 2", "8,100", "", "7,450"],
            &["Scope 3", "95,000", "93,200", "90,870"],
        ]),
        table(&[
            &["Metric", "Metric", "Unit", "Value"],
            &["Water", "Withdrawal", "m3", "$1,000"],
            &["", "Discharge", "m3", "€850"],
            &["Waste", "Recycled", "t", "42"],
        ]),
        table(&[
            &["Site", "", "Audit date", "Status"],
            &["Hsinchu", "North", "2023-03-01", "Open"],
            &["Hsinchu", "North", "2023-03-01", "Open"],
            &["Tainan ", "South", "2023-04-15", "Closed"],
            &["Taichung", "Central", "2023-05-20", "Open"],
        ]),
        table(&[
            &["Region", "Headcount", "Note"],
            &["APAC", "1200", "same"],
            &["EMEA", "800", "same"],
            &["AMER", "950", "same"],
        ]),
        table(&[&["Only", "Header"], &["one", "row"]]),
        // 寫法不同但數值相同
        table(&[
            &["Plant", "Output", "Capacity"],
            &["North", "$1,200", "50"],
            &["South", "1200", "60"],
            &["East", "1,200.0", "70"],
        ]),
        table(&[
            &["Site", "Share", "Year"],
            &["A", "1.0", "2022"],
            &["A", "1", "2022"],
            &["B", "2", "2023"],
        ]),
    ]
}

#[test]
fn test_accepted_tables_keep_minimum_shape() {
    let cleaner = TableCleaner::default();

    for raw in report_tables() {
        if let Some(cleaned) = cleaner.clean(&raw) {
            assert!(cleaned.row_count() >= 2);
            assert!(cleaned.column_count() >= 2);
            for column in cleaned.columns() {
                assert_eq!(column.data.len(), cleaned.row_count());
            }
        }
    }
}

#[test]
fn test_column_names_are_unique_and_normalized() {
    let cleaner = TableCleaner::default();

    for raw in report_tables() {
        let Some(cleaned) = cleaner.clean(&raw) else {
            continue;
        };
        let names = cleaned.column_names();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "duplicate names in {:?}", names);
        for name in names {
            assert!(!name.is_empty());
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }
    }
}

#[test]
fn test_cleaning_twice_changes_nothing() {
    let cleaner = TableCleaner::default();

    for raw in report_tables() {
        let Some(once) = cleaner.clean(&raw) else {
            continue;
        };
        let twice = cleaner
            .clean(&once.to_raw())
            .expect("a cleaned table passes cleaning again");
        assert_eq!(once, twice);
    }
}

#[test]
fn test_report_tables_clean_as_expected() {
    let cleaner = TableCleaner::default();
    let cleaned: Vec<_> = report_tables().iter().map(|raw| cleaner.clean(raw)).collect();

    let emissions = cleaned[0].as_ref().unwrap();
    assert_eq!(emissions.column_names(), vec!["scope", "2021", "2022", "2023"]);
    assert!(matches!(emissions.column("2022").unwrap().data, ColumnData::Number(_)));
    // 縱向合併儲存格往下填補
    assert_eq!(emissions.column("2022").unwrap().data.render(1).as_deref(), Some("11900"));

    let water = cleaned[1].as_ref().unwrap();
    assert_eq!(water.column_names(), vec!["metric", "metric_1", "unit", "value"]);
    assert_eq!(water.column("metric").unwrap().data.render(1).as_deref(), Some("Water"));

    let audits = cleaned[2].as_ref().unwrap();
    assert_eq!(audits.row_count(), 3);
    assert!(matches!(audits.column("audit_date").unwrap().data, ColumnData::Date(_)));

    // 常數欄位被移除
    let headcount = cleaned[3].as_ref().unwrap();
    assert_eq!(headcount.column_names(), vec!["region", "headcount"]);

    // 只有一列資料
    assert!(cleaned[4].is_none());

    // 轉成數字後相同的欄位視為常數欄位
    let plants = cleaned[5].as_ref().unwrap();
    assert_eq!(plants.column_names(), vec!["plant", "capacity"]);

    // 轉成數字後相同的列視為重複
    let shares = cleaned[6].as_ref().unwrap();
    assert_eq!(shares.row_count(), 2);
    assert_eq!(shares.column("share").unwrap().data.render(0).as_deref(), Some("1"));
}

#[test]
fn test_stricter_thresholds_reject_more() {
    let strict = TableCleaner::new(CleaningConfig {
        min_rows: 4,
        ..CleaningConfig::default()
    });

    let accepted = report_tables()
        .iter()
        .filter(|raw| strict.clean(raw).is_some())
        .count();
    assert_eq!(accepted, 0);
}
