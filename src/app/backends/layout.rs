//! Text layout helpers shared by the detectors.

use crate::domain::model::RawTable;
use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a line on tabs or runs of two or more spaces.
pub fn split_cells(line: &str) -> Vec<String> {
    static GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|[ \u{a0}]{2,}").unwrap());

    GAP.split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-empty lines grouped by blank-line separators.
pub fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Grid from ragged rows; short rows are padded with missing cells, blank
/// strings become missing.
pub fn to_raw(rows: Vec<Vec<String>>) -> RawTable {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let cells = rows
        .into_iter()
        .map(|row| {
            let mut cells: Vec<Option<String>> = row
                .into_iter()
                .map(|cell| if cell.trim().is_empty() { None } else { Some(cell) })
                .collect();
            cells.resize(width, None);
            cells
        })
        .collect();
    RawTable::new(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cells() {
        assert_eq!(
            split_cells("  Scope 1 emissions    12,400\t 2023 "),
            vec!["Scope 1 emissions", "12,400", "2023"]
        );
        assert_eq!(split_cells("plain sentence text"), vec!["plain sentence text"]);
        assert!(split_cells("   ").is_empty());
    }

    #[test]
    fn test_blocks() {
        let text = "a  b\nc  d\n\n   \ne  f\n";
        assert_eq!(blocks(text), vec![vec!["a  b", "c  d"], vec!["e  f"]]);
    }

    #[test]
    fn test_to_raw_pads_rows() {
        let raw = to_raw(vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["1".to_string(), " ".to_string()],
        ]);
        assert_eq!(raw.cells[1], vec![Some("1".to_string()), None, None]);
        assert_eq!(raw.columns(), 3);
    }
}
