//! Merge two summarized-article exports into one renumbered, date-ordered table.

pub mod clean;
pub mod table;

use crate::{config::MergeConfig, date_parser};
use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use tracing::{info, warn};

pub use clean::clean_group;
pub use table::ArticleTable;

pub const POST_ID: &str = "postID";
pub const DATE: &str = "date";
pub const GROUP: &str = "group";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub first_rows: usize,
    pub second_rows: usize,
    pub merged_rows: usize,
}

/// Concatenate, order by `date`, clean `group` and renumber `postID` from 1.
///
/// Sorting is stable, so rows with equal dates keep `first`-then-`second` order.
/// Blank dates sort after every parsed one; any other unparseable date aborts.
pub fn merge_tables(first: ArticleTable, second: ArticleTable) -> Result<ArticleTable> {
    let mut merged = first.concat(second);
    let date_idx = merged.require_column(DATE)?;
    let group_idx = merged.require_column(GROUP)?;

    let mut keyed: Vec<(Option<NaiveDateTime>, Vec<String>)> = Vec::with_capacity(merged.len());
    for (i, row) in merged.rows.drain(..).enumerate() {
        let raw = row[date_idx].trim();
        let key = if raw.is_empty() {
            None
        } else {
            match date_parser::parse_datetime(raw) {
                Some(parsed) => Some(parsed.to_utc().naive_utc()),
                None => bail!("unparseable date {:?} in merged row {}", raw, i),
            }
        };
        keyed.push((key, row));
    }

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let post_idx = match merged.column_index(POST_ID) {
        Some(idx) => idx,
        None => {
            merged.headers.push(POST_ID.to_string());
            merged.headers.len() - 1
        }
    };
    let width = merged.headers.len();

    merged.rows = keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut row))| {
            row.resize(width, String::new());
            row[group_idx] = clean_group(&row[group_idx]);
            row[post_idx] = (i + 1).to_string();
            row
        })
        .collect();

    Ok(merged)
}

/// Read both inputs, merge them and write the result.
#[tracing::instrument(level = "info", skip(config), fields(output = %config.output.display()))]
pub fn run(config: &MergeConfig) -> Result<MergeSummary> {
    let first = ArticleTable::read_csv(&config.first)?;
    let second = ArticleTable::read_csv(&config.second)?;
    let first_rows = first.len();
    let second_rows = second.len();

    let merged = merge_tables(first, second)?;
    if merged.is_empty() {
        warn!("both inputs are empty; writing header only");
    }
    merged.write_csv(&config.output)?;

    let summary = MergeSummary {
        first_rows,
        second_rows,
        merged_rows: merged.len(),
    };
    info!(
        "Merged {} and {} records into {} records",
        summary.first_rows, summary.second_rows, summary.merged_rows
    );
    info!("Saved to {}", config.output.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ArticleTable {
        ArticleTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn column<'a>(t: &'a ArticleTable, name: &str) -> Vec<&'a str> {
        let idx = t.column_index(name).unwrap();
        t.rows.iter().map(|r| r[idx].as_str()).collect()
    }

    #[test]
    fn test_sorts_cleans_and_renumbers() -> Result<()> {
        let a = table(
            &["postID", "date", "group", "title"],
            &[
                &["10", "2025-03-05", "Tech3.*[old]", "a"],
                &["11", "2025-03-01 09:00:00", "1. Politics", "b"],
            ],
        );
        let b = table(
            &["postID", "date", "group", "title"],
            &[&["1", "2025-03-03", " (Sports) ", "c"]],
        );

        let merged = merge_tables(a, b)?;
        assert_eq!(merged.len(), 3);
        assert_eq!(column(&merged, "title"), vec!["b", "c", "a"]);
        assert_eq!(column(&merged, "postID"), vec!["1", "2", "3"]);
        assert_eq!(column(&merged, "group"), vec!["Politics", "Sports", "Techold"]);
        assert_eq!(merged.headers, vec!["postID", "date", "group", "title"]);
        Ok(())
    }

    #[test]
    fn test_ties_keep_concatenation_order() -> Result<()> {
        let a = table(
            &["postID", "date", "group"],
            &[&["1", "2025-03-02", "x"], &["2", "2025-03-01", "first"]],
        );
        let b = table(
            &["postID", "date", "group"],
            &[&["1", "2025-03-01", "second"]],
        );
        let merged = merge_tables(a, b)?;
        assert_eq!(column(&merged, "group"), vec!["first", "second", "x"]);
        Ok(())
    }

    #[test]
    fn test_mixed_offsets_sort_by_instant() -> Result<()> {
        let a = table(
            &["date", "group"],
            &[&["2025-03-01T08:00:00+07:00", "late"]],
        );
        let b = table(&["date", "group"], &[&["2025-03-01T00:30:00Z", "early"]]);
        let merged = merge_tables(a, b)?;
        assert_eq!(column(&merged, "group"), vec!["early", "late"]);
        Ok(())
    }

    #[test]
    fn test_blank_dates_sort_last() -> Result<()> {
        let a = table(&["postID", "date", "group"], &[&["1", "", "none"]]);
        let b = table(&["postID", "date", "group"], &[&["1", "2025-01-01", "dated"]]);
        let merged = merge_tables(a, b)?;
        assert_eq!(column(&merged, "group"), vec!["dated", "none"]);
        Ok(())
    }

    #[test]
    fn test_adds_post_id_when_absent() -> Result<()> {
        let a = table(&["date", "group"], &[&["2025-01-02", "g"]]);
        let b = table(&["date", "group"], &[&["2025-01-01", "h"]]);
        let merged = merge_tables(a, b)?;
        assert_eq!(merged.headers, vec!["date", "group", "postID"]);
        assert_eq!(column(&merged, "postID"), vec!["1", "2"]);
        Ok(())
    }

    #[test]
    fn test_unparseable_date_aborts() {
        let a = table(&["date", "group"], &[&["not a date", "g"]]);
        let err = merge_tables(a, ArticleTable::default()).unwrap_err();
        assert!(err.to_string().contains("unparseable date"));
    }

    #[test]
    fn test_missing_group_column_aborts() {
        let a = table(&["date"], &[&["2025-01-01"]]);
        assert!(merge_tables(a, ArticleTable::default()).is_err());
    }

    #[test]
    fn test_run_end_to_end() -> Result<()> {
        let tmp = tempdir()?;
        let config = MergeConfig {
            first: tmp.path().join("a.csv"),
            second: tmp.path().join("b.csv"),
            output: tmp.path().join("merged.csv"),
        };
        fs::write(
            &config.first,
            "postID,date,group,summary\n1,2025-03-21,2. Economy,\"x, y\"\n2,2025-03-19,[Tech],z\n",
        )?;
        fs::write(
            &config.second,
            "postID,date,group,summary\n1,2025-03-20,World*,w\n",
        )?;

        let summary = run(&config)?;
        assert_eq!(
            summary,
            MergeSummary {
                first_rows: 2,
                second_rows: 1,
                merged_rows: 3
            }
        );

        let written = fs::read_to_string(&config.output)?;
        assert_eq!(
            written,
            "postID,date,group,summary\n\
             1,2025-03-19,Tech,z\n\
             2,2025-03-20,World,w\n\
             3,2025-03-21,Economy,\"x, y\"\n"
        );
        Ok(())
    }

    #[test]
    fn test_run_header_only_inputs() -> Result<()> {
        let tmp = tempdir()?;
        let config = MergeConfig {
            first: tmp.path().join("a.csv"),
            second: tmp.path().join("b.csv"),
            output: tmp.path().join("merged.csv"),
        };
        fs::write(&config.first, "postID,date,group\n")?;
        fs::write(&config.second, "postID,date,group\n")?;

        let summary = run(&config)?;
        assert_eq!(summary.merged_rows, 0);
        assert_eq!(fs::read_to_string(&config.output)?, "postID,date,group\n");
        Ok(())
    }

    #[test]
    fn test_run_rejects_row_wider_than_header() {
        let tmp = tempdir().unwrap();
        let config = MergeConfig {
            first: tmp.path().join("a.csv"),
            second: tmp.path().join("b.csv"),
            output: tmp.path().join("merged.csv"),
        };
        fs::write(
            &config.first,
            "postID,date,group,summary\n1,2025-03-21,G,hello,world\n",
        )
        .unwrap();
        fs::write(&config.second, "postID,date,group,summary\n").unwrap();

        assert!(run(&config).is_err());
        assert!(!config.output.exists());
    }

    #[test]
    fn test_run_missing_input_fails() {
        let tmp = tempdir().unwrap();
        let config = MergeConfig {
            first: tmp.path().join("missing.csv"),
            second: tmp.path().join("also_missing.csv"),
            output: tmp.path().join("merged.csv"),
        };
        assert!(run(&config).is_err());
        assert!(!config.output.exists());
    }
}
