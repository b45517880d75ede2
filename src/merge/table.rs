use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{fs::File, path::Path};
use tracing::debug;

/// An article export held fully in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleTable {
    /// Column names from the header row, in file order.
    pub headers: Vec<String>,
    /// One entry per data row, aligned with `headers`.
    pub rows: Vec<Vec<String>>,
}

impl ArticleTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like `column_index`, but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        match self.column_index(name) {
            Some(idx) => Ok(idx),
            None => bail!("column `{}` not found (have: {:?})", name, self.headers),
        }
    }

    /// Read a headed CSV file. Short rows are padded with empty cells;
    /// a row wider than the header is an error.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open CSV {}", path.display()))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.with_context(|| {
                format!("CSV parse error in {} at record {}", path.display(), idx)
            })?;
            if record.len() > headers.len() {
                bail!(
                    "record {} in {} has {} fields, header has {}",
                    idx,
                    path.display(),
                    record.len(),
                    headers.len()
                );
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        debug!(path = %path.display(), rows = rows.len(), cols = headers.len(), "read table");
        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create CSV {}", path.display()))?;
        let mut wtr = WriterBuilder::new().from_writer(file);
        wtr.write_record(&self.headers)
            .with_context(|| format!("failed to write header to {}", path.display()))?;
        for row in &self.rows {
            wtr.write_record(row)
                .with_context(|| format!("failed to write row to {}", path.display()))?;
        }
        wtr.flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        Ok(())
    }

    /// Stack `other` under `self`. Columns are the union of both header
    /// lists in first-seen order; cells a table lacks are left empty.
    pub fn concat(mut self, other: ArticleTable) -> ArticleTable {
        let mut headers = self.headers.clone();
        for h in &other.headers {
            if !headers.contains(h) {
                headers.push(h.clone());
            }
        }

        let width = headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        let mapping: Vec<usize> = other
            .headers
            .iter()
            .map(|h| headers.iter().position(|x| x == h).unwrap_or_default())
            .collect();
        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, &dst) in row.into_iter().zip(&mapping) {
                aligned[dst] = cell;
            }
            self.rows.push(aligned);
        }

        ArticleTable {
            headers,
            rows: self.rows,
        }
    }
}
