// Result file writers: csv (default) and an aligned text table.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{FlatRecord, OutputError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Txt,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }
}

pub struct OutputWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Write all records into a timestamped result file and return its path.
    pub fn write(
        &self,
        records: &[FlatRecord],
        make: &str,
        model: &str,
        with_warning: bool,
    ) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.result_path(make, model, records.len(), with_warning);

        match self.format {
            OutputFormat::Csv => self.write_csv(&path, records)?,
            OutputFormat::Txt => self.write_txt(&path, records)?,
        }

        info!("Saved search results into {}", path.display());
        Ok(path)
    }

    /// `{Make}{Model}_{count}_{timestamp}[_].{ext}`; the trailing underscore
    /// marks a run that finished with warnings.
    fn result_path(&self, make: &str, model: &str, count: usize, with_warning: bool) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        let marker = if with_warning { "_" } else { "" };
        let stem = format!("{make}{model}_{count}_{timestamp}{marker}").replace(' ', "");
        self.dir
            .join(format!("{stem}.{}", self.format.extension()))
    }

    fn write_csv(&self, path: &Path, records: &[FlatRecord]) -> Result<(), OutputError> {
        let mut file = File::create(path)?;
        // BOM keeps spreadsheet imports of cyrillic text intact.
        file.write_all("\u{feff}".as_bytes())?;

        let mut writer = csv::Writer::from_writer(file);
        if let Some(first) = records.first() {
            writer.write_record(first.fields().iter().map(|(name, _)| name.as_str()))?;
        }
        for record in records {
            writer.write_record(record.fields().iter().map(|(_, value)| cell(value)))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_txt(&self, path: &Path, records: &[FlatRecord]) -> Result<(), OutputError> {
        let Some(first) = records.first() else {
            fs::write(path, "")?;
            return Ok(());
        };

        let headers: Vec<&str> = first.fields().iter().map(|(name, _)| name.as_str()).collect();
        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|record| record.fields().iter().map(|(_, value)| cell(value)).collect())
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (index, value) in row.iter().enumerate() {
                if index < widths.len() {
                    widths[index] = widths[index].max(value.chars().count());
                }
            }
        }

        let mut out = String::new();
        write_row(&mut out, headers.iter().map(|h| h.to_string()), &widths);
        write_row(
            &mut out,
            widths.iter().map(|width| "-".repeat(*width)),
            &widths,
        );
        for row in &rows {
            write_row(&mut out, row.iter().cloned(), &widths);
        }

        fs::write(path, out)?;
        Ok(())
    }
}

fn write_row(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    for (index, value) in cells.enumerate() {
        if index > 0 {
            out.push_str("  ");
        }
        out.push_str(&value);
        let width = widths.get(index).copied().unwrap_or(0);
        let padding = width.saturating_sub(value.chars().count());
        out.push_str(&" ".repeat(padding));
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}

/// Render a scalar for a table cell.
fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn records() -> Vec<FlatRecord> {
        let mut first = FlatRecord::with_capacity(3);
        first.push("id", json!(101));
        first.push("title", json!("Ford Focus"));
        first.push("price(usd)", json!(7800));

        let mut second = FlatRecord::with_capacity(3);
        second.push("id", json!(102));
        second.push("title", json!("Ford Fiesta"));
        second.push("price(usd)", json!("-"));

        vec![first, second]
    }

    #[test]
    fn csv_starts_with_bom_and_header() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path(), OutputFormat::Csv);

        let path = writer.write(&records(), "Ford", "", false).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.starts_with('\u{feff}'));
        let mut lines = content.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("id,title,price(usd)"));
        assert_eq!(lines.next(), Some("101,Ford Focus,7800"));
        assert_eq!(lines.next(), Some("102,Ford Fiesta,-"));
    }

    #[test]
    fn file_name_carries_count_and_warning_marker() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path(), OutputFormat::Csv);

        let clean = writer.write(&records(), "Ford", "Focus", false).unwrap();
        let name = clean.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("FordFocus_2_"), "unexpected name {name}");
        assert!(name.ends_with(".csv"));
        assert!(!name.ends_with("_.csv"));

        let flagged = writer.write(&records(), "Ford", "Focus", true).unwrap();
        let name = flagged.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_.csv"), "missing warning marker in {name}");
    }

    #[test]
    fn txt_columns_are_aligned() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path(), OutputFormat::Txt);

        let path = writer.write(&records(), "Ford", "", false).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id"));
        assert!(lines[1].starts_with("---"));
        // "title" column starts at the same offset in every line.
        let offset = lines[0].find("title").unwrap();
        assert_eq!(&lines[2][offset..offset + 10], "Ford Focus");
    }

    #[test]
    fn spaces_are_squeezed_out_of_file_names() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path(), OutputFormat::Csv);

        let path = writer.write(&records(), "Alfa Romeo", "159", false).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("AlfaRomeo159_"));
    }
}
