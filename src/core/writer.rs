use crate::domain::entry::ImportItem;
use crate::utils::error::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered JSONL output file, one import item per line.
///
/// Dropping the writer flushes what was written so far, so an aborted run
/// leaves a readable partial file behind.
pub struct JsonlWriter {
    path: PathBuf,
    inner: Option<BufWriter<File>>,
    lines: usize,
}

impl JsonlWriter {
    /// Creates (or truncates) `dir/file_name`, creating `dir` if needed.
    pub fn create(dir: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        let file = File::create(&path)?;

        Ok(Self {
            path,
            inner: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn write_item(&mut self, item: &ImportItem) -> Result<()> {
        let line = item.to_json_line()?;
        self.write_line(&line)
    }

    pub fn write_items(&mut self, items: &[ImportItem]) -> Result<usize> {
        for item in items {
            self.write_item(item)?;
        }
        Ok(items.len())
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if let Some(inner) = self.inner.as_mut() {
            inner.write_all(line.as_bytes())?;
            inner.write_all(b"\n")?;
            self.lines += 1;
        }
        Ok(())
    }

    /// Flushes and closes the file, returning its path.
    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(mut inner) = self.inner.take() {
            inner.flush()?;
            inner.get_ref().sync_all()?;
        }
        Ok(self.path.clone())
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            if let Err(e) = inner.flush() {
                tracing::warn!("Failed to flush {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{sample_config, OutputMode};
    use crate::core::top_entry_builder;
    use crate::domain::model::EntryType;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory_and_writes_lines() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("output");
        let config = sample_config(OutputMode::LocalOnly);

        let mut writer = JsonlWriter::create(&dir, "out.jsonl").unwrap();
        for catalog in ["a", "b"] {
            let item = top_entry_builder::create(&config, EntryType::Catalog, catalog).unwrap();
            writer.write_item(&item).unwrap();
        }
        assert_eq!(writer.lines_written(), 2);

        let path = writer.finish().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(content.ends_with('\n'));
        for line in lines {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }

    #[test]
    fn test_drop_flushes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = sample_config(OutputMode::LocalOnly);
        let path = {
            let mut writer = JsonlWriter::create(temp_dir.path(), "partial.jsonl").unwrap();
            let item = top_entry_builder::create(&config, EntryType::Catalog, "main").unwrap();
            writer.write_item(&item).unwrap();
            writer.path().to_path_buf()
        };

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
