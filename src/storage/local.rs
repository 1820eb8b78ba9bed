//! Local filesystem Parquet store.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::{AppError, Result};
use crate::storage::ColumnarStore;

pub struct LocalStore {
    root: PathBuf,
    compression: ParquetCompression,
}

impl LocalStore {
    /// Open a store rooted at an existing, writable directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(AppError::Storage(format!(
                "data directory does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(AppError::Storage(format!(
                "data path is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            compression: ParquetCompression::Snappy,
        })
    }

    pub fn with_compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Join a relative path onto the root, refusing traversal segments.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if Path::new(path)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AppError::Storage(format!(
                "path escapes the data directory: {path}"
            )));
        }
        Ok(self.root.join(path))
    }

    fn write_file(&self, frame: &mut DataFrame, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(target)?;
        ParquetWriter::new(file)
            .with_compression(self.compression)
            .finish(frame)?;
        Ok(())
    }

    /// Enforce an explicit schema: select its columns in order and cast
    /// each to the declared dtype. A missing column fails the write.
    fn apply_schema(frame: &DataFrame, schema: &Schema) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(schema.len());
        for (name, dtype) in schema.iter() {
            let column = frame.column(name)?.cast(dtype)?;
            columns.push(column);
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl ColumnarStore for LocalStore {
    fn base_path(&self) -> &str {
        self.root.to_str().unwrap_or(".")
    }

    fn write(
        &self,
        frame: &mut DataFrame,
        path: &str,
        schema: Option<&Schema>,
        partition_cols: Option<&[&str]>,
    ) -> Result<String> {
        let target = self.resolve(path)?;

        let mut prepared = match schema {
            Some(schema) => Self::apply_schema(frame, schema)?,
            None => frame.clone(),
        };

        match partition_cols {
            None => self.write_file(&mut prepared, &target)?,
            Some(cols) => {
                // Directory-style partitioning: one part file per distinct
                // key combination under col=value/ subdirectories.
                let keys: Vec<PlSmallStr> = cols.iter().map(|c| PlSmallStr::from(*c)).collect();
                let parts = prepared.partition_by_stable(keys, true)?;
                for (index, mut part) in parts.into_iter().enumerate() {
                    let mut dir = target.clone();
                    for col in cols {
                        let value = part
                            .column(col)?
                            .as_materialized_series()
                            .get(0)
                            .map(partition_value)?;
                        dir = dir.join(format!("{col}={value}"));
                    }
                    self.write_file(&mut part, &dir.join(format!("part-{index}.parquet")))?;
                }
            }
        }

        info!(path = %target.display(), rows = prepared.height(), "wrote parquet");
        Ok(target.display().to_string())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn list(&self, path: &str, pattern: &str) -> Result<Vec<String>> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if entry.path().is_file() && wildcard_match(pattern, &name) {
                matches.push(format!("{path}/{name}"));
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn delete(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Ok(false);
        }
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        Ok(true)
    }
}

fn partition_value(value: AnyValue) -> String {
    match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Minimal `*` glob: anchored literal segments in order.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == name;
    }

    let mut rest = name;
    if !rest.starts_with(segments[0]) {
        return false;
    }
    rest = &rest[segments[0].len()..];

    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(at) => rest = &rest[at + segment.len()..],
            None => return false,
        }
    }

    let last = segments[segments.len() - 1];
    last.is_empty() || rest.ends_with(last)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store() -> (LocalStore, PathBuf) {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("harvester_test_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        (LocalStore::new(&dir).unwrap(), dir)
    }

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("id".into(), vec![1i64, 2, 3]),
            Column::new("name".into(), vec!["a", "b", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn missing_root_is_rejected() {
        let missing = env::temp_dir().join("harvester_missing_root_xyz");
        let _ = fs::remove_dir_all(&missing);
        assert!(LocalStore::new(&missing).is_err());
    }

    #[test]
    fn write_then_read_roundtrip() {
        let (store, dir) = temp_store();

        let resolved = store
            .write(&mut sample_frame(), "global/sample.parquet", None, None)
            .unwrap();
        assert!(store.exists("global/sample.parquet"));

        let file = fs::File::open(&resolved).unwrap();
        let back = ParquetReader::new(file).finish().unwrap();
        assert_eq!(back.height(), 3);
        assert_eq!(back.column("id").unwrap().i64().unwrap().get(1), Some(2));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_schema_casts_columns() {
        let (store, dir) = temp_store();

        let schema = Schema::from_iter([
            Field::new("id".into(), DataType::Int32),
            Field::new("name".into(), DataType::String),
        ]);
        let resolved = store
            .write(&mut sample_frame(), "cast.parquet", Some(&schema), None)
            .unwrap();

        let file = fs::File::open(&resolved).unwrap();
        let back = ParquetReader::new(file).finish().unwrap();
        assert_eq!(back.column("id").unwrap().dtype(), &DataType::Int32);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_with_missing_column_fails_the_write() {
        let (store, dir) = temp_store();

        let schema = Schema::from_iter([Field::new("absent".into(), DataType::Int64)]);
        assert!(store
            .write(&mut sample_frame(), "bad.parquet", Some(&schema), None)
            .is_err());
        assert!(!store.exists("bad.parquet"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partitioned_write_lays_out_directories() {
        let (store, dir) = temp_store();

        let mut frame = DataFrame::new(vec![
            Column::new("id".into(), vec![1i64, 2, 3]),
            Column::new("date".into(), vec!["2024-01-15", "2024-01-15", "2024-01-16"]),
        ])
        .unwrap();

        store
            .write(&mut frame, "auctions", None, Some(&["date"]))
            .unwrap();

        assert!(store.exists("auctions/date=2024-01-15"));
        assert!(store.exists("auctions/date=2024-01-16"));
        let first_day = store.list("auctions/date=2024-01-15", "*.parquet").unwrap();
        assert_eq!(first_day.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn list_filters_by_pattern() {
        let (store, dir) = temp_store();

        store.write(&mut sample_frame(), "out/a.parquet", None, None).unwrap();
        store.write(&mut sample_frame(), "out/b.parquet", None, None).unwrap();
        fs::write(dir.join("out/notes.txt"), "x").unwrap();

        let parquet = store.list("out", "*.parquet").unwrap();
        assert_eq!(parquet, vec!["out/a.parquet", "out/b.parquet"]);
        let all = store.list("out", "*").unwrap();
        assert_eq!(all.len(), 3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_reports_whether_anything_existed() {
        let (store, dir) = temp_store();

        store.write(&mut sample_frame(), "gone.parquet", None, None).unwrap();
        assert!(store.delete("gone.parquet").unwrap());
        assert!(!store.exists("gone.parquet"));
        assert!(!store.delete("gone.parquet").unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let (store, dir) = temp_store();
        assert!(store.write(&mut sample_frame(), "../escape.parquet", None, None).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn wildcard_patterns() {
        assert!(wildcard_match("*.parquet", "auctions_20240115.parquet"));
        assert!(!wildcard_match("*.parquet", "notes.txt"));
        assert!(wildcard_match("auctions_*", "auctions_20240115.parquet"));
        assert!(wildcard_match("auctions_*.parquet", "auctions_1.parquet"));
        assert!(wildcard_match("exact.parquet", "exact.parquet"));
        assert!(!wildcard_match("exact.parquet", "other.parquet"));
    }
}
