//! Columnar storage sink: one narrow contract, implementations selected at
//! startup. Only the local filesystem backend ships here; an object-store
//! backend would implement the same trait.

pub mod local;

pub use local::LocalStore;

use polars::prelude::{DataFrame, Schema};

use crate::error::Result;

/// Durable columnar storage for tabular payloads.
///
/// Paths are relative to the store's base; `write` returns the resolved
/// location. An explicit `schema` makes the write strict: columns are cast
/// to it and a missing column is an error. `partition_cols` splits the
/// payload into `col=value/` subdirectories instead of one file.
pub trait ColumnarStore: Send + Sync {
    fn base_path(&self) -> &str;

    fn write(
        &self,
        frame: &mut DataFrame,
        path: &str,
        schema: Option<&Schema>,
        partition_cols: Option<&[&str]>,
    ) -> Result<String>;

    fn exists(&self, path: &str) -> bool;

    /// Files under `path` whose names match `pattern` (`*` wildcards).
    fn list(&self, path: &str, pattern: &str) -> Result<Vec<String>>;

    /// Returns whether anything was actually deleted.
    fn delete(&self, path: &str) -> Result<bool>;
}
