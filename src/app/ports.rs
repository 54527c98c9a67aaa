use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::Table;

/// Whole-file table storage. The pipeline never touches the filesystem directly.
pub trait TableStorePort {
    /// `*.csv` files directly inside `dir`, sorted by file name.
    fn list_csv(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Read a CSV whose first record is the header.
    fn read_table(&self, path: &Path) -> Result<Table>;

    /// Read a CSV keeping every record as data.
    fn read_headerless_table(&self, path: &Path) -> Result<Table>;

    /// Write a CSV, replacing any existing file.
    fn write_table(&self, path: &Path, table: &Table) -> Result<()>;

    fn file_exists(&self, path: &Path) -> bool;

    fn dir_exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// Yes/no confirmation for overwriting an existing output file.
pub trait ConfirmPort {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}
