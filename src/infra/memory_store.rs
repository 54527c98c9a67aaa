use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::app::ports::TableStorePort;
use crate::error::Result;
use crate::table::Table;

/// In-memory table store for development/testing. Files are held as CSV text.
pub struct MemoryTableStore {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    dirs: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            dirs: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.dirs.lock().unwrap().insert(path.into());
    }

    /// Add a file with raw CSV content; its parent directory is created too.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: &str) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.lock().unwrap().insert(path, content.to_string());
    }

    /// Raw CSV text stored at `path`.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Table stored at `path`, parsed with its header.
    pub fn written(&self, path: &Path) -> Option<Table> {
        let content = self.contents(path)?;
        Table::from_csv_reader(file_name(path), content.as_bytes()).ok()
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.contents(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display())).into()
        })
    }
}

impl TableStorePort for MemoryTableStore {
    fn list_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        Ok(files
            .keys()
            .filter(|p| p.parent() == Some(dir) && p.extension().is_some_and(|e| e == "csv"))
            .cloned()
            .collect())
    }

    fn read_table(&self, path: &Path) -> Result<Table> {
        let content = self.read(path)?;
        Table::from_csv_reader(file_name(path), content.as_bytes())
    }

    fn read_headerless_table(&self, path: &Path) -> Result<Table> {
        let content = self.read(path)?;
        Table::from_headerless_csv_reader(file_name(path), content.as_bytes())
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer)?;
        debug!("Stored {} rows at {}", table.len(), path.display());
        self.add_file(path, &String::from_utf8_lossy(&buffer));
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }
}
