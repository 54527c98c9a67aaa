use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::ports::TableStorePort;
use crate::error::Result;
use crate::table::Table;

/// Filesystem implementation of `TableStorePort`
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTableStore;

impl FsTableStore {
    pub fn new() -> Self {
        Self
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl TableStorePort for FsTableStore {
    fn list_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "csv") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_table(&self, path: &Path) -> Result<Table> {
        let reader = BufReader::new(File::open(path)?);
        let table = Table::from_csv_reader(file_name(path), reader)?;
        debug!("Read {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    fn read_headerless_table(&self, path: &Path) -> Result<Table> {
        let reader = BufReader::new(File::open(path)?);
        Table::from_headerless_csv_reader(file_name(path), reader)
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        table.write_csv(writer)?;
        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let store = FsTableStore::new();
        let mut table = Table::new("t", vec!["a".into(), "b".into()]);
        table.push_row(vec![Some("1".into()), None]);

        let path = dir.path().join("t.csv");
        store.write_table(&path, &table).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,\n");

        let read = store.read_table(&path).unwrap();
        assert_eq!(read.name, "t.csv");
        assert_eq!(read.rows, table.rows);
    }

    #[test]
    fn test_list_csv_skips_other_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n").unwrap();
        fs::write(dir.path().join("a.csv"), "x\n").unwrap();
        fs::write(dir.path().join("a.log"), "x\n").unwrap();
        fs::create_dir(dir.path().join("sub.csv")).unwrap();

        let names: Vec<_> = FsTableStore::new()
            .list_csv(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| file_name(&p))
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
