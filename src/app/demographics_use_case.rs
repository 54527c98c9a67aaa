use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::app::ports::TableStorePort;
use crate::error::Result;
use crate::pipeline::demographics::{demographics_table, normalize_demographics};
use crate::types::DemographicsRecord;

/// Use case for cleaning the demographics survey export
pub struct DemographicsUseCase {
    store: Arc<dyn TableStorePort>,
}

impl DemographicsUseCase {
    pub fn new(store: Arc<dyn TableStorePort>) -> Self {
        Self { store }
    }

    /// Read and normalize the export at `path`. When `output` is given the
    /// cleaned records are also written there under their canonical names.
    pub fn run(&self, path: &Path, output: Option<&Path>) -> Result<Vec<DemographicsRecord>> {
        if !self.store.file_exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("demographics file {} not found", path.display()),
            )
            .into());
        }

        let raw = self.store.read_headerless_table(path)?;
        let records = normalize_demographics(&raw)?;

        if let Some(output) = output {
            let name = output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.store.write_table(output, &demographics_table(&name, &records))?;
            info!("Cleaned demographics saved as {}", output.display());
        }

        Ok(records)
    }
}
