//! Catalog serialization.
//!
//! The catalog is written as one JSON array. An existing output file is never
//! overwritten, and a failed write leaves no file behind.

use dbcost_core::{DbInstance, Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Serialize instances to a compact JSON array.
pub fn to_json(instances: &[DbInstance]) -> Result<String> {
    Ok(serde_json::to_string(instances)?)
}

/// Fail with [`Error::OutputExists`] if something is already at `path`.
pub fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

/// Write the catalog to `path`, creating missing parent directories.
pub fn save(instances: &[DbInstance], path: &Path) -> Result<()> {
    let data = to_json(instances)?;
    ensure_absent(path)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(Error::OutputExists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = file.write_all(data.as_bytes()).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e.into());
    }

    tracing::info!(path = %path.display(), instances = instances.len(), "Catalog saved");
    Ok(())
}

/// Read a catalog written by [`save`].
pub fn load(path: &Path) -> Result<Vec<DbInstance>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
