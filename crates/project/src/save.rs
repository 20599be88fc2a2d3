use crate::{ProjectError, Snapshot};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serialize a snapshot to the transportable JSON text form.
pub fn to_json(snapshot: &Snapshot) -> Result<String, ProjectError> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn save_project(path: &Path, snapshot: &Snapshot) -> Result<(), ProjectError> {
    let file = File::create(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;

    Ok(())
}
