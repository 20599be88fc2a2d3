use crate::{ProjectError, Snapshot};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetadata {
    pub bpm: u32,
    pub volume: f64,
    pub track_count: usize,
    pub clip_count: usize,
}

/// Parse and validate a snapshot produced by [`crate::to_json`].
pub fn from_json(text: &str) -> Result<Snapshot, ProjectError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    snapshot.validate()?;
    Ok(snapshot)
}

fn load_project_data(path: &Path) -> Result<Snapshot, ProjectError> {
    let bytes = fs::read(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Try JSON first, fall back to MessagePack
    serde_json::from_slice(&bytes)
        .or_else(|_| rmp_serde::from_slice(&bytes).map_err(ProjectError::from))
}

pub fn load_project(path: &Path) -> Result<Snapshot, ProjectError> {
    let snapshot = load_project_data(path)?;
    snapshot.validate()?;
    Ok(snapshot)
}

pub fn load_project_metadata(path: &Path) -> Result<ProjectMetadata, ProjectError> {
    let snapshot = load_project_data(path)?;

    Ok(ProjectMetadata {
        bpm: snapshot.bpm,
        volume: snapshot.volume,
        track_count: snapshot.tracks.len(),
        clip_count: snapshot.clip_count(),
    })
}
