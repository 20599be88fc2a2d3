//! Compact binary form of a [`Snapshot`] for collaborative sync.
//!
//! Snapshots carry raw samples, so the sync path uses MessagePack instead of
//! JSON. Field names are kept (`to_vec_named`) so peers can evolve the shape.

use crate::{ProjectError, Snapshot};

pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, ProjectError> {
    Ok(rmp_serde::to_vec_named(snapshot)?)
}

/// Decode and validate a snapshot received from a peer.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, ProjectError> {
    let snapshot: Snapshot = rmp_serde::from_slice(bytes)?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_snapshot;

    #[test]
    fn test_wire_roundtrip() {
        let bytes = encode(&sample_snapshot()).expect("encode");
        assert_eq!(decode(&bytes).expect("decode"), sample_snapshot());
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let bytes = encode(&sample_snapshot()).expect("encode");
        assert!(decode(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_snapshot() {
        let mut snapshot = sample_snapshot();
        snapshot.bpm = 0;
        let bytes = encode(&snapshot).expect("encode");
        assert!(matches!(decode(&bytes), Err(ProjectError::Invalid(_))));
    }
}
