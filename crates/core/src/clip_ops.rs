//! Pure functions for clip placement, testable without a session.

use crate::error::{EngineError, Result};
use saund_transport::Track;

/// End of the timeline: the latest clip end across all tracks, 0 when empty.
pub fn project_duration(tracks: &[Track]) -> f64 {
    tracks.iter().map(Track::end).fold(0.0, f64::max)
}

/// Check a new clip interval before anything is mutated.
pub fn validate_range(start: f64, end: f64) -> Result<()> {
    let valid = start.is_finite() && end.is_finite() && start >= 0.0 && end > start;
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidRange { start, end })
    }
}

/// Where a moved clip lands: never before the timeline origin.
pub fn clamp_start(new_start: f64) -> f64 {
    new_start.max(0.0)
}

/// Clamp a play position to `[0, duration]`.
pub fn clamp_position(position: f64, duration: f64) -> f64 {
    if position.is_nan() {
        return 0.0;
    }
    position.clamp(0.0, duration.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saund_transport::{AudioArc, Clip, ClipId, TrackColor, TrackId};

    fn track_with(id: u64, ranges: &[(f64, f64)]) -> Track {
        let audio = AudioArc::new(vec![0.0; 8], 44100, 2);
        let mut track = Track::new(TrackId(id), format!("Host {id}"), "Host".into(), TrackColor::Red);
        for (i, (start, end)) in ranges.iter().enumerate() {
            track.push_clip(Clip {
                id: ClipId(id * 100 + i as u64),
                start: *start,
                end: *end,
                audio: audio.clone(),
            });
        }
        track
    }

    #[test]
    fn test_duration_of_empty_project() {
        assert_eq!(project_duration(&[]), 0.0);
        assert_eq!(project_duration(&[track_with(1, &[])]), 0.0);
    }

    #[test]
    fn test_duration_is_max_end_across_tracks() {
        let tracks = vec![
            track_with(1, &[(0.0, 5.0), (10.0, 12.0)]),
            track_with(2, &[(3.0, 8.0)]),
        ];
        assert_eq!(project_duration(&tracks), 12.0);
    }

    #[test]
    fn test_overlapping_clips_count_once() {
        let tracks = vec![track_with(1, &[(0.0, 9.0), (2.0, 4.0)])];
        assert_eq!(project_duration(&tracks), 9.0);
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(0.0, 5.0).is_ok());
        assert!(matches!(
            validate_range(5.0, 5.0),
            Err(EngineError::InvalidRange { .. })
        ));
        assert!(validate_range(5.0, 2.0).is_err());
        assert!(validate_range(-1.0, 2.0).is_err());
        assert!(validate_range(0.0, f64::NAN).is_err());
        assert!(validate_range(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_clamp_start_and_position() {
        assert_eq!(clamp_start(-4.0), 0.0);
        assert_eq!(clamp_start(3.5), 3.5);
        assert_eq!(clamp_position(15.0, 12.0), 12.0);
        assert_eq!(clamp_position(-1.0, 12.0), 0.0);
        assert_eq!(clamp_position(3.0, 0.0), 0.0);
        assert_eq!(clamp_position(f64::NAN, 12.0), 0.0);
    }
}
