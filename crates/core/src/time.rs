/// Ticks per beat used for musical positions.
pub const PPQN: u64 = 960;

pub const BEATS_PER_BAR: u32 = 4;

/// Format seconds as `mm:ss.cc`.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let hundredths = ((seconds % 1.0) * 100.0).floor() as u64;
    format!("{minutes:02}:{secs:02}.{hundredths:02}")
}

#[derive(Debug, Clone, Copy)]
pub struct TimeContext {
    pub tempo: f64,
}

impl TimeContext {
    pub fn new(tempo: f64) -> Self {
        Self { tempo }
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.tempo / 60.0
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.tempo
    }

    pub fn format_position(&self, seconds: f64) -> MusicalPosition {
        let total_beats = self.seconds_to_beats(seconds.max(0.0));
        let beats_per_bar = BEATS_PER_BAR as f64;

        let bar = (total_beats / beats_per_bar).floor() as u32 + 1;
        let beat_in_bar = (total_beats % beats_per_bar).floor() as u32 + 1;
        let tick_in_beat = ((total_beats % 1.0) * PPQN as f64).floor() as u32;

        MusicalPosition {
            bar,
            beat: beat_in_bar,
            tick: tick_in_beat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicalPosition {
    pub bar: u32,
    pub beat: u32,
    pub tick: u32,
}

impl std::fmt::Display for MusicalPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{:03}", self.bar, self.beat, self.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00.00");
        assert_eq!(format_time(65.25), "01:05.25");
        assert_eq!(format_time(600.5), "10:00.50");
        assert_eq!(format_time(-3.0), "00:00.00");
        assert_eq!(format_time(f64::NAN), "00:00.00");
    }

    #[test]
    fn test_beats_conversion() {
        let ctx = TimeContext::new(120.0);
        assert_eq!(ctx.seconds_to_beats(1.0), 2.0);
        assert_eq!(ctx.beats_to_seconds(4.0), 2.0);
    }

    #[test]
    fn test_format_position() {
        let ctx = TimeContext::new(120.0);
        assert_eq!(ctx.format_position(0.0).to_string(), "1.1.000");
        // 2.25s at 120 BPM = 4.5 beats: bar 2, beat 1, half a beat in
        assert_eq!(
            ctx.format_position(2.25),
            MusicalPosition {
                bar: 2,
                beat: 1,
                tick: 480
            }
        );
    }
}
