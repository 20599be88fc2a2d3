use crate::clip_ops::clamp_position;

/// Tolerance for the end-of-project check, absorbing step accumulation error.
const END_EPSILON: f64 = 1e-9;

/// Used in place of a step that is zero, negative or not finite.
pub const DEFAULT_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Fixed-step playback position.
///
/// Pausing keeps the position, stopping rewinds it. Reaching the end of the
/// project while playing stops and rewinds.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    position: f64,
    step: f64,
}

impl PlaybackClock {
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            tracing::warn!(step, fallback = DEFAULT_STEP, "Ignoring unusable tick step");
            DEFAULT_STEP
        };

        Self {
            state: PlaybackState::Stopped,
            position: 0.0,
            step,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn toggle(&mut self) -> PlaybackState {
        self.state = match self.state {
            PlaybackState::Stopped => PlaybackState::Playing,
            PlaybackState::Playing => PlaybackState::Stopped,
        };
        self.state
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0.0;
    }

    /// Move to `position`, clamped into `[0, duration]`. Playback state is kept.
    pub fn seek(&mut self, position: f64, duration: f64) {
        self.position = clamp_position(position, duration);
    }

    /// Pull the position back inside a shrunken project.
    pub fn clamp_to(&mut self, duration: f64) {
        self.position = clamp_position(self.position, duration);
    }

    /// Advance one step. Returns the state after the step.
    pub fn tick(&mut self, duration: f64) -> PlaybackState {
        if !self.is_playing() {
            return self.state;
        }

        let next = self.position + self.step;
        if next >= duration - END_EPSILON {
            tracing::debug!(duration, "Reached end of project");
            self.stop();
        } else {
            self.position = next;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_run_to_end_then_rewind() {
        let mut clock = PlaybackClock::new(0.1);
        clock.play();

        for _ in 0..9 {
            assert_eq!(clock.tick(1.0), PlaybackState::Playing);
        }
        assert!((clock.position() - 0.9).abs() < 1e-9);

        assert_eq!(clock.tick(1.0), PlaybackState::Stopped);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_tick_while_stopped_does_nothing() {
        let mut clock = PlaybackClock::new(0.1);
        clock.seek(0.5, 1.0);
        assert_eq!(clock.tick(1.0), PlaybackState::Stopped);
        assert_eq!(clock.position(), 0.5);
    }

    #[test]
    fn test_empty_project_stops_on_first_tick() {
        let mut clock = PlaybackClock::new(0.1);
        clock.play();
        assert_eq!(clock.tick(0.0), PlaybackState::Stopped);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_pause_keeps_position_stop_rewinds() {
        let mut clock = PlaybackClock::new(0.1);
        clock.play();
        clock.tick(10.0);
        clock.tick(10.0);
        clock.pause();
        assert!((clock.position() - 0.2).abs() < 1e-9);
        assert!(!clock.is_playing());

        clock.stop();
        assert_eq!(clock.position(), 0.0);
        assert_eq!(clock.toggle(), PlaybackState::Playing);
        assert_eq!(clock.toggle(), PlaybackState::Stopped);
    }

    #[test]
    fn test_unusable_step_falls_back() {
        for step in [-0.1, 0.0, f64::NAN, f64::INFINITY] {
            let mut clock = PlaybackClock::new(step);
            assert_eq!(clock.step(), DEFAULT_STEP);

            clock.play();
            clock.tick(1.0);
            clock.tick(1.0);
            assert!((clock.position() - 0.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seek_clamps() {
        let mut clock = PlaybackClock::new(0.1);
        clock.seek(-4.0, 12.0);
        assert_eq!(clock.position(), 0.0);
        clock.seek(30.0, 12.0);
        assert_eq!(clock.position(), 12.0);

        clock.clamp_to(5.0);
        assert_eq!(clock.position(), 5.0);
    }
}
