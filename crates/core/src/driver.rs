//! Drives a shared session's playback clock from a tokio interval.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::clock::PlaybackState;
use crate::error::Result;
use crate::session::Session;

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the ticking task for one session. Must be used inside a tokio runtime.
pub struct ClockDriver {
    session: Arc<Mutex<Session>>,
    task: Option<JoinHandle<()>>,
}

impl ClockDriver {
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self {
            session,
            task: None,
        }
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    /// Whether a ticking task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn play(&mut self) -> Result<()> {
        let period = {
            let mut session = lock(&self.session);
            session.play()?;
            session.config().tick_interval()
        };

        if !self.is_running() {
            self.task = Some(spawn_ticker(Arc::downgrade(&self.session), period));
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        lock(&self.session).pause();
        self.cancel();
    }

    pub fn toggle(&mut self) -> Result<PlaybackState> {
        let playing = lock(&self.session).is_playing();
        if playing {
            self.pause();
            Ok(PlaybackState::Stopped)
        } else {
            self.play()?;
            Ok(PlaybackState::Playing)
        }
    }

    pub fn stop(&mut self) {
        lock(&self.session).stop();
        self.cancel();
    }

    /// Abort the ticking task without touching the clock.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn spawn_ticker(session: Weak<Mutex<Session>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if !tick_once(&session) {
                break;
            }
        }
        tracing::debug!("Clock task finished");
    })
}

/// One step of the ticker. False once the session is gone or the clock stopped.
fn tick_once(session: &Weak<Mutex<Session>>) -> bool {
    let Some(session) = session.upgrade() else {
        return false;
    };
    lock(&session).tick().is_playing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use saund_transport::AudioArc;

    fn session_with_clip(end: f64) -> Arc<Mutex<Session>> {
        let mut session = Session::new(EngineConfig::default());
        let track = session.add_track("Host");
        session
            .add_clip(track, 0.0, end, AudioArc::new(vec![0.0; 100], 100, 1))
            .expect("clip");
        Arc::new(Mutex::new(session))
    }

    fn position(session: &Arc<Mutex<Session>>) -> f64 {
        session.lock().unwrap().current_time()
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_end_and_stops() {
        let session = session_with_clip(1.0);
        let mut driver = ClockDriver::new(session.clone());
        driver.play().expect("play");

        tokio::time::sleep(Duration::from_millis(550)).await;
        assert!(session.lock().unwrap().is_playing());
        assert!((position(&session) - 0.5).abs() < 1e-9);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.lock().unwrap().playback_state(), PlaybackState::Stopped);
        assert_eq!(position(&session), 0.0);
        assert!(!driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_ticking() {
        let session = session_with_clip(10.0);
        let mut driver = ClockDriver::new(session.clone());
        driver.play().expect("play");

        tokio::time::sleep(Duration::from_millis(350)).await;
        driver.pause();
        assert!(!driver.is_running());
        let paused_at = position(&session);
        assert!((paused_at - 0.3).abs() < 1e-9);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(position(&session), paused_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_and_stop() {
        let session = session_with_clip(10.0);
        let mut driver = ClockDriver::new(session.clone());

        assert_eq!(driver.toggle().expect("toggle"), PlaybackState::Playing);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(driver.toggle().expect("toggle"), PlaybackState::Stopped);
        assert!((position(&session) - 0.2).abs() < 1e-9);

        driver.play().expect("play");
        tokio::time::sleep(Duration::from_millis(150)).await;
        driver.stop();
        assert_eq!(position(&session), 0.0);
        assert!(!driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_driver_stops_ticks() {
        let session = session_with_clip(10.0);
        let mut driver = ClockDriver::new(session.clone());
        driver.play().expect("play");
        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(driver);

        let frozen = position(&session);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(position(&session), frozen);
    }

    #[test]
    fn test_ticker_ends_when_session_is_gone() {
        let session = session_with_clip(10.0);
        let weak = Arc::downgrade(&session);
        lock(&session).play().expect("play");
        assert!(tick_once(&weak));

        drop(session);
        assert!(!tick_once(&weak));
    }
}
