//! Linear undo/redo stacks over [`Command`]s.

use crate::command::{Command, CommandKind};
use crate::error::Result;
use crate::state::ProjectState;
use saund_transport::TrackId;

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Command>,
    /// Undone commands, each with the selection its undo cleared.
    redo_stack: Vec<(Command, Option<TrackId>)>,
    /// Maximum undo depth. 0 means unbounded.
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(0)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Push an already-applied command. Any redo branch is discarded.
    pub fn record(&mut self, command: Command) {
        self.redo_stack.clear();
        self.undo_stack.push(command);

        if self.limit > 0 && self.undo_stack.len() > self.limit {
            let excess = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..excess);
        }
    }

    /// Revert the newest command. `Ok(None)` when there is nothing to undo.
    ///
    /// A command that no longer reverts cleanly is dropped and its error
    /// returned; the state is left as it was.
    pub fn undo(&mut self, state: &mut ProjectState) -> Result<Option<CommandKind>> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(None);
        };

        let selected = state.selected_track();
        if let Err(err) = command.revert(state) {
            tracing::warn!(command = command.name(), %err, "Dropping command that can no longer be undone");
            return Err(err);
        }

        tracing::debug!(command = command.name(), "Undo");
        let cleared = selected.filter(|_| state.selected_track().is_none());
        let kind = command.kind();
        self.redo_stack.push((command, cleared));
        Ok(Some(kind))
    }

    /// Re-apply the most recently undone command, bringing back a selection
    /// its undo cleared.
    pub fn redo(&mut self, state: &mut ProjectState) -> Result<Option<CommandKind>> {
        let Some((command, cleared)) = self.redo_stack.pop() else {
            return Ok(None);
        };

        if let Err(err) = command.apply(state) {
            tracing::warn!(command = command.name(), %err, "Dropping command that can no longer be redone");
            return Err(err);
        }

        if let Some(track_id) = cleared {
            state.restore_selection(track_id);
        }
        tracing::debug!(command = command.name(), "Redo");
        let kind = command.kind();
        self.undo_stack.push(command);
        Ok(Some(kind))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_name(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Command::name)
    }

    pub fn redo_name(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|(command, _)| command.name())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saund_transport::{EffectField, Track, TrackColor, TrackId, TrackParam};

    fn add_track(history: &mut History, state: &mut ProjectState, id: u64) {
        let track = Track::new(TrackId(id), format!("Guest {id}"), "Guest".into(), TrackColor::Pink);
        let command = Command::AddTrack {
            index: state.tracks().len(),
            track,
        };
        command.apply(state).expect("apply");
        history.record(command);
    }

    #[test]
    fn test_undo_redo_walks_both_stacks() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(10);
        add_track(&mut history, &mut state, 1);
        add_track(&mut history, &mut state, 2);

        assert_eq!(history.undo_name(), Some("Add track"));
        assert_eq!(history.undo(&mut state).expect("undo"), Some(CommandKind::AddTrack));
        assert_eq!(state.tracks().len(), 1);
        assert!(history.can_redo());

        assert_eq!(history.redo(&mut state).expect("redo"), Some(CommandKind::AddTrack));
        assert_eq!(state.tracks().len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::default();
        let before = state.clone();

        assert_eq!(history.undo(&mut state).expect("undo"), None);
        assert_eq!(history.redo(&mut state).expect("redo"), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(10);
        add_track(&mut history, &mut state, 1);
        history.undo(&mut state).expect("undo");
        assert!(history.can_redo());

        add_track(&mut history, &mut state, 2);
        assert!(!history.can_redo());
        assert_eq!(history.redo_name(), None);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(3);
        for id in 1..=5 {
            add_track(&mut history, &mut state, id);
        }
        assert_eq!(history.undo_len(), 3);

        while history.undo(&mut state).expect("undo").is_some() {}
        // The two oldest additions fell off the stack
        assert_eq!(state.tracks().len(), 2);
    }

    #[test]
    fn test_redo_brings_back_cleared_selection() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(10);
        add_track(&mut history, &mut state, 1);
        state.set_selected_track(Some(TrackId(1))).expect("select");
        let after = state.clone();

        history.undo(&mut state).expect("undo");
        assert_eq!(state.selected_track(), None);
        history.redo(&mut state).expect("redo");
        assert_eq!(state, after);
    }

    #[test]
    fn test_redo_keeps_newer_selection() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(10);
        add_track(&mut history, &mut state, 1);
        add_track(&mut history, &mut state, 2);
        state.set_selected_track(Some(TrackId(2))).expect("select");

        history.undo(&mut state).expect("undo");
        state.set_selected_track(Some(TrackId(1))).expect("select");
        history.redo(&mut state).expect("redo");
        assert_eq!(state.selected_track(), Some(TrackId(1)));
    }

    #[test]
    fn test_failed_revert_drops_command() {
        let mut state = ProjectState::new(75.0, 120);
        let mut history = History::new(10);
        history.record(Command::UpdateTrackEffect {
            track_id: TrackId(42),
            param: TrackParam::Effect(EffectField::Eq),
            old_value: 50.0,
            new_value: 60.0,
        });

        assert!(history.undo(&mut state).is_err());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
