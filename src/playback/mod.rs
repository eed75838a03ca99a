//! Play queue and transport state machine.
//!
//! ```text
//!            enqueue (empty, Idle)          pause
//!   Idle ───────────────────────────▶ Playing ─────▶ Paused
//!    ▲  ◀── skip/complete (drained) ──   ▲  ◀─ play ──┘
//!    │                                   │
//!    └──────────── stop (any) ──▶ Stopped ┘ play
//! ```
//!
//! The controller owns the queue; units are keyed by [`PostId`] so narration
//! results arriving out of submission order are fine, and one post is never
//! queued twice. Playing position advances through [`tick`](PlaybackController::tick),
//! which also performs natural completion.

pub mod voice;

pub use voice::parse_utterance;

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{AudioUnit, PlaybackState, PostId};

/// Discrete transport commands accepted from the UI or voice surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    /// Begin listening for new posts.
    Start,
    /// Stop listening and stop playback.
    Stop,
    Play,
    Pause,
    Skip,
    Replay,
}

impl TransportCommand {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "skip" => Some(Self::Skip),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }
}

/// Success/failure acknowledgment for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.success { "ok" } else { "failed" };
        write!(f, "[{}] {}", mark, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Started(AudioUnit),
    Paused(PostId),
    Resumed(PostId),
    Replayed(PostId),
    Skipped(PostId),
    Completed(PostId),
    /// Queue exhausted; controller is idle.
    Drained,
    Stopped,
}

#[derive(Debug, Clone)]
struct Cursor {
    unit: AudioUnit,
    position: Duration,
}

pub struct PlaybackController {
    state: PlaybackState,
    current: Option<Cursor>,
    queue: VecDeque<AudioUnit>,
    events: broadcast::Sender<TransportEvent>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: PlaybackState::Idle,
            current: None,
            queue: VecDeque::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<&AudioUnit> {
        self.current.as_ref().map(|c| &c.unit)
    }

    pub fn position(&self) -> Option<Duration> {
        self.current.as_ref().map(|c| c.position)
    }

    /// Units waiting behind the current one.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn contains(&self, post_id: &PostId) -> bool {
        self.current().is_some_and(|u| &u.post_id == post_id)
            || self.queue.iter().any(|u| &u.post_id == post_id)
    }

    fn emit(&self, event: TransportEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Make the head of the queue current, at position zero.
    fn advance(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(unit) => {
                self.emit(TransportEvent::Started(unit.clone()));
                self.current = Some(Cursor {
                    unit,
                    position: Duration::ZERO,
                });
                true
            }
            None => {
                self.current = None;
                false
            }
        }
    }

    /// Append a unit. Starts playback only from `Idle` with nothing queued.
    pub fn enqueue(&mut self, unit: AudioUnit) -> Ack {
        if self.contains(&unit.post_id) {
            return Ack::fail(format!("{} is already queued", unit.post_id.short()));
        }

        let was_empty = self.current.is_none() && self.queue.is_empty();
        let id = unit.post_id.clone();
        self.queue.push_back(unit);

        if self.state == PlaybackState::Idle && was_empty {
            self.advance();
            self.state = PlaybackState::Playing;
            return Ack::ok(format!("playing {}", id.short()));
        }

        Ack::ok(format!("queued {} ({} waiting)", id.short(), self.queue.len()))
    }

    /// `Idle|Paused|Stopped → Playing`; resumes the current unit where it
    /// paused, or starts the head of the queue.
    pub fn play(&mut self) -> Ack {
        match self.state {
            PlaybackState::Playing => Ack::ok("already playing"),
            PlaybackState::Paused if self.current.is_some() => {
                self.state = PlaybackState::Playing;
                if let Some(id) = self.current().map(|u| u.post_id.clone()) {
                    self.emit(TransportEvent::Resumed(id));
                }
                Ack::ok("resumed")
            }
            _ => {
                if self.current.is_none() && !self.advance() {
                    return Ack::fail("nothing to play");
                }
                self.state = PlaybackState::Playing;
                Ack::ok("playing")
            }
        }
    }

    pub fn pause(&mut self) -> Ack {
        if self.state != PlaybackState::Playing {
            return Ack::fail(format!("cannot pause while {}", self.state));
        }
        self.state = PlaybackState::Paused;
        if let Some(id) = self.current().map(|u| u.post_id.clone()) {
            self.emit(TransportEvent::Paused(id));
        }
        Ack::ok("paused")
    }

    /// Discard the current unit and move to the next; idle when none is left.
    pub fn skip(&mut self) -> Ack {
        let Some(cursor) = self.current.take() else {
            return Ack::fail("nothing to skip");
        };
        self.emit(TransportEvent::Skipped(cursor.unit.post_id));

        if self.advance() {
            Ack::ok("skipped")
        } else {
            self.state = PlaybackState::Idle;
            self.emit(TransportEvent::Drained);
            Ack::ok("skipped; queue empty")
        }
    }

    /// Rewind the current unit; the state is unchanged.
    pub fn replay(&mut self) -> Ack {
        let Some(cursor) = self.current.as_mut() else {
            return Ack::fail("nothing to replay");
        };
        cursor.position = Duration::ZERO;
        let id = cursor.unit.post_id.clone();
        self.emit(TransportEvent::Replayed(id));
        Ack::ok("replaying")
    }

    /// Clear everything. Only `play` or `enqueue` bring activity back.
    pub fn stop(&mut self) -> Ack {
        self.queue.clear();
        self.current = None;
        self.state = PlaybackState::Stopped;
        self.emit(TransportEvent::Stopped);
        Ack::ok("stopped")
    }

    /// The current unit finished on its own.
    pub fn complete(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(cursor) = self.current.take() else {
            return;
        };
        debug!("Finished {}", cursor.unit.post_id.short());
        self.emit(TransportEvent::Completed(cursor.unit.post_id));

        if !self.advance() {
            self.state = PlaybackState::Idle;
            self.emit(TransportEvent::Drained);
        }
    }

    /// Advance the playing position by `elapsed`, completing the current
    /// unit once its duration is reached. No effect unless `Playing`.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let finished = match self.current.as_mut() {
            Some(cursor) => {
                cursor.position += elapsed;
                cursor.position >= cursor.unit.duration()
            }
            None => false,
        };
        if finished {
            self.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioRef, PlatformId};

    fn unit(text: &str, secs: u64) -> AudioUnit {
        let id = PostId::from_content(&PlatformId::new("twitter"), text);
        AudioUnit::new(
            id,
            vec![AudioRef::new(format!("https://audio.test/{text}.wav"))
                .with_duration(Duration::from_secs(secs))],
        )
    }

    #[test]
    fn test_enqueue_from_idle_autostarts() {
        let mut pc = PlaybackController::new();
        assert!(pc.enqueue(unit("a", 2)).success);
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.current().unwrap().post_id, unit("a", 2).post_id);
        assert_eq!(pc.queue_len(), 0);
    }

    #[test]
    fn test_enqueue_while_playing_appends() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 2));
        pc.enqueue(unit("b", 2));
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.current().unwrap().post_id, unit("a", 2).post_id);
        assert_eq!(pc.queue_len(), 1);
    }

    #[test]
    fn test_two_units_drain_to_idle_in_order() {
        let mut pc = PlaybackController::new();
        let mut events = pc.subscribe();
        pc.enqueue(unit("a", 1));
        pc.enqueue(unit("b", 1));

        pc.tick(Duration::from_secs(1));
        assert_eq!(pc.current().unwrap().post_id, unit("b", 1).post_id);
        pc.tick(Duration::from_secs(1));
        assert_eq!(pc.state(), PlaybackState::Idle);
        assert!(pc.current().is_none());

        let mut completed = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let TransportEvent::Completed(id) = event {
                completed.push(id);
            }
        }
        assert_eq!(completed, vec![unit("a", 1).post_id, unit("b", 1).post_id]);
    }

    #[test]
    fn test_pause_then_play_resumes_position() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 10));
        pc.tick(Duration::from_secs(4));
        assert!(pc.pause().success);

        pc.tick(Duration::from_secs(3));
        assert_eq!(pc.position(), Some(Duration::from_secs(4)));

        assert!(pc.play().success);
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.position(), Some(Duration::from_secs(4)));
        assert_eq!(pc.current().unwrap().post_id, unit("a", 10).post_id);
    }

    #[test]
    fn test_pause_requires_playing() {
        let mut pc = PlaybackController::new();
        assert!(!pc.pause().success);
        assert_eq!(pc.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_skip_advances_then_idles() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 5));
        pc.enqueue(unit("b", 5));

        assert!(pc.skip().success);
        assert_eq!(pc.current().unwrap().post_id, unit("b", 5).post_id);
        assert_eq!(pc.state(), PlaybackState::Playing);

        assert!(pc.skip().success);
        assert_eq!(pc.state(), PlaybackState::Idle);
        assert!(!pc.skip().success);
    }

    #[test]
    fn test_skip_while_paused_stays_paused() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 5));
        pc.enqueue(unit("b", 5));
        pc.pause();
        pc.skip();
        assert_eq!(pc.state(), PlaybackState::Paused);
        assert_eq!(pc.position(), Some(Duration::ZERO));
    }

    #[test]
    fn test_replay_rewinds_and_keeps_state() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 10));
        pc.tick(Duration::from_secs(6));
        pc.pause();

        assert!(pc.replay().success);
        assert_eq!(pc.position(), Some(Duration::ZERO));
        assert_eq!(pc.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_stop_clears_and_needs_explicit_play() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 5));
        pc.enqueue(unit("b", 5));
        assert!(pc.stop().success);
        assert_eq!(pc.state(), PlaybackState::Stopped);
        assert!(pc.current().is_none());
        assert_eq!(pc.queue_len(), 0);

        pc.enqueue(unit("c", 5));
        assert_eq!(pc.state(), PlaybackState::Stopped);
        assert!(pc.current().is_none());

        assert!(pc.play().success);
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.current().unwrap().post_id, unit("c", 5).post_id);
    }

    #[test]
    fn test_play_with_nothing_fails() {
        let mut pc = PlaybackController::new();
        assert!(!pc.play().success);
        assert_eq!(pc.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_duplicate_post_rejected() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 5));
        pc.enqueue(unit("b", 5));
        assert!(!pc.enqueue(unit("a", 5)).success);
        assert!(!pc.enqueue(unit("b", 5)).success);
        assert_eq!(pc.queue_len(), 1);
    }

    #[test]
    fn test_tick_ignored_unless_playing() {
        let mut pc = PlaybackController::new();
        pc.enqueue(unit("a", 1));
        pc.pause();
        pc.tick(Duration::from_secs(5));
        assert_eq!(pc.state(), PlaybackState::Paused);
        assert!(pc.current().is_some());
    }

    #[test]
    fn test_parse_transport_command() {
        assert_eq!(TransportCommand::parse("PLAY"), Some(TransportCommand::Play));
        assert_eq!(TransportCommand::parse(" replay "), Some(TransportCommand::Replay));
        assert_eq!(TransportCommand::parse("rewind"), None);
    }
}
