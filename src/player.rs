use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::PlayerError;
use crate::events::{EventSink, LibraryEvent};
use crate::storage::{KeyValueStore, keys, read_or, write_or_report};

/// Volume applied when nothing is persisted, and restored on unmute
pub const DEFAULT_VOLUME: f64 = 0.7;

/// How far the reported position may drift from the persisted one before
/// a write is forced
const POSITION_PERSIST_DRIFT: f64 = 1.0;

/// Lifecycle phase of the single active item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    Idle,
    Loaded,
    Playing,
    Paused,
    Ended,
}

/// A plain read of the player state, for presentation layers
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub item_id: Option<u32>,
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub volume: f64,
    pub load_error: Option<String>,
}

enum Direction {
    Forward,
    Backward,
}

/// State machine over a single active media item.
///
/// At most one item is active at a time: binding a new item replaces the
/// previous one, and the load generation makes any late host event for an
/// earlier item a no-op. Host media events (`on_metadata`, `on_time_update`,
/// `on_ended`, `on_error`) must pass back the generation returned by
/// [`PlayerController::load`].
#[derive(Debug)]
pub struct PlayerController {
    phase: PlaybackPhase,
    current: Option<u32>,
    position: f64,
    duration: Option<f64>,
    volume: f64,
    generation: u64,
    last_persisted_position: f64,
    load_error: Option<String>,
}

impl PlayerController {
    /// Create a controller with the persisted volume preference applied
    pub fn restore(store: &dyn KeyValueStore, events: &dyn EventSink) -> Self {
        let volume: f64 = read_or(store, keys::VOLUME, DEFAULT_VOLUME, events);

        Self {
            phase: PlaybackPhase::Idle,
            current: None,
            position: 0.0,
            duration: None,
            volume: if volume.is_finite() {
                volume.clamp(0.0, 1.0)
            } else {
                DEFAULT_VOLUME
            },
            generation: 0,
            last_persisted_position: 0.0,
            load_error: None,
        }
    }

    /// Re-bind the persisted last item and position, without playing.
    /// Returns the restored item id, if any.
    pub fn restore_session(
        &mut self,
        catalog: &Catalog,
        store: &dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Option<u32> {
        let last_id: Option<u32> = read_or(store, keys::LAST_ITEM, None, events);
        let last_position: f64 = read_or(store, keys::LAST_POSITION, 0.0, events);

        let id = last_id?;
        let item = catalog.get(id)?;
        if last_position <= 0.0 {
            return None;
        }

        let duration = item.duration_seconds.map(f64::from);
        let position = match duration {
            Some(d) => last_position.min(d),
            None => last_position,
        };

        self.generation += 1;
        self.phase = PlaybackPhase::Loaded;
        self.current = Some(id);
        self.position = position;
        self.duration = duration;
        self.last_persisted_position = position;
        self.load_error = None;

        Some(id)
    }

    /// Bind `id` as the active item, replacing any previous one.
    ///
    /// Returns the new load generation; the host passes it back with every
    /// media event so completions of an abandoned load cannot apply.
    pub fn load(
        &mut self,
        id: u32,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<u64, PlayerError> {
        let item = catalog.get(id).ok_or(PlayerError::UnknownItem { id })?;

        self.generation += 1;
        self.phase = PlaybackPhase::Loaded;
        self.current = Some(id);
        self.position = 0.0;
        self.last_persisted_position = 0.0;
        self.duration = item.duration_seconds.map(f64::from);
        self.load_error = None;

        write_or_report(store, keys::LAST_ITEM, &id, events);
        write_or_report(store, keys::LAST_POSITION, &0.0f64, events);
        events.emit(LibraryEvent::PlaybackLoaded {
            id,
            title: item.title.clone(),
        });

        Ok(self.generation)
    }

    /// Start or resume playback of the active item
    pub fn play(&mut self, catalog: &Catalog, events: &dyn EventSink) -> Result<u32, PlayerError> {
        let id = self.current.ok_or(PlayerError::NoItemLoaded)?;

        if self.phase == PlaybackPhase::Playing {
            return Ok(id);
        }
        if self.phase == PlaybackPhase::Ended {
            self.position = 0.0;
        }

        self.phase = PlaybackPhase::Playing;
        let title = catalog
            .get(id)
            .map(|item| item.title.clone())
            .unwrap_or_default();
        events.emit(LibraryEvent::PlaybackStarted { id, title });

        Ok(id)
    }

    /// Pause playback; a no-op outside `Playing`
    pub fn pause(&mut self, store: &mut dyn KeyValueStore, events: &dyn EventSink) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }

        self.phase = PlaybackPhase::Paused;
        self.flush_position(store, events);

        if let Some(id) = self.current {
            events.emit(LibraryEvent::PlaybackPaused {
                id,
                position_seconds: self.position,
            });
        }
    }

    /// Flip between playing and paused. Returns whether playback is now
    /// running.
    pub fn toggle_play(
        &mut self,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<bool, PlayerError> {
        if self.current.is_none() {
            return Err(PlayerError::NoItemLoaded);
        }

        if self.phase == PlaybackPhase::Playing {
            self.pause(store, events);
            Ok(false)
        } else {
            self.play(catalog, events)?;
            Ok(true)
        }
    }

    /// Move the playhead, clamped to `[0, duration]`.
    /// Returns the clamped position.
    pub fn seek(
        &mut self,
        target_seconds: f64,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<f64, PlayerError> {
        if self.current.is_none() {
            return Err(PlayerError::NoItemLoaded);
        }

        let target = if target_seconds.is_finite() {
            target_seconds.max(0.0)
        } else {
            0.0
        };
        let clamped = match self.duration {
            Some(d) => target.min(d),
            None => target,
        };

        self.position = clamped;
        self.flush_position(store, events);

        Ok(clamped)
    }

    /// Advance to the next item in catalog order, wrapping last-to-first,
    /// and start playing it
    pub fn next(
        &mut self,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<u32, PlayerError> {
        self.advance(Direction::Forward, catalog, store, events)
    }

    /// Step back to the previous item in catalog order, wrapping
    /// first-to-last, and start playing it
    pub fn prev(
        &mut self,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<u32, PlayerError> {
        self.advance(Direction::Backward, catalog, store, events)
    }

    fn advance(
        &mut self,
        direction: Direction,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<u32, PlayerError> {
        if catalog.is_empty() {
            return Err(PlayerError::EmptyCatalog);
        }
        let from = self.current.ok_or(PlayerError::NoItemLoaded)?;

        let to = match direction {
            Direction::Forward => catalog.next_of(from),
            Direction::Backward => catalog.prev_of(from),
        }
        .ok_or(PlayerError::UnknownItem { id: from })?
        .id;

        self.load(to, catalog, store, events)?;
        self.play(catalog, events)?;
        events.emit(LibraryEvent::PlaybackAdvanced { from, to });

        Ok(to)
    }

    /// Set the volume preference, clamped to `[0, 1]`.
    ///
    /// Persists regardless of whether an item is active; the preference
    /// outlives any single playback session.
    pub fn set_volume(
        &mut self,
        volume: f64,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> f64 {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };

        write_or_report(store, keys::VOLUME, &self.volume, events);
        events.emit(LibraryEvent::VolumeChanged {
            volume: self.volume,
            muted: self.volume == 0.0,
        });

        self.volume
    }

    /// Mute, or restore the default volume when already muted
    pub fn toggle_mute(
        &mut self,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> f64 {
        let target = if self.volume > 0.0 { 0.0 } else { DEFAULT_VOLUME };
        self.set_volume(target, store, events)
    }

    /// Host reported the media's real duration
    pub fn on_metadata(&mut self, generation: u64, duration_seconds: f64) {
        if generation != self.generation || self.current.is_none() {
            return;
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return;
        }

        self.duration = Some(duration_seconds);
        self.position = self.position.min(duration_seconds);
    }

    /// Host reported playback progress.
    ///
    /// The position is persisted once it has drifted at least one second
    /// from the last persisted value, keeping storage eventually consistent
    /// without a write per tick.
    pub fn on_time_update(
        &mut self,
        generation: u64,
        position_seconds: f64,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) {
        if generation != self.generation || self.current.is_none() {
            return;
        }
        if !position_seconds.is_finite() {
            return;
        }

        let clamped = match self.duration {
            Some(d) => position_seconds.clamp(0.0, d),
            None => position_seconds.max(0.0),
        };
        self.position = clamped;

        if (clamped - self.last_persisted_position).abs() >= POSITION_PERSIST_DRIFT {
            self.flush_position(store, events);
        }
    }

    /// Host reported the active item played to its natural end.
    ///
    /// Transitions to `Ended`, then auto-advances to the next item in
    /// catalog order and plays it. Returns the new active id.
    pub fn on_ended(
        &mut self,
        generation: u64,
        catalog: &Catalog,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Option<u32> {
        if generation != self.generation {
            return None;
        }
        let id = self.current?;

        self.phase = PlaybackPhase::Ended;
        events.emit(LibraryEvent::PlaybackEnded { id });

        self.advance(Direction::Forward, catalog, store, events).ok()
    }

    /// Host reported a media load failure.
    ///
    /// The item stays bound with a sticky error flag; navigation to the
    /// next or previous item remains possible.
    pub fn on_error(&mut self, generation: u64, reason: &str, events: &dyn EventSink) {
        if generation != self.generation {
            return;
        }
        let Some(id) = self.current else { return };

        self.phase = PlaybackPhase::Loaded;
        self.load_error = Some(reason.to_string());
        events.emit(LibraryEvent::PlaybackFailed {
            id,
            reason: reason.to_string(),
        });
    }

    /// Page-unload analog: pause and persist the position immediately
    pub fn close(&mut self, store: &mut dyn KeyValueStore, events: &dyn EventSink) {
        self.pause(store, events);
        self.flush_position(store, events);
    }

    /// Current phase
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Id of the active item, if any
    pub fn current_item(&self) -> Option<u32> {
        self.current
    }

    /// Volume preference
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// The current load generation; host media events must echo it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read the full player state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            item_id: self.current,
            position_seconds: self.position,
            duration_seconds: self.duration,
            volume: self.volume,
            load_error: self.load_error.clone(),
        }
    }

    fn flush_position(&mut self, store: &mut dyn KeyValueStore, events: &dyn EventSink) {
        if self.current.is_none() {
            return;
        }
        if write_or_report(store, keys::LAST_POSITION, &self.position, events) {
            self.last_persisted_position = self.position;
        }
    }
}
