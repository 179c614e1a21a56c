//! Door presentation controller.
//!
//! [`Calendar`] ties unlock state, the persisted opened-set and the layout
//! output into door entities, and runs the per-door state machine:
//!
//! ```text
//! Locked --(click)--> Locked        (global nag counter, notice at 3)
//! Unopened --(click)--> Opened      (persist + reveal)
//! Opened --(click)--> Opened        (idempotent re-reveal)
//! ```
//!
//! The locked-click counter is owned by the calendar, not module state: it
//! is global across doors and resets on every successful open. Unlock state
//! is recomputed on every build from the caller-supplied `now`, so doors
//! unlock as real time advances without any timer.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::{CalendarConfig, ChapterTitles, LayoutOverrides};
use crate::events::Event;
use crate::layout::{self, DoorGeometry};
use crate::media::{self, MediaProbe};
use crate::store::{OpenedStore, StorageBackend};
use crate::unlock;

/// Locked clicks before the "be patient" notice fires.
pub const LOCKED_CLICK_NAG_THRESHOLD: u32 = 3;

/// Presentation state of a single door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    /// The unlock date has not arrived.
    Locked,
    /// Unlocked but never revealed.
    Unopened,
    /// Unlocked and previously revealed.
    Opened,
}

/// One renderable door entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub day: u32,
    pub state: DoorState,
    pub geometry: DoorGeometry,
    pub chapter_title: Option<String>,
}

/// The calendar controller.
pub struct Calendar<B: StorageBackend> {
    config: CalendarConfig,
    overrides: LayoutOverrides,
    titles: ChapterTitles,
    store: OpenedStore<B>,
    locked_clicks: u32,
}

impl<B: StorageBackend> Calendar<B> {
    /// Build a calendar over the given backend.
    ///
    /// Honors `reset_on_load`: when set, this calendar's persisted
    /// opened-state is cleared once here (a failed clear is logged, not
    /// fatal). Unlike [`Self::reset`], historical calendars are left alone.
    pub fn new(
        config: CalendarConfig,
        overrides: LayoutOverrides,
        titles: ChapterTitles,
        backend: B,
    ) -> Self {
        let config = config.normalized();
        let mut calendar = Self {
            config,
            overrides,
            titles,
            store: OpenedStore::new(backend),
            locked_clicks: 0,
        };
        if calendar.config.reset_on_load {
            match calendar.store.clear(&calendar.config) {
                Ok(()) => {
                    tracing::info!("opened-state reset via config");
                }
                Err(err) => {
                    tracing::warn!(%err, "reset-on-load failed");
                }
            }
        }
        calendar
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn store(&self) -> &OpenedStore<B> {
        &self.store
    }

    /// Process-wide locked-click counter, exposed for the shell's debugging.
    pub fn locked_clicks(&self) -> u32 {
        self.locked_clicks
    }

    /// The current instant in the config's frame of reference, ready to be
    /// passed to [`Self::build_doors`] and [`Self::handle_click`].
    pub fn now(&self) -> NaiveDateTime {
        unlock::wall_clock_now(&self.config)
    }

    fn door_state(&self, day: u32, opened: &BTreeSet<u32>, now: NaiveDateTime) -> DoorState {
        if !unlock::is_unlocked(&self.config, day, now) {
            DoorState::Locked
        } else if opened.contains(&day) {
            DoorState::Opened
        } else {
            DoorState::Unopened
        }
    }

    /// One door entity per day in the configured range, with unlock state
    /// and layout recomputed from scratch.
    pub fn build_doors(&self, now: NaiveDateTime) -> Vec<Door> {
        let opened = self.store.load(&self.config);
        let geometry = layout::compute_layout(&self.config, &self.overrides);
        (self.config.start_day..=self.config.end_day)
            .map(|day| Door {
                day,
                state: self.door_state(day, &opened, now),
                geometry: geometry.get(&day).copied().unwrap_or_default(),
                chapter_title: self.titles.get(day).map(str::to_string),
            })
            .collect()
    }

    /// Run the click state machine for `day`.
    ///
    /// A locked door increments the global counter and, every third locked
    /// click, emits [`Event::BePatient`]. An unlocked door is revealed:
    /// newly opened doors are persisted, repeat clicks re-reveal without a
    /// write. Any successful reveal resets the counter.
    pub fn handle_click(&mut self, day: u32, now: NaiveDateTime) -> Vec<Event> {
        let at = Utc::now();
        if !(self.config.start_day..=self.config.end_day).contains(&day) {
            tracing::warn!(day, "click for a day outside the calendar range");
            return Vec::new();
        }

        if !unlock::is_unlocked(&self.config, day, now) {
            self.locked_clicks += 1;
            let mut events = vec![Event::LockedClick {
                day,
                consecutive: self.locked_clicks,
                at,
            }];
            if self.locked_clicks >= LOCKED_CLICK_NAG_THRESHOLD {
                self.locked_clicks = 0;
                events.push(Event::BePatient { at });
            }
            return events;
        }

        self.locked_clicks = 0;
        let newly_opened = !self.store.load(&self.config).contains(&day);
        if newly_opened {
            if let Err(err) = self.store.mark_opened(&self.config, day) {
                // The reveal still happens; a later reload may forget it.
                tracing::warn!(day, %err, "failed to persist opened state");
            }
        }
        vec![Event::DoorOpened {
            day,
            chapter_title: self.titles.get(day).map(str::to_string),
            newly_opened,
            at,
        }]
    }

    /// Clear the opened-state for this and every historical calendar and
    /// zero the nag counter. The double-confirm gesture belongs to the
    /// embedding shell; this is the action behind it.
    pub fn reset(&mut self) -> Vec<Event> {
        self.locked_clicks = 0;
        match self.store.reset(&self.config) {
            Ok(removed_keys) => vec![Event::CalendarReset {
                removed_keys,
                at: Utc::now(),
            }],
            Err(err) => {
                tracing::warn!(%err, "calendar reset failed");
                Vec::new()
            }
        }
    }

    /// Resolve the playable audio URL for a day via the given probe.
    pub async fn resolve_audio(&self, probe: &dyn MediaProbe, day: u32) -> Option<String> {
        media::resolve_audio(probe, &self.config, day).await
    }

    /// Guidance message for a day whose audio did not resolve.
    pub fn missing_audio_hint(&self, day: u32) -> String {
        media::missing_audio_hint(&self.config, day)
    }
}
