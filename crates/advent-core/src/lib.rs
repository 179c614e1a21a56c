//! # Advent Calendar Core Library
//!
//! This library provides the core logic for an interactive advent calendar:
//! numbered doors that unlock on their calendar date, reveal an audio clip,
//! and remember their opened state across sessions. It is GUI-agnostic --
//! the embedding shell (web page, desktop window) renders the door entities
//! and feeds clicks back in; all decisions live here.
//!
//! ## Architecture
//!
//! - **Layout Engine**: percentage-based door geometry in two modes
//!   (sequential grid, scattered), with per-door manual overrides
//! - **Unlock Policy**: pure date predicate, recomputed on every build
//! - **Opened-State Store**: durable per-calendar set of revealed days over
//!   a pluggable key/value backend
//! - **Calendar Controller**: the per-door state machine, including the
//!   locked-click nag and the prefix-wide reset
//! - **Media**: candidate-URL generation and the HTTP existence probe for
//!   each door's audio file
//!
//! ## Key Components
//!
//! - [`Calendar`]: controller tying unlock, persistence and layout together
//! - [`CalendarConfig`]: JSON-backed configuration with built-in defaults
//! - [`OpenedStore`]: opened-state persistence
//! - [`MediaProbe`]: trait seam for the audio existence check

pub mod calendar;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod media;
pub mod store;
pub mod unlock;

pub use calendar::{Calendar, Door, DoorState, LOCKED_CLICK_NAG_THRESHOLD};
pub use config::{CalendarConfig, ChapterTitles, DoorOverride, LayoutMode, LayoutOverrides};
pub use error::{ConfigError, CoreError, LayoutError, MediaError, StorageError};
pub use events::Event;
pub use layout::{compute_layout, randomize_overrides, DoorGeometry, RandomizeOptions};
pub use media::{HttpProbe, MediaProbe};
pub use store::{FileBackend, MemoryBackend, OpenedStore, StorageBackend, STORAGE_KEY_PREFIX};
