use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every observable calendar transition produces an Event.
/// The embedding shell consumes these to drive its UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An unlocked door was revealed. `newly_opened` is true only the first
    /// time; a repeat click re-presents the same reveal idempotently.
    DoorOpened {
        day: u32,
        chapter_title: Option<String>,
        newly_opened: bool,
        at: DateTime<Utc>,
    },
    /// A locked door was clicked. `consecutive` is the process-wide counter
    /// after this click (it resets on every successful open).
    LockedClick {
        day: u32,
        consecutive: u32,
        at: DateTime<Utc>,
    },
    /// Three locked clicks in a row -- show the "be patient" notice.
    BePatient { at: DateTime<Utc> },
    /// The opened-state was cleared, current and historical calendars alike.
    CalendarReset {
        removed_keys: Vec<String>,
        at: DateTime<Utc>,
    },
}
