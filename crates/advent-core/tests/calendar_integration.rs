//! End-to-end scenarios against the public API: a shell building doors,
//! clicking them, reloading, and resetting.

use advent_core::{
    Calendar, CalendarConfig, ChapterTitles, DoorState, Event, FileBackend, LayoutMode,
    LayoutOverrides, MemoryBackend, StorageBackend,
};
use chrono::{NaiveDate, NaiveDateTime};

fn config() -> CalendarConfig {
    CalendarConfig::default()
}

/// December 10th, noon -- days 1..=10 unlocked, the rest locked.
fn mid_calendar() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 12, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn opened_door_survives_reload_without_rewriting() {
    let dir = tempfile::tempdir().unwrap();
    let now = mid_calendar();

    {
        let mut cal = Calendar::new(
            config(),
            LayoutOverrides::empty(),
            ChapterTitles::default(),
            FileBackend::with_dir(dir.path()),
        );
        let events = cal.handle_click(5, now);
        assert!(matches!(
            events[0],
            Event::DoorOpened {
                day: 5,
                newly_opened: true,
                ..
            }
        ));
    }

    // A fresh session over the same storage presents door 5 as opened and
    // a repeat click does not count as newly opened.
    let mut reloaded = Calendar::new(
        config(),
        LayoutOverrides::empty(),
        ChapterTitles::default(),
        FileBackend::with_dir(dir.path()),
    );
    let doors = reloaded.build_doors(now);
    assert_eq!(doors[4].state, DoorState::Opened);

    let events = reloaded.handle_click(5, now);
    assert!(matches!(
        events[0],
        Event::DoorOpened {
            day: 5,
            newly_opened: false,
            ..
        }
    ));
}

#[test]
fn reset_clears_historical_calendars_too() {
    let mut backend = MemoryBackend::new();
    backend.seed("advent_opened_2024_11", r#"["1", "2"]"#);
    let mut cal = Calendar::new(
        config(),
        LayoutOverrides::empty(),
        ChapterTitles::default(),
        backend,
    );
    cal.handle_click(3, mid_calendar());

    let events = cal.reset();
    match &events[0] {
        Event::CalendarReset { removed_keys, .. } => {
            assert!(removed_keys.contains(&"advent_opened_2024_11".to_string()));
            assert!(removed_keys.contains(&"advent_opened_2025_11".to_string()));
        }
        other => panic!("expected CalendarReset, got {other:?}"),
    }

    let doors = cal.build_doors(mid_calendar());
    assert!(doors.iter().all(|d| d.state != DoorState::Opened));
}

#[test]
fn nag_fires_once_per_three_locked_clicks() {
    let mut cal = Calendar::new(
        config(),
        LayoutOverrides::empty(),
        ChapterTitles::default(),
        MemoryBackend::new(),
    );
    let now = mid_calendar();

    let mut notices = 0;
    for _ in 0..6 {
        let events = cal.handle_click(24, now);
        notices += events
            .iter()
            .filter(|e| matches!(e, Event::BePatient { .. }))
            .count();
    }
    assert_eq!(notices, 2);
}

#[test]
fn changing_the_year_presents_a_fresh_calendar() {
    let mut backend = MemoryBackend::new();
    {
        let mut cal = Calendar::new(
            config(),
            LayoutOverrides::empty(),
            ChapterTitles::default(),
            MemoryBackend::new(),
        );
        cal.handle_click(2, mid_calendar());
        // Carry the opened key over into the shared backend.
        if let Some(value) = cal
            .store()
            .backend()
            .get(&config().storage_key())
            .unwrap()
        {
            backend.seed(config().storage_key(), value);
        }
    }

    let next_year = CalendarConfig {
        year: 2026,
        ..config()
    };
    let cal = Calendar::new(
        next_year.clone(),
        LayoutOverrides::empty(),
        ChapterTitles::default(),
        backend,
    );
    // The 2026 key is untouched; perceived state starts empty.
    assert!(cal.store().load(&next_year).is_empty());
}

#[test]
fn scattered_layout_flows_into_doors() {
    let cfg = CalendarConfig {
        layout_mode: LayoutMode::Scattered,
        ..config()
    };
    let cal = Calendar::new(
        cfg,
        LayoutOverrides::empty(),
        ChapterTitles::default(),
        MemoryBackend::new(),
    );
    let doors = cal.build_doors(mid_calendar());

    // Day 6 lands at row 1, col 0 of the 5-column fallback flow.
    let six = doors.iter().find(|d| d.day == 6).unwrap();
    assert!((six.geometry.top - 26.0).abs() < 1e-9);
    assert!((six.geometry.left - 1.0).abs() < 1e-9);
    assert!((six.geometry.width - 18.0).abs() < 1e-9);
    assert!((six.geometry.height - 16.0).abs() < 1e-9);
}
