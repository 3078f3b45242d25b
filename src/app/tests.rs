use super::*;
use crate::library::{Catalog, Track};
use std::path::PathBuf;

fn catalog(generation: u64, n: usize) -> Catalog {
    let tracks = (0..n)
        .map(|i| Track::fallback(&PathBuf::from(format!("/music/{i}.mp3"))))
        .collect();
    Catalog::new(generation, tracks)
}

#[test]
fn new_app_is_empty_and_idle() {
    let app = App::new();
    assert!(!app.has_tracks());
    assert!(!app.loading);
    assert!(app.notice.is_none());
}

#[test]
fn replace_catalog_clears_loading_and_clamps_cursor() {
    let mut app = App::new();
    app.begin_loading();
    app.replace_catalog(catalog(1, 5));
    assert!(!app.loading);
    app.select_last();
    assert_eq!(app.selected, 4);

    app.begin_loading();
    app.replace_catalog(catalog(2, 2));
    assert_eq!(app.selected, 1);
    assert_eq!(app.catalog.generation(), 2);

    app.replace_catalog(catalog(3, 0));
    assert_eq!(app.selected, 0);
}

#[test]
fn cursor_stays_within_catalog() {
    let mut app = App::new();
    app.replace_catalog(catalog(1, 3));

    app.prev();
    assert_eq!(app.selected, 0);
    app.next();
    app.next();
    app.next();
    assert_eq!(app.selected, 2);

    app.set_selected(7);
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn notices_can_be_shown_and_dismissed() {
    let mut app = App::new();
    app.show_notice("Error", "Unable to play the file");
    assert_eq!(
        app.notice,
        Some(Notice {
            title: "Error".into(),
            message: "Unable to play the file".into()
        })
    );
    app.dismiss_notice();
    assert!(app.notice.is_none());
}
