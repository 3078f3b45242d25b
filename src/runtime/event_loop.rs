use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::config;
use crate::error::PlaybackError;
use crate::library::LibraryLoader;
use crate::permission::PermissionProvider;
use crate::playback::{MediaEngine, PlaybackBridge};
use crate::runtime::startup::load_library;
use crate::ui;

/// What a key press asks the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    /// A transport command went to the engine; resync right away.
    Transport,
    Quit,
}

/// Everything the loop needs besides the terminal and the app model.
pub struct Services<'a, E: MediaEngine> {
    pub bridge: &'a mut PlaybackBridge<E>,
    pub loader: &'a LibraryLoader,
    pub permission: &'a dyn PermissionProvider,
    pub root: &'a Path,
}

/// Main terminal event loop: picks up finished scans, keeps the playback
/// mirror in sync, draws and handles input. Returns `Ok(())` on quit.
pub fn run<E: MediaEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    services: &mut Services<'_, E>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sync_every = Duration::from_millis(settings.playback.sync_interval_ms);
    let mut last_sync = Instant::now();
    let mut followed: Option<usize> = None;

    loop {
        if let Some(catalog) = services.loader.try_recv() {
            info!(
                generation = catalog.generation(),
                tracks = catalog.len(),
                "catalog ready"
            );
            let snapshot = catalog.snapshot();
            app.replace_catalog(catalog);
            report(app, services.bridge.on_catalog_replaced(&snapshot));
        }

        if last_sync.elapsed() >= sync_every {
            sync(services.bridge);
            last_sync = Instant::now();
        }
        follow_playback(app, &mut followed, services.bridge.selection().current_index);

        let bridge = &*services.bridge;
        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                bridge.selection(),
                bridge.current_track(),
                bridge.elapsed(),
                &settings.ui,
            )
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(key.code, app, services) {
                    KeyOutcome::Quit => break,
                    KeyOutcome::Transport => {
                        sync(services.bridge);
                        last_sync = Instant::now();
                    }
                    KeyOutcome::Continue => {}
                }
            }
        }
    }

    Ok(())
}

/// Move the cursor onto the playing track whenever playback moves to a new one.
fn follow_playback(app: &mut App, followed: &mut Option<usize>, playing: Option<usize>) {
    if playing != *followed {
        if let Some(i) = playing {
            app.set_selected(i);
        }
        *followed = playing;
    }
}

/// Sync failures are not the user's doing, so they only go to the log.
fn sync<E: MediaEngine>(bridge: &mut PlaybackBridge<E>) {
    if let Err(e) = bridge.sync() {
        debug!(error = %e, "playback sync failed");
    }
}

fn report(app: &mut App, result: Result<(), PlaybackError>) {
    if let Err(e) = result {
        warn!(error = %e, "playback command failed");
        app.show_notice("Error", e.to_string());
    }
}

fn transport(app: &mut App, result: Result<(), PlaybackError>) -> KeyOutcome {
    report(app, result);
    KeyOutcome::Transport
}

fn handle_key<E: MediaEngine>(
    code: KeyCode,
    app: &mut App,
    services: &mut Services<'_, E>,
) -> KeyOutcome {
    let bridge = &mut *services.bridge;

    match code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Esc => app.dismiss_notice(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter => {
            if !app.has_tracks() {
                return KeyOutcome::Continue;
            }
            let selection = bridge.selection();
            let already_playing =
                selection.is_playing && selection.current_index == Some(app.selected);
            if !already_playing {
                let result = bridge.select_and_play(app.catalog.snapshot(), app.selected);
                return transport(app, result);
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let result = bridge.toggle_playback();
            return transport(app, result);
        }
        KeyCode::Char('l') | KeyCode::Char('n') => {
            let result = bridge.next();
            return transport(app, result);
        }
        KeyCode::Char('h') | KeyCode::Char('b') => {
            let result = bridge.previous();
            return transport(app, result);
        }
        KeyCode::Char('r') => {
            load_library(app, services.loader, services.permission, services.root);
        }
        _ => {}
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibrarySettings;
    use crate::error::EngineError;
    use crate::library::{Catalog, Track};
    use crate::permission::MockPermissionProvider;
    use crate::playback::MockMediaEngine;
    use std::path::PathBuf;

    fn app_with(n: usize) -> App {
        let tracks = (0..n)
            .map(|i| Track::fallback(&PathBuf::from(format!("/music/{i}.mp3"))))
            .collect();
        let mut app = App::new();
        app.replace_catalog(Catalog::new(1, tracks));
        app
    }

    fn press<E: MediaEngine>(
        code: KeyCode,
        app: &mut App,
        bridge: &mut PlaybackBridge<E>,
    ) -> KeyOutcome {
        let loader = LibraryLoader::new(LibrarySettings::default());
        let permission = MockPermissionProvider::new();
        let mut services = Services {
            bridge,
            loader: &loader,
            permission: &permission,
            root: Path::new("/music"),
        };
        handle_key(code, app, &mut services)
    }

    #[test]
    fn enter_plays_the_highlighted_track() {
        let mut engine = MockMediaEngine::new();
        engine.expect_reset().times(1).returning(|| Ok(()));
        engine.expect_enqueue().times(1).returning(|_| Ok(()));
        engine
            .expect_skip_to()
            .withf(|&i| i == 2)
            .times(1)
            .returning(|_| Ok(()));
        engine.expect_play().times(1).returning(|| Ok(()));
        let mut bridge = PlaybackBridge::new(engine);

        let mut app = app_with(5);
        app.set_selected(2);
        assert_eq!(
            press(KeyCode::Enter, &mut app, &mut bridge),
            KeyOutcome::Transport
        );
        assert_eq!(bridge.selection().current_index, Some(2));

        // Enter on the track that is already playing does nothing.
        assert_eq!(
            press(KeyCode::Enter, &mut app, &mut bridge),
            KeyOutcome::Continue
        );
    }

    #[test]
    fn enter_with_empty_library_is_ignored() {
        let mut bridge = PlaybackBridge::new(MockMediaEngine::new());
        let mut app = App::new();
        assert_eq!(
            press(KeyCode::Enter, &mut app, &mut bridge),
            KeyOutcome::Continue
        );
        assert_eq!(bridge.selection().current_index, None);
    }

    #[test]
    fn failed_play_becomes_a_notice() {
        let mut engine = MockMediaEngine::new();
        engine
            .expect_reset()
            .returning(|| Err(EngineError::NoOutputDevice));
        let mut bridge = PlaybackBridge::new(engine);

        let mut app = app_with(3);
        press(KeyCode::Enter, &mut app, &mut bridge);

        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.title, "Error");
        assert!(notice.message.starts_with("Unable to play the file"));
        assert_eq!(bridge.selection().current_index, None);

        press(KeyCode::Esc, &mut app, &mut bridge);
        assert!(app.notice.is_none());
    }

    #[test]
    fn navigation_keys_move_the_cursor_only() {
        let mut bridge = PlaybackBridge::new(MockMediaEngine::new());
        let mut app = app_with(4);

        press(KeyCode::Char('j'), &mut app, &mut bridge);
        press(KeyCode::Down, &mut app, &mut bridge);
        assert_eq!(app.selected, 2);
        press(KeyCode::Char('k'), &mut app, &mut bridge);
        assert_eq!(app.selected, 1);
        press(KeyCode::Char('G'), &mut app, &mut bridge);
        assert_eq!(app.selected, 3);
        press(KeyCode::Char('g'), &mut app, &mut bridge);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn transport_keys_without_selection_are_no_ops() {
        let mut bridge = PlaybackBridge::new(MockMediaEngine::new());
        let mut app = app_with(2);

        for code in [KeyCode::Char(' '), KeyCode::Char('l'), KeyCode::Char('h')] {
            assert_eq!(press(code, &mut app, &mut bridge), KeyOutcome::Transport);
        }
        assert!(app.notice.is_none());
    }

    #[test]
    fn cursor_follows_track_changes_only() {
        let mut app = app_with(5);
        let mut followed = None;

        follow_playback(&mut app, &mut followed, Some(3));
        assert_eq!(app.selected, 3);

        // Browsing away while the same track plays keeps the cursor where the user put it.
        app.set_selected(0);
        follow_playback(&mut app, &mut followed, Some(3));
        assert_eq!(app.selected, 0);

        follow_playback(&mut app, &mut followed, Some(4));
        assert_eq!(app.selected, 4);

        follow_playback(&mut app, &mut followed, None);
        assert_eq!(app.selected, 4);
        assert_eq!(followed, None);
    }

    #[test]
    fn q_quits() {
        let mut bridge = PlaybackBridge::new(MockMediaEngine::new());
        let mut app = App::new();
        assert_eq!(
            press(KeyCode::Char('q'), &mut app, &mut bridge),
            KeyOutcome::Quit
        );
    }
}
