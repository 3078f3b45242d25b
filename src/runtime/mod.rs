use std::env;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::library::LibraryLoader;
use crate::logging;
use crate::permission::FsPermissionProvider;
use crate::playback::{PlaybackBridge, RodioEngine};

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    // Must be reported before raw mode takes over the terminal.
    let _log_guard = match logging::init(&settings.logging) {
        Ok(guard) => {
            info!(directory = %guard.directory.display(), "logging to file");
            Some(guard)
        }
        Err(e) => {
            eprintln!("pochette: logging disabled: {e}");
            None
        }
    };

    let root = startup::library_root(env::args().nth(1), &settings.library);
    info!(root = %root.display(), "starting");

    let mut app = App::new();
    app.set_current_dir(root.display().to_string());

    let loader = LibraryLoader::new(settings.library.clone());
    let permission = FsPermissionProvider::new(&root);
    startup::load_library(&mut app, &loader, &permission, &root);

    let mut bridge = PlaybackBridge::new(RodioEngine::new());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = {
        let mut services = event_loop::Services {
            bridge: &mut bridge,
            loader: &loader,
            permission: &permission,
            root: &root,
        };
        event_loop::run(&mut terminal, &settings, &mut app, &mut services)
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("shutting down");
    run_result
}
