// Ocarina - Terminal player for a shared, YouTube-sourced song catalog
// The catalog rows live in a hosted Postgres store; the ingest backend
// prepares each song at two bitrate tiers that stream over plain HTTP.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use ocarina::player::RodioBackend;
use ocarina::ui::{App, TerminalManager};
use ocarina::{CatalogStore, Config, PlayerState};

#[derive(Parser)]
#[command(name = "ocarina")]
#[command(about = "A terminal music player backed by a shared song catalog")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,
}

fn init_logging(dev: bool) -> Result<()> {
    // Create logs directory in project root
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ocarina.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Base filter: info level for general logs, debug for ocarina
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ocarina=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("🔧 Dev mode: Debug output enabled to stderr + file");
    }

    // Prevent the guard from being dropped
    std::mem::forget(_guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.dev)?;

    info!("🎶 Ocarina starting up");

    // Only redirect stderr if NOT in dev mode (dev mode needs stderr for debug output)
    let _stderr_redirect = if !args.dev {
        debug!("Redirecting stderr to suppress ALSA errors");
        Some(redirect_stderr_to_null())
    } else {
        debug!("Dev mode: keeping stderr for debug output");
        None
    };

    let config = Config::load()?;

    println!("🎶 Ocarina - Terminal Music Player");
    println!("==================================");
    println!("Loading the song catalog...");

    let store = Arc::new(CatalogStore::new(&config.store.url, &config.store.anon_key));

    // A dead store should not keep the player from opening; F5 retries.
    let (folders, songs) = match tokio::try_join!(store.list_folders(), store.list_songs()) {
        Ok((folders, songs)) => {
            println!(
                "✅ Catalog loaded: {} folders, {} songs",
                folders.len(),
                songs.len()
            );
            (folders, songs)
        }
        Err(e) => {
            error!("startup catalog fetch failed: {}", e);
            println!("⚠️  Could not reach the catalog store: {e}");
            println!("   Starting with an empty list; press F5 to retry.");
            (Vec::new(), Vec::new())
        }
    };

    let mut state = PlayerState::new(config.default_bitrate());
    state.set_catalog(folders, songs);

    let backend = RodioBackend::new()?;

    let mut terminal = TerminalManager::new()?;
    let mut app = App::new(state, Box::new(backend), store);
    let result = app.run(&mut terminal).await;
    drop(terminal);

    println!("👋 Thanks for listening!");

    result
}

/// Redirect stderr to /dev/null to suppress ALSA error messages that interfere with TUI
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        // Open /dev/null for writing
        let null_fd = libc::open(
            b"/dev/null\0".as_ptr() as *const libc::c_char,
            libc::O_WRONLY,
        );

        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        // Duplicate stderr to save original
        let stderr_backup = libc::dup(libc::STDERR_FILENO);
        if stderr_backup == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to backup stderr"));
        }

        // Redirect stderr to /dev/null
        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            libc::close(stderr_backup);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }

    Ok(())
}
