//! Campaign Vault Engine - Main entry point.

use anyhow::Context;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    content::FileContentSource,
    settings::Settings,
    storage::FileStorage,
};
use vault_engine::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_engine=info,vault_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Campaign Vault Engine");

    let settings = Settings::from_env();
    tracing::info!(
        content_dir = ?settings.content_dir,
        storage = ?settings.storage_path,
        initiative = %settings.initiative_dice,
        "Configuration loaded"
    );

    let storage = Arc::new(FileStorage::open(&settings.storage_path));
    let content_source = FileContentSource::new(&settings.content_dir);

    let mut app = App::load(
        &settings,
        &content_source,
        storage,
        Arc::new(SystemClock),
        Arc::new(SystemRandom),
    )
    .await
    .context("Failed to load campaign content")?;

    report_status(&app);
    app.shutdown();

    Ok(())
}

fn report_status(app: &App) {
    if let Some(today) = app.calendar.today() {
        tracing::info!(
            date = %app.calendar.display_date(),
            day = %today.day_name,
            time = %app.calendar.format_time(),
            moon = %today.moon_phase,
            "Today"
        );
        if let Some(weather) = &today.weather {
            tracing::info!(
                season = %weather.season.display_name(),
                roll = weather.roll,
                "{}",
                weather.description
            );
        }
        if let Some(effect) = &today.moon_effect {
            tracing::info!(sign = %effect.sign.display_name(), "{}", effect.description);
        }
        for event in &today.events {
            tracing::info!(event = %event.name, "Happening today");
        }
    }

    for deadline in app.calendar.deadlines() {
        if deadline.is_today() {
            tracing::warn!(event = %deadline.event.name, "Deadline is TODAY");
        } else if deadline.is_critical() {
            tracing::warn!(
                event = %deadline.event.name,
                days = deadline.days_until,
                "Deadline approaching"
            );
        } else {
            tracing::info!(
                event = %deadline.event.name,
                days = deadline.days_until,
                "Upcoming deadline"
            );
        }
    }

    let encounter = app.encounter.state();
    tracing::info!(
        name = %encounter.name,
        phase = %encounter.phase(),
        round = encounter.round,
        "Encounter"
    );
    tracing::info!(
        session = %app.scratchpad.current().title,
        history = app.scratchpad.history().len(),
        pinned = app.bookmarks.pinned().len(),
        recent = app.bookmarks.recent().len(),
        "Notes"
    );
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
