use std::path::PathBuf;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{SeasonId, Series, SeriesId};
use crate::app::App;
use crate::backup::{FilePicker, ImportOutcome};
use crate::cli::picker::{PathPicker, PromptPicker};
use crate::cli::SeasonArgs;
use crate::config::{config_path, load_config, save_config, Config, StorageBackend};
use crate::error::Result;
use crate::store::{
    select_filtered_series, LicensePhase, LicenseState, SearchState, SeriesState,
    ToggleAllWatchedMode, ToggleEpisodeWatched,
};
use crate::tracking::{episode_id, Progress, TrackingSeries};

async fn open_app() -> Result<App> {
    let config = load_config()?;
    App::open(&config).await
}

/// Token cancelled by Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    token
}

/// Print `label` once the store first reports work in flight
fn announce_busy<T>(
    mut rx: watch::Receiver<T>,
    busy: fn(&T) -> bool,
    label: &'static str,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if busy(&rx.borrow_and_update()) {
                eprintln!("{}", label);
                break;
            }
        }
    })
}

fn series_line(series: &Series) -> String {
    let mut line = format!("{:>7}  {}", series.id, series.name);

    if let Some(years) = series.years_display() {
        line.push_str(&format!(" ({})", years));
    }
    line.push_str(&format!(" [{}]", series.status.label()));
    if !series.genres.is_empty() {
        line.push_str(&format!(" {}", series.genres.join(", ")));
    }

    line
}

fn progress_label(progress: Progress) -> String {
    format!(
        "{}/{} ({}%)",
        progress.watched,
        progress.total,
        progress.percent()
    )
}

/// Print the one-time celebration once a finished series is fully watched
fn announce_completion(app: &App, id: SeriesId) {
    if app.series.claim_completion_reward(id) {
        let name = app
            .series
            .state()
            .data
            .series(id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        println!("\nCongratulations! You have watched every episode of {}.", name);
    }
}

/// Handle the search command
pub async fn search(query: String) -> Result<()> {
    let app = open_app().await?;
    let cancel = cancel_on_ctrl_c();
    let busy = announce_busy(
        app.search.subscribe(),
        |s: &SearchState| s.is_loading,
        "Searching...",
    );

    app.search.search(&query, &cancel).await;
    busy.abort();

    let state = app.search.state();
    if let Some(error) = state.error {
        eprintln!("Error: {}", error);
    } else if cancel.is_cancelled() {
        println!("Search cancelled.");
    } else {
        match state.results {
            Some(results) if !results.is_empty() => {
                for result in &results {
                    println!("{}", series_line(&result.show));
                }
            }
            _ => println!("No series found for \"{}\".", query.trim()),
        }
    }

    app.shutdown().await;
    Ok(())
}

/// Start tracking a series
pub async fn track(id: SeriesId) -> Result<()> {
    let app = open_app().await?;
    let cancel = cancel_on_ctrl_c();
    let busy = announce_busy(
        app.series.subscribe(),
        |s: &SeriesState| s.is_loading,
        "Loading...",
    );

    app.series.fetch_series(id, &cancel).await;
    busy.abort();

    let state = app.series.state();
    if let Some(error) = state.error {
        eprintln!("Error: {}", error);
        app.series.clear_error_state();
    } else if let Some(series) = state.data.series(id) {
        app.series.set_active_series_id(id);
        println!("Tracking {}", series_line(series).trim_start());
    } else if cancel.is_cancelled() {
        println!("Cancelled.");
    }

    app.shutdown().await;
    Ok(())
}

/// Re-fetch a tracked series
pub async fn refresh(id: SeriesId) -> Result<()> {
    let app = open_app().await?;

    if !app.series.state().data.is_tracked(id) {
        println!("Series {} is not tracked.", id);
        return Ok(());
    }

    let cancel = cancel_on_ctrl_c();
    let busy = announce_busy(
        app.series.subscribe(),
        |s: &SeriesState| s.is_refreshing,
        "Refreshing...",
    );

    app.series.refresh_series(id, &cancel).await;
    busy.abort();

    let state = app.series.state();
    if let Some(error) = state.error {
        eprintln!("Error: {}", error);
        app.series.clear_error_state();
    } else if cancel.is_cancelled() {
        println!("Cancelled.");
    } else if let Some(tracking) = app.series.tracking(id) {
        println!("{}: {}", tracking.name, progress_label(tracking.progress()));
    }

    app.shutdown().await;
    Ok(())
}

pub async fn remove(id: SeriesId) -> Result<()> {
    let app = open_app().await?;

    let Some(name) = app.series.state().data.series(id).map(|s| s.name.clone()) else {
        println!("Series {} is not tracked.", id);
        return Ok(());
    };

    app.series.remove_series(id);
    println!("Stopped tracking {}.", name);

    app.shutdown().await;
    Ok(())
}

pub async fn select(id: SeriesId) -> Result<()> {
    let app = open_app().await?;

    app.series.set_active_series_id(id);
    match app.series.state().data.active_series() {
        Some(series) if series.id == id => println!("Active series: {}", series.name),
        _ => println!("Series {} is not tracked.", id),
    }

    app.shutdown().await;
    Ok(())
}

/// List tracked series with progress
pub async fn list(filter: Option<String>, favorites: bool) -> Result<()> {
    let app = open_app().await?;
    let data = app.series.state().data;

    let series = select_filtered_series(
        &data.series_data,
        filter.as_deref(),
        favorites,
        &data.favorites_series_map,
    );

    if series.is_empty() {
        if data.series_data.is_empty() {
            println!("No series tracked yet. Try `seenit search <query>`.");
        } else {
            println!("No series match.");
        }
        return Ok(());
    }

    for s in series {
        let active = if data.active_series_id == Some(s.id) { '>' } else { ' ' };
        let favorite = if data.is_favorite(s.id) { '*' } else { ' ' };
        let progress = data
            .tracking_series_data
            .get(&s.id)
            .map(|t| progress_label(t.progress()))
            .unwrap_or_default();

        println!("{}{} {}  {}", active, favorite, series_line(s), progress);
    }

    Ok(())
}

fn print_tracking(tracking: &TrackingSeries) {
    if tracking.seasons.is_none() {
        println!("  No season information available.");
        return;
    }

    for season in tracking.seasons_in_order() {
        println!(
            "\n  Season {} (id {})  {}",
            season.number,
            season.id,
            progress_label(season.progress())
        );

        for episode in season.episodes_in_order() {
            let mark = if episode.is_watched { 'x' } else { ' ' };
            match &episode.timestamp {
                Some(at) => println!("    [{}] E{:02}  {}", mark, episode.number, at),
                None => println!("    [{}] E{:02}", mark, episode.number),
            }
        }
    }
}

/// Show seasons and episodes of a series
pub async fn show(id: Option<SeriesId>) -> Result<()> {
    let app = open_app().await?;
    let data = app.series.state().data;

    let Some(id) = id.or(data.active_series_id) else {
        println!("No active series. Use `seenit select <id>`.");
        return Ok(());
    };

    let (Some(series), Some(tracking)) = (data.series(id), data.tracking_series_data.get(&id))
    else {
        println!("Series {} is not tracked.", id);
        return Ok(());
    };

    println!("{}", series_line(series).trim_start());
    println!("Progress: {}", progress_label(tracking.progress()));
    print_tracking(tracking);

    announce_completion(&app, id);

    app.shutdown().await;
    Ok(())
}

/// Mark a single episode
pub async fn watch(
    series_id: SeriesId,
    season_id: SeasonId,
    number: u32,
    unwatch: bool,
) -> Result<()> {
    let app = open_app().await?;
    let id = episode_id(series_id, season_id, number);

    let exists = app
        .series
        .tracking(series_id)
        .and_then(|t| t.seasons)
        .and_then(|seasons| seasons.get(&season_id).map(|s| s.episodes.contains_key(&id)))
        .unwrap_or(false);

    if !exists {
        println!("Episode {} is not tracked.", id);
        return Ok(());
    }

    app.series.toggle_episode_watched(ToggleEpisodeWatched {
        series_id,
        season_id,
        episode_id: id.clone(),
        is_watched: !unwatch,
    });

    println!(
        "Episode {} marked {}.",
        id,
        if unwatch { "unwatched" } else { "watched" }
    );
    announce_completion(&app, series_id);

    app.shutdown().await;
    Ok(())
}

/// Mark a whole season
pub async fn season(args: SeasonArgs) -> Result<()> {
    let app = open_app().await?;
    let mode = if args.reset {
        ToggleAllWatchedMode::Reset
    } else {
        ToggleAllWatchedMode::Complete
    };

    app.series.toggle_all_watched(args.series, args.season, mode);

    let season = app
        .series
        .tracking(args.series)
        .and_then(|t| t.seasons)
        .and_then(|mut seasons| seasons.remove(&args.season));

    match season {
        Some(season) => {
            println!(
                "Season {}: {}",
                season.number,
                progress_label(season.progress())
            );
            announce_completion(&app, args.series);
        }
        None => println!("Season {} of series {} is not tracked.", args.season, args.series),
    }

    app.shutdown().await;
    Ok(())
}

pub async fn favorite(id: SeriesId) -> Result<()> {
    let app = open_app().await?;

    if !app.series.state().data.is_tracked(id) {
        println!("Series {} is not tracked.", id);
        return Ok(());
    }

    app.series.toggle_favorites(id);
    if app.series.state().data.is_favorite(id) {
        println!("Series {} added to favorites.", id);
    } else {
        println!("Series {} removed from favorites.", id);
    }

    app.shutdown().await;
    Ok(())
}

/// Export tracking data to a backup file
pub async fn export(dir: Option<PathBuf>) -> Result<()> {
    let app = open_app().await?;
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match app.export_backup(&dir).await {
        Ok(Some(path)) => println!("Backup written to {}", path.display()),
        Ok(None) => println!("Nothing to export yet."),
        Err(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}

/// Import tracking data from a backup file
pub async fn import(file: Option<PathBuf>) -> Result<()> {
    let app = open_app().await?;
    let picker: Box<dyn FilePicker> = match file {
        Some(path) => Box::new(PathPicker(path)),
        None => Box::new(PromptPicker),
    };

    match app.import_backup(picker.as_ref()).await {
        Ok(ImportOutcome::Imported) => {
            let data = app.series.state().data;
            println!(
                "Backup imported: {} series tracked.",
                data.series_data.len()
            );
        }
        Ok(ImportOutcome::Cancelled) => println!("Import cancelled."),
        Err(e) => eprintln!("Error: {}", e),
    }

    app.shutdown().await;
    Ok(())
}

pub async fn license_activate(key: String) -> Result<()> {
    let app = open_app().await?;
    let cancel = cancel_on_ctrl_c();

    let busy = announce_busy(
        app.license.subscribe(),
        |s: &LicenseState| s.activation.phase == LicensePhase::InFlight,
        "Activating...",
    );

    app.license.activate_license(key.trim(), &cancel).await;
    busy.abort();

    let activation = app.license.state().activation;
    match (activation.success_message, activation.error_message) {
        (_, Some(error)) => eprintln!("Error: {}", error),
        (Some(message), None) => println!("{}", message),
        (None, None) => println!("Cancelled."),
    }
    app.license.clear_license_activation_state();

    app.shutdown().await;
    Ok(())
}

pub async fn license_check(key: String) -> Result<()> {
    let app = open_app().await?;
    let cancel = cancel_on_ctrl_c();

    let busy = announce_busy(
        app.license.subscribe(),
        |s: &LicenseState| s.check.phase == LicensePhase::InFlight,
        "Checking...",
    );

    app.license.check_license_activation(key.trim(), &cancel).await;
    busy.abort();

    let check = app.license.state().check;
    match (check.success_message, check.error_message) {
        (_, Some(error)) => eprintln!("Error: {}", error),
        (Some(message), None) => println!("{}", message),
        (None, None) => println!("Cancelled."),
    }
    app.license.clear_license_check_state();

    app.shutdown().await;
    Ok(())
}

const CONFIG_KEYS: &str = "storage_backend, storage_dir, metadata_url, license_url, refresh_delay_ms";

fn apply_config_value(config: &mut Config, key: &str, value: &str) -> std::result::Result<(), String> {
    match key {
        "storage_backend" => {
            config.storage.backend = StorageBackend::parse(value)
                .ok_or_else(|| format!("Unknown backend: {} (use bundle or sqlite)", value))?;
        }
        "storage_dir" => {
            config.storage.dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "metadata_url" => config.api.metadata_url = value.to_string(),
        "license_url" => config.api.license_url = value.to_string(),
        "refresh_delay_ms" => {
            config.ui.refresh_delay_ms = value
                .parse()
                .map_err(|_| format!("Not a number of milliseconds: {}", value))?;
        }
        _ => return Err(format!("Unknown key: {}", key)),
    }

    Ok(())
}

/// Handle the config command
pub async fn config(show: bool, set: Option<String>, reset: bool) -> Result<()> {
    if reset {
        if config_path().exists() {
            std::fs::remove_file(config_path())?;
            println!("Configuration reset to defaults.");
        } else {
            println!("No configuration file found.");
        }
        return Ok(());
    }

    if let Some(key_value) = set {
        let Some((key, value)) = key_value.split_once('=') else {
            println!("Invalid format. Use: --set key=value");
            println!("Available keys: {}", CONFIG_KEYS);
            return Ok(());
        };

        let mut config = load_config().unwrap_or_default();
        if let Err(message) = apply_config_value(&mut config, key.trim(), value.trim()) {
            println!("{}", message);
            println!("Available keys: {}", CONFIG_KEYS);
            return Ok(());
        }

        save_config(&config)?;
        println!("Configuration updated.");
        return Ok(());
    }

    if show {
        match load_config() {
            Ok(config) => {
                println!("Configuration file: {}\n", config_path().display());
                println!("[storage]");
                println!("backend = \"{}\"", config.storage.backend.label());
                println!("dir = \"{}\"", config.storage.data_dir().display());
                println!("\n[api]");
                println!("metadata_url = \"{}\"", config.api.metadata_url);
                println!("license_url = \"{}\"", config.api.license_url);
                println!("\n[ui]");
                println!("refresh_delay_ms = {}", config.ui.refresh_delay_ms);
                println!("fetch_delay_ms = {}", config.ui.fetch_delay_ms);
            }
            Err(e) => {
                println!("Error: {}", e);
            }
        }
        return Ok(());
    }

    // Default: show help
    println!("Usage: seenit config [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --show         Show current configuration");
    println!("  --set KEY=VAL  Set a configuration value");
    println!("  --reset        Reset configuration to defaults");
    println!();
    println!("Available keys for --set:");
    println!("  storage_backend   bundle (default) or sqlite");
    println!("  storage_dir       Data directory (empty for the default)");
    println!("  metadata_url      Series metadata API");
    println!("  license_url       License server");
    println!("  refresh_delay_ms  Minimum refresh duration (default: 1700)");

    Ok(())
}
