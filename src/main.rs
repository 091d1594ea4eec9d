use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime};
use clap::{Parser, Subcommand};
use hoos_open::{
    Building, Clock, CommentPolicy, DirectoryApiClient, DirectoryQuery, Favorites,
    FileDocumentStore, FileKeyValueStore, StatusFilter, SystemClock, WeeklyHours,
    config::AppConfig, filter_buildings, hours::weekday_name, import_buildings, list_comments,
    load_building, load_buildings, post_comment, weekly_schedule,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "hoos-open")]
#[command(about = "Campus building directory with live open/closed status")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List buildings with their current status
    List {
        /// Only buildings whose name contains this text
        #[arg(long, default_value = "")]
        search: String,
        /// all, open or closed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only favorite buildings
        #[arg(long)]
        favorites: bool,
    },
    /// Show a building's details, weekly hours and comments
    Show { id: String },
    /// Add or remove a building (by name) from favorites
    Favorite { name: String },
    /// Post a comment on a building
    Comment {
        id: String,
        text: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Load a JSON array of buildings into the local store
    Import { file: PathBuf },
    /// Evaluate an hours table, e.g. '{"M-F": "8am - 6pm"}'
    Check {
        hours: String,
        /// Local time to evaluate at (YYYY-MM-DDTHH:MM), defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

/// Where building records come from.
enum Source {
    Store,
    Api(DirectoryApiClient),
}

struct App {
    config: AppConfig,
    clock: SystemClock,
    documents: FileDocumentStore,
    device: FileKeyValueStore,
    source: Source,
    rt: tokio::runtime::Runtime,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let clock = SystemClock::new(config.campus.tz()?);
        let data_dir = &config.storage.data_dir;
        let documents = FileDocumentStore::new(data_dir.join("documents"));
        let device = FileKeyValueStore::new(data_dir.join("device.json"));

        let source = match &config.directory.api_url {
            Some(url) => Source::Api(DirectoryApiClient::new(url.clone(), &config.network)?),
            None => Source::Store,
        };

        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

        Ok(Self {
            config,
            clock,
            documents,
            device,
            source,
            rt,
        })
    }

    fn buildings(&self) -> Result<Vec<Building>> {
        match &self.source {
            Source::Store => load_buildings(&self.documents),
            Source::Api(client) => {
                let mut buildings = self.rt.block_on(client.fetch_buildings())?;
                buildings.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(buildings)
            }
        }
    }

    fn building(&self, id: &str) -> Result<Option<Building>> {
        match &self.source {
            Source::Store => load_building(&self.documents, id),
            Source::Api(client) => self.rt.block_on(client.fetch_building(id)),
        }
    }

    fn favorites(&self) -> Result<Favorites> {
        Favorites::load(&self.device, &self.config.favorites.storage_key)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "hoos_open=debug".to_string());
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(directives);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::debug!(data_dir = %config.storage.data_dir.display(), "Configuration loaded");
    let app = App::new(config)?;

    match args.command {
        Command::List {
            search,
            status,
            favorites,
        } => run_list(&app, search, status, favorites),
        Command::Show { id } => run_show(&app, &id),
        Command::Favorite { name } => {
            let mut favorites = app.favorites()?;
            let added = favorites.toggle(&app.device, &app.config.favorites.storage_key, &name)?;
            println!(
                "{} {}",
                if added { "♥ Added" } else { "♡ Removed" },
                name
            );
            Ok(())
        }
        Command::Comment { id, text, user } => {
            if app.building(&id)?.is_none() {
                anyhow::bail!("No building with id {id}");
            }
            let policy = CommentPolicy::from(&app.config.comments);
            post_comment(&app.documents, &app.clock, &policy, &id, user.as_deref(), &text)?;
            println!("Comment posted");
            Ok(())
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let buildings: Vec<Building> =
                serde_json::from_str(&raw).context("Import file is not a JSON array of buildings")?;
            let count = import_buildings(&app.documents, &buildings)?;
            tracing::info!(count, "Imported buildings");
            println!("Imported {count} buildings");
            Ok(())
        }
        Command::Check { hours, at } => run_check(&app, &hours, at.as_deref()),
    }
}

fn run_list(app: &App, search: String, status: StatusFilter, favorites_only: bool) -> Result<()> {
    let buildings = app.buildings()?;
    let favorites = app.favorites()?;
    let now = app.clock.now_local();
    let query = DirectoryQuery {
        search,
        status,
        favorites_only,
    };

    let listings = filter_buildings(&buildings, &query, &favorites, &now);
    if listings.is_empty() {
        println!("No buildings match.");
        return Ok(());
    }

    for listing in listings {
        let b = listing.building;
        println!(
            "{} {} [{}] {}  {}",
            if listing.favorite { "♥" } else { "♡" },
            b.kind.emoji(),
            b.id,
            b.name,
            if listing.open { "Open" } else { "Closed" },
        );
        println!("    🕒 Today: {}", listing.today);
        if !b.tags.is_empty() {
            println!("    {}", b.tags.join(" · "));
        }
    }
    Ok(())
}

fn run_show(app: &App, id: &str) -> Result<()> {
    let Some(b) = app.building(id)? else {
        anyhow::bail!("No building with id {id}");
    };
    let now = app.clock.now_local();

    println!(
        "{} {} ({})",
        b.kind.emoji(),
        b.name,
        if b.is_open_at(&now) { "Open Now" } else { "Closed" }
    );
    println!("{} · {}", b.kind, b.address);
    if !b.description.is_empty() {
        println!("\n{}", b.description);
    }

    println!("\nHours:");
    let today = now.weekday();
    for (day, label) in weekly_schedule(&b.hours) {
        let marker = if day == weekday_name(today) { "›" } else { " " };
        println!("  {marker} {day:<10} {label}");
    }

    println!("\nMap: {}", b.maps_url());
    if !b.tags.is_empty() {
        println!("Tags: {}", b.tags.join(", "));
    }

    let comments = list_comments(&app.documents, &b.id)?;
    println!("\nComments ({}):", comments.len());
    for c in comments {
        println!(
            "  {} · {}\n    {}",
            c.user,
            c.timestamp.format("%Y-%m-%d %H:%M"),
            c.text
        );
    }
    Ok(())
}

fn run_check(app: &App, hours: &str, at: Option<&str>) -> Result<()> {
    let hours: WeeklyHours =
        serde_json::from_str(hours).context("Hours must be a JSON object of day -> range")?;
    let at = match at {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .with_context(|| format!("Invalid time {s:?}, expected YYYY-MM-DDTHH:MM"))?,
        None => app.clock.now_local(),
    };

    let day = at.weekday();
    match hours.resolve(day) {
        Some((key, range)) => println!("{} → {key}: {range}", at.format("%A %H:%M")),
        None => println!("{} → no entry", at.format("%A %H:%M")),
    }
    match hours.window_for(day) {
        Ok(window) => println!("Window: {window}"),
        Err(reason) => println!("Closed: {reason}"),
    }
    println!("{}", if hours.is_open(&at) { "Open" } else { "Closed" });
    Ok(())
}
