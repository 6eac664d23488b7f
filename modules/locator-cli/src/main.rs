use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use locator_common::config::DistanceOption;
use locator_common::{load_settings, AmenityId, GeocodingEnv, MapSettings};
use locator_engine::{
    FinderView, MemoryView, PageData, ReadyPolicy, Registry, RenderCoordinator, SearchState, UrlState,
    VisibleLocation,
};
use locator_map::{build_geocoder, build_provider, LibraryHandle, MapScene};

#[derive(Parser)]
#[command(name = "locator")]
#[command(about = "Filter a location set the way the finder widget does and print the result")]
#[command(version)]
struct Cli {
    /// Page data: locations plus per-location amenity lists (JSON)
    #[arg(long)]
    locations: PathBuf,

    /// Widget settings (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address the page was loaded with
    #[arg(long, default_value = "/locations")]
    url: String,

    /// Replace the tag filter
    #[arg(long, value_delimiter = ',')]
    tags: Option<Vec<String>>,

    /// Replace the amenity filter
    #[arg(long, value_delimiter = ',')]
    amenities: Option<Vec<String>>,

    /// Submit a location search
    #[arg(long)]
    search: Option<String>,

    /// Pick a distance option by index (0 clears the limit, 1.. are the steps)
    #[arg(long)]
    distance: Option<usize>,

    /// Pick an autocomplete suggestion by exact location name
    #[arg(long)]
    select: Option<String>,

    /// Print autocomplete suggestions for a term
    #[arg(long)]
    suggest: Option<String>,

    /// Include the rendered map scene in the report
    #[arg(long)]
    scene: bool,
}

#[derive(Serialize)]
struct Report<'a, V: Serialize> {
    url: &'a str,
    visible: &'a [VisibleLocation],
    distance_options: Vec<DistanceOption>,
    distance_control: Option<f64>,
    search: &'a SearchState,
    view: &'a V,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<MapScene>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("locator=info".parse()?))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => MapSettings::default(),
    };
    let registry = Registry::load(load_page_data(&cli.locations)?);
    info!(locations = registry.len(), engine = ?settings.engine, "Page data loaded");

    let env = GeocodingEnv::from_env();
    let geocoder = build_geocoder(&settings, &env)?;
    // Headless: the SDK library has nothing left to load.
    let map = build_provider(&settings, geocoder, LibraryHandle::loaded())?;

    let mut finder = RenderCoordinator::start(
        settings,
        registry,
        map,
        MemoryView::default(),
        UrlState::parse(&cli.url),
        ReadyPolicy::default(),
    )
    .await?;

    finder.run_initial_search().await;
    apply_actions(&mut finder, &cli).await?;

    let suggestions = cli.suggest.as_deref().map(|term| finder.suggestions(term));
    let report = Report {
        url: finder.current_url(),
        visible: &finder.last_result().visible,
        distance_options: finder.settings().distance_options(),
        distance_control: finder.distance_control(),
        search: finder.search_state(),
        view: finder.view(),
        suggestions,
        scene: cli.scene.then(|| finder.map().scene()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_page_data(path: &Path) -> Result<PageData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page data: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse page data: {}", path.display()))
}

async fn apply_actions<V: FinderView>(finder: &mut RenderCoordinator<V>, cli: &Cli) -> Result<()> {
    if let Some(tags) = &cli.tags {
        finder.set_tags_filter(tags.clone());
    }
    if let Some(raw) = &cli.amenities {
        finder.set_amenities_filter(raw.iter().map(|id| AmenityId::coerce(id)).collect());
    }
    if let Some(query) = &cli.search {
        if !finder.submit_search(query).await {
            info!(query = query.as_str(), "Search did not recenter the map");
        }
    }
    if let Some(index) = cli.distance {
        let miles = match index {
            0 => None,
            n => match finder.settings().distance_options().get(n - 1) {
                Some(option) => Some(option.value),
                None => bail!("distance option {n} does not exist"),
            },
        };
        finder.set_distance_limit(miles);
    }
    if let Some(name) = &cli.select {
        let matches = finder.select_suggestion(name);
        info!(name = name.as_str(), matches, "Suggestion selected");
    }
    Ok(())
}
