mod store;
mod surface;

use std::sync::Arc;

use beacon_gateways::{AdvisoryApiClient, GoogleMapsGateway, PoiApiClient};
use beacon_logic::{
    HazardKind, HazardSnapshot, HazardView, MapPanel, PanelResult, PanelUiState, PoiCategory,
    ProfileStore, RouteUi, prelude::*,
};
use clap::Parser;
use env_logger::{Builder, Env};
use tokio::io::{AsyncBufReadExt, BufReader};

use store::JsonFileStore;
use surface::{ConsoleSurface, EnvLocation, LogSender};

/// Interactive driver for the beacon map panel
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Hazard dashboard to open (earthquake, hurricane, tsunami,
    /// wildfire, nuclear-event)
    #[arg(long, default_value = "earthquake")]
    hazard: String,

    /// Facility category to search, defaults to the hazard's own
    #[arg(long)]
    category: Option<String>,

    /// Resolve this address on startup instead of asking the device
    #[arg(long)]
    address: Option<String>,

    /// Where the user profile is persisted
    #[arg(long, default_value = "beacon_profile.json")]
    profile_path: String,
}

fn init_logging() {
    let default = "info";
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}

type Panel = MapPanel<EnvLocation, GoogleMapsGateway, PoiApiClient, ConsoleSurface, LogSender>;

fn print_help() {
    println!("Commands:");
    println!("  locate              resolve the device position");
    println!("  search <address>    resolve a free-text address");
    println!("  category <tag>      switch the facility category");
    println!("  list                show the current result list");
    println!("  select <row>        directions to a result");
    println!("  back                drop the route, return to the list");
    println!("  stats               hazard statistic cards");
    println!("  advice              disaster-response guidance");
    println!("  profile [field val] show or update the user profile");
    println!("  quit                exit");
}

fn render_list(ui: &PanelUiState) {
    if matches!(ui.route, RouteUi::Rendered(_)) {
        // The route detail panel owns the display slot.
        return;
    }
    if ui.items.is_empty() {
        return;
    }
    println!("{}:", ui.category.info().title);
    for (i, item) in ui.items.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, item.name, item.address);
        println!(
            "     distance: {}  rating: {}",
            item.distance_display(),
            item.rating_display()
        );
    }
    println!("Use `select <row>` for directions.");
}

fn render_snapshot(hazard: HazardKind, snapshot: &HazardSnapshot) {
    println!("[{}]", hazard.tag());
    println!("  nearby facilities: {}", snapshot.nearby_count);
    println!("  nearest distance:  {}", snapshot.nearest_distance);
    println!("  top rating:        {}", snapshot.top_rating);
    println!("  risk level:        {}", snapshot.risk_level);
}

async fn report(result: PanelResult<()>, panel: &Panel) {
    match result {
        // A successful selection already printed its route detail.
        Ok(()) => render_list(&panel.ui_state().await),
        Err(why) => println!("{why}"),
    }
}

fn handle_profile(store: &JsonFileStore, rest: &str) {
    let mut profile = match store.load() {
        Ok(profile) => profile.unwrap_or_default(),
        Err(why) => {
            println!("Could not read profile: {why}");
            return;
        }
    };

    let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
    match field.trim() {
        "" | "show" => {
            let not_set = "N/A".to_string();
            println!("name:            {}", profile.name);
            println!(
                "age:             {}",
                profile.age.map(|a| a.to_string()).unwrap_or(not_set.clone())
            );
            println!("medical history: {}", profile.medical_history);
            println!(
                "risk score:      {}",
                profile.risk_score.map(|s| s.to_string()).unwrap_or(not_set)
            );
            return;
        }
        "name" => profile.name = value.to_string(),
        "history" => profile.medical_history = value.to_string(),
        "age" => match value.trim().parse() {
            Ok(age) => profile.age = Some(age),
            Err(_) => {
                println!("Age must be a number");
                return;
            }
        },
        "risk" => match value.trim().parse() {
            Ok(score) => profile.risk_score = Some(score),
            Err(_) => {
                println!("Risk score must be a number");
                return;
            }
        },
        other => {
            println!("Unknown profile field: {other}");
            return;
        }
    }

    if let Err(why) = store.save(&profile) {
        println!("Could not save profile: {why}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let hazard = HazardKind::from_tag(&cli.hazard)
        .ok_or_else(|| anyhow::anyhow!("Unknown hazard: {}", cli.hazard))?;
    let category = match &cli.category {
        Some(tag) => PoiCategory::from_tag(tag)
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {tag}"))?,
        None => hazard.default_category(),
    };

    let maps = GoogleMapsGateway::from_env()?;
    let panel = Arc::new(Panel::new(
        category,
        EnvLocation,
        maps,
        PoiApiClient::new(),
        ConsoleSurface,
        LogSender,
    ));
    let view = HazardView::new(hazard, AdvisoryApiClient::new(), panel.subscribe_location());
    let store = JsonFileStore::new(&cli.profile_path);

    if let Ok(Some(profile)) = store.load() {
        if !profile.name.is_empty() {
            println!("Welcome back, {}.", profile.name);
        }
    }

    // First resolution: an explicit address wins, otherwise ask the
    // device and fall back to prompting for one.
    let resolved = match &cli.address {
        Some(address) => panel.locate_by_address(address).await,
        None => panel.locate_by_device().await,
    };
    match resolved {
        Ok(_) => render_list(&panel.ui_state().await),
        Err(why) => {
            println!("Could not resolve a location: {why}");
            println!("Use `search <address>` to set one manually.");
        }
    }

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "locate" => report(panel.locate_by_device().await.map(|_| ()), &panel).await,
            "search" => report(panel.locate_by_address(rest).await.map(|_| ()), &panel).await,
            "category" => report(panel.set_category_tag(rest.trim()).await, &panel).await,
            "list" => render_list(&panel.ui_state().await),
            "select" => match rest.trim().parse::<usize>() {
                Ok(row) if row >= 1 => report(panel.select(row - 1).await, &panel).await,
                _ => println!("Usage: select <row number>"),
            },
            "back" => {
                panel.clear_route().await;
                render_list(&panel.ui_state().await);
            }
            "stats" => {
                let ui = panel.ui_state().await;
                render_snapshot(hazard, &view.snapshot(&ui.items).await);
            }
            "advice" => match view.guidance().await {
                Some(text) => println!("{text}"),
                None => println!("No guidance available."),
            },
            "profile" => handle_profile(&store, rest),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {other} (try `help`)"),
        }
    }

    panel.close().await;
    Ok(())
}
