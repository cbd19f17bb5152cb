use beacon_logic::{LatLng, LocationService, MapSurface, RoutePlan, StateUpdateSender, prelude::*};

/// Renders map operations as console output, standing in for the map
/// widget the dashboard embeds.
pub struct ConsoleSurface;

impl MapSurface for ConsoleSurface {
    type Marker = LatLng;
    type RouteOverlay = String;

    fn center(&self, at: LatLng, zoom: u8) {
        println!("[map] centered at ({:.4}, {:.4}), zoom {zoom}", at.lat, at.lng);
    }

    fn place_marker(&self, at: LatLng, title: &str) -> LatLng {
        println!("[map] marker \"{title}\" at ({:.4}, {:.4})", at.lat, at.lng);
        at
    }

    fn remove_marker(&self, at: LatLng) {
        println!("[map] marker at ({:.4}, {:.4}) removed", at.lat, at.lng);
    }

    fn show_route(&self, plan: &RoutePlan) -> String {
        println!(
            "[map] route to {} ({}, {})",
            plan.destination, plan.summary.distance, plan.summary.duration
        );
        for (i, step) in plan.steps.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, step.instruction, step.distance);
        }
        println!("Use `back` to return to the list.");
        plan.destination.clone()
    }

    fn clear_route(&self, destination: String) {
        println!("[map] route to {destination} cleared");
    }
}

/// Device position from the environment, for headless runs.
pub struct EnvLocation;

impl LocationService for EnvLocation {
    async fn current_position(&self) -> Result<LatLng> {
        let lat = std::env::var("BEACON_DEVICE_LAT")
            .context("BEACON_DEVICE_LAT is not set")?
            .parse()
            .context("BEACON_DEVICE_LAT is not a number")?;
        let lng = std::env::var("BEACON_DEVICE_LNG")
            .context("BEACON_DEVICE_LNG is not set")?
            .parse()
            .context("BEACON_DEVICE_LNG is not a number")?;
        Ok(LatLng { lat, lng })
    }
}

pub struct LogSender;

impl StateUpdateSender for LogSender {
    fn send_update(&self) {
        log::trace!("panel state updated");
    }
}
