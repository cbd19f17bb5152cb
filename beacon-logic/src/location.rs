use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::prelude::*;

/// Some point in the world as gotten from a geolocation API or geocoder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// How the current location was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocationSource {
    /// The device's own geolocation capability
    DeviceGeolocation,
    /// Free-text address resolved through the geocoder
    AddressLookup,
    /// Handed in by the embedding view
    External,
}

/// The panel's resolved location. Exactly one of these is current per
/// panel instance; replacing it replaces the map marker with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub point: LatLng,
    pub source: LocationSource,
}

pub trait LocationService: Send + Sync {
    /// Ask the device for its current position. Failures cover permission
    /// denial, timeouts, and missing hardware alike; the panel never
    /// retries on its own.
    fn current_position(&self) -> impl Future<Output = Result<LatLng>> + Send;
}

/// The one coordinate pair shared between the panel and its parent view.
///
/// The panel owns the sender half, so there is exactly one writer by
/// construction; statistic widgets and hazard views hold
/// [`SharedLocationReader`]s. Starts unset, never persisted.
pub struct SharedLocation {
    tx: watch::Sender<Option<LatLng>>,
}

impl SharedLocation {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
        }
    }

    pub fn set(&self, point: LatLng) {
        self.tx.send_replace(Some(point));
    }

    pub fn get(&self) -> Option<LatLng> {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> SharedLocationReader {
        SharedLocationReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SharedLocation {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of [`SharedLocation`]. Cheap to clone.
#[derive(Clone)]
pub struct SharedLocationReader {
    rx: watch::Receiver<Option<LatLng>>,
}

impl SharedLocationReader {
    pub fn get(&self) -> Option<LatLng> {
        *self.rx.borrow()
    }

    /// Wait until the location changes. Returns `false` once the writer
    /// is gone and no further updates can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT: LatLng = LatLng {
        lat: 37.77,
        lng: -122.42,
    };

    #[test]
    fn starts_unset() {
        let shared = SharedLocation::new();
        assert_eq!(shared.get(), None);
        assert_eq!(shared.subscribe().get(), None);
    }

    #[tokio::test]
    async fn readers_observe_the_single_writer() {
        let shared = SharedLocation::new();
        let mut reader = shared.subscribe();

        shared.set(POINT);

        assert!(reader.changed().await);
        assert_eq!(reader.get(), Some(POINT));
        assert_eq!(shared.get(), Some(POINT));
    }

    #[tokio::test]
    async fn changed_resolves_false_after_writer_drop() {
        let shared = SharedLocation::new();
        let mut reader = shared.subscribe();
        drop(shared);
        assert!(!reader.changed().await);
    }
}
