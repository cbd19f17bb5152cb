use std::{
    mem,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use crate::{
    category::PoiCategory,
    error::{PanelError, PanelResult},
    location::{LatLng, Location, LocationService, LocationSource, SharedLocation, SharedLocationReader},
    maps::{GeocodeOutcome, MapsProvider, RoutePlan, TravelMode},
    poi::{self, PoiBackend, PoiItem, PoiRequest},
    surface::MapSurface,
};

/// Where the map opens before anything is resolved.
const INITIAL_CENTER: LatLng = LatLng {
    lat: 37.7749,
    lng: -122.4194,
};
const INITIAL_ZOOM: u8 = 10;

/// Zoom applied when a locate/search succeeds.
const LOCATE_ZOOM: u8 = 14;

const MARKER_TITLE: &str = "You are here!";

/// Ceiling on every capability call. The panel imposes this itself since
/// none of the external services are trusted to.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub trait StateUpdateSender {
    fn send_update(&self);
}

/// Route lifecycle. The failure edge out of `Routing` goes back to
/// `NoRoute`, which is what makes the selection list reappear.
enum RouteState<O> {
    NoRoute,
    Routing { token: u64 },
    Rendered { overlay: O, plan: RoutePlan },
}

/// What the host renders. While `route` is [`RouteUi::Rendered`] the host
/// shows the route detail panel instead of the selection list; `items`
/// stays intact underneath so the list comes back unchanged when the
/// route is cleared or fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelUiState {
    pub location: Option<Location>,
    pub category: PoiCategory,
    pub items: Vec<PoiItem>,
    pub route: RouteUi,
    /// Set when device geolocation failed; the host should offer manual
    /// address entry.
    pub prompt_for_address: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RouteUi {
    None,
    Pending,
    Rendered(RoutePlan),
}

struct PanelState<M: MapSurface> {
    location: Option<Location>,
    marker: Option<M::Marker>,
    category: PoiCategory,
    items: Vec<PoiItem>,
    route: RouteState<M::RouteOverlay>,
    prompt_for_address: bool,
    last_error: Option<String>,
}

/// Outcome of a capability call raced against the panel's own limits.
enum Guarded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// The location/POI panel orchestrator.
///
/// Owns the single map marker and single route overlay, the shared
/// location context, and the request tokens that keep out-of-order
/// completions from ever being displayed. Generic over the host's
/// capability implementations, mirroring how hosts differ (webview,
/// console, tests).
pub struct MapPanel<
    L: LocationService,
    G: MapsProvider,
    P: PoiBackend,
    M: MapSurface,
    S: StateUpdateSender,
> {
    location_service: L,
    maps: G,
    backend: P,
    surface: M,
    updates: S,
    shared: SharedLocation,
    state: RwLock<PanelState<M>>,
    fetch_seq: AtomicU64,
    route_seq: AtomicU64,
    cancel: CancellationToken,
}

impl<L, G, P, M, S> MapPanel<L, G, P, M, S>
where
    L: LocationService,
    G: MapsProvider,
    P: PoiBackend,
    M: MapSurface,
    S: StateUpdateSender,
{
    pub fn new(
        category: PoiCategory,
        location_service: L,
        maps: G,
        backend: P,
        surface: M,
        updates: S,
    ) -> Self {
        surface.center(INITIAL_CENTER, INITIAL_ZOOM);

        Self {
            location_service,
            maps,
            backend,
            surface,
            updates,
            shared: SharedLocation::new(),
            state: RwLock::new(PanelState {
                location: None,
                marker: None,
                category,
                items: Vec::new(),
                route: RouteState::NoRoute,
                prompt_for_address: false,
                last_error: None,
            }),
            fetch_seq: AtomicU64::new(0),
            route_seq: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Current value of the shared location context.
    pub fn shared_location(&self) -> Option<LatLng> {
        self.shared.get()
    }

    /// Read-only subscription for statistic widgets and hazard views.
    pub fn subscribe_location(&self) -> SharedLocationReader {
        self.shared.subscribe()
    }

    /// Resolve the device's position and make it the panel's location.
    ///
    /// On failure the manual-address prompt flag is raised and nothing
    /// else changes; there is no automatic retry.
    pub async fn locate_by_device(&self) -> PanelResult<Location> {
        match self.guarded(self.location_service.current_position()).await {
            Guarded::Done(Ok(point)) => {
                let location = self
                    .apply_location(point, LocationSource::DeviceGeolocation)
                    .await;
                // A fetch failure here is already reflected as the
                // explicit empty-list state; the locate itself succeeded.
                let _ = self.refresh_pois().await;
                Ok(location)
            }
            Guarded::Done(Err(why)) => self.fail_locate(why.to_string()).await,
            Guarded::TimedOut => self.fail_locate("device location timed out".into()).await,
            Guarded::Cancelled => self.fail_locate("panel closed".into()).await,
        }
    }

    /// Resolve a free-text address and make it the panel's location.
    ///
    /// Empty input never reaches the geocoder. On geocode failure the
    /// previous location, marker, and list are left untouched.
    pub async fn locate_by_address(&self, text: &str) -> PanelResult<Location> {
        let query = text.trim();
        if query.is_empty() {
            return Err(PanelError::InvalidInput("address is empty".into()));
        }

        match self.guarded(self.maps.geocode(query)).await {
            Guarded::Done(Ok(GeocodeOutcome::Found(point))) => {
                let location = self.apply_location(point, LocationSource::AddressLookup).await;
                let _ = self.refresh_pois().await;
                Ok(location)
            }
            Guarded::Done(Ok(GeocodeOutcome::NoMatch)) => {
                self.fail_geocode(format!("no match for \"{query}\"")).await
            }
            Guarded::Done(Err(why)) => self.fail_geocode(why.to_string()).await,
            Guarded::TimedOut => self.fail_geocode("geocoder timed out".into()).await,
            Guarded::Cancelled => self.fail_geocode("panel closed".into()).await,
        }
    }

    /// Adopt a coordinate the embedding view already resolved.
    pub async fn locate_external(&self, point: LatLng) -> PanelResult<Location> {
        let location = self.apply_location(point, LocationSource::External).await;
        let _ = self.refresh_pois().await;
        Ok(location)
    }

    /// Switch the active category and fetch it for the current location.
    pub async fn set_category(&self, category: PoiCategory) -> PanelResult<()> {
        {
            let mut state = self.state.write().await;
            if state.category != category {
                state.category = category;
                // The old category's rows must never show under the new
                // heading, not even while the fetch is in flight.
                state.items.clear();
            }
        }
        self.refresh_pois().await
    }

    /// [`Self::set_category`] from a user-supplied tag string.
    pub async fn set_category_tag(&self, tag: &str) -> PanelResult<()> {
        let category =
            PoiCategory::from_tag(tag).ok_or_else(|| PanelError::UnknownCategory(tag.into()))?;
        self.set_category(category).await
    }

    /// Fetch the active category at the current location.
    ///
    /// No-op without a resolved location. Token-guarded: only the most
    /// recently initiated fetch may write the list, and a response for a
    /// category the panel has left is dropped inert.
    pub async fn refresh_pois(&self) -> PanelResult<()> {
        let (category, at) = {
            let state = self.state.read().await;
            match state.location {
                Some(location) => (state.category, location.point),
                None => return Ok(()),
            }
        };

        let token = self.fetch_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let req = PoiRequest::new(category, at);

        let outcome = self.guarded(self.backend.fetch(req)).await;

        let mut state = self.state.write().await;
        if self.fetch_seq.load(Ordering::Relaxed) != token {
            // A newer fetch owns the list now; this response is stale.
            return Ok(());
        }
        if state.category != req.category {
            return Ok(());
        }

        match outcome {
            Guarded::Done(Ok(body)) => match poi::normalize(category, &body) {
                Ok(items) => {
                    state.items = items;
                    state.last_error = None;
                    drop(state);
                    self.updates.send_update();
                    Ok(())
                }
                Err(err) => self.fail_fetch(state, err.to_string()),
            },
            Guarded::Done(Err(why)) => self.fail_fetch(state, why.to_string()),
            Guarded::TimedOut => self.fail_fetch(state, "facility backend timed out".into()),
            Guarded::Cancelled => Ok(()),
        }
    }

    /// Route from the current location to the list item at `index`.
    ///
    /// Tears the previous route down unconditionally before the new
    /// request goes out; on provider failure the panel returns to
    /// `NoRoute` and the untouched selection list shows again.
    pub async fn select(&self, index: usize) -> PanelResult<()> {
        let (origin, destination, token) = {
            let mut state = self.state.write().await;
            let Some(origin) = state.location else {
                return Err(PanelError::InvalidInput("no resolved location".into()));
            };
            let Some(item) = state.items.get(index) else {
                return Err(PanelError::InvalidInput(format!("no result #{index}")));
            };
            let destination = item.address.clone();

            if let RouteState::Rendered { overlay, .. } =
                mem::replace(&mut state.route, RouteState::NoRoute)
            {
                self.surface.clear_route(overlay);
            }
            let token = self.route_seq.fetch_add(1, Ordering::Relaxed) + 1;
            state.route = RouteState::Routing { token };
            (origin, destination, token)
        };
        self.updates.send_update();

        let outcome = self
            .guarded(self.maps.route(origin.point, &destination, TravelMode::Driving))
            .await;

        let mut state = self.state.write().await;
        if self.route_seq.load(Ordering::Relaxed) != token {
            // Superseded by a newer selection; that request owns the
            // overlay slot now.
            return Ok(());
        }

        match outcome {
            Guarded::Done(Ok(plan)) => {
                let overlay = self.surface.show_route(&plan);
                state.route = RouteState::Rendered { overlay, plan };
                state.last_error = None;
                drop(state);
                self.updates.send_update();
                Ok(())
            }
            Guarded::Done(Err(why)) => self.fail_route(state, why.to_string()),
            Guarded::TimedOut => self.fail_route(state, "directions timed out".into()),
            Guarded::Cancelled => Ok(()),
        }
    }

    /// Drop any rendered or in-flight route and return to browsing.
    pub async fn clear_route(&self) {
        let mut state = self.state.write().await;
        // Invalidate an in-flight directions request as well.
        self.route_seq.fetch_add(1, Ordering::Relaxed);
        if let RouteState::Rendered { overlay, .. } =
            mem::replace(&mut state.route, RouteState::NoRoute)
        {
            self.surface.clear_route(overlay);
        }
        drop(state);
        self.updates.send_update();
    }

    /// Snapshot for the host to render.
    pub async fn ui_state(&self) -> PanelUiState {
        let state = self.state.read().await;
        PanelUiState {
            location: state.location,
            category: state.category,
            items: state.items.clone(),
            route: match &state.route {
                RouteState::NoRoute => RouteUi::None,
                RouteState::Routing { .. } => RouteUi::Pending,
                RouteState::Rendered { plan, .. } => RouteUi::Rendered(plan.clone()),
            },
            prompt_for_address: state.prompt_for_address,
            last_error: state.last_error.clone(),
        }
    }

    /// Release the marker and overlay and make in-flight completions
    /// inert. The panel is unusable afterwards.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut state = self.state.write().await;
        if let Some(marker) = state.marker.take() {
            self.surface.remove_marker(marker);
        }
        if let RouteState::Rendered { overlay, .. } =
            mem::replace(&mut state.route, RouteState::NoRoute)
        {
            self.surface.clear_route(overlay);
        }
    }

    /// Make `point` the panel's one current location: shared context
    /// first, then marker replacement (old out before new in), then
    /// recenter. All of it happens under one lock so no intermediate
    /// state is ever visible.
    async fn apply_location(&self, point: LatLng, source: LocationSource) -> Location {
        let location = Location { point, source };
        let mut state = self.state.write().await;
        self.shared.set(point);
        if let Some(old) = state.marker.take() {
            self.surface.remove_marker(old);
        }
        state.marker = Some(self.surface.place_marker(point, MARKER_TITLE));
        self.surface.center(point, LOCATE_ZOOM);
        state.location = Some(location);
        state.prompt_for_address = false;
        state.last_error = None;
        drop(state);
        self.updates.send_update();
        location
    }

    async fn fail_locate(&self, why: String) -> PanelResult<Location> {
        let mut state = self.state.write().await;
        state.prompt_for_address = true;
        state.last_error = Some(why.clone());
        drop(state);
        self.updates.send_update();
        Err(PanelError::LocationUnavailable(why))
    }

    async fn fail_geocode(&self, why: String) -> PanelResult<Location> {
        let mut state = self.state.write().await;
        state.last_error = Some(why.clone());
        drop(state);
        self.updates.send_update();
        Err(PanelError::GeocodeFailed(why))
    }

    fn fail_fetch(
        &self,
        mut state: RwLockWriteGuard<'_, PanelState<M>>,
        why: String,
    ) -> PanelResult<()> {
        // Explicit no-data state; stale rows from an earlier fetch must
        // not survive a failure.
        state.items.clear();
        state.last_error = Some(why.clone());
        drop(state);
        self.updates.send_update();
        Err(PanelError::FetchFailed(why))
    }

    fn fail_route(
        &self,
        mut state: RwLockWriteGuard<'_, PanelState<M>>,
        why: String,
    ) -> PanelResult<()> {
        state.route = RouteState::NoRoute;
        state.last_error = Some(why.clone());
        drop(state);
        self.updates.send_update();
        Err(PanelError::RouteUnavailable(why))
    }

    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> Guarded<T> {
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Guarded::Cancelled,

            res = tokio::time::timeout(CALL_TIMEOUT, fut) => match res {
                Ok(value) => Guarded::Done(value),
                Err(_) => Guarded::TimedOut,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tests::{
        BackendScript, DummySender, MapsScript, MockBackend, MockLocation, MockMaps,
        RecordingSurface, SurfaceLog, body_with,
    };
    use tokio::test;

    type TestPanel = MapPanel<MockLocation, MockMaps, MockBackend, RecordingSurface, DummySender>;

    const SF: LatLng = LatLng {
        lat: 37.77,
        lng: -122.42,
    };

    struct Harness {
        panel: Arc<TestPanel>,
        surface: Arc<SurfaceLog>,
        backend: Arc<BackendScript>,
        maps: Arc<MapsScript>,
    }

    impl Harness {
        fn new(category: PoiCategory) -> Self {
            Self::with_device(category, Some(SF))
        }

        fn with_device(category: PoiCategory, position: Option<LatLng>) -> Self {
            tokio::time::pause();
            let surface = Arc::new(SurfaceLog::default());
            let backend = Arc::new(BackendScript::default());
            let maps = Arc::new(MapsScript::default());
            let panel = Arc::new(TestPanel::new(
                category,
                MockLocation { position },
                MockMaps(maps.clone()),
                MockBackend(backend.clone()),
                RecordingSurface(surface.clone()),
                DummySender,
            ));
            Self {
                panel,
                surface,
                backend,
                maps,
            }
        }
    }

    #[test]
    async fn locate_by_device_places_one_marker_and_syncs_shared_state() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));

        let location = h.panel.locate_by_device().await.unwrap();

        assert_eq!(location.source, LocationSource::DeviceGeolocation);
        assert_eq!(location.point, SF);
        assert_eq!(h.panel.shared_location(), Some(SF));
        assert_eq!(h.surface.live_markers(), 1);
        assert_eq!(h.surface.last_center(), Some((SF, LOCATE_ZOOM)));
    }

    #[test]
    async fn relocating_replaces_the_marker_instead_of_stacking() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &[]));
        h.backend.push_body(body_with("hospitals", &[]));

        h.panel.locate_by_device().await.unwrap();
        h.panel.locate_by_device().await.unwrap();

        assert_eq!(h.surface.live_markers(), 1);
        assert_eq!(h.surface.markers_placed(), 2);
    }

    #[test]
    async fn device_failure_raises_the_manual_address_prompt() {
        let h = Harness::with_device(PoiCategory::MedicalFacility, None);

        let err = h.panel.locate_by_device().await.unwrap_err();

        assert!(matches!(err, PanelError::LocationUnavailable(_)));
        let ui = h.panel.ui_state().await;
        assert!(ui.prompt_for_address);
        assert_eq!(ui.location, None);
        assert_eq!(h.surface.live_markers(), 0);
        assert_eq!(h.panel.shared_location(), None);
    }

    #[test]
    async fn empty_address_never_reaches_the_geocoder() {
        let h = Harness::new(PoiCategory::MedicalFacility);

        let err = h.panel.locate_by_address("   ").await.unwrap_err();

        assert!(matches!(err, PanelError::InvalidInput(_)));
        assert_eq!(h.maps.geocode_calls(), 0);
    }

    #[test]
    async fn geocode_no_match_leaves_previous_location_untouched() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        h.maps.set_geocode(None);
        let err = h.panel.locate_by_address("nowhere at all").await.unwrap_err();

        assert!(matches!(err, PanelError::GeocodeFailed(_)));
        let ui = h.panel.ui_state().await;
        assert_eq!(ui.location.map(|l| l.point), Some(SF));
        assert_eq!(ui.items.len(), 1);
        assert_eq!(h.surface.live_markers(), 1);
        assert_eq!(h.panel.shared_location(), Some(SF));
    }

    #[test]
    async fn locate_by_address_behaves_like_the_device_path() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        let elsewhere = LatLng {
            lat: 40.71,
            lng: -74.0,
        };
        h.maps.set_geocode(Some(elsewhere));
        h.backend.push_body(body_with("hospitals", &["Bellevue"]));

        let location = h.panel.locate_by_address("New York, NY").await.unwrap();

        assert_eq!(location.source, LocationSource::AddressLookup);
        assert_eq!(h.panel.shared_location(), Some(elsewhere));
        assert_eq!(h.surface.live_markers(), 1);
        let requests = h.backend.requests();
        assert_eq!(requests[0].at, elsewhere);
    }

    #[test]
    async fn stale_fetch_is_discarded() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["First"]));
        let gate = h.backend.push_gated(body_with("hospitals", &["Stale"]));
        h.backend.push_body(body_with("hospitals", &["Fresh"]));

        h.panel.locate_by_device().await.unwrap();

        let panel = h.panel.clone();
        let slow = tokio::spawn(async move { panel.refresh_pois().await });
        h.backend.wait_for_requests(2).await;

        h.panel.refresh_pois().await.unwrap();
        gate.send(()).ok();
        slow.await.unwrap().unwrap();

        let ui = h.panel.ui_state().await;
        assert_eq!(ui.items.len(), 1);
        assert_eq!(ui.items[0].name, "Fresh");
        assert_eq!(h.backend.requests().len(), 3);
    }

    #[test]
    async fn category_switch_discards_the_old_category_in_flight() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        let gate = h.backend.push_gated(body_with("hospitals", &["Late Hospital"]));
        h.backend.push_body(body_with("fire_stations", &["Station 7"]));

        h.panel.locate_by_device().await.unwrap();

        let panel = h.panel.clone();
        let slow = tokio::spawn(async move { panel.refresh_pois().await });
        h.backend.wait_for_requests(2).await;

        h.panel.set_category(PoiCategory::FireStation).await.unwrap();
        gate.send(()).ok();
        slow.await.unwrap().unwrap();

        let ui = h.panel.ui_state().await;
        assert_eq!(ui.category, PoiCategory::FireStation);
        assert_eq!(ui.items.len(), 1);
        assert_eq!(ui.items[0].name, "Station 7");
    }

    #[test]
    async fn fetch_failure_yields_the_explicit_empty_state() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        h.backend.push_error("connection refused");
        let err = h.panel.refresh_pois().await.unwrap_err();

        assert!(matches!(err, PanelError::FetchFailed(_)));
        let ui = h.panel.ui_state().await;
        assert!(ui.items.is_empty());
        assert!(ui.last_error.is_some());
    }

    #[test]
    async fn fetch_timeout_is_a_fetch_failure() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        let gate = h.backend.push_gated(body_with("hospitals", &["Never"]));
        let err = h.panel.refresh_pois().await.unwrap_err();

        assert!(matches!(err, PanelError::FetchFailed(_)));
        assert!(h.panel.ui_state().await.items.is_empty());
        drop(gate);
    }

    #[test]
    async fn empty_backend_array_is_not_an_error() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &[]));

        h.panel.locate_by_device().await.unwrap();

        let ui = h.panel.ui_state().await;
        assert!(ui.items.is_empty());
        assert_eq!(ui.last_error, None);
    }

    #[test]
    async fn unknown_category_tag_is_rejected() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        let err = h.panel.set_category_tag("petting-zoo").await.unwrap_err();
        assert!(matches!(err, PanelError::UnknownCategory(_)));
    }

    #[test]
    async fn routing_twice_leaves_exactly_one_overlay() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend
            .push_body(body_with("hospitals", &["General", "Mercy"]));
        h.panel.locate_by_device().await.unwrap();

        h.panel.select(0).await.unwrap();
        h.panel.select(1).await.unwrap();

        assert_eq!(h.surface.live_routes(), 1);
        assert_eq!(h.surface.routes_shown(), 2);
        assert_eq!(h.maps.route_calls(), 2);
        let ui = h.panel.ui_state().await;
        assert!(matches!(ui.route, RouteUi::Rendered(_)));
    }

    #[test]
    async fn route_failure_restores_the_selection_list() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend
            .push_body(body_with("hospitals", &["A", "B", "C"]));
        h.panel.locate_by_device().await.unwrap();

        h.maps.fail_routes(true);
        let err = h.panel.select(1).await.unwrap_err();

        assert!(matches!(err, PanelError::RouteUnavailable(_)));
        let ui = h.panel.ui_state().await;
        assert_eq!(ui.route, RouteUi::None);
        assert_eq!(ui.items.len(), 3);
        assert_eq!(h.surface.live_routes(), 0);
    }

    #[test]
    async fn clear_route_returns_to_browsing() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        h.panel.select(0).await.unwrap();
        h.panel.clear_route().await;

        assert_eq!(h.surface.live_routes(), 0);
        assert_eq!(h.panel.ui_state().await.route, RouteUi::None);
    }

    #[test]
    async fn selecting_out_of_range_is_invalid_input() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        let err = h.panel.select(5).await.unwrap_err();
        assert!(matches!(err, PanelError::InvalidInput(_)));
    }

    #[test]
    async fn close_releases_marker_and_overlay() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();
        h.panel.select(0).await.unwrap();

        h.panel.close().await;

        assert_eq!(h.surface.live_markers(), 0);
        assert_eq!(h.surface.live_routes(), 0);
    }

    #[test]
    async fn close_makes_an_in_flight_fetch_inert() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend.push_body(body_with("hospitals", &["General"]));
        h.panel.locate_by_device().await.unwrap();

        let gate = h.backend.push_gated(body_with("hospitals", &["Ghost"]));
        let panel = h.panel.clone();
        let slow = tokio::spawn(async move { panel.refresh_pois().await });
        h.backend.wait_for_requests(2).await;

        h.panel.close().await;
        gate.send(()).ok();
        slow.await.unwrap().unwrap();

        let ui = h.panel.ui_state().await;
        assert_eq!(ui.items.len(), 1);
        assert_eq!(ui.items[0].name, "General");
    }

    /// Full walk: device position, category fetch with the exact wire
    /// query, three rows, a failing selection, and the list surviving
    /// intact.
    #[test]
    async fn end_to_end_device_to_failed_route() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.backend
            .push_body(body_with("hospitals", &["A", "B", "C"]));

        h.panel.locate_by_device().await.unwrap();

        let requests = h.backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query(), "lat=37.77&lng=-122.42&radius=10000");
        assert_eq!(h.surface.last_marker(), Some(SF));

        let ui = h.panel.ui_state().await;
        assert_eq!(ui.items.len(), 3);

        h.maps.fail_routes(true);
        let err = h.panel.select(1).await.unwrap_err();
        assert!(matches!(err, PanelError::RouteUnavailable(_)));

        let ui = h.panel.ui_state().await;
        assert_eq!(ui.route, RouteUi::None);
        assert_eq!(
            ui.items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            ["A", "B", "C"]
        );
    }

    #[test]
    async fn refresh_without_location_is_a_no_op() {
        let h = Harness::new(PoiCategory::MedicalFacility);
        h.panel.refresh_pois().await.unwrap();
        assert!(h.backend.requests().is_empty());
    }
}
