use crate::{location::LatLng, maps::RoutePlan};

/// Host-side map rendering capability.
///
/// Marker and route overlay come back as handles the panel holds on to;
/// the panel owns at most one of each and always hands the old handle back
/// through [`MapSurface::remove_marker`]/[`MapSurface::clear_route`]
/// before asking for a replacement. Rendering calls are synchronous: the
/// map never becomes a suspension point, so the panel's state can't be
/// observed half-updated.
pub trait MapSurface: Send + Sync {
    type Marker: Send + Sync;
    type RouteOverlay: Send + Sync;

    /// Center the viewport.
    fn center(&self, at: LatLng, zoom: u8);

    /// Place the user marker. Any previous marker has already been removed.
    fn place_marker(&self, at: LatLng, title: &str) -> Self::Marker;

    /// Remove a previously placed marker.
    fn remove_marker(&self, marker: Self::Marker);

    /// Render a route and its detail panel.
    fn show_route(&self, plan: &RoutePlan) -> Self::RouteOverlay;

    /// Tear down a rendered route and clear its detail panel.
    fn clear_route(&self, overlay: Self::RouteOverlay);
}
