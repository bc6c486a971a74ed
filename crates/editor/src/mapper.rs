use model::MapPoint;

/// Screen-to-map coordinate contract supplied by the rendering surface.
///
/// The editor consumes clicks and drags through this trait only, so the
/// state machine stays testable without a real rendering surface.
pub trait CoordinateMapper {
    fn screen_to_map(&self, screen_x: f64, screen_y: f64) -> MapPoint;
}

/// Identity mapping, for headless use and tests.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityMapper;

impl CoordinateMapper for IdentityMapper {
    fn screen_to_map(&self, screen_x: f64, screen_y: f64) -> MapPoint {
        MapPoint::new(screen_x, screen_y)
    }
}
