use serde::Serialize;

use super::Coordinates;

/// A row of a per-bank table. Field order of the implementing struct is the
/// CSV column order.
pub trait BranchRecord: Serialize + Send + Sync {
    fn name(&self) -> &str;

    fn coordinates(&self) -> Option<Coordinates>;

    fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// Builds coordinates from optional parts, dropping incomplete or invalid pairs.
pub(crate) fn coordinates_from(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinates> {
    Coordinates::new(lat?, lon?).ok()
}
