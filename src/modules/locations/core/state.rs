use crate::modules::locations::application::errors::LocationError;
use crate::modules::locations::core::location::{Floor, Location};

/// What the presentation layer reads from the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationsState {
    pub locations: Vec<Location>,
    pub loading: bool,
    pub error: Option<LocationError>,
}

impl LocationsState {
    pub fn by_floor(&self, floor: &Floor) -> Vec<Location> {
        self.locations
            .iter()
            .filter(|location| location.floor() == floor)
            .cloned()
            .collect()
    }

    pub fn by_id(&self, id: &str) -> Option<Location> {
        self.locations.iter().find(|location| location.id() == id).cloned()
    }
}
