// Shared test fixtures. Compiled only for unit tests.

pub mod locations {
    use crate::modules::locations::core::location::{Location, LocationDraft};
    use chrono::{TimeZone, Utc};

    pub fn room_draft(floor: i64, name: &str) -> LocationDraft {
        LocationDraft::new(floor)
            .with_field("name", name)
            .with_field("x", 120.5)
            .with_field("y", 48.0)
    }

    pub fn stored_collection() -> Vec<Location> {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        vec![
            Location::create(room_draft(0, "Entrance"), created_at),
            Location::create(room_draft(1, "Library"), created_at),
            Location::create(LocationDraft::new("Roof").with_field("name", "Terrace"), created_at),
        ]
    }
}

pub mod positions {
    use crate::modules::positioning::adapters::outbound::scripted_position_source::ScriptedPositionSource;
    use crate::modules::positioning::core::ports::Platform;
    use crate::modules::positioning::core::position::{RawCoords, RawFix};
    use std::sync::Arc;
    use std::time::Duration;

    pub const FIX_TIMESTAMP: i64 = 1_700_000_000_000;

    pub fn raw_fix(latitude: f64, longitude: f64, accuracy: f64) -> RawFix {
        RawFix {
            coords: RawCoords {
                latitude,
                longitude,
                accuracy,
            },
            timestamp: FIX_TIMESTAMP,
        }
    }

    /// A platform whose geolocation is the returned scripted source. No permissions query.
    pub fn scripted_platform() -> (Arc<ScriptedPositionSource>, Platform) {
        let source = Arc::new(ScriptedPositionSource::new());
        let platform = Platform::new(Some(source.clone()), None);
        (source, platform)
    }

    /// Polls `condition` until it holds, failing the test after one second.
    pub async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not met within one second");
    }
}
