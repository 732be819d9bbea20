// End to end flows for position tracking over a scripted platform.

use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;
use wayfinder::modules::positioning::adapters::outbound::scripted_position_source::{
    PositionScript, ScriptedPositionSource,
};
use wayfinder::modules::positioning::application::geolocation::GeolocationAdapter;
use wayfinder::modules::positioning::application::tracker::PositionTracker;
use wayfinder::modules::positioning::core::errors::{GeolocationError, RawPositionError};
use wayfinder::modules::positioning::core::permission::PermissionState;
use wayfinder::modules::positioning::core::position::{RawCoords, RawFix};

type BeforeEachReturn = (Arc<ScriptedPositionSource>, Arc<GeolocationAdapter>, PositionTracker);

fn fix(latitude: f64, longitude: f64, accuracy: f64) -> RawFix {
    RawFix {
        coords: RawCoords {
            latitude,
            longitude,
            accuracy,
        },
        timestamp: 1_700_000_000_000,
    }
}

#[fixture]
fn before_each() -> BeforeEachReturn {
    let script = PositionScript {
        permission: Some(PermissionState::Granted),
        ..PositionScript::default()
    };
    let (source, platform) = ScriptedPositionSource::platform(&script);
    let geolocation = Arc::new(GeolocationAdapter::new(platform));
    let tracker = PositionTracker::new(geolocation.clone());
    (source, geolocation, tracker)
}

#[rstest]
#[tokio::test]
async fn it_should_not_start_tracking_when_the_first_fix_times_out(before_each: BeforeEachReturn) {
    let (source, _, tracker) = before_each;
    source.push_current(Err(RawPositionError::new(3, "Timeout expired")));

    assert_eq!(
        tracker.start_position_tracking().await,
        Err(GeolocationError::Timeout)
    );
    assert!(!tracker.has_current_position());
    assert!(!tracker.is_tracking());
    assert_eq!(source.active_watches(), 0);
}

#[rstest]
#[tokio::test]
async fn it_should_follow_watch_updates_and_survive_watch_errors(before_each: BeforeEachReturn) {
    let (source, geolocation, tracker) = before_each;
    source.push_current(Ok(fix(52.0, 13.0, 30.0)));
    tracker.start_position_tracking().await.unwrap();
    let mut changes = tracker.subscribe();

    source.emit(Ok(fix(52.1, 13.4, 5.0)));
    tokio::time::timeout(Duration::from_secs(1), changes.changed())
        .await
        .expect("expected an update")
        .unwrap();
    source.emit(Err(RawPositionError::new(2, "Position unavailable")));
    tokio::time::timeout(Duration::from_secs(1), async {
        while tracker.last_watch_error().is_none() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("expected the watch error to be reported");

    let position = tracker.current_position().expect("expected a position");
    assert_eq!(position.latitude, 52.1);
    assert_eq!(position.longitude, 13.4);
    assert_eq!(position.accuracy, 5.0);
    assert!(tracker.is_tracking());
    assert!(geolocation.active_watch().is_some());
    assert_eq!(geolocation.check_permissions().await, PermissionState::Granted);

    tracker.stop_position_tracking();
    assert!(geolocation.active_watch().is_none());
    assert_eq!(source.active_watches(), 0);
}
