//! Needs a session bus: `cargo test -- --ignored` inside a desktop session
//! or `dbus-run-session`.

use gmrconfig::BusKind;
use gmrdbus::{MprisNotifier, errors::Result};

const UUID: &str = "7d0e3b52-9c41-4e8a-b6f1-2c5d8a0f4e19";

#[tokio::test]
#[ignore = "needs a session D-Bus"]
async fn second_instance_with_same_uuid_does_not_own_the_name() -> Result<()> {
    let first = MprisNotifier::connect(BusKind::Session, UUID, "First").await?;
    assert!(first.owns_name());

    let second = MprisNotifier::connect(BusKind::Session, UUID, "Second").await?;
    assert!(!second.owns_name());
    assert!(first.owns_name());
    assert_eq!(first.bus_name(), second.bus_name());
    Ok(())
}
