use fleetdesk_core::db::open_db_in_memory;
use fleetdesk_core::{
    RegistryError, RegistryResult, RegistrySnapshot, RegistrySource, Reminder, ReminderKind,
    ReminderService, ReminderServiceError, SqliteVehicleRepository, Vehicle, VehicleId,
};
use std::cell::Cell;
use std::collections::HashMap;

struct FixtureRegistry {
    snapshots: HashMap<String, RegistrySnapshot>,
    fail_with: Option<RegistryError>,
    calls: Cell<usize>,
}

impl FixtureRegistry {
    fn with(id: &str, snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshots: HashMap::from([(id.to_string(), snapshot)]),
            fail_with: None,
            calls: Cell::new(0),
        }
    }

    fn failing(error: RegistryError) -> Self {
        Self {
            snapshots: HashMap::new(),
            fail_with: Some(error),
            calls: Cell::new(0),
        }
    }
}

impl RegistrySource for FixtureRegistry {
    fn source_id(&self) -> &str {
        "fixture"
    }

    fn fetch_snapshot(&self, vehicle_id: &VehicleId) -> RegistryResult<Option<RegistrySnapshot>> {
        self.calls.set(self.calls.get() + 1);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.snapshots.get(vehicle_id.as_str()).cloned())
    }
}

fn seeded_vehicle() -> Vehicle {
    let mut vehicle = Vehicle::new(VehicleId::parse("ABC-123").unwrap());
    vehicle
        .reminders
        .push(Reminder::new("Insurance Renewal", "2024-01-10"));
    vehicle
}

#[test]
fn sync_applies_registry_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let service = ReminderService::new(SqliteVehicleRepository::try_new(&conn).unwrap());
    let vehicle = seeded_vehicle();
    service.add_vehicle(&vehicle).unwrap();

    let registry = FixtureRegistry::with(
        "ABC-123",
        RegistrySnapshot {
            road_worthiness_date: Some("15.06.2025".to_string()),
            insurance_policy_date: Some("2025-01-10".to_string()),
            make: Some("Toyota".to_string()),
            ..RegistrySnapshot::default()
        },
    );

    let applied = service
        .sync_from_registry(&registry, &vehicle.id)
        .unwrap()
        .unwrap();
    assert_eq!(registry.calls.get(), 1);
    assert_eq!(applied.vehicle.make.as_deref(), Some("Toyota"));
    assert_eq!(
        applied.vehicle.find_reminder(ReminderKind::Insurance).unwrap().date,
        "2025-01-10"
    );
    assert_eq!(
        applied
            .vehicle
            .find_reminder(ReminderKind::RoadWorthiness)
            .unwrap()
            .date,
        "2025-06-15"
    );

    let again = service
        .sync_from_registry(&registry, &vehicle.id)
        .unwrap()
        .unwrap();
    assert!(again.changes.is_empty());
    assert_eq!(again.vehicle.reminders.len(), 2);
}

#[test]
fn registry_without_record_causes_no_write() {
    let conn = open_db_in_memory().unwrap();
    let service = ReminderService::new(SqliteVehicleRepository::try_new(&conn).unwrap());
    let vehicle = seeded_vehicle();
    service.add_vehicle(&vehicle).unwrap();

    let registry = FixtureRegistry::with("OTHER-1", RegistrySnapshot::default());
    let outcome = service.sync_from_registry(&registry, &vehicle.id).unwrap();

    assert!(outcome.is_none());
    assert_eq!(service.get_vehicle(&vehicle.id).unwrap(), vehicle);
}

#[test]
fn registry_errors_propagate_and_leave_vehicle_untouched() {
    let conn = open_db_in_memory().unwrap();
    let service = ReminderService::new(SqliteVehicleRepository::try_new(&conn).unwrap());
    let vehicle = seeded_vehicle();
    service.add_vehicle(&vehicle).unwrap();

    let registry = FixtureRegistry::failing(RegistryError::new(
        "fixture",
        "session_expired",
        "login required",
        true,
    ));
    let err = service
        .sync_from_registry(&registry, &vehicle.id)
        .unwrap_err();

    match err {
        ReminderServiceError::Registry(inner) => {
            assert_eq!(inner.code, "session_expired");
            assert!(inner.retryable);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.get_vehicle(&vehicle.id).unwrap(), vehicle);
}
