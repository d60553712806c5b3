//! Vehicle/reminder store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist vehicles with their ordered reminder lists.
//! - Provide reminder lookup-by-name and upsert on top of stored vehicles.
//! - Run read-modify-write updates as one serialized transaction.
//!
//! # Invariants
//! - Writes call `Vehicle::validate()` before SQL mutations.
//! - Reminder order is persisted through `position` and restored on read.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::vehicle::{
    Reminder, ReminderId, ReminderKind, Vehicle, VehicleId, VehicleValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by vehicle and notification persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(VehicleValidationError),
    Db(DbError),
    NotFound(String),
    AlreadyExists(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "record already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<VehicleValidationError> for RepoError {
    fn from(value: VehicleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Before/after states of one read-modify-write update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleUpdate {
    pub before: Vehicle,
    pub after: Vehicle,
}

/// Repository interface for vehicles and their reminders.
pub trait VehicleRepository {
    /// Inserts a new vehicle. Fails with `AlreadyExists` on id clash.
    fn create_vehicle(&self, vehicle: &Vehicle) -> RepoResult<()>;
    /// Inserts or fully replaces a vehicle and its reminder list.
    fn save_vehicle(&self, vehicle: &Vehicle) -> RepoResult<()>;
    fn get_vehicle(&self, id: &VehicleId) -> RepoResult<Option<Vehicle>>;
    /// Lists all vehicles ordered by id, read as one consistent snapshot.
    fn list_vehicles(&self) -> RepoResult<Vec<Vehicle>>;
    fn delete_vehicle(&self, id: &VehicleId) -> RepoResult<()>;
    /// First reminder on the vehicle whose label matches `name`.
    fn find_reminder_by_name(&self, id: &VehicleId, name: &str) -> RepoResult<Option<Reminder>>;
    /// Inserts or replaces one reminder using `Vehicle::upsert_reminder` rules.
    fn upsert_reminder(&self, id: &VehicleId, reminder: Reminder) -> RepoResult<ReminderId>;
    /// Reads, transforms and writes one vehicle inside a single write
    /// transaction, so concurrent updates of the same vehicle serialize.
    fn modify_vehicle(
        &self,
        id: &VehicleId,
        mutate: &mut dyn FnMut(&Vehicle) -> Vehicle,
    ) -> RepoResult<VehicleUpdate>;
}

/// SQLite-backed vehicle repository.
pub struct SqliteVehicleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVehicleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn write_tx(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl VehicleRepository for SqliteVehicleRepository<'_> {
    fn create_vehicle(&self, vehicle: &Vehicle) -> RepoResult<()> {
        vehicle.validate()?;
        let tx = self.write_tx()?;
        if load_vehicle(&tx, &vehicle.id)?.is_some() {
            return Err(RepoError::AlreadyExists(vehicle.id.to_string()));
        }
        write_vehicle(&tx, vehicle)?;
        tx.commit()?;
        Ok(())
    }

    fn save_vehicle(&self, vehicle: &Vehicle) -> RepoResult<()> {
        vehicle.validate()?;
        let tx = self.write_tx()?;
        write_vehicle(&tx, vehicle)?;
        tx.commit()?;
        Ok(())
    }

    fn get_vehicle(&self, id: &VehicleId) -> RepoResult<Option<Vehicle>> {
        load_vehicle(self.conn, id)
    }

    fn list_vehicles(&self) -> RepoResult<Vec<Vehicle>> {
        // One read transaction so the listing is a single point-in-time view.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let ids = {
            let mut stmt = tx.prepare("SELECT id FROM vehicles ORDER BY id ASC;")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut vehicles = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = parse_vehicle_id(&raw)?;
            if let Some(vehicle) = load_vehicle(&tx, &id)? {
                vehicles.push(vehicle);
            }
        }
        tx.commit()?;
        Ok(vehicles)
    }

    fn delete_vehicle(&self, id: &VehicleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM vehicles WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn find_reminder_by_name(&self, id: &VehicleId, name: &str) -> RepoResult<Option<Reminder>> {
        let vehicle = self
            .get_vehicle(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        Ok(vehicle.find_reminder_by_name(name).cloned())
    }

    fn upsert_reminder(&self, id: &VehicleId, reminder: Reminder) -> RepoResult<ReminderId> {
        let mut stored = None;
        let mut pending = Some(reminder);
        self.modify_vehicle(id, &mut |current| {
            let mut next = current.clone();
            if let Some(reminder) = pending.take() {
                stored = Some(next.upsert_reminder(reminder));
            }
            next
        })?;
        stored.ok_or_else(|| RepoError::InvalidData("reminder upsert did not run".to_string()))
    }

    fn modify_vehicle(
        &self,
        id: &VehicleId,
        mutate: &mut dyn FnMut(&Vehicle) -> Vehicle,
    ) -> RepoResult<VehicleUpdate> {
        let tx = self.write_tx()?;
        let before = load_vehicle(&tx, id)?.ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        let after = mutate(&before);
        if after.id != before.id {
            return Err(RepoError::InvalidData(format!(
                "update changed vehicle id from `{}` to `{}`",
                before.id, after.id
            )));
        }
        after.validate()?;
        if after != before {
            write_vehicle(&tx, &after)?;
        }
        tx.commit()?;
        Ok(VehicleUpdate { before, after })
    }
}

fn load_vehicle(conn: &Connection, id: &VehicleId) -> RepoResult<Option<Vehicle>> {
    let row = conn
        .query_row(
            "SELECT id, make, model, year, mileage FROM vehicles WHERE id = ?1;",
            [id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>("id")?,
                    row.get::<_, Option<String>>("make")?,
                    row.get::<_, Option<String>>("model")?,
                    row.get::<_, Option<i32>>("year")?,
                    row.get::<_, Option<i64>>("mileage")?,
                ))
            },
        )
        .optional()?;

    let Some((raw_id, make, model, year, mileage)) = row else {
        return Ok(None);
    };

    let mileage = match mileage {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid mileage `{value}` in vehicles.mileage"))
        })?),
        None => None,
    };

    let mut stmt = conn.prepare(
        "SELECT id, kind, name, date, enabled, notes
         FROM reminders
         WHERE vehicle_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    let mut reminders = Vec::new();
    while let Some(row) = rows.next()? {
        reminders.push(parse_reminder_row(row)?);
    }

    let vehicle = Vehicle {
        id: parse_vehicle_id(&raw_id)?,
        make,
        model,
        year,
        mileage,
        reminders,
    };
    vehicle.validate()?;
    Ok(Some(vehicle))
}

fn write_vehicle(conn: &Connection, vehicle: &Vehicle) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO vehicles (id, make, model, year, mileage)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            make = excluded.make,
            model = excluded.model,
            year = excluded.year,
            mileage = excluded.mileage,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            vehicle.id.as_str(),
            vehicle.make.as_deref(),
            vehicle.model.as_deref(),
            vehicle.year,
            vehicle.mileage.map(i64::from),
        ],
    )?;

    conn.execute(
        "DELETE FROM reminders WHERE vehicle_id = ?1;",
        [vehicle.id.as_str()],
    )?;

    let mut insert = conn.prepare(
        "INSERT INTO reminders (id, vehicle_id, position, kind, name, date, enabled, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
    )?;
    for (position, reminder) in vehicle.reminders.iter().enumerate() {
        insert.execute(params![
            reminder.id.to_string(),
            vehicle.id.as_str(),
            position as i64,
            reminder.kind.as_str(),
            reminder.name.as_str(),
            reminder.date.as_str(),
            bool_to_int(reminder.enabled),
            reminder.notes.as_deref(),
        ])?;
    }

    Ok(())
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in reminders.id"))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = ReminderKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid reminder kind `{kind_text}` in reminders.kind"))
    })?;

    Ok(Reminder {
        id,
        kind,
        name: row.get("name")?,
        date: row.get("date")?,
        enabled: int_to_bool(row.get("enabled")?, "reminders.enabled")?,
        notes: row.get("notes")?,
    })
}

fn parse_vehicle_id(value: &str) -> RepoResult<VehicleId> {
    VehicleId::parse(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid vehicle id `{value}` in vehicles.id")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
