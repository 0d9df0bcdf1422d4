//! SQLite-backed implementation of the appointment repository port.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::AppointmentRepository;
use cadence_domain::constants::IMPORTED_EVENT_TYPE;
use cadence_domain::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, AppointmentUpdate, Attendee,
    CadenceError, ExternalLinkage, LinkageFilter, NewAppointment, Origin, Result as DomainResult,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, ToSql};
use tokio::task;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::{map_join_error, map_sql_error, DbManager, SqliteConnection};

const ORIGIN_INTERNAL: &str = "internal";
const ORIGIN_IMPORTED: &str = "imported_from_calendar";

const SELECT_COLUMNS: &str = "SELECT id, origin, owner_id, appointment_type, scheduled_at,
        duration_minutes, status, attendees_json, objectives, notes, time_zone,
        meeting_link, external_event_id, external_html_link
    FROM appointments";

const INSERT_SQL: &str = "INSERT INTO appointments (
        id, origin, owner_id, appointment_type, scheduled_at, duration_minutes, status,
        attendees_json, objectives, notes, time_zone, meeting_link, external_event_id,
        external_html_link, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)";

// SET expressions all see the pre-update row, so the html link CASE reads the
// old external_event_id. An existing event id is never overwritten.
const UPDATE_SQL: &str = "UPDATE appointments SET
        scheduled_at = COALESCE(?2, scheduled_at),
        duration_minutes = COALESCE(?3, duration_minutes),
        meeting_link = COALESCE(?4, meeting_link),
        external_html_link = CASE
            WHEN external_event_id IS NOT NULL THEN COALESCE(?6, external_html_link)
            WHEN ?5 IS NOT NULL THEN ?6
            ELSE external_html_link
        END,
        external_event_id = COALESCE(external_event_id, ?5),
        updated_at = ?7
    WHERE id = ?1";

/// SQLite implementation of [`AppointmentRepository`]
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    /// Construct a repository backed by the shared manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn list(
        conn: &SqliteConnection,
        filter: &AppointmentFilter,
    ) -> DomainResult<Vec<Appointment>> {
        let sql = format!(
            "{SELECT_COLUMNS}
            WHERE (?1 IS NULL OR scheduled_at >= ?1)
              AND (?2 IS NULL OR scheduled_at <= ?2)
              AND (?3 = 'any'
                   OR (?3 = 'linked' AND external_event_id IS NOT NULL)
                   OR (?3 = 'unlinked' AND external_event_id IS NULL))
              AND (?4 = 0 OR (origin <> '{ORIGIN_IMPORTED}' AND appointment_type <> ?5))
            ORDER BY scheduled_at ASC, id ASC"
        );
        let linkage = match filter.linkage {
            LinkageFilter::Any => "any",
            LinkageFilter::Linked => "linked",
            LinkageFilter::Unlinked => "unlinked",
        };
        let from = filter.scheduled_from.map(|at| at.timestamp());
        let until = filter.scheduled_until.map(|at| at.timestamp());

        let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(
                params![
                    from,
                    until,
                    linkage,
                    filter.exclude_imported,
                    IMPORTED_EVENT_TYPE
                ],
                map_appointment_row,
            )
            .map_err(map_sql_error)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    fn fetch(conn: &SqliteConnection, id: AppointmentId) -> DomainResult<Option<Appointment>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        conn.query_row(&sql, [id.to_string()], map_appointment_row)
            .optional()
            .map_err(map_sql_error)
    }

    fn insert(
        conn: &SqliteConnection,
        id: AppointmentId,
        new: &NewAppointment,
    ) -> DomainResult<()> {
        let (origin, owner_id) = match &new.origin {
            Origin::Internal { owner_id } => (ORIGIN_INTERNAL, Some(owner_id.as_str())),
            Origin::ImportedFromCalendar => (ORIGIN_IMPORTED, None),
        };
        let attendees = serde_json::to_string(&new.attendees)
            .map_err(|err| CadenceError::Internal(format!("attendee encoding failed: {err}")))?;
        let (event_id, html_link) = match &new.external {
            Some(link) => (Some(link.event_id.as_str()), link.html_link.as_deref()),
            None => (None, None),
        };
        let id = id.to_string();
        let scheduled_at = new.scheduled_at.timestamp();
        let status = new.status.to_string();
        let now = Utc::now().timestamp();

        let params: [&dyn ToSql; 15] = [
            &id,
            &origin,
            &owner_id,
            &new.appointment_type,
            &scheduled_at,
            &new.duration_minutes,
            &status,
            &attendees,
            &new.objectives,
            &new.notes,
            &new.time_zone,
            &new.meeting_link,
            &event_id,
            &html_link,
            &now,
        ];
        conn.execute(INSERT_SQL, params.as_slice()).map_err(map_sql_error)?;
        Ok(())
    }

    fn apply_update(
        conn: &SqliteConnection,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> DomainResult<usize> {
        let id = id.to_string();
        let scheduled_at = update.scheduled_at.map(|at| at.timestamp());
        let now = Utc::now().timestamp();
        let params: [&dyn ToSql; 7] = [
            &id,
            &scheduled_at,
            &update.duration_minutes,
            &update.meeting_link,
            &update.external_event_id,
            &update.html_link,
            &now,
        ];
        conn.execute(UPDATE_SQL, params.as_slice()).map_err(map_sql_error)
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    #[instrument(skip(self))]
    async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> DomainResult<Vec<Appointment>> {
        let db = Arc::clone(&self.db);
        let filter = filter.clone();

        task::spawn_blocking(move || -> DomainResult<Vec<Appointment>> {
            let conn = db.get_connection()?;
            let appointments = Self::list(&conn, &filter)?;
            debug!(count = appointments.len(), "listed appointments");
            Ok(appointments)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, appointment), fields(appointment_type = %appointment.appointment_type))]
    async fn create_appointment(&self, appointment: NewAppointment) -> DomainResult<Appointment> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Appointment> {
            let conn = db.get_connection()?;
            let id = Uuid::now_v7();
            Self::insert(&conn, id, &appointment)?;
            Self::fetch(&conn, id)?.ok_or_else(|| {
                CadenceError::Internal(format!("appointment {id} missing after insert"))
            })
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, update))]
    async fn update_appointment(
        &self,
        id: AppointmentId,
        update: &AppointmentUpdate,
    ) -> DomainResult<Appointment> {
        let db = Arc::clone(&self.db);
        let update = update.clone();

        task::spawn_blocking(move || -> DomainResult<Appointment> {
            let conn = db.get_connection()?;
            if Self::apply_update(&conn, id, &update)? == 0 {
                return Err(CadenceError::NotFound(format!("appointment {id}")));
            }
            Self::fetch(&conn, id)?
                .ok_or_else(|| CadenceError::NotFound(format!("appointment {id}")))
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self))]
    async fn get_appointment(&self, id: AppointmentId) -> DomainResult<Option<Appointment>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Appointment>> {
            let conn = db.get_connection()?;
            Self::fetch(&conn, id)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_appointment_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let id: String = row.get(0)?;
    let origin: String = row.get(1)?;
    let owner_id: Option<String> = row.get(2)?;
    let status: String = row.get(6)?;
    let attendees: String = row.get(7)?;
    let external_event_id: Option<String> = row.get(12)?;

    let origin = match (origin.as_str(), owner_id) {
        (ORIGIN_INTERNAL, Some(owner_id)) => Origin::Internal { owner_id },
        (ORIGIN_IMPORTED, _) => Origin::ImportedFromCalendar,
        (other, _) => return Err(conversion_error(1, format!("invalid origin '{other}'"))),
    };

    Ok(Appointment {
        id: Uuid::parse_str(&id).map_err(|err| conversion_error(0, err.to_string()))?,
        origin,
        appointment_type: row.get(3)?,
        scheduled_at: timestamp_to_datetime(row.get(4)?)
            .ok_or_else(|| conversion_error(4, "scheduled_at out of range".into()))?,
        duration_minutes: row.get(5)?,
        status: status.parse::<AppointmentStatus>().map_err(|err| conversion_error(6, err))?,
        attendees: serde_json::from_str::<Vec<Attendee>>(&attendees)
            .map_err(|err| conversion_error(7, err.to_string()))?,
        objectives: row.get(8)?,
        notes: row.get(9)?,
        time_zone: row.get(10)?,
        meeting_link: row.get(11)?,
        external: external_event_id
            .map(|event_id| -> rusqlite::Result<ExternalLinkage> {
                Ok(ExternalLinkage { event_id, html_link: row.get(13)? })
            })
            .transpose()?,
    })
}

fn timestamp_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}
