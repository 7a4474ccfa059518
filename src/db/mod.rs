use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

pub mod record;
pub mod unit_of_work;

pub use record::{Dependent, Record};
pub use unit_of_work::UnitOfWork;

use crate::utils::error::StoreError;

const MAX_CONNECTIONS: u32 = 5;
/// Bounds how long the liveness probe waits for a connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 5;
/// Connections older than this are recycled.
const CONNECTION_MAX_LIFETIME_SECS: u64 = 300;

/// Handle on the relational store.
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone)]
pub struct Store {
    pool: AnyPool,
}

impl Store {
    /// Builds the pool without opening a connection, so the server can start
    /// while the database is still waking up.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .max_lifetime(Duration::from_secs(CONNECTION_MAX_LIFETIME_SECS))
            .test_before_acquire(true)
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Liveness probe. Runs `SELECT 1` and nothing else.
    pub async fn probe(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<UnitOfWork, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork::new(tx))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendance, AttendanceInput, Event, EventForm};

    async fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let store = Store::connect(&url).unwrap();
        store.migrate().await.unwrap();
        (dir, store)
    }

    fn event(name: &str, start: &str) -> Event {
        let form = EventForm {
            name: Some(name.to_string()),
            start: Some(start.to_string()),
            end: Some(start.to_string()),
            ..Default::default()
        };
        Event::new(form.validate().unwrap())
    }

    fn attendee(event: &Event, name: &str) -> Attendance {
        Attendance::new(
            event.id,
            AttendanceInput {
                name: name.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_probe_succeeds_on_open_store() {
        let (_dir, store) = temp_store().await;
        store.probe().await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_fails_as_connectivity_after_close() {
        let (_dir, store) = temp_store().await;
        store.close().await;
        let err = store.probe().await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_create_find_update_round_trip() {
        let (_dir, store) = temp_store().await;
        let mut launch = event("Launch", "2025-01-10T09:00");

        let mut uow = store.begin().await.unwrap();
        uow.create(&launch).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let found: Event = uow.find(launch.id).await.unwrap();
        assert_eq!(found, launch);

        launch.name = "Relaunch".to_string();
        launch.place = Some("HQ".to_string());
        uow.update(&launch).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let found: Event = uow.find(launch.id).await.unwrap();
        assert_eq!(found.name, "Relaunch");
        assert_eq!(found.place.as_deref(), Some("HQ"));
    }

    #[tokio::test]
    async fn test_uncommitted_work_is_rolled_back() {
        let (_dir, store) = temp_store().await;
        let launch = event("Launch", "2025-01-10T09:00");

        {
            let mut uow = store.begin().await.unwrap();
            uow.create(&launch).await.unwrap();
        }

        let mut uow = store.begin().await.unwrap();
        let missing = uow.find::<Event>(launch.id).await;
        assert!(matches!(missing, Err(StoreError::NotFound { table: "event", .. })));
    }

    #[tokio::test]
    async fn test_list_events_orders_by_start() {
        let (_dir, store) = temp_store().await;
        let mut uow = store.begin().await.unwrap();
        for (name, start) in [
            ("late", "2025-03-01T10:00"),
            ("early", "2024-12-31T23:00"),
            ("middle", "2025-01-10T09:00"),
        ] {
            uow.create(&event(name, start)).await.unwrap();
        }
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let names: Vec<_> = uow
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_delete_event_cascades_to_attendances() {
        let (_dir, store) = temp_store().await;
        let launch = event("Launch", "2025-01-10T09:00");
        let other = event("Other", "2025-01-11T09:00");

        let mut uow = store.begin().await.unwrap();
        uow.create(&launch).await.unwrap();
        uow.create(&other).await.unwrap();
        uow.create(&attendee(&launch, "Ana")).await.unwrap();
        uow.create(&attendee(&launch, "Bo")).await.unwrap();
        uow.create(&attendee(&other, "Cy")).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.count_attendances(launch.id).await.unwrap(), 2);
        uow.delete(&launch).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.count_attendances(launch.id).await.unwrap(), 0);
        assert!(uow.list_attendances(launch.id).await.unwrap().is_empty());
        let remaining = uow.list_attendances(other.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Cy");
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_not_found() {
        let (_dir, store) = temp_store().await;
        let ghost = event("Ghost", "2025-01-10T09:00");
        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.delete(&ghost).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            uow.update(&ghost).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
