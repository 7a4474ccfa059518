use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::any::AnyRow;
use sqlx::{Any, Transaction};
use uuid::Uuid;

use super::record::Record;
use crate::models::{Attendance, Event};
use crate::state::AppState;
use crate::utils::error::{AppError, StoreError};

/// The pending writes of a single request.
///
/// Everything goes through one transaction; [`UnitOfWork::commit`] persists it
/// all at once and dropping the value without committing rolls it back.
pub struct UnitOfWork {
    tx: Transaction<'static, Any>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Any>) -> Self {
        Self { tx }
    }

    pub async fn create<T: Record>(&mut self, record: &T) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders(1..=T::COLUMNS.len()).join(", ")
        );
        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = query.bind(value);
        }
        query.execute(&mut *self.tx).await?;
        Ok(())
    }

    /// Overwrites every non-key column of an existing row.
    pub async fn update<T: Record>(&mut self, record: &T) -> Result<(), StoreError> {
        let assignments: Vec<String> = T::COLUMNS[1..]
            .iter()
            .zip(placeholders(2..=T::COLUMNS.len()))
            .map(|(column, p)| format!("{column} = {p}"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = $1",
            T::TABLE,
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = query.bind(value);
        }
        let result = query.execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<T>(record.id()));
        }
        Ok(())
    }

    /// Deletes the row and, first, every dependent row that references it.
    pub async fn delete<T: Record>(&mut self, record: &T) -> Result<(), StoreError> {
        let id = record.id().to_string();
        for dependent in T::DEPENDENTS {
            let sql = format!(
                "DELETE FROM {} WHERE {} = $1",
                dependent.table, dependent.foreign_key
            );
            let removed = sqlx::query(&sql)
                .bind(id.clone())
                .execute(&mut *self.tx)
                .await?;
            tracing::debug!(
                table = dependent.table,
                rows = removed.rows_affected(),
                "Cascaded delete"
            );
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<T>(record.id()));
        }
        Ok(())
    }

    pub async fn find<T: Record>(&mut self, id: Uuid) -> Result<T, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            T::COLUMNS.join(", "),
            T::TABLE
        );
        let row: Option<AnyRow> = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await?;
        match row {
            Some(row) => T::from_row(&row),
            None => Err(not_found::<T>(id)),
        }
    }

    /// All events, earliest start first.
    pub async fn list_events(&mut self) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY start_time ASC",
            Event::COLUMNS.join(", "),
            Event::TABLE
        );
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        rows.iter().map(Event::from_row).collect()
    }

    /// Attendances of one event in registration order.
    pub async fn list_attendances(
        &mut self,
        event_id: Uuid,
    ) -> Result<Vec<Attendance>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE event_id = $1 ORDER BY registered_at ASC",
            Attendance::COLUMNS.join(", "),
            Attendance::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(event_id.to_string())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter().map(Attendance::from_row).collect()
    }

    pub async fn count_attendances(&mut self, event_id: Uuid) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE event_id = $1")
            .bind(event_id.to_string())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.0)
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UnitOfWork {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.store.begin().await?)
    }
}

fn placeholders(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("${i}")).collect()
}

fn not_found<T: Record>(id: Uuid) -> StoreError {
    StoreError::NotFound {
        table: T::TABLE,
        id,
    }
}
