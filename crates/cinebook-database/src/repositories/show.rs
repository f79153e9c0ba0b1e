//! Show and hall repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;

use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::result::AppResult;
use cinebook_core::types::id::{HallId, ShowId};
use cinebook_entity::hall::{Hall, SeatConfig};
use cinebook_entity::show::{CreateShow, Show};

/// Read access to the catalog's shows and halls, plus inserts for seeding.
#[derive(Debug, Clone)]
pub struct ShowRepository {
    pool: PgPool,
}

impl ShowRepository {
    /// Create a new show repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a show by ID.
    pub async fn find_by_id(&self, id: ShowId) -> AppResult<Option<Show>> {
        sqlx::query_as::<_, Show>("SELECT * FROM shows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find show", e))
    }

    /// Find a hall by ID.
    pub async fn find_hall(&self, id: HallId) -> AppResult<Option<Hall>> {
        sqlx::query_as::<_, Hall>("SELECT * FROM halls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find hall", e))
    }

    /// Create a show with no booked seats.
    pub async fn create(&self, data: CreateShow) -> AppResult<Show> {
        let show = data.into_show();
        sqlx::query_as::<_, Show>(
            "INSERT INTO shows (id, event_id, hall_id, start_time, end_time, total_seats, price, \
             booked_seats, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(show.id)
        .bind(show.event_id)
        .bind(show.hall_id)
        .bind(show.start_time)
        .bind(show.end_time)
        .bind(show.total_seats)
        .bind(show.price)
        .bind(&show.booked_seats)
        .bind(show.created_at)
        .bind(show.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create show", e))
    }

    /// Create a hall with the given seat map.
    pub async fn create_hall(&self, name: &str, seat_map: Vec<SeatConfig>) -> AppResult<Hall> {
        sqlx::query_as::<_, Hall>(
            "INSERT INTO halls (id, name, seat_map) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(HallId::new())
        .bind(name)
        .bind(Json(seat_map))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create hall", e))
    }
}
