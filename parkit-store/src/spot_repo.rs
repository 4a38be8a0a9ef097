use async_trait::async_trait;
use parkit_core::{ParkingSpot, SpotStore, StoreResult, VehicleCategory};
use sqlx::PgPool;

pub struct PostgresSpotRepository {
    pool: PgPool,
}

impl PostgresSpotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpotStore for PostgresSpotRepository {
    async fn next_available_slot(&self, category: VehicleCategory) -> StoreResult<i32> {
        let spot_id: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT MIN(parking_number)
            FROM parking
            WHERE available = TRUE AND type = $1
            "#,
        )
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(spot_id.unwrap_or(0))
    }

    async fn update_spot(&self, spot: &ParkingSpot) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE parking SET available = $1 WHERE parking_number = $2")
            .bind(spot.is_available)
            .bind(spot.id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
