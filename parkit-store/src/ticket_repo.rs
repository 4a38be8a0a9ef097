use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkit_core::{ParkingError, ParkingSpot, StoreResult, Ticket, TicketStore};
use rust_decimal::Decimal;
use sqlx::PgPool;

pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    parking_number: i32,
    spot_type: String,
    spot_available: bool,
    vehicle_reg_number: String,
    price: Decimal,
    in_time: DateTime<Utc>,
    out_time: Option<DateTime<Utc>>,
    is_loyalty_user: bool,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = ParkingError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            spot: ParkingSpot::new(row.parking_number, row.spot_type.parse()?, row.spot_available),
            vehicle_plate: row.vehicle_reg_number,
            price: row.price,
            in_time: row.in_time,
            out_time: row.out_time,
            is_loyalty_user: row.is_loyalty_user,
        })
    }
}

#[async_trait]
impl TicketStore for PostgresTicketRepository {
    async fn save(&self, ticket: &Ticket) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO ticket (parking_number, vehicle_reg_number, price, in_time, out_time, is_loyalty_user)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ticket.spot.id)
        .bind(&ticket.vehicle_plate)
        .bind(ticket.price)
        .bind(ticket.in_time)
        .bind(ticket.out_time)
        .bind(ticket.is_loyalty_user)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_open_ticket_by_plate(&self, plate: &str) -> StoreResult<Option<Ticket>> {
        let row: Option<TicketRow> = sqlx::query_as(
            r#"
            SELECT
                t.id, t.parking_number, p.type AS spot_type, p.available AS spot_available,
                t.vehicle_reg_number, t.price, t.in_time, t.out_time, t.is_loyalty_user
            FROM ticket t
            JOIN parking p ON p.parking_number = t.parking_number
            WHERE t.vehicle_reg_number = $1 AND t.out_time IS NULL
            ORDER BY t.in_time DESC
            LIMIT 1
            "#,
        )
        .bind(plate)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Ticket::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE ticket
            SET price = $1, out_time = $2, is_loyalty_user = $3
            WHERE id = $4
            "#,
        )
        .bind(ticket.price)
        .bind(ticket.out_time)
        .bind(ticket.is_loyalty_user)
        .bind(ticket.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_recurring_user(&self, plate: &str) -> StoreResult<bool> {
        let recurring: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ticket WHERE vehicle_reg_number = $1 AND out_time IS NOT NULL)",
        )
        .bind(plate)
        .fetch_one(&self.pool)
        .await?;

        Ok(recurring)
    }
}
