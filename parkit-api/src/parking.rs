use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use parkit_core::{normalize_plate, InputSource, ParkingResult, Ticket, TicketState, VehicleCategory};
use parkit_lot::{EntryReceipt, ExitReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Entry request; `selection` is the menu number (1 = car, 2 = bike).
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub plate: String,
    pub selection: i32,
}

impl InputSource for EntryRequest {
    fn read_category_selection(&self) -> ParkingResult<i32> {
        Ok(self.selection)
    }

    fn read_plate(&self) -> ParkingResult<String> {
        normalize_plate(&self.plate)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExitRequest {
    pub plate: String,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub plate: String,
    pub spot_id: i32,
    pub category: VehicleCategory,
    pub state: TicketState,
    pub price: Decimal,
    pub in_time: DateTime<Utc>,
    pub out_time: Option<DateTime<Utc>>,
    pub is_loyalty_user: bool,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            state: ticket.state(),
            spot_id: ticket.spot.id,
            category: ticket.spot.category,
            plate: ticket.vehicle_plate,
            price: ticket.price,
            in_time: ticket.in_time,
            out_time: ticket.out_time,
            is_loyalty_user: ticket.is_loyalty_user,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/entries", post(register_entry))
        .route("/v1/exits", post(register_exit))
        .route("/v1/tickets/{plate}", get(get_ticket))
}

async fn register_entry(
    State(state): State<AppState>,
    Json(req): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryReceipt>), AppError> {
    let receipt = state.manager.process_incoming_vehicle(&req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn register_exit(
    State(state): State<AppState>,
    Json(req): Json<ExitRequest>,
) -> Result<Json<ExitReceipt>, AppError> {
    let receipt = state.manager.process_exit(&req.plate).await?;
    Ok(Json(receipt))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state.manager.open_ticket(&plate).await?;
    Ok(Json(ticket.into()))
}
