pub mod form;
pub mod service;
pub mod ui;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::dashboard::TicketFilter;
use crate::shared::error::TicketError;
use crate::shared::schema::{ticket_events, tickets};
use crate::shared::state::AppState;

/// Ticket statuses, in workflow order. Any status may follow any other;
/// the enum only validates values coming in from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    InProgress,
    Escalated,
    OnHold,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Escalated,
        TicketStatus::OnHold,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Escalated => "Escalated",
            TicketStatus::OnHold => "On Hold",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<TicketStatus> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Resolved and Closed tickets are out of the active workload.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Option<TicketPriority> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// SLA offset added to the creation timestamp, fixed per priority tier.
    pub fn sla_offset(self) -> chrono::Duration {
        match self {
            TicketPriority::Critical => chrono::Duration::hours(4),
            TicketPriority::High => chrono::Duration::hours(8),
            TicketPriority::Medium => chrono::Duration::hours(24),
            TicketPriority::Low => chrono::Duration::hours(72),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct Ticket {
    pub id: i32,
    pub ticket_number: String,
    pub caller_name: String,
    pub caller_contact: String,
    pub issue_type: String,
    pub call_source: String,
    pub call_reason: String,
    pub service_type: String,
    pub equipment: Option<String>,
    pub priority: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub sla_due: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub ticket_number: String,
    pub caller_name: String,
    pub caller_contact: String,
    pub issue_type: String,
    pub call_source: String,
    pub call_reason: String,
    pub service_type: String,
    pub equipment: Option<String>,
    pub priority: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub sla_due: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct TicketEvent {
    pub id: i32,
    pub ticket_id: i32,
    pub actor: String,
    pub kind: String,
    pub note: Option<String>,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ticket_events)]
pub struct NewTicketEvent {
    pub ticket_id: i32,
    pub actor: String,
    pub kind: String,
    pub note: Option<String>,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub caller_name: String,
    pub caller_contact: Option<String>,
    pub issue_type: Option<String>,
    pub call_source: Option<String>,
    pub call_reason: Option<String>,
    pub service_type: Option<String>,
    pub equipment: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub actor: Option<String>,
    pub caller_name: Option<String>,
    pub caller_contact: Option<String>,
    pub issue_type: Option<String>,
    pub call_source: Option<String>,
    pub call_reason: Option<String>,
    pub service_type: Option<String>,
    pub equipment: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub actor: Option<String>,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct TicketWithEvents {
    pub ticket: Ticket,
    pub events: Vec<TicketEvent>,
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let ticket = service::create_ticket(&mut conn, req, Utc::now().naive_utc())?;
    Ok(Json(ticket))
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TicketFilter>,
) -> Result<Json<Vec<Ticket>>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let tickets = crate::dashboard::filter_tickets(&mut conn, &filter)?;
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let ticket = service::get_ticket(&mut conn, id)?;
    Ok(Json(ticket))
}

pub async fn get_ticket_with_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TicketWithEvents>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let ticket = service::get_ticket(&mut conn, id)?;
    let events = service::list_events(&mut conn, id)?;
    Ok(Json(TicketWithEvents { ticket, events }))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let ticket = service::update_ticket(&mut conn, id, req, Utc::now().naive_utc())?;
    Ok(Json(ticket))
}

pub async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    update_ticket(
        State(state),
        Path(id),
        Json(UpdateTicketRequest {
            status: Some(TicketStatus::Resolved.as_str().to_string()),
            ..Default::default()
        }),
    )
    .await
}

pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    update_ticket(
        State(state),
        Path(id),
        Json(UpdateTicketRequest {
            status: Some(TicketStatus::Closed.as_str().to_string()),
            ..Default::default()
        }),
    )
    .await
}

pub async fn add_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Json<TicketEvent>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let actor = req.actor.unwrap_or_else(|| "system".to_string());
    let event = service::add_note(&mut conn, id, &actor, &req.note, Utc::now().naive_utc())?;
    Ok(Json(event))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<TicketEvent>>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    service::get_ticket(&mut conn, id)?;
    let events = service::list_events(&mut conn, id)?;
    Ok(Json(events))
}

pub async fn get_ticket_form() -> Json<Vec<form::FormField>> {
    Json(form::ticket_form())
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/form", get(get_ticket_form))
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket))
        .route("/api/tickets/:id/full", get(get_ticket_with_events))
        .route("/api/tickets/:id/resolve", put(resolve_ticket))
        .route("/api/tickets/:id/close", put(close_ticket))
        .route("/api/tickets/:id/events", get(list_events))
        .route("/api/tickets/:id/notes", axum::routing::post(add_note))
}
