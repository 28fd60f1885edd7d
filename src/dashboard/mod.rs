//! Dashboard aggregator: read-only queries over the ticket store that feed
//! the metrics and filtered listings on the dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::shared::db::AnyConnection;
use crate::shared::error::TicketError;
use crate::shared::schema::tickets;
use crate::shared::state::AppState;
use crate::tickets::{Ticket, TicketPriority, TicketStatus};

diesel::define_sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Case-insensitive match on ticket number, caller name, or contact.
    pub q: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub resolved_tickets: i64,
    pub closed_tickets: i64,
    pub sla_breaches: i64,
    pub avg_resolution_hours: Option<f64>,
}

fn date_floor() -> NaiveDateTime {
    chrono::DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

fn date_ceil() -> NaiveDateTime {
    // Far enough out for any SLA while staying inside every backend's
    // timestamp range.
    date_floor() + Duration::days(365 * 500)
}

fn active_statuses() -> Vec<String> {
    TicketStatus::ALL
        .iter()
        .filter(|s| !s.is_terminal())
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Tickets matching a conjunction of the given predicates, newest first.
/// Absent criteria widen to match everything.
pub fn filter_tickets(
    conn: &mut AnyConnection,
    filter: &TicketFilter,
) -> Result<Vec<Ticket>, TicketError> {
    let statuses: Vec<String> = match filter.status.as_deref() {
        Some(s) => {
            let status = TicketStatus::parse(s)
                .ok_or_else(|| TicketError::Validation(format!("invalid status: {s}")))?;
            vec![status.as_str().to_string()]
        }
        None => TicketStatus::ALL
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
    };
    let priorities: Vec<String> = match filter.priority.as_deref() {
        Some(p) => {
            let priority = TicketPriority::parse(p)
                .ok_or_else(|| TicketError::Validation(format!("invalid priority: {p}")))?;
            vec![priority.as_str().to_string()]
        }
        None => TicketPriority::ALL
            .iter()
            .map(|p| p.as_str().to_string())
            .collect(),
    };

    let from = filter.from.unwrap_or_else(date_floor);
    let to = filter.to.unwrap_or_else(date_ceil);
    let pattern = filter
        .q
        .as_deref()
        .map(|q| format!("%{}%", q.to_lowercase()))
        .unwrap_or_else(|| "%".to_string());

    let rows = tickets::table
        .filter(tickets::status.eq_any(statuses))
        .filter(tickets::priority.eq_any(priorities))
        .filter(tickets::created_at.ge(from))
        .filter(tickets::created_at.le(to))
        .filter(
            lower(tickets::ticket_number)
                .like(pattern.clone())
                .or(lower(tickets::caller_name).like(pattern.clone()))
                .or(lower(tickets::caller_contact).like(pattern)),
        )
        .order(tickets::created_at.desc())
        .limit(filter.limit.unwrap_or(100))
        .offset(filter.offset.unwrap_or(0))
        .load(conn)?;
    Ok(rows)
}

/// All tickets whose status is neither Resolved nor Closed.
pub fn list_open(conn: &mut AnyConnection) -> Result<Vec<Ticket>, TicketError> {
    let rows = tickets::table
        .filter(tickets::status.eq_any(active_statuses()))
        .order(tickets::created_at.desc())
        .load(conn)?;
    Ok(rows)
}

/// Open tickets whose SLA deadline has passed, oldest deadline first.
pub fn list_overdue(
    conn: &mut AnyConnection,
    now: NaiveDateTime,
) -> Result<Vec<Ticket>, TicketError> {
    let rows = tickets::table
        .filter(tickets::status.eq_any(active_statuses()))
        .filter(tickets::sla_due.lt(now))
        .order(tickets::sla_due.asc())
        .load(conn)?;
    Ok(rows)
}

pub fn count_breaches(conn: &mut AnyConnection, now: NaiveDateTime) -> Result<i64, TicketError> {
    let count = tickets::table
        .filter(tickets::status.eq_any(active_statuses()))
        .filter(tickets::sla_due.lt(now))
        .count()
        .get_result(conn)?;
    Ok(count)
}

/// Mean resolution time in hours over tickets with a resolution timestamp,
/// or `None` when nothing has been resolved yet.
pub fn average_resolution_time(conn: &mut AnyConnection) -> Result<Option<f64>, TicketError> {
    let rows: Vec<(NaiveDateTime, Option<NaiveDateTime>)> = tickets::table
        .filter(tickets::resolved_at.is_not_null())
        .select((tickets::created_at, tickets::resolved_at))
        .load(conn)?;

    let durations: Vec<i64> = rows
        .iter()
        .filter_map(|(created, resolved)| resolved.map(|r| (r - *created).num_seconds()))
        .collect();
    if durations.is_empty() {
        return Ok(None);
    }
    let total: i64 = durations.iter().sum();
    Ok(Some(total as f64 / durations.len() as f64 / 3600.0))
}

fn count_by_status(conn: &mut AnyConnection, status: TicketStatus) -> Result<i64, TicketError> {
    let count = tickets::table
        .filter(tickets::status.eq(status.as_str()))
        .count()
        .get_result(conn)?;
    Ok(count)
}

pub fn stats(conn: &mut AnyConnection, now: NaiveDateTime) -> Result<DashboardStats, TicketError> {
    let total_tickets = tickets::table.count().get_result(conn)?;
    let open_tickets = tickets::table
        .filter(tickets::status.eq_any(active_statuses()))
        .count()
        .get_result(conn)?;
    Ok(DashboardStats {
        total_tickets,
        open_tickets,
        resolved_tickets: count_by_status(conn, TicketStatus::Resolved)?,
        closed_tickets: count_by_status(conn, TicketStatus::Closed)?,
        sla_breaches: count_breaches(conn, now)?,
        avg_resolution_hours: average_resolution_time(conn)?,
    })
}

/// Tickets created per day over the trailing window, zero-filled so the
/// chart has a point for every day.
pub fn created_per_day(
    conn: &mut AnyConnection,
    now: NaiveDateTime,
    days: i64,
) -> Result<BTreeMap<NaiveDate, i64>, TicketError> {
    let start = (now - Duration::days(days - 1)).date().and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| now - Duration::days(days - 1));

    let created: Vec<NaiveDateTime> = tickets::table
        .filter(tickets::created_at.ge(start))
        .select(tickets::created_at)
        .load(conn)?;

    let mut by_day: BTreeMap<NaiveDate, i64> = (0..days)
        .map(|d| (start.date() + Duration::days(d), 0))
        .collect();
    for ts in created {
        if let Some(count) = by_day.get_mut(&ts.date()) {
            *count += 1;
        }
    }
    Ok(by_day)
}

#[derive(Debug, Deserialize)]
pub struct BreachQuery {
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub days: Option<i64>,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let stats = stats(&mut conn, Utc::now().naive_utc())?;
    Ok(Json(stats))
}

pub async fn list_open_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let tickets = list_open(&mut conn)?;
    Ok(Json(tickets))
}

pub async fn list_overdue_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BreachQuery>,
) -> Result<Json<Vec<Ticket>>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let now = query.now.unwrap_or_else(|| Utc::now().naive_utc());
    let tickets = list_overdue(&mut conn, now)?;
    Ok(Json(tickets))
}

pub async fn report_created_per_day(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<BTreeMap<NaiveDate, i64>>, (StatusCode, String)> {
    let mut conn = state.conn.get().map_err(TicketError::from)?;
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let report = created_per_day(&mut conn, Utc::now().naive_utc(), days)?;
    Ok(Json(report))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets/stats", get(get_stats))
        .route("/api/tickets/open", get(list_open_tickets))
        .route("/api/tickets/overdue", get(list_overdue_tickets))
        .route("/api/reports/created-per-day", get(report_created_per_day))
}
