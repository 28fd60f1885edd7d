//! Server-rendered dashboard: one embedded page plus htmx fragments. Thin
//! presentation glue over the ticket and dashboard queries.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;

use super::{service, Ticket, TicketEvent};
use crate::dashboard::{self, TicketFilter};
use crate::shared::state::AppState;

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn priority_badge(priority: &str) -> &'static str {
    match priority {
        "Critical" => "<span class=\"badge badge-danger\">Critical</span>",
        "High" => "<span class=\"badge badge-warning\">High</span>",
        "Medium" => "<span class=\"badge badge-info\">Medium</span>",
        "Low" => "<span class=\"badge badge-secondary\">Low</span>",
        _ => "<span class=\"badge\">Unknown</span>",
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "Open" => "<span class=\"badge badge-primary\">Open</span>",
        "In Progress" => "<span class=\"badge badge-purple\">In Progress</span>",
        "Escalated" => "<span class=\"badge badge-danger\">Escalated</span>",
        "On Hold" => "<span class=\"badge badge-warning\">On Hold</span>",
        "Resolved" => "<span class=\"badge badge-success\">Resolved</span>",
        "Closed" => "<span class=\"badge badge-secondary\">Closed</span>",
        _ => "<span class=\"badge\">Unknown</span>",
    }
}

/// Countdown text for the SLA column: overdue in red, under four hours left
/// in amber, otherwise green.
fn sla_countdown(now: NaiveDateTime, due: NaiveDateTime) -> (String, &'static str) {
    let remaining = due - now;
    let hours = remaining.num_hours();
    if remaining.num_seconds() < 0 {
        (format!("{}h overdue", -hours), "overdue")
    } else if hours <= 4 {
        (format!("{hours}h left"), "almost")
    } else if hours >= 24 {
        (format!("{}d left", hours / 24), "ok")
    } else {
        (format!("{hours}h left"), "ok")
    }
}

fn render_empty_state(title: &str, description: &str) -> String {
    format!(
        "<div class=\"empty-state\"><h3>{}</h3><p>{}</p></div>",
        html_escape(title),
        html_escape(description)
    )
}

fn render_ticket_row(ticket: &Ticket, now: NaiveDateTime) -> String {
    let (sla_text, sla_class) = sla_countdown(now, ticket.sla_due);
    let created = ticket.created_at.format("%Y-%m-%d %H:%M").to_string();
    let hash = "#";

    format!(
        "<tr class=\"ticket-row\" data-id=\"{id}\">\
            <td class=\"ticket-number\">\
                <a href=\"{hash}\" hx-get=\"/api/ui/tickets/{id}\" hx-target=\"{hash}ticket-detail\" hx-swap=\"innerHTML\">{number}</a>\
            </td>\
            <td>{created}</td>\
            <td>{caller}</td>\
            <td>{contact}</td>\
            <td>{status}</td>\
            <td>{priority}</td>\
            <td><span class=\"{sla_class}\">{sla_text}</span></td>\
            <td>{reason}</td>\
            <td>{service}</td>\
        </tr>",
        id = ticket.id,
        hash = hash,
        number = html_escape(&ticket.ticket_number),
        created = created,
        caller = html_escape(&ticket.caller_name),
        contact = html_escape(&ticket.caller_contact),
        status = status_badge(&ticket.status),
        priority = priority_badge(&ticket.priority),
        sla_class = sla_class,
        sla_text = sla_text,
        reason = html_escape(&ticket.call_reason),
        service = html_escape(&ticket.service_type),
    )
}

fn render_event(event: &TicketEvent) -> String {
    let when = event.created_at.format("%Y-%m-%d %H:%M").to_string();
    let body = match event.kind.as_str() {
        service::EVENT_KIND_STATUS => format!(
            "{} &rarr; {}",
            html_escape(event.old_status.as_deref().unwrap_or("-")),
            html_escape(event.new_status.as_deref().unwrap_or("-")),
        ),
        _ => html_escape(event.note.as_deref().unwrap_or("-")),
    };
    format!(
        "<li><em>{}</em> <strong>{}</strong>: {}</li>",
        when,
        html_escape(&event.actor),
        body
    )
}

pub fn configure_tickets_ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/api/ui/tickets", get(handle_tickets_list))
        .route("/api/ui/tickets/open-count", get(handle_open_count))
        .route("/api/ui/tickets/breach-count", get(handle_breach_count))
        .route("/api/ui/tickets/avg-resolution", get(handle_avg_resolution))
        .route("/api/ui/tickets/:id", get(handle_ticket_detail))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_tickets_list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TicketFilter>,
) -> impl IntoResponse {
    let Ok(mut conn) = state.conn.get() else {
        return Html(render_empty_state("No tickets", "Unable to load tickets"));
    };

    let tickets = match dashboard::filter_tickets(&mut conn, &filter) {
        Ok(tickets) => tickets,
        Err(err) => return Html(render_empty_state("No tickets", &err.to_string())),
    };

    if tickets.is_empty() {
        return Html(render_empty_state(
            "No tickets yet",
            "Create your first ticket to get started",
        ));
    }

    let now = Utc::now().naive_utc();
    let mut html = String::from(
        "<table class=\"tickets-table\">\
            <thead>\
                <tr>\
                    <th>Number</th>\
                    <th>Created</th>\
                    <th>Caller</th>\
                    <th>Contact</th>\
                    <th>Status</th>\
                    <th>Priority</th>\
                    <th>SLA</th>\
                    <th>Reason</th>\
                    <th>Service</th>\
                </tr>\
            </thead>\
            <tbody>",
    );
    for ticket in &tickets {
        html.push_str(&render_ticket_row(ticket, now));
    }
    html.push_str("</tbody></table>");
    Html(html)
}

async fn handle_open_count(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(mut conn) = state.conn.get() else {
        return Html("0".to_string());
    };
    let count = dashboard::list_open(&mut conn)
        .map(|t| t.len())
        .unwrap_or(0);
    Html(count.to_string())
}

async fn handle_breach_count(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(mut conn) = state.conn.get() else {
        return Html("0".to_string());
    };
    let count = dashboard::count_breaches(&mut conn, Utc::now().naive_utc()).unwrap_or(0);
    Html(count.to_string())
}

async fn handle_avg_resolution(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(mut conn) = state.conn.get() else {
        return Html("-".to_string());
    };
    let text = match dashboard::average_resolution_time(&mut conn) {
        Ok(Some(hours)) => format!("{hours:.1}h"),
        _ => "-".to_string(),
    };
    Html(text)
}

async fn handle_ticket_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let Ok(mut conn) = state.conn.get() else {
        return Html(render_empty_state("Unavailable", "Unable to load ticket"));
    };

    let ticket = match service::get_ticket(&mut conn, id) {
        Ok(ticket) => ticket,
        Err(err) => return Html(render_empty_state("Not found", &err.to_string())),
    };
    let events = service::list_events(&mut conn, id).unwrap_or_default();

    let mut html = format!(
        "<div class=\"ticket-detail-card\">\
            <h3>{number} &mdash; {caller}</h3>\
            <p>{status} {priority}</p>\
            <p>Created {created} &middot; SLA due {due}</p>\
            <p>Reason: {reason} &middot; Service: {service} &middot; Source: {source}</p>",
        number = html_escape(&ticket.ticket_number),
        caller = html_escape(&ticket.caller_name),
        status = status_badge(&ticket.status),
        priority = priority_badge(&ticket.priority),
        created = ticket.created_at.format("%Y-%m-%d %H:%M"),
        due = ticket.sla_due.format("%Y-%m-%d %H:%M"),
        reason = html_escape(&ticket.call_reason),
        service = html_escape(&ticket.service_type),
        source = html_escape(&ticket.call_source),
    );

    if events.is_empty() {
        html.push_str("<p><em>No activity yet.</em></p>");
    } else {
        html.push_str("<ul class=\"event-log\">");
        for event in &events {
            html.push_str(&render_event(event));
        }
        html.push_str("</ul>");
    }
    html.push_str("</div>");
    Html(html)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Helpdesk</title>
<script src="https://unpkg.com/htmx.org@1.9.12"></script>
<style>
body { font-family: sans-serif; background: #f5f5f5; margin: 0; padding: 16px; }
.header { background: #002856; color: white; padding: 12px 16px; border-radius: 10px; margin-bottom: 16px; }
.metrics { display: flex; gap: 16px; margin-bottom: 16px; }
.metric { background: white; border: 1px solid #e5e7eb; border-radius: 10px; padding: 12px 20px; }
.metric .value { font-size: 24px; font-weight: 700; color: #3bafda; }
.tickets-table { width: 100%; border-collapse: collapse; background: white; }
.tickets-table th, .tickets-table td { padding: 8px 10px; border-bottom: 1px solid #e5e7eb; text-align: left; }
.badge { display: inline-block; padding: 3px 8px; border-radius: 999px; font-size: 12px; font-weight: 700; color: white; background: #6b7280; }
.badge-primary { background: #3bafda; }
.badge-purple { background: #8b5cf6; }
.badge-danger { background: #ef4444; }
.badge-warning { background: #f59e0b; }
.badge-success { background: #10b981; }
.badge-secondary { background: #6b7280; }
.badge-info { background: #3bafda; }
.overdue { color: #ef4444; font-weight: 700; }
.almost { color: #f59e0b; font-weight: 700; }
.ok { color: #10b981; font-weight: 700; }
.empty-state { background: white; border-radius: 10px; padding: 24px; text-align: center; color: #6b7280; }
.ticket-detail-card { background: white; border-radius: 10px; padding: 16px; margin-top: 16px; }
.filters { margin-bottom: 12px; }
</style>
</head>
<body>
<div class="header"><h2>Helpdesk Ticketing</h2></div>
<div class="metrics">
  <div class="metric">Open<br><span class="value" hx-get="/api/ui/tickets/open-count" hx-trigger="load, every 30s">-</span></div>
  <div class="metric">SLA breaches<br><span class="value" hx-get="/api/ui/tickets/breach-count" hx-trigger="load, every 30s">-</span></div>
  <div class="metric">Avg resolution<br><span class="value" hx-get="/api/ui/tickets/avg-resolution" hx-trigger="load, every 30s">-</span></div>
</div>
<div class="filters">
  <input type="search" name="q" placeholder="Search tickets"
         hx-get="/api/ui/tickets" hx-target="#ticket-list" hx-trigger="keyup changed delay:300ms">
</div>
<div id="ticket-list" hx-get="/api/ui/tickets" hx-trigger="load"></div>
<div id="ticket-detail"></div>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sla_countdown_classifies_deadlines() {
        let now = crate::shared::test_util::t0();
        let (text, class) = sla_countdown(now, now - Duration::hours(3));
        assert_eq!(text, "3h overdue");
        assert_eq!(class, "overdue");

        let (_, class) = sla_countdown(now, now + Duration::hours(2));
        assert_eq!(class, "almost");

        // overdue by less than an hour must still read as overdue
        let (text, class) = sla_countdown(now, now - Duration::minutes(30));
        assert_eq!(text, "0h overdue");
        assert_eq!(class, "overdue");

        let (text, class) = sla_countdown(now, now + Duration::days(3));
        assert_eq!(text, "3d left");
        assert_eq!(class, "ok");
    }

    #[test]
    fn html_escape_neutralizes_markup() {
        assert_eq!(
            html_escape("<b>\"A&B\"</b>"),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
    }
}
