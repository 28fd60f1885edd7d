//! Ticket domain logic. Every function takes the connection it should use;
//! nothing in this module holds shared state.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::{
    form, CreateTicketRequest, NewTicket, NewTicketEvent, Ticket, TicketEvent, TicketPriority,
    TicketStatus, UpdateTicketRequest,
};
use crate::shared::db::AnyConnection;
use crate::shared::error::TicketError;
use crate::shared::schema::{ticket_events, tickets};

pub const EVENT_KIND_NOTE: &str = "note";
pub const EVENT_KIND_STATUS: &str = "status";

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = tickets)]
struct TicketChanges {
    caller_name: Option<String>,
    caller_contact: Option<String>,
    issue_type: Option<String>,
    call_source: Option<String>,
    call_reason: Option<String>,
    service_type: Option<String>,
    equipment: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    resolved_at: Option<NaiveDateTime>,
    closed_at: Option<NaiveDateTime>,
}

impl TicketChanges {
    fn is_empty(&self) -> bool {
        self.caller_name.is_none()
            && self.caller_contact.is_none()
            && self.issue_type.is_none()
            && self.call_source.is_none()
            && self.call_reason.is_none()
            && self.service_type.is_none()
            && self.equipment.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

/// SLA deadline derived from the priority tier at creation time. Computed
/// once; later priority changes do not move it.
pub fn sla_due(priority: TicketPriority, created_at: NaiveDateTime) -> NaiveDateTime {
    created_at + priority.sla_offset()
}

fn generate_ticket_number(conn: &mut AnyConnection) -> QueryResult<String> {
    let count: i64 = tickets::table.count().get_result(conn)?;
    Ok(format!("TKT-{:06}", count + 1))
}

fn parse_priority(s: &str) -> Result<TicketPriority, TicketError> {
    TicketPriority::parse(s)
        .ok_or_else(|| TicketError::Validation(format!("invalid priority: {s}")))
}

fn parse_status(s: &str) -> Result<TicketStatus, TicketError> {
    TicketStatus::parse(s).ok_or_else(|| TicketError::Validation(format!("invalid status: {s}")))
}

pub fn create_ticket(
    conn: &mut AnyConnection,
    req: CreateTicketRequest,
    now: NaiveDateTime,
) -> Result<Ticket, TicketError> {
    let caller_name = req.caller_name.trim().to_string();
    if caller_name.is_empty() {
        return Err(TicketError::Validation(
            "caller_name is required".to_string(),
        ));
    }

    let priority = match req.priority.as_deref() {
        Some(p) => parse_priority(p)?,
        None => TicketPriority::Medium,
    };
    let call_source = form::checked_option("call_source", req.call_source, form::CALL_SOURCES)?;
    let call_reason = form::checked_option("call_reason", req.call_reason, form::CALL_REASONS)?;
    let service_type =
        form::checked_option("service_type", req.service_type, form::SERVICE_TYPES)?;

    let ticket_number = generate_ticket_number(conn)?;
    let new_ticket = NewTicket {
        ticket_number: ticket_number.clone(),
        caller_name,
        caller_contact: req.caller_contact.unwrap_or_default(),
        issue_type: req.issue_type.unwrap_or_default(),
        call_source,
        call_reason,
        service_type,
        equipment: req.equipment,
        priority: priority.as_str().to_string(),
        status: TicketStatus::Open.as_str().to_string(),
        created_at: now,
        sla_due: sla_due(priority, now),
    };

    diesel::insert_into(tickets::table)
        .values(&new_ticket)
        .execute(conn)?;

    let ticket = tickets::table
        .filter(tickets::ticket_number.eq(&ticket_number))
        .first(conn)?;
    Ok(ticket)
}

pub fn get_ticket(conn: &mut AnyConnection, id: i32) -> Result<Ticket, TicketError> {
    tickets::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or(TicketError::NotFound(id))
}

/// Applies field changes. A status change appends exactly one status event
/// with the old and new value; moving to Resolved or Closed stamps the
/// matching timestamp. Transitions themselves are unconstrained.
pub fn update_ticket(
    conn: &mut AnyConnection,
    id: i32,
    req: UpdateTicketRequest,
    now: NaiveDateTime,
) -> Result<Ticket, TicketError> {
    let existing = get_ticket(conn, id)?;
    let actor = req.actor.unwrap_or_else(|| "system".to_string());

    let mut changes = TicketChanges {
        caller_name: req.caller_name,
        caller_contact: req.caller_contact,
        issue_type: req.issue_type,
        call_source: req.call_source,
        call_reason: req.call_reason,
        service_type: req.service_type,
        equipment: req.equipment,
        ..Default::default()
    };
    if let Some(source) = &changes.call_source {
        form::ensure_option("call_source", source, form::CALL_SOURCES)?;
    }
    if let Some(reason) = &changes.call_reason {
        form::ensure_option("call_reason", reason, form::CALL_REASONS)?;
    }
    if let Some(service) = &changes.service_type {
        form::ensure_option("service_type", service, form::SERVICE_TYPES)?;
    }
    if let Some(p) = req.priority.as_deref() {
        changes.priority = Some(parse_priority(p)?.as_str().to_string());
    }

    let mut status_change: Option<(String, TicketStatus)> = None;
    if let Some(s) = req.status.as_deref() {
        let new_status = parse_status(s)?;
        if new_status.as_str() != existing.status {
            status_change = Some((existing.status.clone(), new_status));
        }
        changes.status = Some(new_status.as_str().to_string());
        match new_status {
            TicketStatus::Resolved => changes.resolved_at = Some(now),
            TicketStatus::Closed => changes.closed_at = Some(now),
            _ => {}
        }
    }

    if changes.is_empty() {
        return Err(TicketError::Validation("no fields to update".to_string()));
    }

    diesel::update(tickets::table.find(id))
        .set(&changes)
        .execute(conn)?;

    if let Some((old_status, new_status)) = status_change {
        diesel::insert_into(ticket_events::table)
            .values(&NewTicketEvent {
                ticket_id: id,
                actor,
                kind: EVENT_KIND_STATUS.to_string(),
                note: None,
                old_status: Some(old_status),
                new_status: Some(new_status.as_str().to_string()),
                created_at: now,
            })
            .execute(conn)?;
    }

    get_ticket(conn, id)
}

pub fn add_note(
    conn: &mut AnyConnection,
    id: i32,
    actor: &str,
    note: &str,
    now: NaiveDateTime,
) -> Result<TicketEvent, TicketError> {
    get_ticket(conn, id)?;
    let note = note.trim();
    if note.is_empty() {
        return Err(TicketError::Validation("note must not be empty".to_string()));
    }

    diesel::insert_into(ticket_events::table)
        .values(&NewTicketEvent {
            ticket_id: id,
            actor: actor.to_string(),
            kind: EVENT_KIND_NOTE.to_string(),
            note: Some(note.to_string()),
            old_status: None,
            new_status: None,
            created_at: now,
        })
        .execute(conn)?;

    let event = ticket_events::table
        .filter(ticket_events::ticket_id.eq(id))
        .order(ticket_events::id.desc())
        .first(conn)?;
    Ok(event)
}

/// Event log for one ticket, in insertion order.
pub fn list_events(conn: &mut AnyConnection, id: i32) -> Result<Vec<TicketEvent>, TicketError> {
    let events = ticket_events::table
        .filter(ticket_events::ticket_id.eq(id))
        .order(ticket_events::id.asc())
        .load(conn)?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_util::{t0, test_conn, ticket_request as request};
    use chrono::Duration;

    #[test]
    fn sla_due_follows_priority_offsets() {
        let now = t0();
        let cases = [
            (TicketPriority::Critical, 4),
            (TicketPriority::High, 8),
            (TicketPriority::Medium, 24),
            (TicketPriority::Low, 72),
        ];
        for (priority, hours) in cases {
            assert_eq!(sla_due(priority, now), now + Duration::hours(hours));
        }
    }

    #[test]
    fn create_ticket_sets_derived_fields() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "High"), t0()).expect("create");

        assert_eq!(ticket.ticket_number, "TKT-000001");
        assert_eq!(ticket.status, "Open");
        assert_eq!(ticket.priority, "High");
        assert_eq!(ticket.created_at, t0());
        assert_eq!(ticket.sla_due, t0() + Duration::hours(8));
        assert!(ticket.resolved_at.is_none());
        assert!(ticket.closed_at.is_none());

        let events = list_events(&mut conn, ticket.id).expect("events");
        assert!(events.is_empty(), "creation must not append an event");
    }

    #[test]
    fn ticket_numbers_are_monotonic() {
        let mut conn = test_conn();
        let a = create_ticket(&mut conn, request("Ada", "Low"), t0()).expect("create");
        let b = create_ticket(&mut conn, request("Grace", "Low"), t0()).expect("create");
        assert_eq!(a.ticket_number, "TKT-000001");
        assert_eq!(b.ticket_number, "TKT-000002");
    }

    #[test]
    fn create_ticket_requires_caller_name() {
        let mut conn = test_conn();
        let mut req = request("", "Low");
        req.caller_name = "   ".to_string();
        let err = create_ticket(&mut conn, req, t0()).unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[test]
    fn create_ticket_rejects_unknown_priority() {
        let mut conn = test_conn();
        let err = create_ticket(&mut conn, request("Ada", "Urgent"), t0()).unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[test]
    fn create_ticket_rejects_unknown_call_source() {
        let mut conn = test_conn();
        let mut req = request("Ada", "Low");
        req.call_source = Some("telegraph".to_string());
        let err = create_ticket(&mut conn, req, t0()).unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[test]
    fn status_change_appends_exactly_one_event() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");

        let updated = update_ticket(
            &mut conn,
            ticket.id,
            UpdateTicketRequest {
                actor: Some("Chuck".to_string()),
                status: Some("In Progress".to_string()),
                ..Default::default()
            },
            t0() + Duration::hours(1),
        )
        .expect("update");
        assert_eq!(updated.status, "In Progress");

        let events = list_events(&mut conn, ticket.id).expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EVENT_KIND_STATUS);
        assert_eq!(events[0].actor, "Chuck");
        assert_eq!(events[0].old_status.as_deref(), Some("Open"));
        assert_eq!(events[0].new_status.as_deref(), Some("In Progress"));
    }

    #[test]
    fn same_status_update_appends_no_event() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");

        update_ticket(
            &mut conn,
            ticket.id,
            UpdateTicketRequest {
                status: Some("Open".to_string()),
                ..Default::default()
            },
            t0(),
        )
        .expect("update");

        let events = list_events(&mut conn, ticket.id).expect("events");
        assert!(events.is_empty());
    }

    #[test]
    fn resolving_sets_resolved_at() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");
        let t1 = t0() + Duration::hours(3);

        let updated = update_ticket(
            &mut conn,
            ticket.id,
            UpdateTicketRequest {
                status: Some("Resolved".to_string()),
                ..Default::default()
            },
            t1,
        )
        .expect("update");
        assert_eq!(updated.resolved_at, Some(t1));
        assert!(updated.closed_at.is_none());
    }

    #[test]
    fn sla_due_is_not_recomputed_on_priority_change() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Low"), t0()).expect("create");

        let updated = update_ticket(
            &mut conn,
            ticket.id,
            UpdateTicketRequest {
                priority: Some("Critical".to_string()),
                ..Default::default()
            },
            t0() + Duration::hours(1),
        )
        .expect("update");
        assert_eq!(updated.priority, "Critical");
        assert_eq!(updated.sla_due, t0() + Duration::hours(72));
    }

    #[test]
    fn update_unknown_ticket_is_not_found() {
        let mut conn = test_conn();
        let err = update_ticket(
            &mut conn,
            999,
            UpdateTicketRequest {
                status: Some("Closed".to_string()),
                ..Default::default()
            },
            t0(),
        )
        .unwrap_err();
        assert!(matches!(err, TicketError::NotFound(999)));
    }

    #[test]
    fn empty_update_is_a_validation_error() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");
        let err =
            update_ticket(&mut conn, ticket.id, UpdateTicketRequest::default(), t0()).unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[test]
    fn add_note_appends_note_event() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");

        let event = add_note(&mut conn, ticket.id, "Gabby", "customer called back", t0())
            .expect("add note");
        assert_eq!(event.kind, EVENT_KIND_NOTE);
        assert_eq!(event.note.as_deref(), Some("customer called back"));

        let events = list_events(&mut conn, ticket.id).expect("events");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn add_note_to_unknown_ticket_is_not_found() {
        let mut conn = test_conn();
        let err = add_note(&mut conn, 42, "Gabby", "hello", t0()).unwrap_err();
        assert!(matches!(err, TicketError::NotFound(42)));
    }

    #[test]
    fn add_empty_note_is_a_validation_error() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");
        let err = add_note(&mut conn, ticket.id, "Gabby", "  ", t0()).unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[test]
    fn events_are_listed_in_insertion_order() {
        let mut conn = test_conn();
        let ticket = create_ticket(&mut conn, request("Ada", "Medium"), t0()).expect("create");

        add_note(&mut conn, ticket.id, "Gabby", "first", t0()).expect("note");
        update_ticket(
            &mut conn,
            ticket.id,
            UpdateTicketRequest {
                status: Some("Escalated".to_string()),
                ..Default::default()
            },
            t0() + Duration::minutes(5),
        )
        .expect("update");
        add_note(&mut conn, ticket.id, "Gabby", "second", t0() + Duration::minutes(10))
            .expect("note");

        let events = list_events(&mut conn, ticket.id).expect("events");
        let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec![EVENT_KIND_NOTE, EVENT_KIND_STATUS, EVENT_KIND_NOTE]);
    }
}
