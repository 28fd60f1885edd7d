//! Fixtures shared by the unit tests. Everything runs against an in-memory
//! SQLite connection so the tests exercise the same diesel queries as the
//! server without external services.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::Connection;

use crate::shared::db::{init_schema, AnyConnection};
use crate::tickets::CreateTicketRequest;

pub fn test_conn() -> AnyConnection {
    let mut conn = AnyConnection::establish(":memory:").expect("in-memory sqlite should connect");
    init_schema(&mut conn).expect("schema bootstrap");
    conn
}

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

pub fn ticket_request(name: &str, priority: &str) -> CreateTicketRequest {
    CreateTicketRequest {
        caller_name: name.to_string(),
        caller_contact: Some("555-0100".to_string()),
        issue_type: Some("no sync".to_string()),
        call_source: Some("phone".to_string()),
        call_reason: Some("outage".to_string()),
        service_type: Some("Fiber".to_string()),
        equipment: None,
        priority: Some(priority.to_string()),
    }
}
