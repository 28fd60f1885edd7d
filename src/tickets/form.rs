//! Typed catalog of the ticket form fields. The UI renders from this and the
//! service layer validates against it, so there is a single definition of
//! each field, its kind, and its allowed options.

use serde::Serialize;

use super::{TicketPriority, TicketStatus};
use crate::shared::error::TicketError;

pub const SERVICE_TYPES: &[&str] = &["Fiber", "DSL", "Fixed Wireless", "TV", "Voice", "Other"];
pub const CALL_SOURCES: &[&str] = &["phone", "email", "chat", "walk-in"];
pub const CALL_REASONS: &[&str] = &[
    "outage",
    "repair",
    "billing",
    "upgrade",
    "cancel",
    "new service",
    "other",
];

pub const DEFAULT_SERVICE_TYPE: &str = "Other";
pub const DEFAULT_CALL_SOURCE: &str = "phone";
pub const DEFAULT_CALL_REASON: &str = "other";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Select,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<&'static str>,
}

impl FormField {
    fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        FormField {
            name,
            label,
            kind: FieldKind::Text,
            required,
            options: Vec::new(),
        }
    }

    fn select(name: &'static str, label: &'static str, options: &[&'static str]) -> Self {
        FormField {
            name,
            label,
            kind: FieldKind::Select,
            required: false,
            options: options.to_vec(),
        }
    }
}

pub fn ticket_form() -> Vec<FormField> {
    let statuses: Vec<&'static str> = TicketStatus::ALL.iter().map(|s| s.as_str()).collect();
    let priorities: Vec<&'static str> = TicketPriority::ALL.iter().map(|p| p.as_str()).collect();
    vec![
        FormField::text("caller_name", "Caller Name", true),
        FormField::text("caller_contact", "Caller Contact", false),
        FormField::text("issue_type", "Issue Type", false),
        FormField::select("call_source", "Call Source", CALL_SOURCES),
        FormField::select("call_reason", "Call Reason", CALL_REASONS),
        FormField::select("service_type", "Service Type", SERVICE_TYPES),
        FormField::text("equipment", "Equipment", false),
        FormField::select("priority", "Priority", &priorities),
        FormField::select("status", "Status", &statuses),
    ]
}

pub fn ensure_option(field: &str, value: &str, options: &[&str]) -> Result<(), TicketError> {
    if options.contains(&value) {
        Ok(())
    } else {
        Err(TicketError::Validation(format!(
            "invalid {field}: {value}"
        )))
    }
}

/// Validates an optional select value, falling back to the field default.
pub fn checked_option(
    field: &str,
    value: Option<String>,
    options: &[&str],
) -> Result<String, TicketError> {
    match value {
        Some(v) => {
            ensure_option(field, &v, options)?;
            Ok(v)
        }
        None => {
            let default = match field {
                "call_source" => DEFAULT_CALL_SOURCE,
                "call_reason" => DEFAULT_CALL_REASON,
                _ => DEFAULT_SERVICE_TYPE,
            };
            Ok(default.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_form_field() {
        let names: Vec<&str> = ticket_form().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "caller_name",
                "caller_contact",
                "issue_type",
                "call_source",
                "call_reason",
                "service_type",
                "equipment",
                "priority",
                "status",
            ]
        );
    }

    #[test]
    fn select_fields_carry_their_options() {
        let form = ticket_form();
        let priority = form
            .iter()
            .find(|f| f.name == "priority")
            .expect("priority field");
        assert_eq!(priority.options, vec!["Low", "Medium", "High", "Critical"]);
    }

    #[test]
    fn form_serializes_with_lowercase_kinds() {
        let value = serde_json::to_value(ticket_form()).expect("serialize form");
        let first = &value[0];
        assert_eq!(first["name"], "caller_name");
        assert_eq!(first["kind"], "text");
        assert_eq!(first["required"], true);

        let priority = &value[7];
        assert_eq!(priority["kind"], "select");
        assert_eq!(priority["options"][3], "Critical");
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(ensure_option("call_source", "phone", CALL_SOURCES).is_ok());
        assert!(ensure_option("call_source", "fax", CALL_SOURCES).is_err());
    }
}
