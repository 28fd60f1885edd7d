diesel::table! {
    tickets (id) {
        id -> Integer,
        ticket_number -> Text,
        caller_name -> Text,
        caller_contact -> Text,
        issue_type -> Text,
        call_source -> Text,
        call_reason -> Text,
        service_type -> Text,
        equipment -> Nullable<Text>,
        priority -> Text,
        status -> Text,
        created_at -> Timestamp,
        sla_due -> Timestamp,
        resolved_at -> Nullable<Timestamp>,
        closed_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    ticket_events (id) {
        id -> Integer,
        ticket_id -> Integer,
        actor -> Text,
        kind -> Text,
        note -> Nullable<Text>,
        old_status -> Nullable<Text>,
        new_status -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::joinable!(ticket_events -> tickets (ticket_id));
diesel::allow_tables_to_appear_in_same_query!(tickets, ticket_events);
