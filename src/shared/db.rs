use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::QueryResult;

/// Connection over either backend. `establish` picks the variant from the
/// URL: `postgres://...` connects over the network, anything else is treated
/// as a SQLite file path (`:memory:` included).
#[derive(diesel::MultiConnection)]
pub enum AnyConnection {
    Postgresql(diesel::PgConnection),
    Sqlite(diesel::SqliteConnection),
}

pub type DbPool = Pool<ConnectionManager<AnyConnection>>;

pub fn create_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<AnyConnection>::new(database_url);
    Pool::builder().build(manager)
}

const PG_DDL: &str = "\
CREATE TABLE IF NOT EXISTS tickets (
    id SERIAL PRIMARY KEY,
    ticket_number TEXT NOT NULL UNIQUE,
    caller_name TEXT NOT NULL,
    caller_contact TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    call_source TEXT NOT NULL,
    call_reason TEXT NOT NULL,
    service_type TEXT NOT NULL,
    equipment TEXT,
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    sla_due TIMESTAMP NOT NULL,
    resolved_at TIMESTAMP,
    closed_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS ticket_events (
    id SERIAL PRIMARY KEY,
    ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
    actor TEXT NOT NULL,
    kind TEXT NOT NULL,
    note TEXT,
    old_status TEXT,
    new_status TEXT,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets (status);
CREATE INDEX IF NOT EXISTS idx_ticket_events_ticket ON ticket_events (ticket_id);
";

const SQLITE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_number TEXT NOT NULL UNIQUE,
    caller_name TEXT NOT NULL,
    caller_contact TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    call_source TEXT NOT NULL,
    call_reason TEXT NOT NULL,
    service_type TEXT NOT NULL,
    equipment TEXT,
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    sla_due TIMESTAMP NOT NULL,
    resolved_at TIMESTAMP,
    closed_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS ticket_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
    actor TEXT NOT NULL,
    kind TEXT NOT NULL,
    note TEXT,
    old_status TEXT,
    new_status TEXT,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets (status);
CREATE INDEX IF NOT EXISTS idx_ticket_events_ticket ON ticket_events (ticket_id);
";

/// Creates both tables if they do not exist yet. The DDL differs per backend
/// only in the auto-increment primary key syntax.
pub fn init_schema(conn: &mut AnyConnection) -> QueryResult<()> {
    let ddl = match conn {
        AnyConnection::Postgresql(_) => PG_DDL,
        AnyConnection::Sqlite(_) => SQLITE_DDL,
    };
    conn.batch_execute(ddl)
}
