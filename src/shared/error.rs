use axum::http::StatusCode;
use thiserror::Error;

/// Domain error surfaced by ticket and dashboard operations. Handlers turn
/// this into the `(StatusCode, String)` pair axum responds with; nothing is
/// retried or recovered automatically.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket {0} not found")]
    NotFound(i32),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl From<TicketError> for (StatusCode, String) {
    fn from(err: TicketError) -> Self {
        let status = match &err {
            TicketError::NotFound(_) => StatusCode::NOT_FOUND,
            TicketError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TicketError::Storage(_) | TicketError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, err.to_string())
    }
}
