//! Combines the ticket CRUD, dashboard, and UI routers into one app router.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::tickets::configure_tickets_routes())
        .merge(crate::tickets::ui::configure_tickets_ui_routes())
        .merge(crate::dashboard::configure_dashboard_routes())
}
