use axum::extract::State;
use axum::http::StatusCode;

use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::outbound::events::ConsumerHealth;

/// Report the notification consumer's state; 503 once it gave up.
pub async fn health(State(state): State<AppState>) -> ApiSuccess<ConsumerHealth> {
    let consumer = *state.consumer_health.borrow();

    let status = match consumer {
        ConsumerHealth::Failed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    ApiSuccess::new(status, "Consumer status.", consumer)
}
