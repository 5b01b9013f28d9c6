use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use handlebars::Handlebars;
use handlebars::TemplateError;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_contact::create_contact;
use super::handlers::delete_contact::delete_contact;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_contact::get_contact;
use super::handlers::health::health;
use super::handlers::list_contacts::list_contacts;
use super::handlers::login::login;
use super::handlers::register::register;
use super::handlers::reset_password::register_templates;
use super::handlers::reset_password::reset_password;
use super::handlers::reset_password::reset_password_form;
use super::handlers::reset_password::reset_password_submit;
use super::handlers::update_contact::update_contact;
use super::middleware::authenticate as auth_middleware;
use crate::contact::ports::ContactServicePort;
use crate::credential::ports::CredentialServicePort;
use crate::outbound::events::ConsumerHealth;

#[derive(Clone)]
pub struct AppState {
    pub credential_service: Arc<dyn CredentialServicePort>,
    pub contact_service: Arc<dyn ContactServicePort>,
    pub tokens: Arc<TokenIssuer>,
    pub templates: Arc<Handlebars<'static>>,
    pub consumer_health: watch::Receiver<ConsumerHealth>,
}

/// Build the HTTP surface.
///
/// # Errors
/// * `TemplateError` - An embedded HTML template failed to compile
pub fn create_router(
    credential_service: Arc<dyn CredentialServicePort>,
    contact_service: Arc<dyn ContactServicePort>,
    tokens: Arc<TokenIssuer>,
    consumer_health: watch::Receiver<ConsumerHealth>,
) -> Result<Router, TemplateError> {
    let mut templates = Handlebars::new();
    register_templates(&mut templates)?;

    let state = AppState {
        credential_service,
        contact_service,
        tokens,
        templates: Arc::new(templates),
        consumer_health,
    };

    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route(
            "/api/auth/reset-password",
            get(reset_password_form).post(reset_password),
        )
        .route("/api/auth/reset-password-form", post(reset_password_submit))
        .route("/api/health", get(health));

    let protected_routes = Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/:contact_id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Query strings carry reset tokens; only paths are logged
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state))
}
