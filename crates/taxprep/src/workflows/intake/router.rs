use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde_json::{json, Value};

use super::notify::{match_auto_reply, AutoReplyRule, InboundLog, InboundSms, SmsGateway, SmsOutbox};
use super::service::{IntakeError, IntakeService};
use super::store::SheetStore;

/// Shared state behind the intake routes.
pub struct IntakeState<S, G> {
    pub service: Arc<IntakeService<S>>,
    pub outbox: Arc<SmsOutbox>,
    pub gateway: Arc<G>,
    pub inbound: Arc<InboundLog>,
    pub auto_replies: Arc<Vec<AutoReplyRule>>,
}

impl<S, G> Clone for IntakeState<S, G> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            outbox: self.outbox.clone(),
            gateway: self.gateway.clone(),
            inbound: self.inbound.clone(),
            auto_replies: self.auto_replies.clone(),
        }
    }
}

/// Router builder exposing the webhook endpoints: form intake, inbound
/// SMS, and outbox dispatch/inspection.
pub fn intake_router<S, G>(state: IntakeState<S, G>) -> Router
where
    S: SheetStore + 'static,
    G: SmsGateway + 'static,
{
    Router::new()
        .route("/api/v1/forms", post(intake_handler::<S, G>))
        .route("/api/v1/sms/inbound", post(inbound_handler::<S, G>))
        .route("/api/v1/sms/dispatch", post(dispatch_handler::<S, G>))
        .route("/api/v1/sms/outbox", get(outbox_handler::<S, G>))
        .with_state(state)
}

pub(crate) async fn intake_handler<S, G>(
    State(state): State<IntakeState<S, G>>,
    axum::Json(payload): axum::Json<Value>,
) -> Response
where
    S: SheetStore + 'static,
    G: SmsGateway + 'static,
{
    match state.service.handle(&payload, Local::now()) {
        Ok(receipt) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Err(IntakeError::Validation(errors)) => {
            let payload = json!({
                "result": "error",
                "errors": errors.0,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(
            err @ (IntakeError::MalformedBody
            | IntakeError::MissingCategory
            | IntakeError::UnknownCategory(_)),
        ) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn inbound_handler<S, G>(
    State(state): State<IntakeState<S, G>>,
    axum::Json(message): axum::Json<InboundSms>,
) -> Response
where
    S: SheetStore + 'static,
    G: SmsGateway + 'static,
{
    let reply = match_auto_reply(&state.auto_replies, &message.body).map(str::to_string);
    state
        .inbound
        .record(message, reply.is_some(), Local::now());

    (StatusCode::OK, axum::Json(json!({ "reply": reply }))).into_response()
}

pub(crate) async fn dispatch_handler<S, G>(State(state): State<IntakeState<S, G>>) -> Response
where
    S: SheetStore + 'static,
    G: SmsGateway + 'static,
{
    let summary = state.outbox.dispatch(state.gateway.as_ref(), Local::now());
    (StatusCode::OK, axum::Json(summary)).into_response()
}

pub(crate) async fn outbox_handler<S, G>(State(state): State<IntakeState<S, G>>) -> Response
where
    S: SheetStore + 'static,
    G: SmsGateway + 'static,
{
    (StatusCode::OK, axum::Json(state.outbox.snapshot())).into_response()
}
