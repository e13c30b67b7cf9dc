use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use shoplist_backends::SharedBackend;
use shoplist_core::InterfaceError;
use shoplist_skill::{
    IntentRouter, RequestContext, RequestEnvelope, ResponseEnvelope, SessionStore,
};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SkillState {
    pub router: Arc<IntentRouter<SharedBackend>>,
    pub sessions: Arc<SessionStore>,
    pub application_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

type Rejection = (StatusCode, Json<ErrorBody>);

pub fn router(state: SkillState) -> Router {
    Router::new().route("/skill", post(handle)).with_state(state)
}

pub async fn handle(
    State(state): State<SkillState>,
    payload: Result<Json<RequestEnvelope>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, Rejection> {
    let Json(envelope) = payload.map_err(|rejection| {
        let status = rejection.status();
        let error = InterfaceError::BadRequest {
            message: rejection.body_text(),
            correlation_id: Uuid::new_v4().to_string(),
        };
        reject(status, error)
    })?;

    let ctx = request_context(&envelope);
    check_application(&state, &envelope, &ctx)?;

    let mut session = state.sessions.load(envelope.session.as_ref()).await;
    let response = state.router.route(&envelope.request, &mut session, &ctx).await;

    if response.end_session == Some(true) {
        session.mark_ended();
        if let Some(session_id) = session.session_id() {
            state.sessions.end(session_id).await;
        }
    } else {
        state.sessions.save(&session).await;
    }

    debug!(
        event_name = "skill.response.sent",
        correlation_id = %ctx.correlation_id,
        has_speech = response.speech.is_some(),
        has_reprompt = response.reprompt.is_some(),
        "skill response ready"
    );

    Ok(Json(response.into_envelope(&session)))
}

fn request_context(envelope: &RequestEnvelope) -> RequestContext {
    let request_id = envelope.request.request_id.trim();
    if request_id.is_empty() {
        RequestContext::new(Uuid::new_v4().to_string())
    } else {
        RequestContext::new(request_id)
    }
}

fn check_application(
    state: &SkillState,
    envelope: &RequestEnvelope,
    ctx: &RequestContext,
) -> Result<(), Rejection> {
    let Some(expected) = state.application_id.as_deref() else {
        return Ok(());
    };

    let received = envelope.application_id();
    if received == Some(expected) {
        return Ok(());
    }

    warn!(
        event_name = "skill.request.forbidden",
        correlation_id = %ctx.correlation_id,
        received_application_id = received.unwrap_or("none"),
        "rejecting request for a different application"
    );

    Err(reject(
        StatusCode::FORBIDDEN,
        InterfaceError::Forbidden {
            message: format!("application id `{}` is not accepted", received.unwrap_or("none")),
            correlation_id: ctx.correlation_id.clone(),
        },
    ))
}

fn reject(status: StatusCode, error: InterfaceError) -> Rejection {
    let body = ErrorBody {
        error: error.user_message(),
        detail: error.to_string(),
        correlation_id: error.correlation_id().to_owned(),
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use shoplist_backends::{InMemoryListBackend, SharedBackend};
    use shoplist_skill::{IntentRouter, SessionStore};
    use tower::ServiceExt;

    use crate::skill::{router, SkillState};

    fn state(application_id: Option<&str>) -> SkillState {
        let backend: SharedBackend = Arc::new(InMemoryListBackend::default());
        SkillState {
            router: Arc::new(IntentRouter::new(backend, Duration::from_secs(5))),
            sessions: Arc::new(SessionStore::default()),
            application_id: application_id.map(str::to_owned),
        }
    }

    fn envelope(session_id: &str, new: bool, request: Value) -> Value {
        json!({
            "version": "1.0",
            "session": {
                "new": new,
                "sessionId": session_id,
                "application": { "applicationId": "amzn1.ask.skill.shoplist" },
                "attributes": {}
            },
            "request": request
        })
    }

    fn intent(request_id: &str, name: &str, slots: Value) -> Value {
        json!({
            "type": "IntentRequest",
            "requestId": request_id,
            "locale": "en-US",
            "intent": { "name": name, "slots": slots }
        })
    }

    async fn post(app: &Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/skill")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn launch_then_add_keeps_session_open_with_follow_up() {
        let state = state(None);
        let app = router(state.clone());

        let (status, launch) = post(
            &app,
            envelope("s-1", true, json!({ "type": "LaunchRequest", "requestId": "r-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            launch["response"]["outputSpeech"]["text"],
            "Here is your shopping list, what would you like to do?"
        );
        assert_eq!(launch["response"]["shouldEndSession"], false);
        assert_eq!(launch["sessionAttributes"]["launched"], true);

        let (_, added) = post(
            &app,
            envelope(
                "s-1",
                false,
                intent("r-2", "AddItemIntent", json!({ "item": { "name": "item", "value": "milk" } })),
            ),
        )
        .await;
        assert_eq!(added["response"]["outputSpeech"]["text"], "I have added Milk. Anything else?");
        assert_eq!(added["response"]["reprompt"]["outputSpeech"]["text"], "Anything else?");
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn one_shot_add_has_no_reprompt_and_omits_should_end_session() {
        let app = router(state(None));

        let (status, added) = post(
            &app,
            envelope(
                "s-2",
                true,
                intent("r-1", "AddItemIntent", json!({ "item": { "name": "item", "value": "eggs" } })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["response"]["outputSpeech"]["text"], "I have added Eggs.");
        assert!(added["response"].get("reprompt").is_none());
        assert!(added["response"].get("shouldEndSession").is_none());
    }

    #[tokio::test]
    async fn farewell_ends_session_and_evicts_stored_flag() {
        let state = state(None);
        let app = router(state.clone());
        post(&app, envelope("s-3", true, json!({ "type": "LaunchRequest", "requestId": "r-1" })))
            .await;
        assert_eq!(state.sessions.len().await, 1);

        let (_, bye) =
            post(&app, envelope("s-3", false, intent("r-2", "AMAZON.StopIntent", json!({}))))
                .await;

        assert_eq!(bye["response"]["outputSpeech"]["text"], "See you later!");
        assert_eq!(bye["response"]["shouldEndSession"], true);
        assert_eq!(bye["sessionAttributes"]["launched"], false);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn session_ended_request_returns_no_speech() {
        let state = state(None);
        let app = router(state.clone());
        post(&app, envelope("s-4", true, json!({ "type": "LaunchRequest", "requestId": "r-1" })))
            .await;

        let (status, ended) = post(
            &app,
            envelope(
                "s-4",
                false,
                json!({ "type": "SessionEndedRequest", "requestId": "r-2", "reason": "USER_INITIATED" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(ended["response"].get("outputSpeech").is_none());
        assert_eq!(ended["sessionAttributes"]["launched"], false);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn mismatched_application_id_is_forbidden() {
        let state = state(Some("amzn1.ask.skill.other"));
        let app = router(state.clone());

        let (status, body) = post(
            &app,
            envelope("s-5", true, json!({ "type": "LaunchRequest", "requestId": "r-forbidden" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["correlation_id"], "r-forbidden");
        assert!(state.sessions.is_empty().await, "rejected requests are never routed");
    }

    #[tokio::test]
    async fn matching_application_id_is_accepted() {
        let app = router(state(Some("amzn1.ask.skill.shoplist")));

        let (status, _) = post(
            &app,
            envelope("s-6", true, json!({ "type": "LaunchRequest", "requestId": "r-1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let app = router(state(None));
        let request = Request::builder()
            .method("POST")
            .uri("/skill")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn unsupported_request_type_gets_error_handler_speech() {
        let app = router(state(None));

        let (status, body) = post(
            &app,
            envelope("s-7", true, json!({ "type": "CanFulfillIntentRequest", "requestId": "r-1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"]["outputSpeech"]["text"],
            "Sorry, I had trouble doing what you asked. Please try again."
        );
        assert_eq!(body["response"]["shouldEndSession"], false);
    }
}
