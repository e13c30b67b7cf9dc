use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use shoplist_core::{normalize_item_name, BackendError, DomainError, ListBackend};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::envelope::{Request, RequestKind};
use crate::session::SessionContext;
use crate::speech::{self, ResponseBuilder, SkillResponse};

pub const ADD_ITEM_INTENT: &str = "AddItemIntent";
pub const LIST_ITEMS_INTENT: &str = "ListItemsIntent";
pub const CLEAR_COMPLETED_ITEMS_INTENT: &str = "ClearCompletedItemsIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const NO_INTENT: &str = "AMAZON.NoIntent";

pub const ITEM_SLOT: &str = "item";

/// The handler a request resolves to. `Reflect` is reached only through the
/// wildcard arm of [`classify`], after every named intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Launch,
    AddItem { item: Option<&'a str> },
    ListItems,
    ClearCompletedItems,
    Help,
    Farewell,
    SessionEnded,
    Reflect { intent_name: &'a str },
    Unsupported { request_type: &'a str },
}

impl Route<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::AddItem { .. } => "add_item",
            Self::ListItems => "list_items",
            Self::ClearCompletedItems => "clear_completed_items",
            Self::Help => "help",
            Self::Farewell => "farewell",
            Self::SessionEnded => "session_ended",
            Self::Reflect { .. } => "reflect",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

pub fn classify(request: &Request) -> Route<'_> {
    match &request.kind {
        RequestKind::Launch => Route::Launch,
        RequestKind::Intent(intent) => match intent.name.as_str() {
            ADD_ITEM_INTENT => Route::AddItem { item: intent.slot_value(ITEM_SLOT) },
            LIST_ITEMS_INTENT => Route::ListItems,
            CLEAR_COMPLETED_ITEMS_INTENT => Route::ClearCompletedItems,
            HELP_INTENT => Route::Help,
            CANCEL_INTENT | STOP_INTENT | NO_INTENT => Route::Farewell,
            other => Route::Reflect { intent_name: other },
        },
        RequestKind::SessionEnded { .. } => Route::SessionEnded,
        RequestKind::Unsupported { request_type } => Route::Unsupported { request_type },
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no handler for request type `{0}`")]
    UnsupportedRequest(String),
    #[error("intent `{intent}` is missing slot `{slot}`")]
    MissingSlot { intent: &'static str, slot: &'static str },
    #[error("invalid value for slot `{slot}`")]
    InvalidSlot {
        slot: &'static str,
        #[source]
        source: DomainError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }
}

pub struct IntentRouter<B> {
    backend: B,
    backend_timeout: Duration,
}

impl<B> IntentRouter<B>
where
    B: ListBackend,
{
    pub fn new(backend: B, backend_timeout: Duration) -> Self {
        Self { backend, backend_timeout }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Produces exactly one response for `request`. Handler errors and
    /// unrouted requests go through the error handler.
    pub async fn route(
        &self,
        request: &Request,
        session: &mut SessionContext,
        ctx: &RequestContext,
    ) -> SkillResponse {
        let route = classify(request);
        info!(
            event_name = "skill.request.routed",
            correlation_id = %ctx.correlation_id,
            session_id = session.session_id().unwrap_or("none"),
            request_type = request.kind.request_type(),
            route = route.label(),
            launched = session.launched(),
            "routing skill request"
        );

        match self.dispatch(route, session, ctx).await {
            Ok(response) => response,
            Err(route_error) => handle_error(&route_error, ctx),
        }
    }

    async fn dispatch(
        &self,
        route: Route<'_>,
        session: &mut SessionContext,
        ctx: &RequestContext,
    ) -> Result<SkillResponse, RouteError> {
        match route {
            Route::Launch => {
                session.mark_launched();
                Ok(ResponseBuilder::new()
                    .speak(speech::LAUNCH_PROMPT)
                    .reprompt(speech::LAUNCH_PROMPT)
                    .build())
            }
            Route::AddItem { item } => self.add_item(item, session, ctx).await,
            Route::ListItems => Ok(self.list_items(session, ctx).await),
            Route::ClearCompletedItems => Ok(self.clear_completed_items(session, ctx).await),
            Route::Help => {
                Ok(ResponseBuilder::new().speak(speech::HELP_TEXT).reprompt(speech::HELP_TEXT).build())
            }
            Route::Farewell => Ok(ResponseBuilder::new().speak(speech::FAREWELL).end_session().build()),
            Route::SessionEnded => {
                session.mark_ended();
                Ok(SkillResponse::empty())
            }
            Route::Reflect { intent_name } => {
                Ok(ResponseBuilder::new().speak(speech::reflect(intent_name)).build())
            }
            Route::Unsupported { request_type } => {
                Err(RouteError::UnsupportedRequest(request_type.to_owned()))
            }
        }
    }

    async fn add_item(
        &self,
        item: Option<&str>,
        session: &SessionContext,
        ctx: &RequestContext,
    ) -> Result<SkillResponse, RouteError> {
        let raw = item.ok_or(RouteError::MissingSlot { intent: ADD_ITEM_INTENT, slot: ITEM_SLOT })?;
        let name = normalize_item_name(raw)
            .map_err(|source| RouteError::InvalidSlot { slot: ITEM_SLOT, source })?;

        let speech = match self.call(self.backend.create(&name)).await {
            Ok(()) => {
                info!(
                    event_name = "skill.item.added",
                    correlation_id = %ctx.correlation_id,
                    backend = self.backend.name(),
                    item = %name,
                    "item added to list"
                );
                speech::added_item(&name, session.launched())
            }
            Err(backend_error) => {
                self.log_backend_failure("create", &backend_error, ctx);
                failure_speech(&backend_error).to_owned()
            }
        };

        Ok(with_follow_up(ResponseBuilder::new().speak(speech), session).build())
    }

    async fn list_items(&self, session: &SessionContext, ctx: &RequestContext) -> SkillResponse {
        let speech = match self.call(self.backend.list()).await {
            Ok(items) => speech::list_summary(&items),
            Err(backend_error) => {
                self.log_backend_failure("list", &backend_error, ctx);
                failure_speech(&backend_error).to_owned()
            }
        };

        with_follow_up(ResponseBuilder::new().speak(speech), session).build()
    }

    async fn clear_completed_items(
        &self,
        session: &SessionContext,
        ctx: &RequestContext,
    ) -> SkillResponse {
        let speech = match self.call(self.backend.clear()).await {
            Ok(()) => speech::LIST_CLEARED,
            Err(backend_error) => {
                self.log_backend_failure("clear", &backend_error, ctx);
                failure_speech(&backend_error)
            }
        };

        with_follow_up(ResponseBuilder::new().speak(speech), session).build()
    }

    async fn call<T, F>(&self, operation: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.backend_timeout, operation).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BackendError::Timeout(self.backend_timeout)),
        }
    }

    fn log_backend_failure(&self, operation: &str, error: &BackendError, ctx: &RequestContext) {
        warn!(
            event_name = "skill.backend.failed",
            correlation_id = %ctx.correlation_id,
            backend = self.backend.name(),
            operation,
            timed_out = error.is_timeout(),
            error = %error,
            "list backend call failed"
        );
    }
}

fn with_follow_up(builder: ResponseBuilder, session: &SessionContext) -> ResponseBuilder {
    if session.launched() {
        builder.reprompt(speech::FOLLOW_UP)
    } else {
        builder
    }
}

fn failure_speech(error: &BackendError) -> &'static str {
    if error.is_timeout() {
        speech::BACKEND_TIMEOUT
    } else {
        speech::BACKEND_FAILURE
    }
}

/// Platform-level catch-all. Never retries; always asks the user again.
pub fn handle_error(route_error: &RouteError, ctx: &RequestContext) -> SkillResponse {
    error!(
        event_name = "skill.request.unhandled",
        correlation_id = %ctx.correlation_id,
        error = %route_error,
        error_chain = %error_chain(route_error),
        "request reached the error handler"
    );

    ResponseBuilder::new()
        .speak(speech::UNHANDLED_ERROR)
        .reprompt(speech::UNHANDLED_ERROR)
        .build()
}

fn error_chain(error: &dyn StdError) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join(": ")
}
