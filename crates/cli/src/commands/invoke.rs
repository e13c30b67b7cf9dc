use clap::ValueEnum;
use shoplist_backends::build_backend;
use shoplist_skill::envelope::{Intent, RequestEnvelope, RequestKind};
use shoplist_skill::router::ITEM_SLOT;
use shoplist_skill::{IntentRouter, RequestContext, SessionContext};

use crate::commands::{load_config, runtime, CommandResult, BACKEND_EXIT, CONFIG_EXIT};

const COMMAND: &str = "invoke";
const SESSION_ID: &str = "shoplist-cli-session";
const REQUEST_ID: &str = "shoplist-cli-request";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InvokeKind {
    Launch,
    Intent,
    SessionEnded,
}

#[derive(Clone, Debug)]
pub struct InvokeArgs {
    pub kind: InvokeKind,
    pub intent: Option<String>,
    pub item: Option<String>,
    pub launched: bool,
}

/// Replays a single request against the configured backend. The session only
/// lives for this call, so `--launched` stands in for an earlier launch.
pub fn run(args: InvokeArgs) -> CommandResult {
    let kind = match request_kind(&args) {
        Ok(kind) => kind,
        Err(failure) => return failure,
    };
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let envelope = RequestEnvelope::new(Some(SESSION_ID), REQUEST_ID, kind);
    let mut session = SessionContext::new(SESSION_ID);
    if args.launched {
        session.mark_launched();
    }

    let routed = runtime.block_on(async {
        let backend = build_backend(&config).await?;
        let router = IntentRouter::new(backend, config.backend.timeout());
        let ctx = RequestContext::new(REQUEST_ID);
        Ok::<_, shoplist_backends::BackendInitError>(
            router.route(&envelope.request, &mut session, &ctx).await,
        )
    });

    let response = match routed {
        Ok(response) => response,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "backend_init",
                error.to_string(),
                BACKEND_EXIT,
            );
        }
    };

    match serde_json::to_string_pretty(&response.into_envelope(&session)) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
    }
}

fn request_kind(args: &InvokeArgs) -> Result<RequestKind, CommandResult> {
    match args.kind {
        InvokeKind::Launch => Ok(RequestKind::Launch),
        InvokeKind::SessionEnded => Ok(RequestKind::SessionEnded { reason: None }),
        InvokeKind::Intent => {
            let Some(name) = args.intent.as_deref() else {
                return Err(CommandResult::failure(
                    COMMAND,
                    "usage",
                    "`--intent <NAME>` is required for intent requests",
                    CONFIG_EXIT,
                ));
            };
            let intent = match args.item.as_deref() {
                Some(item) => Intent::new(name).with_slot(ITEM_SLOT, item),
                None => Intent::new(name),
            };
            Ok(RequestKind::Intent(intent))
        }
    }
}
