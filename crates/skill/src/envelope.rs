use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ENVELOPE_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub context: Option<Context>,
    pub request: Request,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    pub session_id: String,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Context {
    #[serde(rename = "System", default)]
    pub system: Option<SystemContext>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SystemContext {
    #[serde(default)]
    pub application: Option<Application>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRequest")]
pub struct Request {
    pub request_id: String,
    pub locale: Option<String>,
    pub kind: RequestKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Launch,
    Intent(Intent),
    SessionEnded { reason: Option<String> },
    Unsupported { request_type: String },
}

impl RequestKind {
    pub fn request_type(&self) -> &str {
        match self {
            Self::Launch => "LaunchRequest",
            Self::Intent(_) => "IntentRequest",
            Self::SessionEnded { .. } => "SessionEndedRequest",
            Self::Unsupported { request_type } => request_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: BTreeMap<String, Slot>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), slots: BTreeMap::new() }
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.slots.insert(name.clone(), Slot { name, value: Some(value.into()) });
        self
    }

    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|slot| slot.value.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(rename = "type")]
    request_type: String,
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    intent: Option<Intent>,
    #[serde(default)]
    reason: Option<String>,
}

impl From<RawRequest> for Request {
    fn from(raw: RawRequest) -> Self {
        let kind = match (raw.request_type.as_str(), raw.intent) {
            ("LaunchRequest", _) => RequestKind::Launch,
            ("IntentRequest", Some(intent)) => RequestKind::Intent(intent),
            ("SessionEndedRequest", _) => RequestKind::SessionEnded { reason: raw.reason },
            _ => RequestKind::Unsupported { request_type: raw.request_type },
        };

        Self { request_id: raw.request_id, locale: raw.locale, kind }
    }
}

impl RequestEnvelope {
    pub fn new(session_id: Option<&str>, request_id: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_owned(),
            session: session_id.map(|session_id| Session {
                new: false,
                session_id: session_id.to_owned(),
                application: None,
                attributes: Map::new(),
            }),
            context: None,
            request: Request { request_id: request_id.into(), locale: None, kind },
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.session_id.as_str())
    }

    /// Application id from the session, falling back to `context.System`.
    pub fn application_id(&self) -> Option<&str> {
        let from_session = self
            .session
            .as_ref()
            .and_then(|session| session.application.as_ref())
            .map(|application| application.application_id.as_str());

        from_session.or_else(|| {
            self.context
                .as_ref()
                .and_then(|context| context.system.as_ref())
                .and_then(|system| system.application.as_ref())
                .map(|application| application.application_id.as_str())
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    pub response: ResponseBody,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub session_attributes: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub speech_type: &'static str,
    pub text: String,
}

impl OutputSpeech {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { speech_type: "PlainText", text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Intent, OutputSpeech, RequestEnvelope, RequestKind, ResponseBody, ResponseEnvelope};

    #[test]
    fn intent_request_with_slot_is_parsed() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "version": "1.0",
            "session": {
                "new": false,
                "sessionId": "amzn1.echo-api.session.1",
                "application": { "applicationId": "amzn1.ask.skill.abc" },
                "attributes": { "launched": true }
            },
            "request": {
                "type": "IntentRequest",
                "requestId": "amzn1.echo-api.request.1",
                "timestamp": "2026-10-17T09:00:00Z",
                "locale": "en-GB",
                "intent": {
                    "name": "AddItemIntent",
                    "confirmationStatus": "NONE",
                    "slots": { "item": { "name": "item", "value": "milk", "confirmationStatus": "NONE" } }
                }
            }
        }))
        .expect("parse");

        assert_eq!(envelope.session_id(), Some("amzn1.echo-api.session.1"));
        assert_eq!(envelope.application_id(), Some("amzn1.ask.skill.abc"));
        assert_eq!(envelope.request.request_id, "amzn1.echo-api.request.1");
        let RequestKind::Intent(intent) = &envelope.request.kind else {
            panic!("expected intent request");
        };
        assert_eq!(intent.name, "AddItemIntent");
        assert_eq!(intent.slot_value("item"), Some("milk"));
    }

    #[test]
    fn unfilled_slot_has_no_value() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "request": {
                "type": "IntentRequest",
                "requestId": "r-2",
                "intent": { "name": "AddItemIntent", "slots": { "item": { "name": "item" } } }
            }
        }))
        .expect("parse");

        let RequestKind::Intent(intent) = &envelope.request.kind else {
            panic!("expected intent request");
        };
        assert_eq!(intent.slot_value("item"), None);
        assert_eq!(envelope.session_id(), None);
    }

    #[test]
    fn unknown_request_types_are_kept_as_unsupported() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "request": { "type": "CanFulfillIntentRequest", "requestId": "r-3" }
        }))
        .expect("parse");

        assert_eq!(
            envelope.request.kind,
            RequestKind::Unsupported { request_type: "CanFulfillIntentRequest".to_owned() }
        );
    }

    #[test]
    fn session_ended_reason_and_system_application_are_read() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "context": { "System": { "application": { "applicationId": "amzn1.ask.skill.ctx" } } },
            "request": { "type": "SessionEndedRequest", "requestId": "r-4", "reason": "USER_INITIATED" }
        }))
        .expect("parse");

        assert_eq!(
            envelope.request.kind,
            RequestKind::SessionEnded { reason: Some("USER_INITIATED".to_owned()) }
        );
        assert_eq!(envelope.application_id(), Some("amzn1.ask.skill.ctx"));
    }

    #[test]
    fn response_omits_absent_fields() {
        let envelope = ResponseEnvelope {
            version: "1.0".to_owned(),
            response: ResponseBody {
                output_speech: Some(OutputSpeech::plain("See you later!")),
                reprompt: None,
                should_end_session: Some(true),
            },
            session_attributes: Default::default(),
        };

        assert_eq!(
            serde_json::to_value(&envelope).expect("serialize"),
            json!({
                "version": "1.0",
                "response": {
                    "outputSpeech": { "type": "PlainText", "text": "See you later!" },
                    "shouldEndSession": true
                }
            })
        );
    }

    #[test]
    fn intent_builder_sets_slot_values() {
        let intent = Intent::new("AddItemIntent").with_slot("item", "eggs");
        assert_eq!(intent.slot_value("item"), Some("eggs"));
        assert_eq!(intent.slot_value("quantity"), None);
    }
}
