use shoplist_core::Item;

use crate::envelope::{OutputSpeech, Reprompt, ResponseBody, ResponseEnvelope, ENVELOPE_VERSION};
use crate::session::SessionContext;

pub const MAX_ITEMS_REPORTED: usize = 5;

pub const LAUNCH_PROMPT: &str = "Here is your shopping list, what would you like to do?";
pub const HELP_TEXT: &str = "I can't help with that at the moment, sorry.";
pub const FAREWELL: &str = "See you later!";
pub const FOLLOW_UP: &str = "Anything else?";
pub const LIST_CLEARED: &str = "List cleared";
pub const EMPTY_LIST: &str = "The shopping list is empty.";
pub const BACKEND_FAILURE: &str = "Sorry, something went wrong.";
pub const BACKEND_TIMEOUT: &str = "Sorry, your shopping list is taking too long to answer.";
pub const UNHANDLED_ERROR: &str = "Sorry, I had trouble doing what you asked. Please try again.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillResponse {
    pub speech: Option<String>,
    pub reprompt: Option<String>,
    pub end_session: Option<bool>,
}

impl SkillResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_envelope(self, session: &SessionContext) -> ResponseEnvelope {
        ResponseEnvelope {
            version: ENVELOPE_VERSION.to_owned(),
            response: ResponseBody {
                output_speech: self.speech.map(OutputSpeech::plain),
                reprompt: self
                    .reprompt
                    .map(|text| Reprompt { output_speech: OutputSpeech::plain(text) }),
                should_end_session: self.end_session,
            },
            session_attributes: session.attributes(),
        }
    }
}

/// Fluent builder mirroring the platform SDK's response builder: a reprompt
/// keeps the session open.
#[derive(Default)]
pub struct ResponseBuilder {
    response: SkillResponse,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speak(mut self, text: impl Into<String>) -> Self {
        self.response.speech = Some(text.into());
        self
    }

    pub fn reprompt(mut self, text: impl Into<String>) -> Self {
        self.response.reprompt = Some(text.into());
        self.response.end_session = Some(false);
        self
    }

    pub fn end_session(mut self) -> Self {
        self.response.end_session = Some(true);
        self
    }

    pub fn build(self) -> SkillResponse {
        self.response
    }
}

pub fn added_item(item: &str, launched: bool) -> String {
    if launched {
        format!("I have added {item}. {FOLLOW_UP}")
    } else {
        format!("I have added {item}.")
    }
}

/// Describes the list, naming at most [`MAX_ITEMS_REPORTED`] items in the
/// order the backend returned them.
pub fn list_summary(items: &[Item]) -> String {
    let total = items.len();
    let shown: Vec<&str> =
        items.iter().take(MAX_ITEMS_REPORTED).map(|item| item.name.as_str()).collect();

    match total {
        0 => EMPTY_LIST.to_owned(),
        1 => format!("There is one item on your list: {}", shown[0]),
        _ if total <= MAX_ITEMS_REPORTED => {
            format!("There are {total} items on your list: {}", join_spoken(&shown))
        }
        _ => format!(
            "There are {total} items on your list. The last {} are: {}",
            shown.len(),
            join_spoken(&shown)
        ),
    }
}

/// `["a", "b", "c"]` → `"a, b and c"`.
pub fn join_spoken(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_owned(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

pub fn reflect(intent_name: &str) -> String {
    format!("You just triggered {intent_name}")
}
