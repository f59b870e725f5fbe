//! Dialogue state machine
//!
//! Pure transition function over per-user dialogue state. Nothing here
//! performs I/O; the controller executes the returned directive.

pub const WELCOME_TEXT: &str = "Hi! I'm a bot that can generate jokes. \
    Use the commands /generate_random_joke or /generate_joke <topic>.";
pub const ASK_TOPIC_TEXT: &str =
    "What should the joke be about? Send the topic as your next message.";

const RANDOM_JOKE_PROMPT: &str = "Generate a random joke";

/// Per-user dialogue position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    /// A topic-less `/generate_joke` was received; the next text message is
    /// taken as the topic.
    AwaitingTopic,
}

/// One inbound chat event, already parsed from transport text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    Start,
    RandomJoke,
    JokeCommand { topic: Option<String> },
    Text { text: String },
}

/// A generation request handed to the flow: the backend prompt plus the
/// progress acknowledgement shown while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeRequest {
    pub prompt: String,
    pub ack: String,
}

/// What the controller should do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    SendWelcome,
    AskForTopic,
    Generate(JokeRequest),
    Ignore,
}

/// Pure transition function.
///
/// A command received while awaiting a topic abandons the pending topic
/// request and is handled as if the user were idle.
pub fn transition(state: DialogueState, event: DialogueEvent) -> (DialogueState, Directive) {
    match (state, event) {
        (_, DialogueEvent::Start) => (DialogueState::Idle, Directive::SendWelcome),

        (_, DialogueEvent::RandomJoke) => {
            (DialogueState::Idle, Directive::Generate(random_joke()))
        }

        (_, DialogueEvent::JokeCommand { topic: Some(topic) }) => {
            (DialogueState::Idle, Directive::Generate(topic_joke(topic.trim())))
        }

        (_, DialogueEvent::JokeCommand { topic: None }) => {
            (DialogueState::AwaitingTopic, Directive::AskForTopic)
        }

        (DialogueState::AwaitingTopic, DialogueEvent::Text { text }) => {
            let topic = text.trim();
            if topic.is_empty() {
                // Nothing usable as a topic; keep waiting.
                (DialogueState::AwaitingTopic, Directive::AskForTopic)
            } else {
                (DialogueState::Idle, Directive::Generate(topic_joke(topic)))
            }
        }

        (DialogueState::Idle, DialogueEvent::Text { .. }) => {
            (DialogueState::Idle, Directive::Ignore)
        }
    }
}

fn random_joke() -> JokeRequest {
    JokeRequest {
        prompt: RANDOM_JOKE_PROMPT.to_string(),
        ack: "Generating a random joke...".to_string(),
    }
}

fn topic_joke(topic: &str) -> JokeRequest {
    JokeRequest {
        prompt: format!("Generate a joke on the topic: {topic}"),
        ack: format!("Generating a joke on the topic: {topic}..."),
    }
}
