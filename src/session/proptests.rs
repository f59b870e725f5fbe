//! Property-based tests for the session primitives

use super::cooldown::{Gate, RateLimiter};
use super::dialogue::{transition, DialogueEvent, DialogueState, Directive};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn arb_event() -> impl Strategy<Value = DialogueEvent> {
    prop_oneof![
        Just(DialogueEvent::Start),
        Just(DialogueEvent::RandomJoke),
        proptest::option::of("[a-z]{1,12}")
            .prop_map(|topic| DialogueEvent::JokeCommand { topic }),
        "[ a-z]{0,24}".prop_map(|text| DialogueEvent::Text { text }),
    ]
}

proptest! {
    #[test]
    fn cooldown_rejects_with_ceiled_remaining(
        window_secs in 1u64..3600,
        elapsed_ms in 0u64..3_600_000,
    ) {
        prop_assume!(elapsed_ms < window_secs * 1000);
        let limiter = RateLimiter::new(Duration::from_secs(window_secs));
        let t0 = Instant::now();
        limiter.record(7, t0);

        let gate = limiter.check(7, t0 + Duration::from_millis(elapsed_ms));
        let expected = (window_secs * 1000 - elapsed_ms).div_ceil(1000);
        prop_assert_eq!(gate, Gate::Reject { remaining_secs: expected });
    }

    #[test]
    fn cooldown_accepts_once_window_elapsed(
        window_secs in 1u64..3600,
        extra_ms in 0u64..60_000,
    ) {
        let limiter = RateLimiter::new(Duration::from_secs(window_secs));
        let t0 = Instant::now();
        limiter.record(7, t0);

        let later = t0 + Duration::from_secs(window_secs) + Duration::from_millis(extra_ms);
        prop_assert_eq!(limiter.check(7, later), Gate::Accept);
    }

    /// A generation directive never leaves the user stuck mid-dialogue.
    #[test]
    fn generation_always_leaves_idle(event in arb_event()) {
        for state in [DialogueState::Idle, DialogueState::AwaitingTopic] {
            let (next, directive) = transition(state, event.clone());
            if matches!(directive, Directive::Generate(_)) {
                prop_assert_eq!(next, DialogueState::Idle);
            }
        }
    }

    /// Only a topic-less joke command moves an idle user into AwaitingTopic.
    #[test]
    fn awaiting_topic_only_from_topicless_command(event in arb_event()) {
        let (next, _) = transition(DialogueState::Idle, event.clone());
        let awaiting = next == DialogueState::AwaitingTopic;
        let topicless = matches!(event, DialogueEvent::JokeCommand { topic: None });
        prop_assert_eq!(awaiting, topicless);
    }
}
