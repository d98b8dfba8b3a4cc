mod common;

use common::{harness, harness_with_config, Read, ScriptedClassifier, ScriptedSource};
use face_gate::capture::SessionConfig;
use face_gate::session::{Phase, TickOutcome};
use proptest::prelude::*;

fn reads() -> impl Strategy<Value = Vec<Read>> {
    prop::collection::vec(
        prop_oneof![4 => Just(Read::Frame), 1 => Just(Read::Fail)],
        1..80,
    )
}

proptest! {
    #[test]
    fn never_authorized_stays_streaming(script in reads()) {
        let config = SessionConfig {
            max_consecutive_read_failures: 0,
            ..SessionConfig::default()
        };
        let ticks = script.len();
        let frames = script.iter().filter(|r| **r == Read::Frame).count();
        let mut h = harness_with_config(
            ScriptedSource::with_script(script),
            ScriptedClassifier::never(),
            config,
        );
        h.controller.activate();

        for _ in 0..ticks {
            let outcome = h.controller.tick();
            prop_assert!(matches!(outcome, TickOutcome::Displayed | TickOutcome::ReadFailed));
            prop_assert_eq!(h.controller.phase(), Phase::Streaming);
            prop_assert!(h.source.is_open_now());
        }

        prop_assert_eq!(h.view.frames_shown(), frames);
        prop_assert!(h.controller.identity().is_unknown());
        prop_assert!(h.controller.handoff_deadline().is_none());
    }

    #[test]
    fn first_authorization_stops_everything(authorize_at in 1u64..40, extra_ticks in 0usize..20) {
        let mut h = harness(
            ScriptedSource::new(),
            ScriptedClassifier::authorizing_on("Alice", &[authorize_at, authorize_at + 1]),
        );
        h.controller.activate();

        for _ in 1..authorize_at {
            prop_assert_eq!(h.controller.tick(), TickOutcome::Displayed);
        }
        prop_assert!(matches!(h.controller.tick(), TickOutcome::Authorized(_)));

        for _ in 0..extra_ticks {
            prop_assert_eq!(h.controller.tick(), TickOutcome::Skipped);
        }

        prop_assert_eq!(h.controller.phase(), Phase::Authorized);
        prop_assert!(!h.source.is_open_now());
        prop_assert_eq!(h.source.reads() as u64, authorize_at);
        let user = h.context.current_user();
        prop_assert_eq!(user.as_str(), "Alice");
        prop_assert!(h.controller.handoff_deadline().is_some());
        prop_assert_eq!(h.controller.stats().authorizations, 1);
    }

    #[test]
    fn repeated_resets_match_single_reset(repeats in 1usize..6, ticks in 0usize..10) {
        let mut h = harness(ScriptedSource::new(), ScriptedClassifier::never());
        h.controller.activate();
        for _ in 0..ticks {
            h.controller.tick();
        }

        h.controller.reset();
        let once = h.controller.snapshot();
        for _ in 0..repeats {
            h.controller.reset();
        }

        prop_assert_eq!(h.controller.snapshot(), once);
        prop_assert!(!h.source.is_open_now());
        prop_assert!(!h.controller.pump_armed());
        prop_assert!(h.controller.handoff_deadline().is_none());
    }
}
