//! Property-based tests for the persisted data model.
//!
//! Uses proptest to verify:
//! 1. Any task list survives encode → decode.
//! 2. Arbitrary strings never cause a panic in `decode` (returns `Err` gracefully).
//! 3. Validation accepts text iff its trimmed form is 3..=100 characters.
//! 4. The validation result agrees with the typed check.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use tickbox_proto::codec;
use tickbox_proto::task::{Task, TaskId};
use tickbox_proto::validation::{
    MAX_TASK_TEXT_LENGTH, MIN_TASK_TEXT_LENGTH, ValidationError, check_task_text,
    validate_task_text,
};

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    ("[a-z0-9-]{1,36}", "\\PC{0,120}", any::<bool>()).prop_map(|(id, text, completed)| Task {
        id: TaskId::from_string(id),
        text,
        completed,
    })
}

proptest! {
    #[test]
    fn task_list_round_trips(tasks in prop::collection::vec(arb_task(), 0..32)) {
        let raw = codec::encode(&tasks).unwrap();
        let decoded: Vec<Task> = codec::decode(&raw).unwrap();
        prop_assert_eq!(decoded, tasks);
    }

    #[test]
    fn decode_never_panics(raw in "\\PC*") {
        let _ = codec::decode::<Vec<Task>>(&raw);
        let _ = codec::decode::<bool>(&raw);
    }

    #[test]
    fn validation_matches_trimmed_length(text in "[ \\ta-zA-Z0-9é]{0,130}") {
        let trimmed_len = text.trim().chars().count();
        let expected = (MIN_TASK_TEXT_LENGTH..=MAX_TASK_TEXT_LENGTH).contains(&trimmed_len);
        prop_assert_eq!(validate_task_text(&text).is_valid, expected);
    }

    #[test]
    fn validation_result_agrees_with_check(text in "\\PC{0,130}") {
        let result = validate_task_text(&text);
        match check_task_text(&text) {
            Ok(()) => {
                prop_assert!(result.is_valid);
                prop_assert!(result.error.is_none());
            }
            Err(e) => {
                prop_assert!(!result.is_valid);
                prop_assert_eq!(result.error, Some(e.to_string()));
            }
        }
    }

    #[test]
    fn blank_text_is_rejected_as_whitespace(spaces in "[ \\t\\n]{1,20}") {
        prop_assert_eq!(check_task_text(&spaces), Err(ValidationError::WhitespaceOnly));
    }
}

#[test]
fn persisted_task_layout_is_flat() {
    let task = Task {
        id: TaskId::from_string("0190-abc"),
        text: "Buy milk".to_string(),
        completed: true,
    };
    let raw = codec::encode(&[task]).unwrap();
    assert_eq!(raw, r#"[{"id":"0190-abc","text":"Buy milk","completed":true}]"#);
}
