#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use recall_core::{ManagerConfig, NotifyPolicy, StateManager};

#[derive(Debug, Arbitrary)]
enum Op {
    Save,
    Update { value: i32, save_previous: bool },
    Append { value: i32, save_previous: bool },
    Undo,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    under_lock: bool,
    initial: Vec<i32>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let notify = if input.under_lock {
        NotifyPolicy::UnderLock
    } else {
        NotifyPolicy::AfterUnlock
    };
    let config = ManagerConfig::labeled("fuzz").with_notify(notify);
    let manager = StateManager::with_config(input.initial.clone(), config).unwrap();

    // Plain Vec stack model.
    let mut state = input.initial;
    let mut stack: Vec<Vec<i32>> = Vec::new();

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Save => {
                manager.save().unwrap();
                stack.push(state.clone());
            }
            Op::Update {
                value,
                save_previous,
            } => {
                if save_previous {
                    stack.push(state.clone());
                }
                state = vec![value];
                manager.update(state.clone(), save_previous).unwrap();
            }
            Op::Append {
                value,
                save_previous,
            } => {
                if save_previous {
                    stack.push(state.clone());
                }
                state.push(value);
                assert!(manager.update_with(|v| v.push(value), save_previous).unwrap());
            }
            Op::Undo => {
                let restored = manager.undo().unwrap();
                match stack.pop() {
                    Some(prev) => {
                        assert!(restored);
                        state = prev;
                    }
                    None => assert!(!restored),
                }
            }
            Op::Clear => {
                manager.clear_history();
                stack.clear();
            }
        }
        assert_eq!(manager.get_state(), state);
        assert_eq!(manager.history_len(), stack.len());
    }
});
