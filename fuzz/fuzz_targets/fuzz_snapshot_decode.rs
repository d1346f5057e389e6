#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use recall_core::{History, ManagerConfig, Originator, Snapshot, StateManager};

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary payloads must fail cleanly, never panic.
    let _ = Snapshot::<u64>::from_bytes(data.to_vec()).decode();
    let _ = Snapshot::<String>::from_bytes(data.to_vec()).decode();
    let _ = Snapshot::<Vec<Option<i32>>>::from_bytes(data.to_vec()).decode();
    let _ = Snapshot::<BTreeMap<String, f64>>::from_bytes(data.to_vec()).decode();

    // A corrupt entry on top of the history: undo either restores it or
    // leaves both state and depth untouched.
    let history = History::new();
    history.push(Snapshot::capture(&0u64).unwrap());
    history.push(Snapshot::from_bytes(data.to_vec()));
    let manager =
        StateManager::from_parts(Originator::new(7u64), history, ManagerConfig::default()).unwrap();
    match manager.undo() {
        Ok(restored) => {
            assert!(restored);
            assert_eq!(manager.history_len(), 1);
        }
        Err(_) => {
            assert_eq!(manager.get_state(), 7);
            assert_eq!(manager.history_len(), 2);
        }
    }
});
