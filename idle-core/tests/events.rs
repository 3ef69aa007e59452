//! Event-stream assertions via the instrument recorder.

#![cfg(feature = "instrument")]

use idle_core::{GlobalState, SimRng, advance, default_catalog, start_action};
use instrument::Value;

#[test]
fn test_completion_events_match_state_changes() {
    instrument::install_recorder();
    instrument::drain();

    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(1);
    let mut state = GlobalState::empty(&catalog);
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    start_action(&catalog, &mut state, tree, &mut rng).unwrap();

    let (next, _) = advance(&catalog, &state, 150, &mut rng);
    let events = instrument::drain();

    let completions: Vec<_> = events
        .iter()
        .filter(|e| e.target == "completion")
        .collect();
    assert_eq!(completions.len(), 5);
    for event in &completions {
        assert_eq!(
            event.field("action").and_then(Value::as_str),
            Some("Normal Tree")
        );
    }

    // Five completions of one log each, plus possibly a rare nest.
    let logs = catalog.item_by_name("Normal Logs").unwrap();
    assert_eq!(next.inventory.count_of(logs), 5);
    let drops = events.iter().filter(|e| e.target == "drop").count();
    assert!(drops >= 5, "drop events {drops}");
}

#[test]
fn test_thieving_emits_stun_events() {
    instrument::install_recorder();
    instrument::drain();

    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(2);
    let mut state = GlobalState::empty(&catalog);
    let man = catalog.action_by_name("Man").unwrap();
    start_action(&catalog, &mut state, man, &mut rng).unwrap();

    // Level-1 success odds are 42%; a long run must include failures.
    let (_, _) = advance(&catalog, &state, 10_000, &mut rng);
    let events = instrument::drain();
    let stuns = events.iter().filter(|e| e.target == "stun").count();
    assert!(stuns > 0, "no stun events over 10k ticks of thieving");
}
