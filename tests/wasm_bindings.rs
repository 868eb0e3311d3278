#![cfg(target_arch = "wasm32")]

use ignition_engine::{IgnitionEngine, SimulationConfig};
use wasm_bindgen_test::*;

fn config_json() -> String {
    serde_json::to_string(&SimulationConfig::default()).unwrap()
}

#[wasm_bindgen_test]
fn constructs_from_json_and_ticks() {
    let mut engine = IgnitionEngine::new(&config_json()).unwrap();
    assert_eq!(engine.tick_index(), 0);
    assert_eq!(engine.active_cylinders(), 4);

    let sample = engine.tick(0.0);
    assert!(sample.is_object());
    assert_eq!(engine.tick_index(), 1);
    assert!(engine.get_waveforms().is_object());
    assert!(engine.get_status().is_object());
}

#[wasm_bindgen_test]
fn tick_applies_transition_from_elapsed_time() {
    let mut engine = IgnitionEngine::new(&config_json()).unwrap();
    engine.tick(7_999.0);
    assert_eq!(engine.active_cylinders(), 4);
    engine.tick(8_000.0);
    assert_eq!(engine.active_cylinders(), 8);

    engine.reset_js();
    assert_eq!(engine.tick_index(), 0);
    assert_eq!(engine.active_cylinders(), 4);
}

#[wasm_bindgen_test]
fn invalid_config_is_rejected() {
    let err = IgnitionEngine::new(r#"{"initialCylinders": 4}"#).err().unwrap();
    assert!(err.is_string());
    assert!(IgnitionEngine::new("not json").is_err());
}

#[wasm_bindgen_test]
fn highlight_is_negative_without_listing() {
    let engine = IgnitionEngine::new(&config_json()).unwrap();
    assert_eq!(engine.initial_highlight(), -1);
}
