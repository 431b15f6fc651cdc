/// Tests for TemplateMap serialization/deserialization
///
/// This demonstrates saving and loading the miner state, which is useful for:
/// - Resuming a mining run where it left off
/// - Shipping a learned template dictionary to another host
/// - Inspecting discovered templates offline
use log_template_miner::persistence;
use log_template_miner::template_map::TemplateMap;

fn mined_map() -> TemplateMap {
    let mut map = TemplateMap::new(r"\s+").unwrap();
    map.insert("User alice logged in");
    map.insert("User bob logged in");
    map.insert("Connection closed by peer");
    map
}

#[test]
fn test_save_and_load_binary() {
    let map = mined_map();

    // Behavior before save
    let params_before = map[0].param_line("User eve logged in");
    assert_eq!(params_before, Some(vec![vec!["eve".to_string()]]));

    let path = "test_miner_state.bin";
    map.save_to_file(path).expect("Failed to save");

    let loaded = TemplateMap::load_from_file(path).expect("Failed to load");

    // Behavior after load is identical
    let params_after = loaded[0].param_line("User eve logged in");
    assert_eq!(params_before, params_after);

    assert_eq!(loaded.len(), map.len());
    assert_eq!(loaded.token_pattern(), map.token_pattern());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_save_and_load_json() {
    let map = mined_map();

    let path = "test_miner_state.json";
    map.save_to_json(path).expect("Failed to save JSON");

    // Human-readable on disk
    let json_content = std::fs::read_to_string(path).expect("Failed to read JSON");
    assert!(json_content.contains("token_pattern"));
    assert!(json_content.contains("templates"));

    let loaded = TemplateMap::load_from_json(path).expect("Failed to load JSON");
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded[0].param_line("User mallory logged in"),
        Some(vec![vec!["mallory".to_string()]])
    );

    std::fs::remove_file(path).ok();
}

#[test]
fn test_preserves_all_template_data() {
    let map = mined_map();

    let path = "test_template_preservation.bin";
    persistence::save(path, &map).unwrap();
    let loaded = persistence::load(path).unwrap();

    for (original, restored) in map.iter().zip(loaded.iter()) {
        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.tokens(), original.tokens());
        assert_eq!(restored.line_ids(), original.line_ids());
        assert_eq!(restored.positions(), original.positions());
        assert_eq!(restored.separator(), original.separator());
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_counters_survive_round_trip() {
    let map = mined_map();
    assert_eq!(map.line_count(), 3);

    let path = "test_counter_roundtrip.bin";
    map.save_to_file(path).unwrap();
    let mut loaded = TemplateMap::load_from_file(path).unwrap();

    // Mining continues exactly where the stream stopped: next line id is 4
    // and a fresh template picks up the next template id
    let template = loaded.insert("Disk full on /var");
    assert_eq!(template.id(), 2);
    assert_eq!(template.line_ids(), &[4]);
    assert_eq!(loaded.line_count(), 4);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_rejects_foreign_payload() {
    let path = "test_not_a_map.bin";
    std::fs::write(path, b"this is not a saved template map").unwrap();

    let result = TemplateMap::load_from_file(path);
    assert!(result.is_err(), "garbage payload must not deserialize");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_missing_file() {
    assert!(TemplateMap::load_from_file("no_such_state_file.bin").is_err());
}
