mod common;

use common::*;
use trellis_core::extension::EXT_STATE;
use trellis_core::{Event, EventBody, Extension, LogSeverity, PluginError, StateError, StateFormat};

fn toml_plugin() -> TestPlugin {
    TestPlugin {
        state_format: StateFormat::Toml { version: 3 },
        ..TestPlugin::default()
    }
}

#[test]
fn test_binary_round_trip_into_fresh_instance() {
    let Running { instance: mut source, .. } = processing(TestPlugin::default());
    source.set_value(GAIN, 0.125);
    source.set_value(VOICES, 7.0);
    source.set_value(MODE, 1.0);

    let mut bytes = Vec::new();
    source.save_state(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 3 * 8);

    let Running { instance: mut target, mut audio, .. } = processing(TestPlugin::default());
    target.load_state(&mut bytes.as_slice()).unwrap();
    for id in [GAIN, VOICES, MODE] {
        assert_eq!(target.get_value(id), source.get_value(id));
    }

    let (_, out) = run_block(&mut audio, &[], 2);
    assert_eq!(out.len(), 3);
}

#[test]
fn test_save_includes_audio_side_changes() {
    let Running { mut instance, mut audio, .. } = processing(TestPlugin::default());
    let events = [Event::new(0, EventBody::ParamValue { id: GAIN, value: 0.75 })];
    run_block(&mut audio, &events, 2);

    let mut bytes = Vec::new();
    instance.save_state(&mut bytes).unwrap();
    assert_eq!(&bytes[..8], &0.75f64.to_le_bytes());
}

#[test]
fn test_truncated_state_keeps_applied_values() {
    let Running { mut instance, .. } = processing(TestPlugin::default());
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0.3f64.to_le_bytes());
    bytes.extend_from_slice(&4.0f64.to_le_bytes());

    let err = instance.load_state(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(
        err,
        PluginError::State(StateError::Truncated { expected: 3, found: 2 })
    ));
    assert_eq!(instance.get_value(GAIN), 0.3);
    assert_eq!(instance.get_value(VOICES), 4.0);
    assert_eq!(instance.get_value(MODE), 0.0);
}

#[test]
fn test_state_extension_record() {
    let host = MockHost::full();
    let mut instance = instance_with(TestPlugin::default(), host);
    instance.init().unwrap();
    let Some(Extension::State(state)) = instance.get_extension(EXT_STATE) else {
        panic!("state extension missing");
    };

    instance.set_value(GAIN, 0.9);
    let mut bytes = Vec::new();
    (state.save)(&mut instance, &mut bytes).unwrap();
    instance.set_value(GAIN, 0.1);
    (state.load)(&mut instance, &mut bytes.as_slice()).unwrap();
    assert_eq!(instance.get_value(GAIN), 0.9);
}

#[test]
fn test_toml_round_trip() {
    let Running { instance: mut source, .. } = processing(toml_plugin());
    source.set_value(GAIN, 0.25);
    source.set_value(MODE, 2.0);

    let mut text = Vec::new();
    source.save_state(&mut text).unwrap();
    let text = String::from_utf8(text).unwrap();
    assert!(text.contains("plugin = \"org.trellis.test\""));
    assert!(text.contains("version = 3"));
    assert!(text.contains("mode = 2.0"));

    let Running { instance: mut target, host, .. } = processing(toml_plugin());
    target.load_state(&mut text.as_bytes()).unwrap();
    assert_eq!(target.get_value(GAIN), 0.25);
    assert_eq!(target.get_value(MODE), 2.0);
    assert!(host.logged(LogSeverity::Warning).is_empty());
}

#[test]
fn test_toml_unknown_keys_are_warned() {
    let Running { mut instance, host, .. } = processing(toml_plugin());
    let text = "[_meta]\nversion = 3\nplugin = \"org.trellis.test\"\n\n[params]\ngain = 0.6\ncutoff = 0.2\n";
    instance.load_state(&mut text.as_bytes()).unwrap();
    assert_eq!(instance.get_value(GAIN), 0.6);

    let warnings = host.logged(LogSeverity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("cutoff"));
}

#[test]
fn test_toml_rejects_other_plugin_and_old_versions() {
    let Running { mut instance, .. } = processing(toml_plugin());
    let other = "[_meta]\nversion = 3\nplugin = \"org.other\"\n[params]\ngain = 0.6\n";
    assert!(matches!(
        instance.load_state(&mut other.as_bytes()),
        Err(PluginError::State(StateError::WrongPlugin { .. }))
    ));

    // the test plugin has no migration
    let old = "[_meta]\nversion = 1\nplugin = \"org.trellis.test\"\n[params]\ngain = 0.6\n";
    assert!(matches!(
        instance.load_state(&mut old.as_bytes()),
        Err(PluginError::State(StateError::Migration(_)))
    ));
    assert_eq!(instance.get_value(GAIN), 0.5);
}
