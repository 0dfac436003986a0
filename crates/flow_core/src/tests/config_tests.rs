use super::{apply_env_overrides, load_settings_from, NavigationContext, NavigationSettings, SettingsError};

use std::{
    collections::HashMap,
    env, fs,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn temp_settings_path(name: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("flow_core_{name}_{suffix}.toml"))
}

#[test]
fn defaults_match_transition_timings() {
    let settings = NavigationSettings::default();
    assert_eq!(settings.timings.present_delay_ms, 60);
    assert_eq!(settings.timings.dismiss_delay_ms, 300);
    assert_eq!(settings.timings.dismiss_delay_animated_ms, 600);
    assert_eq!(settings.event_capacity, 64);
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let settings: NavigationSettings = toml::from_str(
        r#"
        event_capacity = 8

        [timings]
        present_delay_ms = 16
        "#,
    )
    .expect("parse settings");

    assert_eq!(settings.event_capacity, 8);
    assert_eq!(settings.timings.present_delay_ms, 16);
    assert_eq!(settings.timings.dismiss_delay_animated_ms, 600);
}

#[test]
fn env_overrides_replace_file_values() {
    let mut settings = NavigationSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup(&[
            ("NAV__PRESENT_DELAY_MS", "5"),
            ("NAV__DISMISS_DELAY_MS", " 10 "),
            ("NAV__DISMISS_DELAY_ANIMATED_MS", "20"),
            ("NAV__EVENT_CAPACITY", "4"),
        ]),
    );

    assert_eq!(settings.timings.present_delay(), Duration::from_millis(5));
    assert_eq!(settings.timings.dismiss_delay(false), Duration::from_millis(10));
    assert_eq!(settings.timings.dismiss_delay(true), Duration::from_millis(20));
    assert_eq!(settings.event_capacity, 4);
}

#[test]
fn unparseable_env_values_are_ignored() {
    let mut settings = NavigationSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup(&[
            ("NAV__PRESENT_DELAY_MS", "soon"),
            ("NAV__DISMISS_DELAY_MS", "-1"),
            ("NAV__EVENT_CAPACITY", "0"),
        ]),
    );

    assert_eq!(settings, NavigationSettings::default());
}

#[test]
fn load_settings_from_reads_file() {
    let path = temp_settings_path("read");
    fs::write(&path, "[timings]\ndismiss_delay_ms = 120\n").expect("write settings");

    let settings = load_settings_from(&path).expect("load settings");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.timings.dismiss_delay_ms, 120);
}

#[test]
fn load_settings_from_missing_file_is_read_error() {
    let path = temp_settings_path("missing");
    let err = load_settings_from(&path).expect_err("missing file");
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn load_settings_from_rejects_malformed_toml() {
    let path = temp_settings_path("malformed");
    fs::write(&path, "event_capacity = \"many\"").expect("write settings");

    let err = load_settings_from(&path).expect_err("malformed file");
    fs::remove_file(&path).expect("cleanup");

    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("failed to parse"));
}

#[test]
fn context_from_settings_never_has_zero_capacity() {
    let settings = NavigationSettings {
        event_capacity: 0,
        ..NavigationSettings::default()
    };
    let context = NavigationContext::from_settings(&settings);
    assert_eq!(context.event_capacity, 1);
    assert_eq!(context.timings, settings.timings);
}

#[test]
fn instant_context_has_zero_delays() {
    let context = NavigationContext::instant();
    assert!(context.timings.present_delay().is_zero());
    assert!(context.timings.dismiss_delay(true).is_zero());
}
