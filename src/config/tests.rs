use std::io::Write;

use super::validation::validate_config;
use super::*;

fn minimal_toml() -> &'static str {
    r#"
bridge_address = "192.168.1.2"
bridge_username = "abc123"
"#
}

fn parse(toml_str: &str) -> Config {
    toml::from_str(toml_str).expect("config should parse")
}

#[test]
fn minimal_config_parses_and_validates() {
    let config = parse(minimal_toml());
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.latitude, None);
    assert_eq!(config.update_interval, None);
}

#[test]
fn numeric_fields_parse_from_numbers() {
    let config = parse(
        r#"
latitude = 40.7128
longitude = -74.0060
update_interval = 120
poll_interval = 1.5
min_brightness = 30
bridge_address = "b"
bridge_username = "u"
"#,
    );
    assert_eq!(config.latitude, Some(40.7128));
    assert_eq!(config.update_interval, Some(120));
    assert_eq!(config.poll_interval, Some(1.5));
    assert_eq!(config.min_brightness, Some(30));
}

#[test]
fn numeric_strings_are_accepted() {
    let config = parse(
        r#"
latitude = "40.7128"
update_interval = "120"
bridge_address = "b"
bridge_username = "u"
"#,
    );
    assert_eq!(config.latitude, Some(40.7128));
    assert_eq!(config.update_interval, Some(120));
}

#[test]
fn non_numeric_values_fall_back_to_default() {
    // Spelled-out numbers and junk behave exactly like missing keys
    let config = parse(
        r#"
latitude = "very north"
update_interval = "ninety"
poll_interval = false
bridge_address = "b"
bridge_username = "u"
"#,
    );
    assert_eq!(config.latitude, None);
    assert_eq!(config.update_interval, None);
    assert_eq!(config.poll_interval, None);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn exclusion_list_parses_ids_and_sentinel() {
    let list = ExclusionList::parse("1, 4,7");
    assert!(list.contains(1));
    assert!(list.contains(4));
    assert!(list.contains(7));
    assert!(!list.contains(2));
    assert!(!list.excludes_all());

    let all = ExclusionList::parse("-1");
    assert!(all.excludes_all());
    assert!(all.contains(1));
    assert!(all.contains(9999));

    let mixed = ExclusionList::parse("3,-1");
    assert!(mixed.contains(3));
    assert!(mixed.contains(4));
}

#[test]
fn exclusion_list_ignores_garbage_tokens() {
    let list = ExclusionList::parse(" , lamp, 2 ,");
    assert!(list.contains(2));
    assert!(!list.contains(0));
    assert!(!list.excludes_all());
}

#[test]
fn exclusions_resolve_from_config_fields() {
    let config = parse(
        r#"
exclude_lights = "9"
exclude_brightness = "-1"
exclude_colortemp = "2,3"
bridge_address = "b"
bridge_username = "u"
"#,
    );
    let exclusions = config.exclusions();
    assert!(exclusions.lights.contains(9));
    assert!(exclusions.brightness.excludes_all());
    assert!(exclusions.colortemp.contains(3));
    assert!(!exclusions.manual_override.contains(1));
}

#[test]
fn validation_rejects_out_of_range_coordinates() {
    let mut config = parse(minimal_toml());
    config.latitude = Some(91.0);
    assert!(
        validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("latitude")
    );

    config.latitude = Some(51.5);
    config.longitude = Some(-200.0);
    assert!(
        validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("longitude")
    );
}

#[test]
fn validation_rejects_inverted_ranges() {
    let mut config = parse(minimal_toml());
    config.min_brightness = Some(90);
    config.max_brightness = Some(40);
    assert!(
        validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("min_brightness")
    );

    let mut config = parse(minimal_toml());
    config.min_colortemp = Some(6500);
    config.max_colortemp = Some(2200);
    assert!(validate_config(&config).is_err());
}

#[test]
fn validation_requires_bridge_credentials() {
    let config: Config = toml::from_str("latitude = 51.5").unwrap();
    assert!(
        validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("bridge_address")
    );

    let config: Config = toml::from_str(r#"bridge_address = "b""#).unwrap();
    assert!(
        validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("bridge_username")
    );
}

#[test]
fn validation_rejects_colortemp_outside_device_limits() {
    let mut config = parse(minimal_toml());
    config.sleep_colortemp = Some(500);
    assert!(validate_config(&config).is_err());

    config.sleep_colortemp = Some(2000);
    config.max_colortemp = Some(30000);
    assert!(validate_config(&config).is_err());
}

#[test]
fn load_from_path_reads_a_real_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name = "Living Room"
latitude = 48.8566
longitude = 2.3522
bridge_address = "10.0.0.2"
bridge_username = "user"
"#
    )
    .unwrap();

    let config = load_from_path(file.path()).unwrap();
    assert_eq!(config.name.as_deref(), Some("Living Room"));
    assert_eq!(config.latitude, Some(48.8566));
}

#[test]
fn load_from_path_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
latitude = 123.0
bridge_address = "10.0.0.2"
bridge_username = "user"
"#
    )
    .unwrap();

    assert!(load_from_path(file.path()).is_err());
}
