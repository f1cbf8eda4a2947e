use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join(CONFIG_FILE_NAME);
    fs::write(&path, content).unwrap();
    path
}

fn with_env<T>(key: &str, value: &Path, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    unsafe {
        std::env::set_var(key, value);
    }
    let result = f();
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
fn test_empty_config_gets_defaults() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "");
    let config = load_from_path(&path).unwrap();

    assert_eq!(config.pack.as_deref(), Some(DEFAULT_PACK));
    assert_eq!(config.backend, Some(Backend::Auto));
    assert_eq!(config.max_sleep, Some(DEFAULT_MAX_SLEEP));
    assert_eq!(config.max_sleep(), std::time::Duration::from_secs(300));
    assert!(!config.has_coordinates());
}

#[test]
fn test_full_config_parses() {
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
pack = "coastal"
backend = "command"
command = "swww img {image}"
max_sleep = 120
latitude = 51.5074
longitude = -0.1278
timezone = "Europe/London"
"#,
    );
    let config = load_from_path(&path).unwrap();

    assert_eq!(config.pack_name(), "coastal");
    assert_eq!(config.backend(), Backend::Command);
    assert_eq!(config.command.as_deref(), Some("swww img {image}"));
    assert_eq!(config.max_sleep(), std::time::Duration::from_secs(120));

    let location = config.location().unwrap();
    assert!(location.has_coordinates());
    assert_eq!(location.timezone(), chrono_tz::Europe::London);
}

#[test]
fn test_unknown_backend_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "backend = \"hyprland\"\n");
    let err = format!("{:#}", load_from_path(&path).unwrap_err());
    assert!(err.contains("Failed to parse config"), "{err}");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = load_from_path(&dir.path().join(CONFIG_FILE_NAME));
    assert!(result.unwrap_err().to_string().contains("not found"));
}

#[test]
fn test_geo_file_overrides_main_config() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "latitude = 10.0\nlongitude = 10.0\n");
    fs::write(
        dir.path().join(GEO_FILE_NAME),
        "latitude = 35.6762\nlongitude = 139.6503\ntimezone = \"Asia/Tokyo\"\n",
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.latitude, Some(35.6762));
    assert_eq!(config.longitude, Some(139.6503));
    assert_eq!(config.timezone.as_deref(), Some("Asia/Tokyo"));
}

#[test]
fn test_broken_geo_file_is_ignored() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "latitude = 10.0\nlongitude = 20.0\n");
    fs::write(dir.path().join(GEO_FILE_NAME), "latitude = \"north\"").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.latitude, Some(10.0));
    assert_eq!(config.longitude, Some(20.0));
}

#[test]
fn test_geo_file_values_are_validated() {
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "");
    fs::write(dir.path().join(GEO_FILE_NAME), "latitude = 95.0\nlongitude = 0.0\n").unwrap();
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_max_sleep_bounds() {
    let mut config = Config {
        max_sleep: Some(MINIMUM_MAX_SLEEP),
        ..Config::default()
    };
    assert!(validate_config(&config).is_ok());

    config.max_sleep = Some(MAXIMUM_MAX_SLEEP);
    assert!(validate_config(&config).is_ok());

    config.max_sleep = Some(MINIMUM_MAX_SLEEP - 1);
    assert!(validate_config(&config).is_err());

    config.max_sleep = Some(MAXIMUM_MAX_SLEEP + 1);
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("max_sleep"), "{err}");
}

#[test]
fn test_command_backend_requires_command() {
    let mut config = Config {
        backend: Some(Backend::Command),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());

    config.command = Some("   ".to_string());
    assert!(validate_config(&config).is_err());

    config.command = Some("feh --bg-fill {image}".to_string());
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_coordinates_must_come_in_pairs() {
    let config = Config {
        latitude: Some(40.0),
        ..Config::default()
    };
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("longitude is missing"), "{err}");

    let config = Config {
        longitude: Some(40.0),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_coordinate_ranges() {
    let config = Config {
        latitude: Some(-91.0),
        longitude: Some(0.0),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());

    let config = Config {
        latitude: Some(0.0),
        longitude: Some(180.5),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_unknown_timezone_is_rejected() {
    let config = Config {
        timezone: Some("Atlantis/Central".to_string()),
        ..Config::default()
    };
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("Atlantis/Central"), "{err}");
}

#[test]
fn test_empty_pack_name_is_rejected() {
    let config = Config {
        pack: Some(" ".to_string()),
        ..Config::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_location_from_coordinates_looks_up_timezone() {
    let config = Config {
        latitude: Some(40.7128),
        longitude: Some(-74.0060),
        ..Config::default()
    };
    let location = config.location().unwrap();
    assert_eq!(location.timezone(), chrono_tz::America::New_York);
}

#[test]
fn test_location_with_timezone_only() {
    let config = Config {
        timezone: Some("Europe/Paris".to_string()),
        ..Config::default()
    };
    let location = config.location().unwrap();
    assert!(!location.has_coordinates());
    assert_eq!(location.timezone(), chrono_tz::Europe::Paris);
}

#[test]
#[serial]
fn test_location_without_anything_uses_system_timezone() {
    let original = std::env::var("TZ").ok();
    unsafe {
        std::env::set_var("TZ", "Asia/Kolkata");
    }
    let location = Config::default().location().unwrap();
    unsafe {
        match original {
            Some(val) => std::env::set_var("TZ", val),
            None => std::env::remove_var("TZ"),
        }
    }
    assert_eq!(location.timezone(), chrono_tz::Asia::Kolkata);
    assert!(!location.has_coordinates());
}

#[test]
fn test_default_config_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
    create_default_config(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("#[Location]"));
    assert!(content.contains("#latitude = "));

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.pack_name(), DEFAULT_PACK);
    assert_eq!(config.backend(), Backend::Auto);
    assert_eq!(config.latitude, None);
    assert_eq!(config.command, None);
}

#[test]
fn test_example_pack_loads_and_is_not_overwritten() {
    let dir = tempdir().unwrap();
    create_example_pack(dir.path()).unwrap();

    let pack_dir = dir.path().join(PACKS_DIR_NAME).join(DEFAULT_PACK);
    let pack = crate::pack::load_pack(&pack_dir).unwrap();
    assert_eq!(pack.name(), "Default");
    assert_eq!(pack.model.len(), 4);

    let manifest = pack_dir.join(PACK_MANIFEST_NAME);
    fs::write(&manifest, "# mine\n").unwrap();
    create_example_pack(dir.path()).unwrap();
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "# mine\n");
}

#[test]
#[serial]
fn test_load_creates_default_files() {
    let dir = tempdir().unwrap();
    let config = with_env("XDG_CONFIG_HOME", dir.path(), || load().unwrap());

    let app_dir = dir.path().join(APP_DIR_NAME);
    assert!(app_dir.join(CONFIG_FILE_NAME).is_file());
    assert!(
        app_dir
            .join(PACKS_DIR_NAME)
            .join(DEFAULT_PACK)
            .join(PACK_MANIFEST_NAME)
            .is_file()
    );
    assert_eq!(config.pack_name(), DEFAULT_PACK);
}
