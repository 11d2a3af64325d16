use std::io::Write;
use std::time::Duration;

use gallery_frame::config::{Configuration, MET_OBJECTS_URL};

#[test]
fn defaults_match_the_collection_catalog() {
    let cfg = Configuration::default();
    assert_eq!(cfg.refresh_interval, Duration::from_secs(20));
    assert_eq!(cfg.refresh_threshold, 4);
    assert!(!cfg.primary_image_preferred);
    assert_eq!(cfg.api_base_url, MET_OBJECTS_URL);
    assert_eq!(cfg.max_object_id, 471_581);
    assert_eq!(cfg.max_retry, 100);
    assert!(cfg.request_timeout.is_none());
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
refresh-interval: 45s
refresh-threshold: 6
primary-image-preferred: true
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.refresh_interval, Duration::from_secs(45));
    assert_eq!(cfg.refresh_threshold, 6);
    assert!(cfg.primary_image_preferred);
    // untouched keys keep their defaults
    assert_eq!(cfg.max_retry, 100);
}

#[test]
fn parse_with_request_timeout() {
    let yaml = r#"
request-timeout: 5s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.request_timeout, Some(Duration::from_secs(5)));
}

#[test]
fn load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "refresh-interval: 30s").unwrap();
    writeln!(file, "max-retry: 10").unwrap();
    let cfg = Configuration::from_yaml_file(file.path()).unwrap();
    assert_eq!(cfg.refresh_interval, Duration::from_secs(30));
    assert_eq!(cfg.max_retry, 10);
}

#[test]
fn sub_second_refresh_interval_is_rejected() {
    let cfg = Configuration {
        refresh_interval: Duration::from_millis(500),
        ..Configuration::default()
    };
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("refresh-interval"));
}

#[test]
fn zero_threshold_is_rejected() {
    let cfg = Configuration {
        refresh_threshold: 0,
        ..Configuration::default()
    };
    assert!(cfg.validated().is_err());
}

#[test]
fn threshold_must_leave_a_prefetch_window() {
    let equal = Configuration {
        refresh_interval: Duration::from_secs(10),
        refresh_threshold: 10,
        ..Configuration::default()
    };
    assert!(equal.validated().is_err());

    let larger = Configuration {
        refresh_interval: Duration::from_secs(10),
        refresh_threshold: 12,
        ..Configuration::default()
    };
    assert!(larger.validated().is_err());

    let ok = Configuration {
        refresh_interval: Duration::from_secs(10),
        refresh_threshold: 9,
        ..Configuration::default()
    };
    assert!(ok.validated().is_ok());
}

#[test]
fn zero_retry_budget_is_rejected() {
    let cfg = Configuration {
        max_retry: 0,
        ..Configuration::default()
    };
    assert!(cfg.validated().is_err());
}

#[test]
fn defaults_pass_validation() {
    assert!(Configuration::default().validated().is_ok());
}
