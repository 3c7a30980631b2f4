//! Comprehensive tests for configuration parsing
//!
//! This file tests the config module including:
//! - Loading the bundled JSON presets
//! - Defaults for optional fields
//! - Metric spellings
//! - Handling invalid JSON and missing files
//! - Rejecting out-of-range values
//! - Rejecting layouts whose layer costs overflow

use resnet_prune_env::architecture::Topology;
use resnet_prune_env::config::{load_config, validate_config, ProxyConfig, ResourceMetric};
use resnet_prune_env::env::ResNetProxy;
use resnet_prune_env::ProxyError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

fn load_str(contents: &str) -> Result<ProxyConfig, ProxyError> {
    let file = write_temp_config(contents);
    load_config(file.path().to_str().unwrap())
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_resnet20_flops_preset() {
        let config =
            load_config("config/resnet20_flops.json").expect("Failed to load resnet20 flops config");

        assert_eq!(
            config,
            ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, false)
        );
    }

    #[test]
    fn test_load_resnet20_params_preset() {
        let config = load_config("config/resnet20_params.json")
            .expect("Failed to load resnet20 params config");

        assert_eq!(config.metric, ResourceMetric::Params);
        assert!(config.enforce_lower_bound);
    }

    #[test]
    fn test_load_resnet56_preset() {
        let config =
            load_config("config/resnet56_params.json").expect("Failed to load resnet56 config");

        assert_eq!(
            config,
            ProxyConfig::resnet56(ResourceMetric::Params, 0.5, 0.2, true)
        );
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let config = load_str(
            r#"{
  "unit_counts": [2, 2],
  "metric": "flops",
  "ratio": 0.6,
  "floor_ratio": 0.25
}"#,
        )
        .unwrap();

        assert!(config.enforce_lower_bound);
        assert_eq!(config.expand_ratio, 1);
        assert_eq!(config.stem_channels, 64);
        assert_eq!(config.input_resolution, 32);
        assert!((config.budget_margin - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_optional_fields() {
        let config = load_str(
            r#"{
  "unit_counts": [1, 1, 1, 1],
  "metric": "params",
  "ratio": 0.3,
  "floor_ratio": 0.2,
  "enforce_lower_bound": false,
  "expand_ratio": 2,
  "stem_channels": 24,
  "input_resolution": 64,
  "budget_margin": 0.1
}"#,
        )
        .unwrap();

        assert_eq!(config.unit_counts, vec![1, 1, 1, 1]);
        assert!(!config.enforce_lower_bound);
        assert_eq!(config.expand_ratio, 2);
        assert_eq!(config.stem_channels, 24);
        assert_eq!(config.input_resolution, 64);
    }

    #[test]
    fn test_legacy_para_spelling() {
        let config = load_str(
            r#"{"unit_counts": [3], "metric": "para", "ratio": 0.5, "floor_ratio": 0.1}"#,
        )
        .unwrap();
        assert_eq!(config.metric, ResourceMetric::Params);
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = ProxyConfig::resnet56(ResourceMetric::Flops, 0.4, 0.2, false);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"metric\":\"flops\""));

        let parsed: ProxyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_config("config/does_not_exist.json");
        assert!(matches!(result, Err(ProxyError::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_str(r#"{"unit_counts": [3, 3, 3], "metric": "#);
        assert!(matches!(result, Err(ProxyError::Json(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let result = load_str(r#"{"unit_counts": [3], "metric": "flops", "ratio": 0.5}"#);
        assert!(matches!(result, Err(ProxyError::Json(_))));
    }

    #[test]
    fn test_unknown_metric() {
        let result = load_str(
            r#"{"unit_counts": [3], "metric": "latency", "ratio": 0.5, "floor_ratio": 0.1}"#,
        );
        assert!(matches!(result, Err(ProxyError::Json(_))));
    }

    #[test]
    fn test_empty_unit_counts() {
        let result =
            load_str(r#"{"unit_counts": [], "metric": "flops", "ratio": 0.5, "floor_ratio": 0.1}"#);
        assert!(matches!(result, Err(ProxyError::InvalidConfig(_))));
    }

    #[test]
    fn test_ratio_out_of_range() {
        for ratio in [0.0, -0.2, 1.5] {
            let config = ProxyConfig::new(vec![3], ResourceMetric::Flops, ratio, 0.1, true);
            assert!(validate_config(&config).is_err(), "ratio {}", ratio);
        }
    }

    #[test]
    fn test_floor_ratio_out_of_range() {
        for floor in [0.0, 1.01, f64::NAN] {
            let config = ProxyConfig::new(vec![3], ResourceMetric::Flops, 0.5, floor, true);
            assert!(validate_config(&config).is_err(), "floor {}", floor);
        }
    }

    #[test]
    fn test_zero_expand_ratio() {
        let mut config = ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, true);
        config.expand_ratio = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_stem_channels() {
        let mut config = ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, true);
        config.stem_channels = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_negative_budget_margin() {
        let mut config = ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, true);
        config.budget_margin = -0.01;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_overflowing_resolution_rejected() {
        let mut config = ProxyConfig::new(vec![1], ResourceMetric::Flops, 0.5, 0.1, true);
        config.input_resolution = 1 << 32;

        assert!(matches!(config.validate(), Err(ProxyError::InvalidConfig(_))));
        assert!(matches!(
            Topology::build(&config),
            Err(ProxyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_expand_ratio_rejected() {
        let mut config = ProxyConfig::new(vec![1], ResourceMetric::Params, 0.5, 0.1, true);
        config.expand_ratio = usize::MAX / 8;

        assert!(matches!(config.validate(), Err(ProxyError::InvalidConfig(_))));
        assert!(matches!(
            ResNetProxy::new(&config),
            Err(ProxyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_stem_channels_rejected() {
        let mut config = ProxyConfig::resnet20(ResourceMetric::Flops, 0.5, 0.1, true);
        config.stem_channels = usize::MAX / 2;
        assert!(matches!(config.validate(), Err(ProxyError::InvalidConfig(_))));
    }

    #[test]
    fn test_large_but_representable_layers_accepted() {
        let mut config = ProxyConfig::new(vec![1], ResourceMetric::Flops, 0.5, 0.1, true);
        config.input_resolution = 1024;
        config.expand_ratio = 64;

        let topology = Topology::build(&config).unwrap();
        assert_eq!(topology.layer(0).out_channels(), 1024);
    }

    #[test]
    fn test_error_message_names_field() {
        let config = ProxyConfig::new(vec![3], ResourceMetric::Flops, 2.0, 0.1, true);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("ratio"));
    }
}
