//! Config loading, validation and swap behaviour

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::logic::config::watcher::RELOAD_RETRY;
    use crate::logic::config::{ConfigStore, EngineConfig};
    use crate::logic::error::ConfigError;
    use crate::logic::risk::{DecayConfig, DecayPoint};

    #[test]
    fn test_default_config_compiles() {
        let store = ConfigStore::new(EngineConfig::default()).unwrap();
        let config = store.current();
        assert_eq!(config.generation, 1);
        assert_eq!(config.rules.len(), 7);
        assert_eq!(config.thresholds.monitor, 0.30);
        assert_eq!(config.thresholds.decoy, 0.60);
        assert!(config.canary.trap_count() >= 4);
    }

    #[test]
    fn test_presets_compile() {
        assert!(ConfigStore::new(EngineConfig::strict()).is_ok());
        assert!(ConfigStore::new(EngineConfig::relaxed()).is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = EngineConfig::from_json(
            r#"{
                "risk": { "monitor_threshold": 0.25, "decay": { "kind": "linear", "zero_after_secs": 900 } },
                "forensics": { "real_sample_rate": 0.5 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.risk.monitor_threshold, 0.25);
        assert_eq!(config.risk.decoy_threshold, 0.60);
        assert_eq!(config.risk.decay, DecayConfig::Linear { zero_after_secs: 900.0 });
        assert_eq!(config.forensics.real_sample_rate, 0.5);
        assert_eq!(config.rules, EngineConfig::default().rules);
    }

    #[test]
    fn test_rule_document_shape() {
        let config = EngineConfig::from_json(
            r#"{
                "rules": [
                    { "id": "fast", "feature": "request_rate", "operator": ">=", "threshold": 3, "weight": 0.2, "min_events": 5 }
                ]
            }"#,
        )
        .unwrap();
        let store = ConfigStore::new(config).unwrap();
        let rules = store.current();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(rules.rules.rules()[0].min_events, 5);
    }

    fn assert_rejected(mutate: impl FnOnce(&mut EngineConfig)) -> ConfigError {
        let store = ConfigStore::new(EngineConfig::default()).unwrap();
        let before = store.current();

        let mut bad = EngineConfig::default();
        mutate(&mut bad);
        let err = store.replace(bad).unwrap_err();

        let after = store.current();
        assert!(Arc::ptr_eq(&before, &after), "prior config must stay active");
        assert_eq!(store.generation(), 1);
        err
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let err = assert_rejected(|c| c.rules[0].feature = "gpu_temp".to_string());
        assert!(matches!(err, ConfigError::UnknownFeature { .. }));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = assert_rejected(|c| {
            let dup = c.rules[0].clone();
            c.rules.push(dup);
        });
        assert!(matches!(err, ConfigError::DuplicateRule(_)));
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let err = assert_rejected(|c| c.risk.monitor_threshold = 0.9);
        assert!(matches!(err, ConfigError::InvalidThresholds(_)));
    }

    #[test]
    fn test_non_monotonic_decay_rejected() {
        let err = assert_rejected(|c| {
            c.risk.decay = DecayConfig::Table {
                points: vec![
                    DecayPoint { after_secs: 60.0, factor: 0.3 },
                    DecayPoint { after_secs: 120.0, factor: 0.6 },
                    DecayPoint { after_secs: 180.0, factor: 0.0 },
                ],
            }
        });
        assert!(matches!(err, ConfigError::InvalidDecay(_)));
    }

    #[test]
    fn test_bad_regex_rejected() {
        let err = assert_rejected(|c| c.sensitive_routes.push("^/api/(".to_string()));
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_bad_sample_rate_rejected() {
        let err = assert_rejected(|c| c.forensics.real_sample_rate = 1.5);
        assert!(matches!(err, ConfigError::InvalidForensics(_)));
    }

    #[test]
    fn test_empty_window_rejected() {
        let err = assert_rejected(|c| c.window.max_events = 0);
        assert!(matches!(err, ConfigError::InvalidWindow(_)));
    }

    #[test]
    fn test_replace_bumps_generation() {
        let store = ConfigStore::new(EngineConfig::default()).unwrap();
        let generation = store.replace(EngineConfig::strict()).unwrap();
        assert_eq!(generation, 2);
        assert_eq!(store.current().thresholds.decoy, 0.45);
    }

    #[test]
    fn test_reload_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phantomshield.json");
        std::fs::write(&path, r#"{ "risk": { "decoy_threshold": 0.7 } }"#).unwrap();

        let store = ConfigStore::from_file(&path).unwrap();
        assert_eq!(store.current().thresholds.decoy, 0.7);

        std::fs::write(&path, r#"{ "risk": { "decoy_threshold": 0.8 } }"#).unwrap();
        assert_eq!(store.reload().unwrap(), 2);
        assert_eq!(store.current().thresholds.decoy, 0.8);

        std::fs::write(&path, r#"{ "risk": { "decoy_threshold": "#).unwrap();
        assert!(matches!(store.reload(), Err(ConfigError::Parse(_))));
        assert_eq!(store.current().thresholds.decoy, 0.8);
    }

    #[test]
    fn test_reload_retries_until_file_is_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phantomshield.json");
        std::fs::write(&path, r#"{ "risk": { "decoy_threshold": 0.7 } }"#).unwrap();
        let store = ConfigStore::from_file(&path).unwrap();

        // Caught mid-write.
        std::fs::write(&path, r#"{ "risk": { "decoy_thr"#).unwrap();

        let mut delays = Vec::new();
        let generation = store
            .reload_with_backoff(&RELOAD_RETRY, |delay| {
                delays.push(delay);
                if delays.len() == 2 {
                    std::fs::write(&path, r#"{ "risk": { "decoy_threshold": 0.9 } }"#).unwrap();
                }
            })
            .unwrap();

        assert_eq!(delays, vec![Duration::from_millis(100), Duration::from_millis(200)]);
        assert_eq!(store.generation(), generation);
        assert_eq!(store.current().thresholds.decoy, 0.9);
    }

    #[test]
    fn test_reload_retries_are_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phantomshield.json");
        std::fs::write(&path, "{}").unwrap();
        let store = ConfigStore::from_file(&path).unwrap();
        let before = store.current();

        std::fs::write(&path, r#"{ "risk": { "monitor_threshold": 0.9, "decoy_threshold": 0.5 } }"#).unwrap();
        let mut attempts = 0;
        let result = store.reload_with_backoff(&RELOAD_RETRY, |_| attempts += 1);

        assert!(matches!(result, Err(ConfigError::InvalidThresholds(_))));
        assert_eq!(attempts, RELOAD_RETRY.max_retries);
        assert!(Arc::ptr_eq(&before, &store.current()));
    }

    #[test]
    fn test_reload_without_source() {
        let store = ConfigStore::new(EngineConfig::default()).unwrap();
        assert!(matches!(store.reload(), Err(ConfigError::NoSource)));
    }

    #[test]
    fn test_config_serializes_back_to_same_document() {
        let config = EngineConfig::strict();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
