//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;
    use serial_test::serial;
    use std::io::Write;

    // ========================================================================
    // Defaults
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = SuggestConfig::default();

        // Assert
        assert_eq!(config.index.name, "suggest");
        assert_eq!(config.conversion.max_candidates, 10);
        assert_eq!(config.indexer.batch_size, 100);
        assert_eq!(config.reader.lock_idle_threshold, 3);
        assert_eq!(config.reader.lock_timeout_ms, 60_000);
        assert_eq!(config.popular_words.window_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_chains() {
        let config = SuggestConfig::default();

        let converters: Vec<&str> = config
            .conversion
            .converters
            .iter()
            .map(|s| s.name.as_str())
            .collect();

        assert_eq!(converters, vec!["katakana", "romaji"]);
        assert_eq!(config.conversion.normalizers.len(), 3);
        assert_eq!(
            config.conversion.normalizers[2].options.get("id"),
            Some(&serde_json::Value::from("Any-Lower"))
        );
    }

    // ========================================================================
    // TOML parsing
    // ========================================================================

    #[test]
    fn test_config_from_toml_overrides_sections() {
        // Arrange
        let toml_str = r#"
            [index]
            name = "my_suggest"

            [conversion]
            max_candidates = 4

            [[conversion.converters]]
            name = "romaji"
            max_candidates = 3

            [indexer]
            batch_size = 5
            supported_fields = ["title", "body"]
        "#;

        // Act
        let config = SuggestConfig::from_toml(toml_str).expect("parse");

        // Assert
        assert_eq!(config.index.name, "my_suggest");
        assert_eq!(config.conversion.max_candidates, 4);
        assert_eq!(config.conversion.converters.len(), 1);
        assert_eq!(config.conversion.converters[0].name, "romaji");
        assert_eq!(
            config.conversion.converters[0].options.get("max_candidates"),
            Some(&serde_json::Value::from(3))
        );
        assert_eq!(config.indexer.batch_size, 5);
        assert_eq!(config.indexer.supported_fields, vec!["title", "body"]);
        // Untouched sections keep defaults
        assert_eq!(config.reader.page_size, 100);
    }

    #[test]
    fn test_config_from_invalid_toml() {
        let result = SuggestConfig::from_toml("[index\nname = ");

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_load_from_file() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[reader]\npage_size = 7\nretry_limit = 2").expect("write");

        // Act
        let config = SuggestConfig::load_from_path(file.path()).expect("load");

        // Assert
        assert_eq!(config.reader.page_size, 7);
        assert_eq!(config.reader.retry_limit, 2);
    }

    #[test]
    fn test_config_missing_file_uses_defaults() {
        let config = SuggestConfig::load_from_path("/nonexistent/suggest.toml").expect("load");

        assert_eq!(config.index.name, "suggest");
    }

    #[test]
    #[serial]
    fn test_config_env_overrides_file() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[indexer]\nbatch_size = 7").expect("write");
        std::env::set_var("SUGGEST_INDEXER__BATCH_SIZE", "42");

        // Act
        let config = SuggestConfig::load_from_path(file.path());
        std::env::remove_var("SUGGEST_INDEXER__BATCH_SIZE");

        // Assert
        assert_eq!(config.expect("load").indexer.batch_size, 42);
    }

    #[test]
    fn test_config_to_toml_roundtrip() {
        let config = SuggestConfig::default();

        let toml_str = config.to_toml().expect("serialize");
        let parsed = SuggestConfig::from_toml(&toml_str).expect("parse");

        assert_eq!(parsed.conversion.converters, config.conversion.converters);
        assert_eq!(parsed.indexer.batch_size, config.indexer.batch_size);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_validate_rejects_zero_candidates() {
        let mut config = SuggestConfig::default();
        config.conversion.max_candidates = 0;

        let err = config.validate().expect_err("should fail");

        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "conversion.max_candidates")
        );
    }

    #[test]
    fn test_validate_rejects_cap_below_stage_count() {
        let mut config = SuggestConfig::default();
        config.conversion.max_candidates = 1;

        let err = config.validate().expect_err("two stages need two slots");

        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "conversion.max_candidates")
        );
        config.conversion.max_candidates = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut config = SuggestConfig::default();
        config.reader.lock_backoff_min_ms = 100;
        config.reader.lock_backoff_max_ms = 10;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_size_above_max() {
        let mut config = SuggestConfig::default();
        config.search.default_size = 5000;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_index_name() {
        let mut config = SuggestConfig::default();
        config.index.name = "  ".to_string();

        assert!(config.validate().is_err());
    }
}
