//! # Tool Settings
//!
//! Settings of the synthesizer itself (not of the synthesized stack), loaded
//! from environment variables.

/// Output format of a synthesized template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

/// Logging settings
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE); `RUST_LOG` wins when set
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable color in text format logs
    pub log_enable_color: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
            log_enable_color: false,
        }
    }
}

impl LogSettings {
    /// Load settings from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env_var_or_default_str("LOG_LEVEL", &defaults.log_level),
            log_format: env_var_or_default_str("LOG_FORMAT", &defaults.log_format),
            log_enable_color: env_var_or_default_bool("LOG_ENABLE_COLOR", defaults.log_enable_color),
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable as boolean or return default
pub(crate) fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| parse_bool(&v))
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "TRUE", "1", "yes", "On"] {
            assert!(parse_bool(truthy), "{truthy} should be true");
        }
        for falsy in ["false", "0", "no", "off", ""] {
            assert!(!parse_bool(falsy), "{falsy} should be false");
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = LogSettings::default();
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.is_json());
    }

    #[test]
    fn test_env_var_or_default_str_falls_back() {
        assert_eq!(
            env_var_or_default_str("TAP_STACK_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
        assert!(env_var_or_default_bool("TAP_STACK_TEST_UNSET_VARIABLE", true));
    }
}
