//! Gatekeeper configuration

use serde::Deserialize;

/// Configuration for validation rules
///
/// Every field has a default, so a partial `[validation]` table in a TOML file
/// only overrides what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum username length (characters)
    pub min_username_len: usize,

    /// Maximum username length (characters)
    pub max_username_len: usize,

    /// Minimum password length (characters)
    pub min_password_len: usize,

    /// Maximum email length (characters)
    pub max_email_len: usize,

    /// Maximum bio length (characters)
    pub max_bio_len: usize,

    /// Maximum post title length (characters)
    pub max_title_len: usize,

    /// Maximum post body length (characters)
    pub max_content_len: usize,

    /// Maximum comment length (characters)
    pub max_comment_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_username_len: 3,
            max_username_len: 150,
            min_password_len: 8,
            max_email_len: 254,
            max_bio_len: 500,
            max_title_len: 200,
            max_content_len: 10_000,
            max_comment_len: 2_000,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (minimal limits, for tests and demos)
    pub fn permissive() -> Self {
        Self {
            min_username_len: 1,
            max_username_len: 150,
            min_password_len: 1,
            max_email_len: 254,
            max_bio_len: usize::MAX,
            max_title_len: usize::MAX,
            max_content_len: usize::MAX,
            max_comment_len: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.min_password_len, 8);
        assert_eq!(config.max_title_len, 200);
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert_eq!(config.min_password_len, 1);
        assert_eq!(config.max_content_len, usize::MAX);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ValidationConfig = toml::from_str("min_password_len = 12").unwrap();
        assert_eq!(config.min_password_len, 12);
        assert_eq!(config.min_username_len, 3);
    }
}
