//! Configuration validation
//!
//! Validation runs on the deserialized [`GameConfig`] and collects ALL
//! issues rather than stopping at the first one.
//!
//! An unset region is only a warning here: operators load a configuration
//! before marking corners. Starting a game re-checks it as an error.

use crate::config::schema::GameConfig;
use crate::error::{Severity, ValidationIssue};
use crate::region::Vec3;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns the result.
    pub fn validate(&mut self, config: &GameConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_durations(config);
        self.validate_region(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_durations(&mut self, config: &GameConfig) {
        if config.green_light_seconds < 1 {
            self.add_error("green_light_seconds", "Green phase must last at least 1 second");
        }
        if config.red_light_seconds < 1 {
            self.add_error("red_light_seconds", "Red phase must last at least 1 second");
        }

        let timings = config.timings();
        if timings.red_ticks > 0 && timings.arming_delay_ticks >= timings.red_ticks {
            self.add_warning(
                "red_light_delay_ticks",
                &format!(
                    "Arming delay of {} ticks is not shorter than the {}-tick red phase; \
                     detection will never arm",
                    timings.arming_delay_ticks, timings.red_ticks
                ),
            );
        }
    }

    fn validate_region(&mut self, config: &GameConfig) {
        let first = config.region.first.0;
        let second = config.region.second.0;

        let mut finite = true;
        for (path, corner) in [("region.first", first), ("region.second", second)] {
            if !corner.is_finite() {
                finite = false;
                self.add_error(path, "Corner coordinates must be finite numbers");
            }
        }
        if !finite {
            return;
        }

        if first == Vec3::ORIGIN || second == Vec3::ORIGIN {
            self.add_warning(
                "region",
                "Region corners are not set; the game cannot start until both are marked",
            );
        } else if first == second {
            self.add_warning(
                "region",
                "Region corners are identical; the game cannot start with a degenerate region",
            );
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Corner, RegionConfig};

    fn marked_config() -> GameConfig {
        GameConfig {
            world: Some("arena".to_string()),
            region: RegionConfig {
                first: Corner(Vec3::new(10.0, 60.0, 10.0)),
                second: Corner(Vec3::new(-10.0, 70.0, -10.0)),
            },
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_validate_marked_config() {
        let result = Validator::new().validate(&marked_config());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_zero_durations() {
        let config = GameConfig {
            green_light_seconds: 0,
            red_light_seconds: 0,
            ..marked_config()
        };
        let result = Validator::new().validate(&config);
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["green_light_seconds", "red_light_seconds"]);
    }

    #[test]
    fn test_validate_arming_never_reached() {
        let config = GameConfig {
            red_light_seconds: 1,
            red_light_delay_ticks: 20,
            ..marked_config()
        };
        let result = Validator::new().validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "red_light_delay_ticks");
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_validate_unset_region_warns() {
        let config = GameConfig {
            world: Some("arena".to_string()),
            ..GameConfig::default()
        };
        let result = Validator::new().validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings[0].path, "region");
    }

    #[test]
    fn test_validate_degenerate_region_warns() {
        let corner = Corner(Vec3::new(3.0, 64.0, 3.0));
        let config = GameConfig {
            region: RegionConfig {
                first: corner,
                second: corner,
            },
            ..marked_config()
        };
        let result = Validator::new().validate(&config);
        assert!(result.warnings[0].message.contains("identical"));
    }

    #[test]
    fn test_validate_non_finite_corner() {
        let config = GameConfig {
            region: RegionConfig {
                first: Corner(Vec3::new(f64::NAN, 64.0, 0.0)),
                second: Corner(Vec3::new(1.0, f64::INFINITY, 0.0)),
            },
            ..marked_config()
        };
        let result = Validator::new().validate(&config);
        assert_eq!(result.errors.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validator_is_reusable() {
        let mut validator = Validator::new();
        let bad = GameConfig {
            green_light_seconds: 0,
            ..marked_config()
        };
        assert!(validator.validate(&bad).has_errors());
        assert!(validator.validate(&marked_config()).is_valid());
    }
}
