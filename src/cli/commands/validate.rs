//! `validate` command handler
//!
//! Loads each configuration file through the same pipeline `simulate`
//! uses and reports its warnings.

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, RedlightError, Severity, ValidationIssue};

/// Validate configuration files without running a game.
///
/// Stops at the first file that fails to load.
///
/// # Errors
///
/// Returns a config error if a file is missing, unparsable or invalid, or,
/// with `--strict`, if it produced any warning.
pub fn run(args: &ValidateArgs) -> Result<(), RedlightError> {
    let mut loader = ConfigLoader::with_defaults();

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let load_result = loader.load(path)?;

        for warning in &load_result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }

        report(args.format, &path.display().to_string(), &load_result.warnings);

        if args.strict && !load_result.warnings.is_empty() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: load_result.warnings.iter().map(as_error).collect(),
            }
            .into());
        }

        tracing::info!(file = %path.display(), "configuration valid");
    }

    Ok(())
}

fn report(format: OutputFormat, file: &str, warnings: &[LoadWarning]) {
    match format {
        OutputFormat::Human => {
            if warnings.is_empty() {
                println!("{file}: ok");
            } else {
                println!("{file}: ok with {} warning(s)", warnings.len());
                for warning in warnings {
                    let location = warning.location.as_deref().unwrap_or("<unknown>");
                    println!("  warning: {} at {location}", warning.message);
                }
            }
        }
        OutputFormat::Json => {
            let warnings: Vec<_> = warnings
                .iter()
                .map(|w| serde_json::json!({ "message": w.message, "location": w.location }))
                .collect();
            println!(
                "{}",
                serde_json::json!({ "file": file, "valid": true, "warnings": warnings })
            );
        }
    }
}

fn as_error(warning: &LoadWarning) -> ValidationIssue {
    ValidationIssue {
        path: warning.location.clone().unwrap_or_default(),
        message: warning.message.clone(),
        severity: Severity::Error,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn file_with(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    fn args(files: Vec<PathBuf>, strict: bool) -> ValidateArgs {
        ValidateArgs {
            files,
            format: OutputFormat::Human,
            strict,
        }
    }

    #[test]
    fn test_valid_file_passes() {
        let file = file_with("region:\n  first: \"1 0 1\"\n  second: \"10 5 10\"\n");
        assert!(run(&args(vec![file.path().to_path_buf()], true)).is_ok());
    }

    #[test]
    fn test_strict_rejects_warnings() {
        // no region at all only warns
        let file = file_with("green_light_seconds: 4\n");
        let paths = vec![file.path().to_path_buf()];
        assert!(run(&args(paths.clone(), false)).is_ok());

        let err = run(&args(paths, true)).unwrap_err();
        assert!(matches!(
            err,
            RedlightError::Config(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = run(&args(vec![PathBuf::from("/nonexistent/game.yaml")], false)).unwrap_err();
        assert!(matches!(
            err,
            RedlightError::Config(ConfigError::MissingFile { .. })
        ));
    }
}
