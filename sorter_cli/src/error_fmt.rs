//! Human-readable error descriptions, exit codes and structured JSON errors.

use thiserror::Error;

/// Failures raised by the CLI itself, tagged by where they came from.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid scenario: {0}")]
    Scenario(String),
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use sorter_core::error::{BuildError, SorterError};

    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(msg) => format!(
                "What happened: The configuration was rejected ({msg}).\nLikely causes: Missing [band] section, an inverted band, or out-of-range values.\nHow to fix: Edit the TOML config and rerun `sorter self-check`."
            ),
            CliError::Scenario(msg) => format!(
                "What happened: The scenario file could not be used ({msg}).\nLikely causes: Wrong header (expected a single 'grams' column) or a non-numeric/negative weight.\nHow to fix: Fix the CSV and rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No weight sensor was provided to the sorter.\nLikely causes: The load cell failed to initialize or was not wired into the builder.\nHow to fix: Pass the sensor via with_sensor(...).".to_string()
            }
            BuildError::MissingPusher | BuildError::MissingEjector => {
                "What happened: An actuator was not provided to the sorter.\nLikely causes: A servo failed to initialize or was not wired into the builder.\nHow to fix: Pass both actuators via with_pusher(...) and with_ejector(...).".to_string()
            }
            BuildError::MissingBand => {
                "What happened: No acceptance band was configured.\nLikely causes: The [band] section is missing.\nHow to fix: Add [band] with min_g and max_g.".to_string()
            }
            BuildError::InvalidBand { min, max } => format!(
                "What happened: The acceptance band {min} g .. {max} g is invalid.\nLikely causes: min_g greater than max_g, or a non-finite bound.\nHow to fix: Set band.min_g <= band.max_g."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SorterError>() {
        if matches!(se, SorterError::NotReady | SorterError::Timeout) {
            return "What happened: The load cell did not deliver a reading.\nLikely causes: Sensor not wired, no power, or not yet settled after power-on.\nHow to fix: Check the [pins] and power, then retry.".to_string();
        }
        return format!(
            "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: configuration 2, scenario 3, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use sorter_core::error::BuildError;
    match err.downcast_ref::<CliError>() {
        Some(CliError::Config(_)) => 2,
        Some(CliError::Scenario(_)) => 3,
        None if err.downcast_ref::<BuildError>().is_some() => 2,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<CliError>() {
        Some(CliError::Config(_)) => "Config",
        Some(CliError::Scenario(_)) => "Scenario",
        None if err.downcast_ref::<sorter_core::error::BuildError>().is_some() => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_scenario_errors_have_distinct_codes() {
        let cfg = eyre::Report::new(CliError::Config("band".into()));
        let scn = eyre::Report::new(CliError::Scenario("header".into()));
        let other = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&cfg), 2);
        assert_eq!(exit_code_for_error(&scn), 3);
        assert_eq!(exit_code_for_error(&other), 1);
    }

    #[test]
    fn build_errors_count_as_config_errors() {
        let e = eyre::Report::new(sorter_core::error::BuildError::MissingBand);
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("[band]"));
    }

    #[test]
    fn json_error_carries_reason_and_code() {
        let e = eyre::Report::new(CliError::Scenario("row 3".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Scenario");
        assert_eq!(v["exit_code"], 3);
        assert!(v["message"].as_str().unwrap().contains("row 3"));
    }
}
