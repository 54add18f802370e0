use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the tuning values
/// are inconsistent.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the tuning values
/// are inconsistent.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; parsing and validation are decoupled from the
/// real environment so tests can drive this with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
            Err(_) => Ok(default),
        }
    };

    let log_level = or_default("MAPSCOUT_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("MAPSCOUT_OUTPUT_DIR", "./output"));
    let jobs_path = PathBuf::from(or_default("MAPSCOUT_JOBS_PATH", "./config/jobs.yaml"));
    let search_base_url = or_default(
        "MAPSCOUT_SEARCH_BASE_URL",
        "https://www.google.com/maps/search/",
    );
    let language = or_default("MAPSCOUT_LANGUAGE", "en");
    let browser_headless = parse_bool("MAPSCOUT_BROWSER_HEADLESS", true)?;
    let browser_executable = lookup("MAPSCOUT_BROWSER_EXECUTABLE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let enrich_emails = parse_bool("MAPSCOUT_ENRICH_EMAILS", true)?;

    let navigation_timeout_secs = parse_u64("MAPSCOUT_NAVIGATION_TIMEOUT_SECS", "60")?;
    let consent_timeout_ms = parse_u64("MAPSCOUT_CONSENT_TIMEOUT_MS", "5000")?;
    let feed_timeout_ms = parse_u64("MAPSCOUT_FEED_TIMEOUT_MS", "15000")?;
    let detail_timeout_ms = parse_u64("MAPSCOUT_DETAIL_TIMEOUT_MS", "5000")?;
    let card_settle_ms = parse_u64("MAPSCOUT_CARD_SETTLE_MS", "1000")?;
    let detail_settle_ms = parse_u64("MAPSCOUT_DETAIL_SETTLE_MS", "2000")?;
    let scroll_settle_ms = parse_u64("MAPSCOUT_SCROLL_SETTLE_MS", "2000")?;
    let scroll_step_px = parse_u32("MAPSCOUT_SCROLL_STEP_PX", "1000")?;
    let enrich_timeout_ms = parse_u64("MAPSCOUT_ENRICH_TIMEOUT_MS", "8000")?;
    let max_stale_rounds = parse_u32("MAPSCOUT_MAX_STALE_ROUNDS", "5")?;
    let end_stale_rounds = parse_u32("MAPSCOUT_END_STALE_ROUNDS", "2")?;

    if max_stale_rounds == 0 || end_stale_rounds == 0 {
        return Err(ConfigError::Validation(
            "stale round thresholds must be at least 1".to_string(),
        ));
    }
    if end_stale_rounds > max_stale_rounds {
        return Err(ConfigError::Validation(format!(
            "MAPSCOUT_END_STALE_ROUNDS ({end_stale_rounds}) must not exceed \
             MAPSCOUT_MAX_STALE_ROUNDS ({max_stale_rounds})"
        )));
    }

    Ok(AppConfig {
        log_level,
        output_dir,
        jobs_path,
        search_base_url,
        language,
        browser_headless,
        browser_executable,
        enrich_emails,
        navigation_timeout_secs,
        consent_timeout_ms,
        feed_timeout_ms,
        detail_timeout_ms,
        card_settle_ms,
        detail_settle_ms,
        scroll_settle_ms,
        scroll_step_px,
        enrich_timeout_ms,
        max_stale_rounds,
        end_stale_rounds,
    })
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` (any case).
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
