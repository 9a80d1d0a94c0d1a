use crate::errors::AppError;

/// Runtime switches read from the environment.
///
/// | Env Var                       | Default |
/// |-------------------------------|---------|
/// | `REQUIRE_EMAIL_VERIFICATION`  | `false` |
/// | `AUTO_ENROLL_PROJECT_CREATOR` | `false` |
/// | `REFRESH_TOKEN_DAYS`          | `30`    |
/// | `ALLOWED_ORIGINS`             | `*`     |
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Reject logins for accounts whose e-mail has not been confirmed.
    pub require_email_verification: bool,
    /// Insert an `owner` membership row for the creator of a new project.
    /// Off by default: project creation only records `created_by`.
    pub auto_enroll_project_creator: bool,
    pub refresh_token_days: i64,
    /// Lifetime of e-mail verification and password reset tokens.
    pub action_token_hours: i64,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            require_email_verification: false,
            auto_enroll_project_creator: false,
            refresh_token_days: 30,
            action_token_hours: 24,
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let allowed_origins = match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) if raw.trim() != "*" => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            require_email_verification: env_flag("REQUIRE_EMAIL_VERIFICATION", defaults.require_email_verification)?,
            auto_enroll_project_creator: env_flag("AUTO_ENROLL_PROJECT_CREATOR", defaults.auto_enroll_project_creator)?,
            refresh_token_days: env_number("REFRESH_TOKEN_DAYS", defaults.refresh_token_days)?,
            action_token_hours: env_number("ACTION_TOKEN_HOURS", defaults.action_token_hours)?,
            allowed_origins,
        })
    }
}

/// `APP_PORT`, falling back to 8000 when unset or unparsable.
pub fn app_port() -> u16 {
    std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000)
}

fn env_flag(name: &str, default: bool) -> Result<bool, AppError> {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value)
            .ok_or_else(|| AppError::configuration(format!("{name} must be true or false"))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn env_number(name: &str, default: i64) -> Result<i64, AppError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::configuration(format!("{name} must be a positive integer"))),
        Err(_) => Ok(default),
    }
}
