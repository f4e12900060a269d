use std::env;
use std::time::Duration;

use grantdesk_core::{AppError, AppResult};
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/star-guard/api";
const DEFAULT_LOGIN_URL: &str = "http://127.0.0.1:8080/star-guard/login";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Operator credentials for the service's form login.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub url: Url,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub login: Option<LoginConfig>,
    pub http_timeout: Duration,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_base_url = non_blank("GRANTDESK_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        Url::parse(&api_base_url).map_err(|error| {
            AppError::Validation(format!(
                "invalid GRANTDESK_API_BASE_URL value '{api_base_url}': {error}"
            ))
        })?;

        let http_timeout_secs = match non_blank("GRANTDESK_HTTP_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid GRANTDESK_HTTP_TIMEOUT_SECS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(AppError::Validation(
                "GRANTDESK_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        let login = match (non_blank("GRANTDESK_USERNAME"), lookup("GRANTDESK_PASSWORD")) {
            (Some(username), Some(password)) => {
                let raw_url = non_blank("GRANTDESK_LOGIN_URL")
                    .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_owned());
                let url = Url::parse(&raw_url).map_err(|error| {
                    AppError::Validation(format!(
                        "invalid GRANTDESK_LOGIN_URL value '{raw_url}': {error}"
                    ))
                })?;
                Some(LoginConfig {
                    url,
                    username,
                    password,
                })
            }
            (Some(_), None) => {
                return Err(AppError::Validation(
                    "GRANTDESK_PASSWORD is required when GRANTDESK_USERNAME is set".to_owned(),
                ));
            }
            (None, _) => None,
        };

        Ok(Self {
            api_base_url,
            login,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::ConsoleConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<ConsoleConfig, grantdesk_core::AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        ConsoleConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = load(&[]);
        let Ok(config) = config else {
            panic!("defaults should load");
        };

        assert_eq!(config.api_base_url, "http://127.0.0.1:8080/star-guard/api");
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.login.is_none());
    }

    #[test]
    fn credentials_enable_login() {
        let config = load(&[
            ("GRANTDESK_API_BASE_URL", "https://perm.example.com/star-guard/api/"),
            ("GRANTDESK_USERNAME", "admin"),
            ("GRANTDESK_PASSWORD", "secret"),
        ]);
        let Ok(config) = config else {
            panic!("config should load");
        };

        assert_eq!(config.api_base_url, "https://perm.example.com/star-guard/api");
        assert_eq!(
            config.login.map(|login| login.username),
            Some("admin".to_owned())
        );
    }

    #[test]
    fn username_without_password_is_rejected() {
        assert!(load(&[("GRANTDESK_USERNAME", "admin")]).is_err());
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        assert!(load(&[("GRANTDESK_HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("GRANTDESK_HTTP_TIMEOUT_SECS", "soon")]).is_err());
    }
}
