use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct App {
    pub(super) host: String,
    pub(super) port: String,

    /// Deadline of a single http request, in seconds
    #[serde(default = "default_timeout")]
    pub(super) timeout: u64,
}

impl App {
    pub fn get_app_config(&self) -> (String, String) {
        (self.host.to_owned(), self.port.to_owned())
    }

    pub fn get_timeout(&self) -> u64 {
        self.timeout
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.host.is_empty() {
            return Err(CommonError::ValidationError("app: missing host".to_string()));
        }

        if self.port.parse::<u16>().is_err() {
            return Err(CommonError::ValidationError(format!(
                "app: invalid port: {}",
                self.port
            )));
        }

        if self.timeout == 0 {
            return Err(CommonError::ValidationError(
                "app: timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::path::PathBuf;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers;

    #[test]
    fn test_parse_app_config() -> Result<(), ConfigError> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/config/fixtures");

        let toml_file = format!("{}/config_app.toml", path.display());
        let config_toml = {
            let config_builder: Result<App, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let config_app = config_toml.unwrap();
        assert_eq!(config_app.host, "localhost".to_string());
        assert_eq!(config_app.port, "8181".to_string());
        assert_eq!(config_app.timeout, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn test_validate_invalid_port() {
        let app = App {
            host: "localhost".to_string(),
            port: "http".to_string(),
            timeout: 5,
        };

        let validation = helpers::validate(app);
        assert!(matches!(validation, Err(CommonError::ValidationError(_))))
    }
}
