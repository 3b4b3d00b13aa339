//! Settings of the native client that are read on start up
//!
//! Sources in order of priority: the command line, environment variables
//! prefixed with `APP_` (e.g. `APP_SERVER_URL`), the file
//! [`CLIENT_CONFIG_FILE_NAME`] in the working directory and finally the
//! defaults.

use car_notes_shared::const_config::client::{CLIENT_CONFIG_FILE_NAME, CLIENT_DEFAULT_SERVER_URL};

use crate::cli::Cli;

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub server_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: CLIENT_DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl ClientSettings {
    /// Loads the settings falling back to the defaults (with a warning) if the
    /// sources cannot be read
    pub fn load(cli: &Cli) -> Self {
        let mut result = match get_configuration() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(?e, "failed to load configuration, using defaults");
                Self::default()
            }
        };
        if let Some(server_url) = cli.server_url.as_ref() {
            result.server_url = server_url.clone();
        }
        tracing::info!(?result, "client settings loaded");
        result
    }
}

pub fn get_configuration() -> Result<ClientSettings, config::ConfigError> {
    build_configuration(CLIENT_CONFIG_FILE_NAME, config::Environment::with_prefix("APP"))
}

fn build_configuration(
    file_name: &str,
    environment: config::Environment,
) -> Result<ClientSettings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("server_url", CLIENT_DEFAULT_SERVER_URL)?
        .add_source(config::File::with_name(file_name).required(false))
        // E.g. `APP_SERVER_URL=http://cars.example.com/api` sets `server_url`
        .add_source(environment.prefix_separator("_"))
        .build()?;

    settings.try_deserialize::<ClientSettings>()
}
