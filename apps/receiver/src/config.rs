//! Receiver configuration from the environment.
//!
//! - `PORT`: TCP port to listen on (default 3000)
//!
//! Uploads always land in `./output`.

use std::path::PathBuf;

use anyhow::{Context, bail};
use pipedrop_protocol::{DEFAULT_PORT, OUTPUT_DIR};
use pipedrop_receiver::ServerConfig;

/// Environment variable naming the listen port.
pub const PORT_ENV: &str = "PORT";

/// Builds the server configuration from the process environment.
pub fn from_env() -> anyhow::Result<ServerConfig> {
    let port = match std::env::var(PORT_ENV) {
        Ok(value) => Some(value),
        Err(std::env::VarError::NotPresent) => None,
        Err(e) => bail!("{PORT_ENV} is not valid unicode: {e}"),
    };
    Ok(ServerConfig {
        port: parse_port(port.as_deref())?,
        output_dir: PathBuf::from(OUTPUT_DIR),
    })
}

/// Parses a `PORT` value; unset or blank means the default.
pub fn parse_port(value: Option<&str>) -> anyhow::Result<u16> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("invalid {PORT_ENV} value {raw:?}")),
    }
}
