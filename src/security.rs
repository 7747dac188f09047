// A bunch of stuff used to determine if the server should run in secure mode or not

use std::env;
use std::path::PathBuf;

const SSL_MODE_ENV_KEY: &str = "SSL_MODE";
const SSL_CERT_PATH_ENV_KEY: &str = "SSL_CERT_PATH";
const SSL_KEY_PATH_ENV_KEY: &str = "SSL_KEY_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SSLModeSettings {
	pub cert_path: PathBuf,
	pub key_path: PathBuf
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SecurityError {
	#[error("error parsing SSL_MODE value {0:?}, expected an integer")]
	InvalidMode(String),
	#[error("the {0} environment variable is required when SSL_MODE=1")]
	MissingVariable(&'static str),
}

/// Reads the TLS settings from the process environment
pub fn get_ssl_mode_settings() -> Result<Option<SSLModeSettings>, SecurityError> {
	ssl_mode_settings_from(|key| env::var(key).ok())
}

pub fn ssl_mode_settings_from<F>(lookup: F) -> Result<Option<SSLModeSettings>, SecurityError>
where
	F: Fn(&str) -> Option<String>
{
	let secure_mode = match lookup(SSL_MODE_ENV_KEY) {
		Some(val) => match val.trim().parse::<i32>() {
			Ok(val) => val > 0,
			Err(_) => return Err(SecurityError::InvalidMode(val))
		},
		None => {
			log::info!("{SSL_MODE_ENV_KEY} was not found. Running in non-secure mode.");
			log::info!("The environment variable {SSL_MODE_ENV_KEY}=1 is required on an environment using HTTPS");
			false
		}
	};

	if !secure_mode {
		return Ok(None);
	}

	let cert_path = lookup(SSL_CERT_PATH_ENV_KEY).ok_or(SecurityError::MissingVariable(SSL_CERT_PATH_ENV_KEY))?;
	let key_path = lookup(SSL_KEY_PATH_ENV_KEY).ok_or(SecurityError::MissingVariable(SSL_KEY_PATH_ENV_KEY))?;

	Ok(Some(SSLModeSettings {
		cert_path: cert_path.into(),
		key_path: key_path.into()
	}))
}
