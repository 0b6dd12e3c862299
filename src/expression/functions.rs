// ABOUTME: Built-in functions and filters available inside expressions
// ABOUTME: Implements uuid, timestamp, env and hostname lookups plus base64 filters

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use minijinja::{Environment, Error, ErrorKind};
use std::env;
use uuid::Uuid;

/// Returns a new UUID v4
pub fn uuid_function() -> String {
    Uuid::new_v4().to_string()
}

/// Formats the current UTC time, `%Y-%m-%d %H:%M:%S` by default
pub fn timestamp_function(format: Option<String>) -> String {
    let format = format.unwrap_or_else(|| "%Y-%m-%d %H:%M:%S".to_string());
    Utc::now().format(&format).to_string()
}

/// Reads an environment variable, falling back to `default` or the empty string
pub fn env_function(name: String, default: Option<String>) -> String {
    env::var(&name).unwrap_or_else(|_| default.unwrap_or_default())
}

pub fn hostname_function() -> Result<String, Error> {
    let hostname = hostname::get()
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("hostname: {}", e)))?;
    Ok(hostname.to_string_lossy().to_string())
}

pub fn b64encode_filter(value: String) -> String {
    BASE64.encode(value.as_bytes())
}

pub fn b64decode_filter(value: String) -> Result<String, Error> {
    let bytes = BASE64
        .decode(value.as_bytes())
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("b64decode: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("b64decode: {}", e)))
}

/// Register all built-in functions and filters on an environment
pub fn register_functions(env: &mut Environment<'_>) {
    env.add_function("uuid", uuid_function);
    env.add_function("timestamp", timestamp_function);
    env.add_function("env", env_function);
    env.add_function("hostname", hostname_function);
    env.add_filter("b64encode", b64encode_filter);
    env.add_filter("b64decode", b64decode_filter);
}
