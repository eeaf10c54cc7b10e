//! `.env` file loading.
//!
//! Lines are `KEY=VALUE`. Blank lines and `#` comments are skipped, as are
//! lines that do not split into exactly two parts on `=`. Values are used
//! verbatim apart from surrounding whitespace; no quoting or interpolation.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Parses `.env` content into a key/value map.
pub fn parse_env(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 {
            continue;
        }
        let key = parts[0].trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), parts[1].trim().to_string());
    }
    vars
}

/// Reads and parses a `.env` file. A missing file yields an empty map.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_env(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No env file found");
            Ok(HashMap::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read env file {}", path.display())),
    }
}

/// Variable lookup with process environment taking precedence over the
/// values read from the `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    file: HashMap<String, String>,
    read_process_env: bool,
}

impl EnvVars {
    /// Lookup backed by the process environment, falling back to `file`.
    pub fn new(file: HashMap<String, String>) -> Self {
        Self {
            file,
            read_process_env: true,
        }
    }

    /// Lookup backed only by the given map.
    pub fn from_map(file: HashMap<String, String>) -> Self {
        Self {
            file,
            read_process_env: false,
        }
    }

    /// Returns the value for `key`. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        if self.read_process_env {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        self.file.get(key).filter(|v| !v.is_empty()).cloned()
    }
}
