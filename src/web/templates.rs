use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;

/// HTML templates loaded once at startup.
///
/// Every `*.html` file in the template directory is registered under its
/// file name, so pages can `{% extends "base.html" %}`. Output is
/// auto-escaped.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut env = Environment::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read template directory {}", dir.display()))?;

        let mut count = 0usize;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension() != Some(OsStr::new("html")) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            env.add_template_owned(name.to_string(), source)
                .with_context(|| format!("Invalid template {}", path.display()))?;
            count += 1;
        }

        tracing::info!(dir = %dir.display(), count, "Loaded templates");
        Ok(Self { env })
    }

    /// Builds templates from in-memory sources.
    pub fn from_sources<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        let mut env = Environment::new();
        for (name, source) in sources {
            env.add_template(name, source)
                .with_context(|| format!("Invalid template {name}"))?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
