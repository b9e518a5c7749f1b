// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Trellis project configuration.
//!
//! Configuration is loaded from `trellis.toml` at the project root. Every
//! section and key is optional.
//!
//! # Example Configuration
//!
//! ```toml
//! [project]
//! name = "my-app"
//!
//! [routing]
//! app_dir = "app"
//! output_dir = "src/generated"
//! static_dir = "static"
//!
//! [dev]
//! host = "127.0.0.1"
//! port = 3000
//! ignore = ["**/target/**", "**/.git/**"]
//!
//! [build]
//! release = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "trellis.toml";

/// Main configuration structure loaded from `trellis.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Where routes are read from and generated code is written to.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Development loop settings.
    #[serde(default)]
    pub dev: DevConfig,
    /// Production build settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Project metadata configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_name")]
    pub name: String,
}

/// Routing configuration for file-based routing.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Directory scanned for marker files (default: "app").
    #[serde(default = "default_app_dir")]
    pub app_dir: String,

    /// Directory the generator writes to (default: "src/generated").
    /// Must lie under `src/`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory for static files (default: "static").
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Development loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DevConfig {
    /// Server host (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Glob patterns of paths the watcher ignores.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

/// Production build configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Build with `--release` (default: true).
    #[serde(default = "default_release")]
    pub release: bool,
}

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_app_dir() -> String {
    "app".to_string()
}

fn default_output_dir() -> String {
    "src/generated".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_ignore() -> Vec<String> {
    vec!["**/target/**".to_string(), "**/.git/**".to_string()]
}

fn default_release() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            output_dir: default_output_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ignore: default_ignore(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            release: default_release(),
        }
    }
}

impl Config {
    /// Loads configuration from `trellis.toml` in the current directory.
    ///
    /// If no configuration file exists, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Loads configuration from `trellis.toml` in `project_dir`.
    pub fn load_from(project_dir: &Path) -> anyhow::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE);
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", config_path.display(), e))?;
        Ok(config)
    }

    /// The app directory, resolved against `project_dir`.
    pub fn app_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.routing.app_dir)
    }

    /// The generator output directory, resolved against `project_dir`.
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.routing.output_dir)
    }

    /// The static files directory, resolved against `project_dir`.
    pub fn static_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.routing.static_dir)
    }

    /// Address the dev server listens on.
    pub fn dev_addr(&self) -> String {
        format!("{}:{}", self.dev.host, self.dev.port)
    }

    /// Compiles the watcher ignore patterns.
    pub fn ignore_set(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.dev.ignore {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}
