//! Configuration loading
//!
//! Coordinates loading configuration from env files, environment variables,
//! and the command line.

use crate::primitives::ConfigError;

use super::{cli::CliConfig, config::AppConfig, env::EnvironmentConfig};

/// Environment files read before the CLI, most specific first
const ENV_FILES: [&str; 2] = [".env.local", ".env"];

impl AppConfig {
    /// Load config and command: defaults -> .env -> env vars -> CLI
    pub fn load() -> Result<CliConfig, ConfigError> {
        // 1. .env files first so clap's `env` lookups see them
        Self::load_env_files()?;

        // 2. Standard environment variables
        let env_config = EnvironmentConfig::load()?;

        // 3. CLI arguments, with DEPTREE_* variables already folded in by clap
        let cli_config = CliConfig::load()?;

        let app_config = Self::from_sources(cli_config.app_config, &env_config)?;
        Ok(CliConfig {
            app_config,
            command: cli_config.command,
        })
    }

    /// Layer parsed CLI config over defaults and standard env vars, then validate
    pub fn from_sources(cli: AppConfig, env: &EnvironmentConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.color = env.apply_color_config(config.color);
        config = config.merge_with(cli);
        config.validate()?;
        Ok(config)
    }

    /// Read `.env.local` and `.env` if present
    pub fn load_env_files() -> Result<(), ConfigError> {
        for env_file in ENV_FILES {
            match dotenvy::from_filename(env_file) {
                Ok(_) => {}
                Err(e) if e.not_found() => {}
                Err(e) => {
                    return Err(ConfigError::EnvFileError {
                        file: env_file.to_string(),
                        source: e,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
