use crate::primitives::ConfigError;
use clap::{Parser, Subcommand};
use std::ffi::OsString;

use super::config::AppConfig;

/// deptree CLI - npm dependency tree resolver
#[derive(Debug, Clone, Parser)]
#[command(name = "deptree")]
#[command(about = "Resolve the full dependency tree of an npm package")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// deptree commands
    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration loaded from CLI
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Commands,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        Ok(cli.into())
    }

    /// Parse an explicit argument list, program name first
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Into::into)
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            app_config: cli.config,
            command: cli.command,
        }
    }
}

/// Available deptree commands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Resolve the dependency tree of a package at a version
    Resolve {
        /// Package name; percent-encoded names such as %40types%2Freact are accepted
        #[arg(help = "Package name, e.g. react or @types/react")]
        name: String,

        /// Exact version, dist-tag, or range
        #[arg(id = "package_version", value_name = "VERSION", help = "Version to resolve, e.g. 16.13.0 or latest")]
        version: String,

        /// Print the tree on a single line
        #[arg(long, help = "Print compact single-line JSON")]
        compact: bool,
    },

    /// Show the version a range selects for a package
    Select {
        /// Package name
        #[arg(help = "Package name")]
        name: String,

        /// Range expression
        #[arg(help = "Range expression, e.g. ^1.2.0 or '>=1.0.0 <2.0.0'")]
        range: String,
    },
}

impl Commands {
    /// Package name as given on the command line
    pub fn package_name(&self) -> &str {
        match self {
            Commands::Resolve { name, .. } | Commands::Select { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
