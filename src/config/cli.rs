use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the wijiwiki binary.
#[derive(Debug, Parser)]
#[command(name = "wijiwiki", version, about = "Markdown wiki server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "WIJIWIKI_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the wiki over HTTP.
    Serve(Box<ServeArgs>),
    /// Reset the user file to a single admin account.
    Init(InitArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(short = 'p', long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the directory holding page sources.
    #[arg(long = "pages-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub pages_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    /// Password for the `admin` account.
    #[arg(long = "admin-password", env = "WIJIWIKI_ADMIN_PASSWORD", value_name = "PASSWORD")]
    pub admin_password: String,

    /// Override the user file location.
    #[arg(long = "users-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub users_file: Option<PathBuf>,
}
