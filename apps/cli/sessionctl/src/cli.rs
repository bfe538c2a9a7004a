use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const PASSWORD_ENV: &str = "SESSION_PASSWORD";

/// Manage the stored API session.
#[derive(Debug, Parser)]
#[command(name = "sessionctl", version, about)]
pub struct Cli {
    /// Directory holding config.json (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Also print info/debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Recover the stored session and print its state
    Status,
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
    },
    /// Sign out on the backend and forget the local session
    Logout,
    /// Print the signed-in user as JSON
    Whoami,
}
