use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};

use crate::commands::{self, keys};
use crate::ssh::SessionConfig;

/// Ferry - stage files and launch scripts on remote hosts over SSH
#[derive(Parser)]
#[command(name = "ferry")]
#[command(version, disable_version_flag = true)]
#[command(about = "Ferry - stage files and launch scripts on remote hosts over SSH")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show version
    #[arg(long, global = true)]
    pub version: bool,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The remote target every command needs: who, where, and which key.
#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Remote host address
    #[arg(short = 'H', long, env = "FERRY_HOST")]
    pub host: String,

    /// Username for login
    #[arg(short = 'u', long, env = "FERRY_USER")]
    pub user: String,

    /// Path to the private key (defaults to ~/.ssh/id_ed25519)
    #[arg(short = 'i', long, env = "FERRY_KEY")]
    pub key: Option<PathBuf>,

    /// SSH port
    #[arg(short = 'p', long, default_value_t = 22)]
    pub port: u16,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

impl TargetArgs {
    pub fn key_path(&self) -> PathBuf {
        self.key.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".ssh")
                .join("id_ed25519")
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(&self.host, &self.user, self.key_path());
        config.port = self.port;
        config.timeout = Duration::from_millis(self.timeout_ms);
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a JSON payload to a remote directory
    Push {
        #[command(flatten)]
        target: TargetArgs,

        /// Local JSON file holding the payload
        data: PathBuf,

        /// Remote directory to receive the payload
        remote_dir: String,

        /// File name on the host (forced to a .json suffix; defaults to the local name)
        #[arg(long)]
        name: Option<String>,

        /// Leave the connection open after the transfer
        #[arg(long)]
        keep: bool,
    },

    /// Upload a file to the remote host
    Send {
        #[command(flatten)]
        target: TargetArgs,

        /// Local file to upload
        local: PathBuf,

        /// Remote destination (a directory, or an explicit file path)
        remote: String,

        /// Leave the connection open after the transfer
        #[arg(long)]
        keep: bool,
    },

    /// Download a file from the remote host
    Fetch {
        #[command(flatten)]
        target: TargetArgs,

        /// Remote file to download
        remote: String,

        /// Local destination path
        local: PathBuf,

        /// Leave the connection open after the transfer
        #[arg(long)]
        keep: bool,
    },

    /// Launch a script on the remote host and stream its output
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Remote script path (or its destination when staging with --stage)
        script: String,

        /// Local script to stage onto the host before launching
        #[arg(long)]
        stage: Option<PathBuf>,

        /// Extra interpreter option placed before the script name (e.g. -u)
        #[arg(long, allow_hyphen_values = true)]
        option: Option<String>,

        /// Interpreter command
        #[arg(long, default_value = "python")]
        interpreter: String,

        /// Arguments passed to the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Key management commands
    #[command(subcommand)]
    Keys(keys::KeyCommands),
}

impl Cli {
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        if self.version {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let Some(command) = self.command else {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        };

        match command {
            Commands::Push {
                target,
                data,
                remote_dir,
                name,
                keep,
            } => commands::push::run(&target, &data, &remote_dir, name.as_deref(), keep),
            Commands::Send {
                target,
                local,
                remote,
                keep,
            } => commands::send::run(&target, &local, &remote, keep),
            Commands::Fetch {
                target,
                remote,
                local,
                keep,
            } => commands::fetch::run(&target, &remote, &local, keep),
            Commands::Run {
                target,
                script,
                stage,
                option,
                interpreter,
                args,
            } => commands::run::run(&target, &script, stage, option, &interpreter, args),
            Commands::Keys(cmd) => keys::run(cmd),
        }
    }
}
