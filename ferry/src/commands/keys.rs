//! `ferry keys` - key management

use clap::Subcommand;

use crate::cli::TargetArgs;
use crate::output;
use crate::ssh;

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Install the public key on the remote host via ssh-copy-id
    Install {
        #[command(flatten)]
        target: TargetArgs,
    },
}

pub fn run(cmd: KeyCommands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        KeyCommands::Install { target } => {
            let key_path = target.key_path();
            output::step(&format!(
                "Installing {} for {}@{}...",
                key_path.display(),
                target.user,
                target.host
            ));
            ssh::provision_key(&key_path, &target.host, &target.user, target.port)?;
            output::success(&format!("Key installed for {}@{}", target.user, target.host));
            Ok(())
        }
    }
}
