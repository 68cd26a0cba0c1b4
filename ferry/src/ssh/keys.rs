//! Private key loading and remote key provisioning

use super::error::{SshError, SshResult};
use russh::keys::{PrivateKey, load_secret_key};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Environment variable consulted for encrypted-key passphrases before any
/// interactive prompt.
pub const KEY_PASSPHRASE_ENV: &str = "FERRY_SSH_KEY_PASSPHRASE";

/// Load a private key from disk.
///
/// Encrypted keys get a second decode attempt with a passphrase from
/// [`KEY_PASSPHRASE_ENV`] or, when attached to a terminal, a hidden prompt.
pub fn load_key(path: &Path) -> SshResult<PrivateKey> {
    match load_secret_key(path, None) {
        Ok(key) => Ok(key),
        Err(e) => {
            let pass = std::env::var(KEY_PASSPHRASE_ENV).ok().or_else(|| {
                if crate::output::is_interactive() {
                    crate::output::prompt_password(&format!(
                        "SSH key passphrase for {}",
                        path.display()
                    ))
                    .ok()
                } else {
                    None
                }
            });

            match pass {
                Some(pass) => {
                    load_secret_key(path, Some(&pass)).map_err(|e| SshError::KeyLoad {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })
                }
                None => Err(SshError::KeyLoad {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// Install the public half of a key pair on a remote host via the external
/// `ssh-copy-id` utility.
pub fn provision_key(key_path: &Path, host: &str, username: &str, port: u16) -> SshResult<()> {
    if !key_path.exists() {
        return Err(SshError::KeyLoad {
            path: key_path.to_path_buf(),
            reason: "key file does not exist".to_string(),
        });
    }

    let args = build_copy_id_args(key_path, host, username, port);
    let output = Command::new("ssh-copy-id").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SshError::Connection(format!(
            "ssh-copy-id failed for {username}@{host}: {}",
            stderr.trim()
        )));
    }

    tracing::info!(host = %host, user = %username, key = %key_path.display(), "public key installed");
    Ok(())
}

fn build_copy_id_args(key_path: &Path, host: &str, username: &str, port: u16) -> Vec<OsString> {
    vec![
        OsString::from("-i"),
        key_path.as_os_str().to_os_string(),
        OsString::from("-p"),
        OsString::from(port.to_string()),
        OsString::from(format!("{username}@{host}")),
    ]
}
