//! Remote client: high-level upload and script-launch operations

use super::auth::AuthFallback;
use super::error::{SshError, SshResult};
use super::process::RemoteProcess;
use super::session::{Session, SessionConfig};
use crate::paths;
use russh_sftp::protocol::FileAttributes;
use std::path::Path;

/// Default interpreter for remote script launches.
pub const DEFAULT_INTERPRETER: &str = "python";

/// Script launch parameters for [`RemoteClient::run_script`].
#[derive(Debug, Clone, Default)]
pub struct ScriptLaunch {
    /// Extra interpreter option placed before the script name (e.g. `-u`)
    pub command_option: Option<String>,
    /// Positional arguments appended after the script name
    pub script_args: Vec<String>,
    /// Local script to stage onto the host before launching
    pub local_script: Option<std::path::PathBuf>,
    /// Interpreter command; defaults to [`DEFAULT_INTERPRETER`]
    pub interpreter: Option<String>,
}

/// Orchestrates one transport session and its transfer tunnel to expose
/// upload, download and remote-script operations.
///
/// Each call decides via `keep_connection` whether the session survives for
/// a subsequent call; the default is to close it.
pub struct RemoteClient {
    session: Session,
}

impl RemoteClient {
    /// Create a client with the interactive console fallback provider.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
        }
    }

    /// Create a client with an injected fallback decision provider.
    pub fn with_fallback(config: SessionConfig, fallback: Box<dyn AuthFallback>) -> Self {
        Self {
            session: Session::with_fallback(config, fallback),
        }
    }

    /// The underlying transport session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Change the SSH port. Only valid before the first connection.
    pub fn set_port(&mut self, port: u16) -> SshResult<()> {
        self.session.set_port(port)
    }

    fn host(&self) -> String {
        self.session.config().host.clone()
    }

    /// Serialize `data` as pretty JSON and upload it to
    /// `remote_dir/<filename>`, with the file name forced to a `.json`
    /// suffix.
    ///
    /// Never returns an error: failures are logged (naming file and host) and
    /// reported as `None`. Unless `keep_connection` is set, the session is
    /// closed before returning, on success and failure alike.
    pub async fn upload_data(
        &mut self,
        data: &serde_json::Value,
        remote_dir: &str,
        filename: &str,
        keep_connection: bool,
    ) -> Option<FileAttributes> {
        let name = paths::json_file_name(filename);
        let dest = paths::join_remote(remote_dir, &name);

        let result = self.upload_data_inner(data, &dest).await;
        let attrs = self.swallow_transfer(result, &name);
        self.release(keep_connection).await;
        attrs
    }

    async fn upload_data_inner(
        &mut self,
        data: &serde_json::Value,
        dest: &str,
    ) -> SshResult<FileAttributes> {
        let payload = serde_json::to_string_pretty(data)
            .map_err(|e| SshError::Transfer(format!("failed to serialize payload: {e}")))?;

        let tunnel = self.session.ensure_tunnel(None).await?;
        tunnel.put_bytes(payload.as_bytes(), dest).await
    }

    /// Upload a local file.
    ///
    /// When the final component of `remote_path` has no extension it is
    /// treated as a directory and the local file name is appended; otherwise
    /// it names the destination file. Failure policy and `keep_connection`
    /// handling as in [`Self::upload_data`].
    pub async fn upload_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        keep_connection: bool,
    ) -> Option<FileAttributes> {
        let Some((name, dest)) = paths::resolve_destination(local_path, remote_path) else {
            tracing::error!(
                host = %self.host(),
                local = %local_path.display(),
                "local path has no usable file name; nothing was sent"
            );
            self.release(keep_connection).await;
            return None;
        };

        let result = self.upload_file_inner(local_path, &dest).await;
        let attrs = self.swallow_transfer(result, &name);
        self.release(keep_connection).await;
        attrs
    }

    async fn upload_file_inner(
        &mut self,
        local_path: &Path,
        dest: &str,
    ) -> SshResult<FileAttributes> {
        let tunnel = self.session.ensure_tunnel(None).await?;
        tunnel.put_file(local_path, dest).await
    }

    /// Download a remote file, with the same failure policy and
    /// `keep_connection` handling as the uploads.
    pub async fn download_file(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        keep_connection: bool,
    ) -> Option<FileAttributes> {
        let name = paths::final_component(remote_path).to_string();

        let result = self.download_file_inner(remote_path, local_path).await;
        let attrs = self.swallow_transfer(result, &name);
        self.release(keep_connection).await;
        attrs
    }

    async fn download_file_inner(
        &mut self,
        remote_path: &str,
        local_path: &Path,
    ) -> SshResult<FileAttributes> {
        let tunnel = self.session.ensure_tunnel(None).await?;
        tunnel.get_file(remote_path, local_path).await
    }

    /// Launch a script on the remote host and return its stream handles
    /// without waiting for completion.
    ///
    /// With `launch.local_script` set, the script is staged through the
    /// transfer tunnel first (directory-or-file destination logic as in
    /// [`Self::upload_file`]); only the tunnel is closed afterwards, the
    /// session stays open for the launch. All failures propagate; this
    /// operation does not share the uploads' swallow policy.
    pub async fn run_script(
        &mut self,
        remote_script_path: &str,
        launch: ScriptLaunch,
    ) -> SshResult<RemoteProcess> {
        let script_path = if let Some(local) = launch.local_script.as_deref() {
            let (_, dest) =
                paths::resolve_destination(local, remote_script_path).ok_or_else(|| {
                    SshError::Transfer(format!(
                        "local script {} has no usable file name",
                        local.display()
                    ))
                })?;

            let tunnel = self.session.ensure_tunnel(None).await?;
            tunnel.put_file(local, &dest).await?;
            // The shell connection must stay open to run the command next.
            self.session.close_tunnel().await?;
            dest
        } else {
            self.session.ensure_connected().await?;
            remote_script_path.to_string()
        };

        let interpreter = launch.interpreter.as_deref().unwrap_or(DEFAULT_INTERPRETER);
        let command = paths::assemble_command(
            interpreter,
            launch.command_option.as_deref(),
            &script_path,
            &launch.script_args,
        );

        self.session.launch(&command).await
    }

    /// Close the session, cascading through the transfer tunnel. Idempotent.
    pub async fn close(&mut self) -> SshResult<()> {
        self.session.close().await
    }

    /// The single site of the swallow-and-log transfer policy shared by the
    /// upload/download conveniences. Launch operations bypass it; that
    /// asymmetry is deliberate.
    fn swallow_transfer<T>(&self, result: SshResult<T>, filename: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    host = %self.host(),
                    file = %filename,
                    error = %e,
                    "transfer failed; nothing was sent"
                );
                None
            }
        }
    }

    async fn release(&mut self, keep_connection: bool) {
        if keep_connection {
            return;
        }
        if let Err(e) = self.session.close().await {
            tracing::warn!(host = %self.host(), error = %e, "error while closing ssh session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::ProcessEvent;
    use crate::ssh::testserver::{TestServer, write_client_key};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_client(port: u16, keys: &TempDir) -> RemoteClient {
        let mut config = SessionConfig::new("127.0.0.1", "stan", write_client_key(keys));
        config.port = port;
        config.timeout = Duration::from_secs(5);
        RemoteClient::new(config)
    }

    #[tokio::test]
    async fn upload_data_forces_json_name_and_closes_session() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let data = serde_json::json!({"a": 1});
        let remote_dir = root.path().display().to_string();
        let attrs = client
            .upload_data(&data, &remote_dir, "out.txt", false)
            .await
            .expect("upload");
        assert!(attrs.size.is_some());

        let uploaded = root.path().join("out.json");
        let content = std::fs::read_to_string(&uploaded).expect("normalized json file");
        let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid json");
        assert_eq!(parsed, data);
        // Pretty-printed, not a single line.
        assert!(content.contains('\n'));

        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn upload_data_keeps_connection_when_asked() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let data = serde_json::json!({"chains": 4});
        let remote_dir = root.path().display().to_string();

        client
            .upload_data(&data, &remote_dir, "first", true)
            .await
            .expect("first upload");
        assert!(client.session().is_connected());

        client
            .upload_data(&data, &remote_dir, "second", false)
            .await
            .expect("second upload");
        assert!(!client.session().is_connected());

        // Both calls shared one dialed connection.
        assert_eq!(server.counters.connections(), 1);
    }

    #[tokio::test]
    async fn upload_file_resolves_directory_destination() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let local = root.path().join("run.py");
        std::fs::write(&local, b"print('hi')\n").expect("write local");

        let remote_dir = root.path().join("staging");
        std::fs::create_dir(&remote_dir).expect("staging dir");

        client
            .upload_file(&local, &remote_dir.display().to_string(), false)
            .await
            .expect("upload");

        assert!(remote_dir.join("run.py").exists());
        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn failed_upload_returns_none_and_still_closes() {
        let Some(server) = TestServer::builder().read_only().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let local = root.path().join("run.py");
        std::fs::write(&local, b"print('hi')\n").expect("write local");
        let dest = root.path().join("denied.py").display().to_string();

        let attrs = client.upload_file(&local, &dest, false).await;
        assert!(attrs.is_none());
        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn download_file_fetches_remote_content() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let remote = root.path().join("results.csv");
        std::fs::write(&remote, b"draws\n").expect("write remote");
        let local = root.path().join("fetched.csv");

        let attrs = client
            .download_file(&remote.display().to_string(), &local, false)
            .await
            .expect("download");
        assert_eq!(attrs.size, Some(6));
        assert_eq!(std::fs::read(&local).expect("local copy"), b"draws\n");
        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn run_script_stages_dispatches_and_keeps_session_open() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let workdir = TempDir::new().expect("local workdir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let local = workdir.path().join("run.py");
        std::fs::write(&local, b"print('hi')\n").expect("write local");

        let launch = ScriptLaunch {
            command_option: Some("-u".to_string()),
            script_args: vec!["--x".to_string(), "1".to_string()],
            local_script: Some(local),
            interpreter: Some("python3".to_string()),
        };

        let remote = root.path().join("run.py").display().to_string();
        let mut process = client.run_script(&remote, launch).await.expect("launch");

        // Staged through the tunnel, which is closed again; the session is not.
        assert_eq!(
            std::fs::read(root.path().join("run.py")).expect("staged script"),
            b"print('hi')\n"
        );
        assert!(client.session().is_connected());
        assert!(!client.session().tunnel_open());

        // The launch returned before completion; drain to the exit event.
        let mut exited = None;
        while let Some(event) = process.next_event().await {
            if let ProcessEvent::Exited(code) = event {
                exited = Some(code);
            }
        }
        assert_eq!(exited, Some(0));

        assert_eq!(
            server.counters.exec_commands(),
            vec!["python3 -u run.py --x 1".to_string()]
        );

        client.close().await.expect("close");
        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn run_script_without_staging_only_connects() {
        let Some(server) = TestServer::builder().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let mut client = test_client(server.port, &keys);

        let process = client
            .run_script("/remote/model.py", ScriptLaunch::default())
            .await
            .expect("launch");

        assert!(client.session().is_connected());
        assert_eq!(server.counters.sftp_opens(), 0);

        let output = process.wait_with_output().await.expect("drain");
        assert!(output.success());
        assert_eq!(
            server.counters.exec_commands(),
            vec!["python model.py".to_string()]
        );

        client.close().await.expect("close");
    }

    #[tokio::test]
    async fn run_script_propagates_staging_failures() {
        let Some(server) = TestServer::builder().read_only().spawn().await else {
            return;
        };
        let keys = TempDir::new().expect("temp keys dir");
        let root = TempDir::new().expect("sftp root");
        let mut client = test_client(server.port, &keys);

        let local = root.path().join("run.py");
        std::fs::write(&local, b"print('hi')\n").expect("write local");

        let launch = ScriptLaunch {
            local_script: Some(local),
            ..Default::default()
        };

        let remote = root.path().join("run.py").display().to_string();
        let err = client.run_script(&remote, launch).await.unwrap_err();
        assert!(matches!(err, SshError::Transfer(_)));
        assert!(server.counters.exec_commands().is_empty());

        client.close().await.expect("close");
    }
}
