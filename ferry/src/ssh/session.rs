//! Transport session: one authenticated SSH connection per client

use super::auth::{AuthFallback, ConsoleFallback};
use super::error::{SshError, SshResult};
use super::keys;
use super::process::RemoteProcess;
use super::tunnel::{Tunnel, TunnelState};
use russh::Disconnect;
use russh::client::{self, Config, Handle, Handler};
use russh::keys::{Algorithm, PrivateKey, PrivateKeyWithHashAlg, PublicKey};
use russh_sftp::client::SftpSession;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default connect timeout. Only the dial is bounded; transfers and command
/// dispatch rely on the transport's own behavior.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Connection identity: fixed for the lifetime of a client, except for the
/// port, which may change while disconnected.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remote hostname or IP
    pub host: String,
    /// Username for login
    pub username: String,
    /// Path to the private key
    pub key_path: PathBuf,
    /// SSH port (default 22)
    pub port: u16,
    /// Connect timeout
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: &str, username: &str, key_path: impl Into<PathBuf>) -> Self {
        Self {
            host: host.to_string(),
            username: username.to_string(),
            key_path: key_path.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Handler for SSH client events
pub struct ClientHandler {
    /// Unseen host keys are accepted and trusted on first use
    accept_any_host_key: bool,
}

impl Handler for ClientHandler {
    type Error = SshError;

    fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> impl Future<Output = std::result::Result<bool, Self::Error>> + Send {
        let accept = self.accept_any_host_key;
        async move { Ok(accept) }
    }
}

pub(crate) enum SessionState {
    Disconnected,
    Connected(Connected),
}

/// Live connection plus the transfer tunnel nested inside it. A tunnel can
/// only exist while the connection is live.
pub(crate) struct Connected {
    pub(crate) handle: Handle<ClientHandler>,
    pub(crate) tunnel: TunnelState,
}

/// One lazily-established SSH connection to a single host.
pub struct Session {
    config: SessionConfig,
    fallback: Box<dyn AuthFallback>,
    state: SessionState,
}

impl Session {
    /// Create a session with the interactive console fallback provider.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_fallback(config, Box::new(ConsoleFallback))
    }

    /// Create a session with an injected fallback decision provider.
    pub fn with_fallback(config: SessionConfig, fallback: Box<dyn AuthFallback>) -> Self {
        Self {
            config,
            fallback,
            state: SessionState::Disconnected,
        }
    }

    /// Get the config
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Check if the transfer tunnel is open
    pub fn tunnel_open(&self) -> bool {
        matches!(
            self.state,
            SessionState::Connected(Connected {
                tunnel: TunnelState::Open(_),
                ..
            })
        )
    }

    /// Change the SSH port. Only valid while disconnected.
    pub fn set_port(&mut self, port: u16) -> SshResult<()> {
        if self.is_connected() {
            return Err(SshError::Connection(
                "cannot change the port of an established session".to_string(),
            ));
        }
        self.config.port = port;
        Ok(())
    }

    /// Establish the connection if it does not exist yet.
    ///
    /// Key authentication is attempted first; on failure the injected
    /// [`AuthFallback`] provider decides whether to retry once with a
    /// password on the same dialed connection. Calling this on a live
    /// session is a no-op.
    pub async fn ensure_connected(&mut self) -> SshResult<()> {
        if self.is_connected() {
            tracing::debug!(host = %self.config.host, "connection already established");
            return Ok(());
        }

        let key = keys::load_key(&self.config.key_path)?;
        let mut handle = self.dial().await?;

        let key_accepted = match Self::try_key_auth(&mut handle, &self.config.username, key).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::debug!(host = %self.config.host, error = %e, "key authentication errored");
                false
            }
        };

        if !key_accepted {
            tracing::warn!(
                host = %self.config.host,
                user = %self.config.username,
                "key authentication failed"
            );
            self.authenticate_with_password(&mut handle).await?;
        }

        self.state = SessionState::Connected(Connected {
            handle,
            tunnel: TunnelState::Closed,
        });
        tracing::info!(host = %self.config.host, user = %self.config.username, "ssh connection established");

        Ok(())
    }

    async fn dial(&self) -> SshResult<Handle<ClientHandler>> {
        let ssh_config = Config {
            keepalive_interval: Some(Duration::from_secs(15)),
            keepalive_max: 3,
            ..Default::default()
        };

        let handler = ClientHandler {
            accept_any_host_key: true,
        };

        let addr = format!("{}:{}", self.config.host, self.config.port);

        tracing::debug!(host = %self.config.host, port = self.config.port, "connecting to ssh server");

        tokio::time::timeout(self.config.timeout, async {
            client::connect(Arc::new(ssh_config), addr, handler).await
        })
        .await
        .map_err(|_| SshError::Timeout(format!("connection to {} timed out", self.config.host)))?
        .map_err(|e| SshError::Connection(e.to_string()))
    }

    async fn try_key_auth(
        handle: &mut Handle<ClientHandler>,
        username: &str,
        key: PrivateKey,
    ) -> SshResult<bool> {
        let hash_alg = if matches!(key.algorithm(), Algorithm::Rsa { .. }) {
            handle
                .best_supported_rsa_hash()
                .await
                .map_err(|e| SshError::Protocol(e.to_string()))?
                .flatten()
        } else {
            None
        };

        let auth_result = handle
            .authenticate_publickey(
                username,
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await
            .map_err(|e| SshError::Protocol(e.to_string()))?;

        Ok(auth_result.success())
    }

    async fn authenticate_with_password(
        &mut self,
        handle: &mut Handle<ClientHandler>,
    ) -> SshResult<()> {
        let auth_error = || SshError::Authentication {
            host: self.config.host.clone(),
            username: self.config.username.clone(),
        };

        if !self
            .fallback
            .retry_with_password(&self.config.host, &self.config.username)
        {
            tracing::error!(host = %self.config.host, user = %self.config.username, "connection failed");
            return Err(auth_error());
        }

        let password = self
            .fallback
            .password(&self.config.host, &self.config.username)
            .map_err(|e| {
                tracing::debug!(error = %e, "password entry failed");
                auth_error()
            })?;

        let result = handle
            .authenticate_password(self.config.username.as_str(), password.as_str())
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "password authentication errored");
                auth_error()
            })?;

        if !result.success() {
            tracing::error!(
                host = %self.config.host,
                user = %self.config.username,
                "password authentication failed"
            );
            return Err(auth_error());
        }

        Ok(())
    }

    /// Open the transfer tunnel if it does not exist yet, connecting the
    /// session first when needed.
    ///
    /// A missing `initial_dir` is logged and left unset; the tunnel stays
    /// open at the host's default directory.
    pub async fn ensure_tunnel(&mut self, initial_dir: Option<&str>) -> SshResult<&mut Tunnel> {
        self.ensure_connected().await?;

        let SessionState::Connected(conn) = &mut self.state else {
            return Err(SshError::NotConnected);
        };

        if matches!(conn.tunnel, TunnelState::Closed) {
            let channel = conn
                .handle
                .channel_open_session()
                .await
                .map_err(|e| SshError::Channel(e.to_string()))?;

            channel
                .request_subsystem(true, "sftp")
                .await
                .map_err(|e| SshError::Channel(format!("failed to request sftp subsystem: {e}")))?;

            let sftp = SftpSession::new(channel.into_stream())
                .await
                .map_err(|e| SshError::Channel(format!("failed to open sftp session: {e}")))?;

            let mut tunnel = Tunnel::new(sftp);
            if let Some(dir) = initial_dir {
                tunnel.enter_dir(dir).await;
            }

            conn.tunnel = TunnelState::Open(tunnel);
            tracing::debug!(host = %self.config.host, "transfer tunnel opened");
        } else {
            tracing::debug!(host = %self.config.host, "transfer tunnel already open");
        }

        match &mut conn.tunnel {
            TunnelState::Open(tunnel) => Ok(tunnel),
            TunnelState::Closed => Err(SshError::NotConnected),
        }
    }

    /// Close the transfer tunnel, leaving the connection live. No-op when no
    /// tunnel is open.
    pub async fn close_tunnel(&mut self) -> SshResult<()> {
        let SessionState::Connected(conn) = &mut self.state else {
            tracing::debug!(host = %self.config.host, "no transfer tunnel open");
            return Ok(());
        };

        match std::mem::replace(&mut conn.tunnel, TunnelState::Closed) {
            TunnelState::Closed => {
                tracing::debug!(host = %self.config.host, "no transfer tunnel open");
            }
            TunnelState::Open(tunnel) => {
                tunnel.shutdown();
                tracing::debug!(host = %self.config.host, "transfer tunnel closed");
            }
        }

        Ok(())
    }

    /// Close the connection, tearing down any open tunnel first. No-op when
    /// already disconnected.
    pub async fn close(&mut self) -> SshResult<()> {
        self.close_tunnel().await?;

        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Disconnected => {
                tracing::debug!(host = %self.config.host, "no live connection to close");
            }
            SessionState::Connected(conn) => {
                conn.handle
                    .disconnect(Disconnect::ByApplication, "", "en")
                    .await
                    .map_err(|e| SshError::Connection(e.to_string()))?;
                tracing::info!(host = %self.config.host, "ssh connection closed");
            }
        }

        Ok(())
    }

    /// Dispatch a command for asynchronous execution on the live connection.
    ///
    /// Returns the process stream handles without waiting for completion and
    /// without touching the connection; the caller owns draining the streams.
    pub async fn launch(&self, command: &str) -> SshResult<RemoteProcess> {
        let SessionState::Connected(conn) = &self.state else {
            return Err(SshError::NotConnected);
        };

        tracing::debug!(host = %self.config.host, command = %command, "dispatching remote command");

        let channel = conn
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshError::Channel(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| SshError::CommandDispatch(e.to_string()))?;

        Ok(RemoteProcess::new(channel))
    }
}
