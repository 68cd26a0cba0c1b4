//! Stream handles for a dispatched remote process

use super::error::{SshError, SshResult};
use russh::ChannelMsg;
use russh::client::Msg;

/// Something the remote process produced.
#[derive(Debug)]
pub enum ProcessEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Exited(u32),
}

/// Collected output from a remote process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (0 = success)
    pub exit_code: u32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Check if the process succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A launched remote process: stdin writes plus stdout/stderr/exit events.
///
/// Returned before the process completes; the caller owns draining the
/// streams and eventually closing the session the process was launched on.
#[derive(Debug)]
pub struct RemoteProcess {
    channel: russh::Channel<Msg>,
    exit_code: Option<u32>,
}

impl RemoteProcess {
    pub(crate) fn new(channel: russh::Channel<Msg>) -> Self {
        Self {
            channel,
            exit_code: None,
        }
    }

    /// Write to the process's standard input.
    pub async fn write_stdin(&self, data: &[u8]) -> SshResult<()> {
        self.channel
            .data(data)
            .await
            .map_err(|e| SshError::Channel(e.to_string()))
    }

    /// Signal end of input.
    pub async fn close_stdin(&self) -> SshResult<()> {
        self.channel
            .eof()
            .await
            .map_err(|e| SshError::Channel(e.to_string()))
    }

    /// Exit code, once the process has reported one.
    pub fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    /// Next output event, or `None` once the channel is drained.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        loop {
            match self.channel.wait().await? {
                ChannelMsg::Data { data } => return Some(ProcessEvent::Stdout(data.to_vec())),
                ChannelMsg::ExtendedData { data, ext } if ext == 1 => {
                    return Some(ProcessEvent::Stderr(data.to_vec()));
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    self.exit_code = Some(exit_status);
                    return Some(ProcessEvent::Exited(exit_status));
                }
                ChannelMsg::Eof | ChannelMsg::Close => return None,
                _ => {}
            }
        }
    }

    /// Drain the process to completion, collecting its output.
    pub async fn wait_with_output(mut self) -> SshResult<ProcessOutput> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    self.exit_code = Some(exit_status);
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        let output = ProcessOutput {
            exit_code: self.exit_code.unwrap_or(0),
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        };

        tracing::debug!(
            exit_code = output.exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "remote process completed"
        );

        Ok(output)
    }
}
