//! Ferry stages files and JSON payloads on remote hosts over SSH and
//! launches scripts there, reusing one lazily established connection per
//! client.
//!
//! The [`ssh`] module is the core: a transport session with key/password
//! authentication fallback, an SFTP transfer tunnel nested inside it, and a
//! [`ssh::RemoteClient`] combining the two. The remaining modules are the CLI
//! surface over that core.

pub mod cli;
pub mod commands;
pub mod output;
pub mod paths;
pub mod ssh;
