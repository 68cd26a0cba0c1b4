//! `ferry push` - upload a JSON payload

use std::path::Path;

use crate::cli::TargetArgs;
use crate::output;
use crate::paths;
use crate::ssh::RemoteClient;

pub fn run(
    target: &TargetArgs,
    data_path: &Path,
    remote_dir: &str,
    name: Option<&str>,
    keep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(data_path)
        .map_err(|e| format!("cannot read {}: {e}", data_path.display()))?;
    let data: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| format!("{} is not valid JSON: {e}", data_path.display()))?;

    let name = match name {
        Some(name) => name.to_string(),
        None => data_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("{} has no usable file name", data_path.display()))?
            .to_string(),
    };
    let normalized = paths::json_file_name(&name);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut client = RemoteClient::new(target.session_config());

        output::step(&format!("Uploading {normalized} to {}...", target.host));
        match client.upload_data(&data, remote_dir, &name, keep).await {
            Some(attrs) => {
                output::success(&format!(
                    "Uploaded {} ({} bytes)",
                    paths::join_remote(remote_dir, &normalized),
                    attrs.size.unwrap_or(0)
                ));
                Ok(())
            }
            None => Err(format!("upload of {normalized} to {} failed", target.host).into()),
        }
    })
}
