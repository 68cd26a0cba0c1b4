//! `ferry send` - upload a file

use std::path::Path;

use crate::cli::TargetArgs;
use crate::output;
use crate::ssh::RemoteClient;

pub fn run(
    target: &TargetArgs,
    local: &Path,
    remote: &str,
    keep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !local.exists() {
        return Err(format!("{} does not exist", local.display()).into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut client = RemoteClient::new(target.session_config());

        output::step(&format!(
            "Uploading {} to {}...",
            local.display(),
            target.host
        ));
        match client.upload_file(local, remote, keep).await {
            Some(attrs) => {
                output::success(&format!("Uploaded ({} bytes)", attrs.size.unwrap_or(0)));
                Ok(())
            }
            None => Err(format!(
                "upload of {} to {} failed",
                local.display(),
                target.host
            )
            .into()),
        }
    })
}
