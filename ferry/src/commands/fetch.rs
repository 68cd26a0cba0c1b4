//! `ferry fetch` - download a file

use std::path::Path;

use crate::cli::TargetArgs;
use crate::output;
use crate::ssh::RemoteClient;

pub fn run(
    target: &TargetArgs,
    remote: &str,
    local: &Path,
    keep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut client = RemoteClient::new(target.session_config());

        output::step(&format!("Downloading {remote} from {}...", target.host));
        match client.download_file(remote, local, keep).await {
            Some(attrs) => {
                output::success(&format!(
                    "Downloaded to {} ({} bytes)",
                    local.display(),
                    attrs.size.unwrap_or(0)
                ));
                Ok(())
            }
            None => Err(format!("download of {remote} from {} failed", target.host).into()),
        }
    })
}
