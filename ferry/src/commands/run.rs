//! `ferry run` - launch a remote script and stream its output

use std::io::Write;
use std::path::PathBuf;

use crate::cli::TargetArgs;
use crate::output;
use crate::ssh::{ProcessEvent, RemoteClient, ScriptLaunch};

pub fn run(
    target: &TargetArgs,
    script: &str,
    stage: Option<PathBuf>,
    option: Option<String>,
    interpreter: &str,
    args: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(local) = stage.as_deref()
        && !local.exists()
    {
        return Err(format!("{} does not exist", local.display()).into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let exit_code = rt.block_on(async {
        let mut client = RemoteClient::new(target.session_config());

        if stage.is_some() {
            output::step(&format!("Staging script on {}...", target.host));
        }

        let launch = ScriptLaunch {
            command_option: option,
            script_args: args,
            local_script: stage,
            interpreter: Some(interpreter.to_string()),
        };

        let mut process = client.run_script(script, launch).await?;

        let mut exit_code = 0u32;
        let mut stdout = std::io::stdout();
        let mut stderr = std::io::stderr();
        while let Some(event) = process.next_event().await {
            match event {
                ProcessEvent::Stdout(bytes) => {
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
                ProcessEvent::Stderr(bytes) => {
                    stderr.write_all(&bytes)?;
                    stderr.flush()?;
                }
                ProcessEvent::Exited(code) => exit_code = code,
            }
        }

        client.close().await?;
        Ok::<u32, Box<dyn std::error::Error>>(exit_code)
    })?;

    if exit_code != 0 {
        output::error(&format!("remote script exited with code {exit_code}"));
        std::process::exit(exit_code as i32);
    }

    Ok(())
}
