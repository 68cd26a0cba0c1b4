use std::path::Path;

/// Force a `.json` suffix on a payload file name.
///
/// The stem before the first `.` is kept; everything after it is replaced, so
/// `samples.data.txt` becomes `samples.json`.
pub fn json_file_name(name: &str) -> String {
    let stem = name.split('.').next().unwrap_or(name);
    format!("{stem}.json")
}

/// Final component of a POSIX-style remote path.
pub fn final_component(remote: &str) -> &str {
    remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(remote)
}

/// Join a remote directory and a file name with a single `/`.
pub fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Whether a path component carries a file extension.
///
/// Mirrors the usual suffix rules: a leading dot (`.profile`) is a hidden
/// file, not an extension, and a trailing dot does not count.
pub fn has_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(idx) => idx > 0 && idx < name.len() - 1,
        None => false,
    }
}

/// Resolve the remote destination for a local file.
///
/// When the final component of `remote` has no extension it is treated as a
/// directory and the local file's own name is appended; otherwise the given
/// component is the destination file name. Returns `(file_name, destination)`,
/// or `None` when the local path has no usable file name.
pub fn resolve_destination(local: &Path, remote: &str) -> Option<(String, String)> {
    let last = final_component(remote);
    if has_extension(last) {
        Some((last.to_string(), remote.to_string()))
    } else {
        let name = local.file_name()?.to_str()?.to_string();
        let dest = join_remote(remote, &name);
        Some((name, dest))
    }
}

/// Assemble the remote command line for a script launch.
///
/// The script path is reduced to its final component; positional arguments are
/// space-joined after it.
pub fn assemble_command(
    interpreter: &str,
    command_option: Option<&str>,
    script_path: &str,
    script_args: &[String],
) -> String {
    let mut parts: Vec<&str> = vec![interpreter];
    if let Some(option) = command_option {
        parts.push(option);
    }
    parts.push(final_component(script_path));
    for arg in script_args {
        parts.push(arg);
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn json_file_name_replaces_foreign_suffix() {
        assert_eq!(json_file_name("out.txt"), "out.json");
    }

    #[test]
    fn json_file_name_keeps_bare_stem() {
        assert_eq!(json_file_name("samples"), "samples.json");
    }

    #[test]
    fn json_file_name_cuts_at_first_dot() {
        assert_eq!(json_file_name("samples.data.txt"), "samples.json");
    }

    #[test]
    fn destination_appends_local_name_for_directories() {
        let local = PathBuf::from("/home/u/run.py");
        let (name, dest) = resolve_destination(&local, "/remote/dir").unwrap();
        assert_eq!(name, "run.py");
        assert_eq!(dest, "/remote/dir/run.py");
    }

    #[test]
    fn destination_keeps_explicit_file_name() {
        let local = PathBuf::from("/home/u/run.py");
        let (name, dest) = resolve_destination(&local, "/remote/dir/other.py").unwrap();
        assert_eq!(name, "other.py");
        assert_eq!(dest, "/remote/dir/other.py");
    }

    #[test]
    fn destination_tolerates_trailing_slash() {
        let local = PathBuf::from("/home/u/run.py");
        let (_, dest) = resolve_destination(&local, "/remote/dir/").unwrap();
        assert_eq!(dest, "/remote/dir/run.py");
    }

    #[test]
    fn hidden_files_are_not_extensions() {
        assert!(!has_extension(".profile"));
        assert!(has_extension("run.py"));
        assert!(!has_extension("dir"));
    }

    #[test]
    fn join_remote_collapses_separators() {
        assert_eq!(join_remote("/tmp/", "a.json"), "/tmp/a.json");
        assert_eq!(join_remote("/", "a.json"), "/a.json");
    }

    #[test]
    fn assemble_command_orders_tokens() {
        let args = vec!["--x".to_string(), "1".to_string()];
        let cmd = assemble_command("python3", Some("-u"), "/r/run.py", &args);
        assert_eq!(cmd, "python3 -u run.py --x 1");
    }

    #[test]
    fn assemble_command_without_option_or_args() {
        let cmd = assemble_command("python", None, "model.py", &[]);
        assert_eq!(cmd, "python model.py");
    }
}
