use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Resolve an executable, either an explicit path or a bare name searched on `PATH`.
#[must_use]
pub fn find_executable(program: &str) -> Option<Utf8PathBuf> {
    let program_path = Utf8Path::new(program);
    if program_path.components().count() > 1 {
        return program_path.is_file().then(|| program_path.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .filter_map(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = String> {
    [format!("{program}.exe"), program.to_string()].into_iter()
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = String> {
    core::iter::once(program.to_string())
}

/// Run a program to completion, capturing its output, and kill it if it outlives `timeout`.
pub async fn run_with_timeout(program: &Utf8Path, args: &[&str], timeout: Duration) -> Result<Output> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .into_app_err_with(|| format!("could not spawn '{program}'"))?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(e).into_app_err_with(|| format!("'{program} {}' failed to run", args.join(" "))),
        Err(_) => {
            bail!("'{program} {}' timed out after {} seconds", args.join(" "), timeout.as_secs());
        }
    }
}

/// Turn a non-zero exit status into an error carrying the program's stderr.
pub fn check_output(output: &Output, operation: &str) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{operation} failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitStatus;

    fn exit_status(code: i32) -> ExitStatus {
        #[cfg(unix)]
        let status = {
            use std::os::unix::process::ExitStatusExt;
            ExitStatus::from_raw(code << 8)
        };

        #[cfg(windows)]
        let status = {
            use std::os::windows::process::ExitStatusExt;
            ExitStatus::from_raw(code.cast_unsigned())
        };

        status
    }

    #[test]
    fn test_check_output_success() {
        let output = Output {
            status: exit_status(0),
            stdout: vec![],
            stderr: vec![],
        };

        check_output(&output, "test operation").unwrap();
    }

    #[test]
    fn test_check_output_failure_includes_stderr() {
        let output = Output {
            status: exit_status(1),
            stdout: vec![],
            stderr: b"fatal: not a git repository\n".to_vec(),
        };

        let result = check_output(&output, "git remote");
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("git remote failed"));
        assert!(error_msg.contains("not a git repository"));
    }

    #[test]
    fn test_find_executable_missing() {
        assert!(find_executable("cargo-gephi-no-such-tool-4a1c").is_none());
    }

    #[test]
    fn test_find_executable_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Utf8PathBuf::try_from(dir.path().join("tool")).unwrap();
        std::fs::write(&tool, "").unwrap();

        assert_eq!(find_executable(tool.as_str()), Some(tool.clone()));
        assert!(find_executable(dir.path().join("absent").to_str().unwrap()).is_none());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_with_timeout_captures_output() {
        let Some(sh) = find_executable("sh") else {
            return;
        };

        let output = run_with_timeout(&sh, &["-c", "echo hello"], Duration::from_secs(30)).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_with_timeout_expires() {
        let Some(sh) = find_executable("sh") else {
            return;
        };

        let result = run_with_timeout(&sh, &["-c", "sleep 5"], Duration::from_millis(100)).await;
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }
}
