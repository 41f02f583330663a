//! Child-process plumbing shared by the rasteriser and OCR stages.
//!
//! Programs are resolved with [`which`] and run to completion with stdout
//! and stderr captured. `kill_on_drop` ties the child's lifetime to the
//! future awaiting it, so dropping a conversion never leaves an orphaned
//! `nougat` process burning GPU time.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured stderr is cut to this many trailing bytes before it is put
/// into an error. Nougat prints a full Python traceback plus progress bars.
pub const MAX_STDERR_BYTES: usize = 4096;

/// Result of running an external program to completion.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    /// Whether the process exited with status 0.
    pub success: bool,
    pub stdout: String,
    /// Trailing [`MAX_STDERR_BYTES`] of stderr, decoded lossily.
    pub stderr: String,
}

/// Locate `program` on `PATH`, or check it directly when it contains a
/// path separator.
pub fn find_program(program: &OsStr) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Run `program` with `args` and wait for it to exit.
///
/// Returns `Err` only when the process could not be spawned; a non-zero
/// exit is reported through [`ToolOutput::success`].
pub async fn run_tool(program: &Path, args: &[OsString]) -> std::io::Result<ToolOutput> {
    debug!("Running: {}", describe_command(program.as_os_str(), args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(ToolOutput {
        status: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: tail(&stderr, MAX_STDERR_BYTES).to_string(),
    })
}

/// Shell-like rendering of a command line for logs.
pub fn describe_command(program: &OsStr, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|a| {
            let s = a.to_string_lossy();
            if s.is_empty() || s.contains(char::is_whitespace) {
                format!("'{s}'")
            } else {
                s.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The last `max` bytes of `s`, moved forward to a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_strings() {
        assert_eq!(tail("abc", 10), "abc");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        let s = "ééé"; // 6 bytes
        assert_eq!(tail(s, 3), "é");
        assert_eq!(tail(s, 4), "éé");
    }

    #[test]
    fn describe_command_quotes_spaces() {
        let args: Vec<OsString> = vec!["-r".into(), "150".into(), "my scan.pdf".into()];
        assert_eq!(
            describe_command(OsStr::new("pdftoppm"), &args),
            "pdftoppm -r 150 'my scan.pdf'"
        );
    }

    #[test]
    fn unknown_program_is_not_found() {
        assert!(find_program(OsStr::new("pdf2rmd-definitely-not-installed-xyz")).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_status_and_stderr() {
        let sh = find_program(OsStr::new("sh")).expect("sh on PATH");
        let args: Vec<OsString> = vec!["-c".into(), "echo out; echo oops >&2; exit 3".into()];
        let out = run_tool(&sh, &args).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "oops");
    }
}
