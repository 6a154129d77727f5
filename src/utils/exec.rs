//! External command execution utilities.
//!
//! The markdown converter and the stylesheet processor are both plain child
//! processes. Each call blocks until the child exits; there is no timeout.

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    ffi::OsString,
    process::{Command, Output},
    sync::LazyLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// exec!(&config.command; input.path())?;
/// ```
#[macro_export]
macro_rules! exec {
    ($cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            $cmd,
            &[$(::std::ffi::OsString::from($arg)),*],
            &$crate::utils::exec::EMPTY_FILTER,
        )
    };
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// `cmd` is the program followed by fixed leading arguments, as written in
/// the config; `args` are appended after it.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(cmd: &[String], args: &[OsString], filter: &'static FilterRule) -> Result<Output> {
    let (name, mut command) = prepare(cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output, filter)?;
    Ok(output)
}

/// Prepare a Command from components.
fn prepare(cmd: &[String], args: &[OsString]) -> Result<(String, Command)> {
    let (program, leading) = cmd.split_first().context("Empty command")?;

    let mut command = Command::new(program);
    command
        .args(leading)
        .args(args.iter().filter(|a| !a.is_empty()));

    Ok((program.clone(), command))
}

/// Whether the program of `cmd` can be found on `PATH`.
pub fn is_installed(cmd: &[String]) -> bool {
    cmd.first().is_some_and(|program| which::which(program).is_ok())
}

/// Pick the first candidate command whose program is installed.
///
/// Empty candidates are skipped, so an unset fallback costs nothing.
pub fn resolve_command<'a>(candidates: &[&'a [String]]) -> Result<&'a [String]> {
    if let Some(found) = candidates.iter().find(|cmd| is_installed(cmd)) {
        return Ok(found);
    }

    let names: Vec<&str> = candidates
        .iter()
        .filter_map(|cmd| cmd.first().map(String::as_str))
        .collect();
    bail!("none of `{}` found on PATH", names.join("`, `"))
}

// ============================================================================
// Output Filtering
// ============================================================================

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    ANSI_RE.replace_all(s, "")
}

/// Filter rule for skipping known noise in command output.
pub struct FilterRule {
    /// Prefixes to match at the start of output lines.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, output: &str) -> bool {
        output.is_empty() || self.skip_prefixes.iter().any(|p| output.starts_with(p))
    }

    /// Log the lines of `output` that survive the filter.
    fn log(&self, name: &str, output: &str) {
        let valid_lines: Vec<&str> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();

        if !valid_lines.is_empty() {
            log!(name; "{}", valid_lines.join("\n"));
        }
    }
}

/// Stdout filter: skip markup output, it is the payload rather than a message.
const STDOUT_FILTER: FilterRule = FilterRule::new(&["<", "{"]);

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Log command output, failing on a non-zero exit status.
fn log_output(name: &str, output: &Output, filter: &'static FilterRule) -> Result<()> {
    if !output.status.success() {
        bail!(format_error(name, output, filter));
    }

    // On success, only log stderr (warnings) to reduce noise
    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());

    Ok(())
}

/// Format command error message with filtering.
fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}\n", output.status);
    if !error_msg.is_empty() {
        msg.push_str(error_msg);
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() && !STDOUT_FILTER.should_skip(stdout_trimmed) {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(&[], &[]).is_err());
    }

    #[test]
    fn test_prepare_keeps_leading_args() {
        let command = cmd(&["pandoc", "-f", "markdown"]);
        let args = [OsString::from("in.md"), OsString::new()];
        let (name, command) = prepare(&command, &args).unwrap();

        assert_eq!(name, "pandoc");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["-f", "markdown", "in.md"]);
    }

    #[test]
    fn test_is_installed_rejects_unknown_program() {
        assert!(!is_installed(&cmd(&["petur-no-such-program-4a1f"])));
        assert!(!is_installed(&[]));
    }

    #[test]
    fn test_resolve_command_reports_all_names() {
        let primary = cmd(&["petur-missing-primary"]);
        let fallback = cmd(&["petur-missing-fallback"]);
        let err = resolve_command(&[&primary, &fallback]).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("petur-missing-primary"));
        assert!(msg.contains("petur-missing-fallback"));
    }

    #[test]
    fn test_resolve_command_skips_empty_candidates() {
        let empty: Vec<String> = Vec::new();
        let missing = cmd(&["petur-missing-primary"]);
        assert!(resolve_command(&[&empty, &missing]).is_err());
    }

    #[test]
    fn test_filter_rule() {
        let filter = FilterRule::new(&["WARN:", "INFO:"]);

        assert!(filter.should_skip("WARN: something"));
        assert!(filter.should_skip("INFO: something"));
        assert!(!filter.should_skip("ERROR: something"));
        assert!(filter.should_skip(""));
    }

    #[test]
    fn test_stdout_filter_skips_markup() {
        assert!(STDOUT_FILTER.should_skip("<p>converted</p>"));
        assert!(!STDOUT_FILTER.should_skip("plain diagnostic"));
    }

    #[test]
    fn test_format_error() {
        // `false` exits with status 1
        let status = Command::new("false")
            .status()
            .or_else(|_| Command::new("cmd").args(["/C", "exit 1"]).status())
            .unwrap();

        static TEST_FILTER: FilterRule = FilterRule::new(&["Ignored:"]);
        let output = Output {
            status,
            stdout: b"diagnostic on stdout".to_vec(),
            stderr: b"Ignored: warning\nFatal error".to_vec(),
        };
        let msg = format_error("xsltproc", &output, &TEST_FILTER);

        assert!(msg.contains("Command `xsltproc` failed"));
        assert!(msg.contains("Fatal error"));
        assert!(msg.contains("Stdout:\ndiagnostic on stdout"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("\x1b[1;32mGreen Bold\x1b[0m"), "Green Bold");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }
}
