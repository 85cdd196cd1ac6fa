//! External command execution utilities.
//!
//! Runs the stylesheet compiler and the highlighter theme export as blocking
//! child processes. A non-zero exit is an error carrying the filtered stderr.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
    sync::OnceLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["pygmentize"]; "-S", "default", "-f", "html")?;
///
/// // With working directory
/// exec!(root; &config.build.sass.command; input, output)?;
///
/// // With custom filter
/// const MY_FILTER: FilterRule = FilterRule::new(&["Deprecation"]);
/// exec!(filter=&MY_FILTER; ["sass"]; input, output)?;
/// ```
#[macro_export]
macro_rules! exec {
    (filter=$filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $filter; $($rest)*)
    };
    ($($rest:tt)*) => {
        $crate::exec_internal!(@parse_root &$crate::utils::exec::EMPTY_FILTER; $($rest)*)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! exec_internal {
    // Parse root and command (with root)
    (@parse_root $filter:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
    // Parse command (without root)
    (@parse_root $filter:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Trait for converting to command vector.
    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &Vec<String> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    /// Convert command to Vec<OsString>.
    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Run a command to completion and capture its output.
///
/// Stderr of a successful run is logged under the command name, minus the
/// lines `filter` drops. A non-zero exit becomes an error carrying the
/// filtered stderr, plus stdout when it looks like a diagnostic.
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &'static FilterRule,
) -> Result<Output> {
    let (program, fixed_args) = cmd.split_first().context("Empty command")?;
    let name = program.to_string_lossy().into_owned();

    let mut command = Command::new(program);
    command.args(fixed_args).args(args);
    if let Some(dir) = root {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    let stderr = filter.apply(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        anyhow::bail!(failure_message(&name, &output, &stderr));
    }
    if !stderr.is_empty() {
        log!(&name; "{stderr}");
    }
    Ok(output)
}

fn failure_message(name: &str, output: &Output, stderr: &str) -> String {
    let mut message = format!("`{name}` exited with {}", output.status);
    if !stderr.is_empty() {
        message.push('\n');
        message.push_str(stderr);
    }

    // Highlighter output is CSS; only other stdout is worth showing
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if !stdout.is_empty() && !CSS_OUTPUT.skips(stdout) {
        message.push_str("\nstdout:\n");
        message.push_str(stdout);
    }
    message
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

/// Line prefixes to drop from a tool's stderr.
pub struct FilterRule {
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn skips(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Keep the non-blank lines that no prefix matches, colour codes removed.
    fn apply(&self, output: &str) -> String {
        output
            .lines()
            .map(strip_ansi)
            .filter(|line| !self.skips(line.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Stylesheet-looking stdout.
const CSS_OUTPUT: FilterRule = FilterRule::new(&["pre ", "."]);

/// Keeps every line.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

// ============================================================================
// Tests
// ============================================================================
