use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use super::{LintResult, Linter};
use crate::error::Result;
use crate::lang::Language;
use crate::shell::{check_tool_installed, run_shell_cmd_with, ShellOptions, DEFAULT_TIMEOUT};

static FLAKE8_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn flake8_line_re() -> &'static Regex {
    FLAKE8_LINE_RE
        .get_or_init(|| Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): (?P<msg>.+)$").unwrap())
}

/// Python linting through an installed `flake8`.
pub struct Flake8Linter {
    select: Vec<String>,
    timeout: Duration,
    installed: OnceLock<bool>,
}

impl Flake8Linter {
    pub fn new(select: Vec<String>) -> Self {
        Self {
            select,
            timeout: DEFAULT_TIMEOUT,
            installed: OnceLock::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_installed(&self) -> bool {
        *self.installed.get_or_init(|| check_tool_installed("flake8"))
    }

    fn command(&self, path: &Path) -> String {
        let mut cmd = String::from("flake8 --isolated");
        if !self.select.is_empty() {
            cmd.push_str(" --select=");
            cmd.push_str(&self.select.join(","));
        }
        cmd.push(' ');
        cmd.push_str(&shell_quote(&path.to_string_lossy()));
        cmd
    }
}

/// Parse flake8's `file:line:col: CODE message` lines.
pub fn parse_flake8_output(output: &str) -> Vec<LintResult> {
    output
        .lines()
        .filter_map(|line| {
            let caps = flake8_line_re().captures(line.trim_end())?;
            Some(LintResult {
                file: caps["file"].to_string(),
                line: caps["line"].parse().ok()?,
                column: caps["col"].parse().ok()?,
                message: caps["msg"].to_string(),
            })
        })
        .collect()
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

impl Linter for Flake8Linter {
    fn name(&self) -> &str {
        "flake8"
    }

    fn supports(&self, language: Language) -> bool {
        language == Language::Python && self.is_installed()
    }

    fn lint(&self, path: &Path) -> Result<Vec<LintResult>> {
        let opts = ShellOptions {
            timeout: Some(self.timeout),
            truncate_after: None,
            ..ShellOptions::default()
        };
        let out = run_shell_cmd_with(&self.command(path), &opts)?;
        Ok(parse_flake8_output(&out.stdout))
    }
}
