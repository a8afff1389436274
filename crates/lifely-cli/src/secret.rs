//! Secret references in `config.toml`.
//!
//! Credential values may point at a secret stored elsewhere:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//! - `file::~/path`: the trimmed contents of a file
//! - anything else: the literal value

use std::fmt;
use std::path::PathBuf;

/// A parsed credential value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Pass(&'a str),
    Env(&'a str),
    File(&'a str),
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else if let Some(path) = value.strip_prefix("file::") {
            Self::File(path)
        } else {
            Self::Plain(value)
        }
    }

    /// Looks the secret up.
    pub fn resolve(&self) -> Result<String, String> {
        match *self {
            Self::Pass(path) => resolve_pass(path),
            Self::Env(var) => {
                std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
            }
            Self::File(path) => resolve_file(path),
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Never prints plain values, so references can go into logs and errors.
impl fmt::Display for SecretRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(path) => write!(f, "pass::{}", path),
            Self::Env(var) => write!(f, "env::{}", var),
            Self::File(path) => write!(f, "file::{}", path),
            Self::Plain(_) => f.write_str("<inline value>"),
        }
    }
}

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_file(path: &str) -> Result<String, String> {
    let full = match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .ok_or_else(|| "cannot expand `~`: no home directory".to_string())?
            .join(rest),
        None => PathBuf::from(path),
    };
    let content = std::fs::read_to_string(&full)
        .map_err(|e| format!("failed to read {}: {}", full.display(), e))?;
    let value = content.trim();
    if value.is_empty() {
        return Err(format!("{} is empty", full.display()));
    }
    Ok(value.to_string())
}
