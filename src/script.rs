//! SQL script loading.
//!
//! Scripts come either bundled into the binary or from a filesystem path.
//! [`load_script`] returns the normalized text as one string; only
//! [`split_statements`] breaks a script into individual statements, and that
//! is left to the query executor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result, ScriptOrigin};

pub const DEFAULT_COMMENT_PREFIX: &str = "--";
pub const DEFAULT_STATEMENT_SEPARATOR: &str = ";";

pub const WRITE_SCRIPT: &str = "write.sql";
pub const READ_SCRIPT: &str = "read.sql";

/// Scripts bundled into the binary, by resource name.
const RESOURCES: &[(&str, &str)] = &[
    (WRITE_SCRIPT, include_str!("../resources/write.sql")),
    (READ_SCRIPT, include_str!("../resources/read.sql")),
];

/// Looks up a bundled script by name.
pub fn resource(name: &str) -> Option<&'static str> {
    RESOURCES
        .iter()
        .find(|(resource, _)| *resource == name)
        .map(|(_, content)| *content)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Resource(String),
    Path(PathBuf),
}

impl ScriptSource {
    pub fn resource(name: impl Into<String>) -> Self {
        ScriptSource::Resource(name.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ScriptSource::Path(path.into())
    }

    fn origin(&self) -> ScriptOrigin {
        match self {
            ScriptSource::Resource(name) => ScriptOrigin::Resource(name.clone()),
            ScriptSource::Path(path) => ScriptOrigin::Path(path.clone()),
        }
    }
}

/// Comment and separator conventions applied while reading scripts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptOptions {
    pub comment_prefix: String,
    pub separator: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
            separator: DEFAULT_STATEMENT_SEPARATOR.to_string(),
        }
    }
}

/// Reads the full script addressed by `source` and normalizes it.
pub fn load_script(source: &ScriptSource, options: &ScriptOptions) -> Result<String> {
    let load_err = |reason: String| Error::ScriptLoad {
        origin: source.origin(),
        reason,
    };
    let script = match source {
        ScriptSource::Resource(name) => {
            let content =
                resource(name).ok_or_else(|| load_err("no such bundled resource".to_string()))?;
            read_script(content.as_bytes(), options)
        }
        ScriptSource::Path(path) => {
            let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
            read_script(BufReader::new(file), options)
        }
    }
    .map_err(|e| load_err(e.to_string()))?;
    debug!("loaded script from {}: {} bytes", source.origin(), script.len());
    Ok(script)
}

/// Reads a script line by line, dropping lines that start with the comment
/// prefix and joining the rest with `\n`.
pub fn read_script(reader: impl BufRead, options: &ScriptOptions) -> std::io::Result<String> {
    let mut script = String::new();
    for line in reader.lines() {
        let line = line?;
        if !options.comment_prefix.is_empty() && line.starts_with(&options.comment_prefix) {
            continue;
        }
        if !script.is_empty() {
            script.push('\n');
        }
        script.push_str(&line);
    }
    maybe_add_separator(&mut script, &options.separator);
    Ok(script)
}

// A separator with trailing whitespace (e.g. ";\n") is restored in full when
// the script ends with its trimmed form, since line joining ate the whitespace.
fn maybe_add_separator(script: &mut String, separator: &str) {
    let trimmed = separator.trim();
    if trimmed.len() == separator.len() || trimmed.is_empty() {
        return;
    }
    if script.ends_with(trimmed) {
        script.push_str(&separator[trimmed.len()..]);
    }
}

/// Splits a script into statements on `options.separator`.
///
/// Separators inside string literals and quoted identifiers (`'..'`, `".."`,
/// `` `..` `` and `[..]`) do not split. A doubled quote character escapes
/// itself, except inside brackets. Both `--` style line comments and `/* */`
/// block comments are removed. Statements come back trimmed; empty ones are
/// dropped.
pub fn split_statements(script: &str, options: &ScriptOptions) -> Vec<String> {
    let separator = if options.separator.is_empty() {
        DEFAULT_STATEMENT_SEPARATOR
    } else {
        options.separator.as_str()
    };
    let comment = options.comment_prefix.as_str();

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut rest = script;

    while let Some(ch) = rest.chars().next() {
        if let Some(q) = quote {
            current.push(ch);
            rest = &rest[ch.len_utf8()..];
            if ch == q {
                // A doubled quote is an escaped quote, stay inside the literal.
                if q != ']' && rest.starts_with(q) {
                    current.push(q);
                    rest = &rest[q.len_utf8()..];
                } else {
                    quote = None;
                }
            }
            continue;
        }

        if let Some(closer) = closing_quote(ch) {
            quote = Some(closer);
            current.push(ch);
            rest = &rest[ch.len_utf8()..];
        } else if !comment.is_empty() && rest.starts_with(comment) {
            // Keep the newline so tokens on either side stay apart.
            match rest.find('\n') {
                Some(end) => {
                    current.push('\n');
                    rest = &rest[end + 1..];
                }
                None => rest = "",
            }
        } else if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => {
                    current.push(' ');
                    rest = &rest[end + 4..];
                }
                None => rest = "",
            }
        } else if rest.starts_with(separator) {
            push_statement(&mut statements, &current);
            current.clear();
            rest = &rest[separator.len()..];
        } else {
            current.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn closing_quote(open: char) -> Option<char> {
    match open {
        '\'' | '"' | '`' => Some(open),
        '[' => Some(']'),
        _ => None,
    }
}

fn push_statement(statements: &mut Vec<String>, statement: &str) {
    let trimmed = statement.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}
