use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::error::BuildHookError;

/// Value of `#define <macro_name> "<value>"` on a single line, if that line
/// is such a definition. Whitespace around `#` and between tokens is
/// accepted; the value must be non-empty.
fn parse_define_line<'a>(line: &'a str, macro_name: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("define")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix(macro_name)?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    let value = &rest[..end];
    (!value.is_empty()).then_some(value)
}

/// First string definition of `macro_name` in header text.
pub fn extract_release(content: &str, macro_name: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| parse_define_line(line, macro_name))
        .map(ToOwned::to_owned)
}

/// Reads the header and extracts the release. A missing header is fatal; a
/// header without the define yields `ReleaseNotFound` so the caller can
/// fall back.
pub fn read_release(header: &Path, macro_name: &str) -> Result<String> {
    let content = fs::read_to_string(header).map_err(|source| BuildHookError::ConfigNotFound {
        path: header.to_path_buf(),
        source,
    })?;
    match extract_release(&content, macro_name) {
        Some(release) => Ok(release),
        None => Err(BuildHookError::ReleaseNotFound {
            macro_name: macro_name.to_string(),
            path: header.to_path_buf(),
        }
        .into()),
    }
}
