//! Build identifier derivation.
//!
//! The identifier is the DJB2 hash of the build timestamp rendered as eight
//! lowercase hex digits. Firmware code reads it back through the
//! `BUILD_TIMESTAMP_STR` and `BUILD_ID` defines, and the packaging step puts
//! the same digits into the artifact name.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hooks::context::BuildContext;

pub const TIMESTAMP_FORMAT: &str = "%b %d %Y%H:%M:%S";
pub const DEFINE_TIMESTAMP_STR: &str = "BUILD_TIMESTAMP_STR";
pub const DEFINE_BUILD_ID: &str = "BUILD_ID";

const DJB2_SEED: u32 = 5381;

/// DJB2 over the Unicode scalar values of `text`, wrapping at 32 bits.
pub fn djb2(text: &str) -> u32 {
    text.chars().fold(DJB2_SEED, |hash, ch| {
        (hash << 5).wrapping_add(hash).wrapping_add(ch as u32)
    })
}

pub fn build_timestamp<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

pub fn local_build_timestamp() -> String {
    build_timestamp(&chrono::Local::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildId(u32);

impl BuildId {
    pub fn from_timestamp(timestamp: &str) -> Self {
        Self(djb2(timestamp))
    }

    pub fn hex(self) -> String {
        self.to_string()
    }

    /// Numeric C literal, e.g. `0x0badf00d`.
    pub fn literal(self) -> String {
        format!("0x{self}")
    }

    /// Quoted C string literal, e.g. `"Build 0badf00d"`.
    pub fn label_literal(self) -> String {
        format!("\"Build {self}\"")
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for BuildId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == 8 && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        if !valid {
            return Err(format!("build id must be 8 lowercase hex digits, got `{s}`"));
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|err| format!("invalid build id `{s}`: {err}"))
    }
}

/// One preprocessor definition handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: String,
}

impl Define {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// `-DNAME=VALUE`, single-quoted when the value would be split or
    /// unquoted by a shell.
    pub fn to_flag(&self) -> String {
        let flag = format!("-D{}={}", self.name, self.value);
        if self.value.contains(|c: char| c.is_whitespace() || c == '"') {
            format!("'{flag}'")
        } else {
            flag
        }
    }

    pub fn to_header_line(&self) -> String {
        format!("#define {} {}", self.name, self.value)
    }
}

/// Hashes `timestamp`, records both defines and the raw id in `ctx`.
pub fn generate(ctx: &mut BuildContext, timestamp: &str) -> BuildId {
    let id = BuildId::from_timestamp(timestamp);
    ctx.set_define(Define::new(DEFINE_TIMESTAMP_STR, id.label_literal()));
    ctx.set_define(Define::new(DEFINE_BUILD_ID, id.literal()));
    ctx.set_build_id(id);
    ctx.set_timestamp(timestamp);
    id
}

pub fn render_flags(defines: &[Define]) -> String {
    defines
        .iter()
        .map(Define::to_flag)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_header(defines: &[Define]) -> String {
    let mut out = String::new();
    out.push_str("// Generated by spojboard-build. Do not edit.\n");
    out.push_str("#pragma once\n\n");
    for define in defines {
        out.push_str(&format!("#ifdef {}\n#undef {}\n#endif\n", define.name, define.name));
        out.push_str(&define.to_header_line());
        out.push('\n');
    }
    out
}
