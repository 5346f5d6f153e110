// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Plugin
//!
//! A plugin is a named, independently testable source unit. Its content is
//! only ever replaced by an accepted mutation candidate.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Plugin identity, content checksums and structural summary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::lang::{parse_module, FunctionSummary, ParseError};

pub const MAX_PLUGIN_ID_LEN: usize = 64;

/// Stable plugin name. Restricted to `[a-z_][a-z0-9_]*` so it can never
/// address anything outside the plugin directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid plugin id '{0}': expected lowercase letters, digits and underscores")]
pub struct InvalidPluginId(pub String);

impl PluginId {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidPluginId> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(InvalidPluginId(name))
        }
    }

    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        name.len() <= MAX_PLUGIN_ID_LEN
            && (first.is_ascii_lowercase() || first == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PluginId {
    type Err = InvalidPluginId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PluginId {
    type Error = InvalidPluginId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.0
    }
}

/// File extension of a unit in the plugin directory.
pub const PLUGIN_EXTENSION: &str = "plug";

/// Hex-encoded SHA-256 of a source unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn of(content: &str) -> Self {
        Self(hex::encode(Sha256::digest(content.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: PluginId,
    pub source: String,
    pub checksum: Checksum,
}

impl Plugin {
    pub fn new(id: PluginId, source: impl Into<String>) -> Self {
        let source = source.into();
        let checksum = Checksum::of(&source);
        Self {
            id,
            source,
            checksum,
        }
    }

    pub fn summary(&self) -> Result<PluginSummary, ParseError> {
        let module = parse_module(&self.source)?;
        Ok(PluginSummary {
            plugin: self.id.clone(),
            functions: module.summary(),
            lines: self.source.lines().count(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSummary {
    pub plugin: PluginId,
    pub functions: Vec<FunctionSummary>,
    pub lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_id_rejects_paths() {
        assert!(PluginId::new("sample_plugin").is_ok());
        assert!(PluginId::new("../etc/passwd").is_err());
        assert!(PluginId::new("a/b").is_err());
        assert!(PluginId::new("").is_err());
        assert!(PluginId::new("Upper").is_err());
        assert!(PluginId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn test_plugin_id_deserialization_validates() {
        let ok: Result<PluginId, _> = serde_json::from_str("\"list_ops\"");
        assert!(ok.is_ok());
        let bad: Result<PluginId, _> = serde_json::from_str("\"..\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = Checksum::of("fn f() { }");
        assert_eq!(a, Checksum::of("fn f() { }"));
        assert_ne!(a, Checksum::of("fn f() { } "));
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_summary() {
        let plugin = Plugin::new(
            PluginId::new("sample").unwrap(),
            "fn process(values) {\n    return 0;\n}\nfn empty() { }\n",
        );
        let summary = plugin.summary().unwrap();
        assert_eq!(summary.lines, 4);
        assert_eq!(summary.functions.len(), 2);
        assert_eq!(summary.functions[0].statements, 1);
        assert!(summary.functions[1].is_stub);
    }
}
