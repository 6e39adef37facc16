//! JSON configuration files
//!
//! ```text
//! field map   { "user": "account", "user.mail": "account.email" }
//! aliases     { "user": { "name": "account", "fields": { "mail": "email" } } }
//! includes    { "open": "status:(open OR pending)" }
//! policy      { "restricted_fields": ["password"], "allowed_max_node_depth": 4 }
//! ```

use std::{collections::HashMap, fs, path::Path};

use serde::de::DeserializeOwned;

use super::CliError;
use crate::visitors::{AliasMap, ValidationOptions};

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::Json(path.to_path_buf(), e))
}

pub fn load_field_map(path: &Path) -> Result<HashMap<String, String>, CliError> {
    load_json(path)
}

pub fn load_includes(path: &Path) -> Result<HashMap<String, String>, CliError> {
    load_json(path)
}

pub fn load_policy(path: &Path) -> Result<ValidationOptions, CliError> {
    load_json(path)
}

pub fn load_aliases(path: &Path) -> Result<AliasMap, CliError> {
    let value: serde_json::Value = load_json(path)?;
    Ok(AliasMap::from_json(&value)?)
}
