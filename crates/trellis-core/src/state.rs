//! Persisted parameter state.
//!
//! Two formats are supported:
//!
//! - **Binary**: one little-endian `f64` per parameter in ascending id
//!   order, no header. Values are applied as they are read, so a truncated
//!   stream leaves the values read so far in place.
//! - **TOML**: a human-readable document keyed by parameter key:
//!
//! ```toml
//! [_meta]
//! version = 1
//! plugin = "com.example.sines"
//!
//! [preset]
//! name = "Init"
//! creator = ""
//! description = ""
//!
//! [params]
//! fall = 0.25
//! polyphony = 8.0
//! ```
//!
//! Both read and write raw values through [`MainParameters`], so a load
//! reaches the audio side through the ordinary change channel.

use std::io::{ErrorKind, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::parameter_store::MainParameters;

/// Persisted state layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFormat {
    /// Flat little-endian `f64` per parameter.
    #[default]
    Binary,
    /// TOML document; `version` is compared on load and older documents
    /// are handed to the plugin for migration.
    Toml { version: u32 },
}

/// Descriptive preset metadata stored alongside TOML state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Meta {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    plugin: String,
}

/// Write every value in id order.
pub fn save_binary(params: &MainParameters, writer: &mut dyn Write) -> Result<(), StateError> {
    for value in params.values() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read one value per parameter, applying each as it is read.
pub fn load_binary(params: &mut MainParameters, reader: &mut dyn Read) -> Result<(), StateError> {
    let expected = params.count();
    let mut bytes = [0u8; 8];
    for id in 0..expected {
        match reader.read_exact(&mut bytes) {
            Ok(()) => params.set(id as u32, f64::from_le_bytes(bytes)),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(StateError::Truncated {
                    expected,
                    found: id,
                });
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Write a TOML document.
pub fn save_toml(
    params: &MainParameters,
    plugin_id: &str,
    version: u32,
    preset: Option<&PresetInfo>,
    writer: &mut dyn Write,
) -> Result<(), StateError> {
    let mut document = toml::Table::new();
    let meta = Meta {
        version,
        plugin: plugin_id.to_owned(),
    };
    document.insert("_meta".into(), to_value(&meta)?);
    if let Some(preset) = preset {
        document.insert("preset".into(), to_value(preset)?);
    }

    let mut values = toml::Table::new();
    for descriptor in params.registry().iter() {
        values.insert(
            descriptor.key.clone(),
            toml::Value::Float(params.peek(descriptor.id)),
        );
    }
    document.insert("params".into(), toml::Value::Table(values));

    let text = toml::to_string(&document).map_err(|err| StateError::Parse(err.to_string()))?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// What a TOML load found besides the values it applied.
#[derive(Debug, Default, PartialEq)]
pub struct TomlLoad {
    /// Preset section, if present.
    pub preset: Option<PresetInfo>,
    /// Keys that matched no parameter or held a non-numeric value.
    pub skipped_keys: Vec<String>,
    /// Version stored in the document.
    pub version: u32,
}

/// Read a TOML document and apply every known parameter.
///
/// `migrate` is called with the parsed document and its stored version
/// when that differs from `version`; it may rewrite the document in place.
pub fn load_toml(
    params: &mut MainParameters,
    plugin_id: &str,
    version: u32,
    reader: &mut dyn Read,
    migrate: &mut dyn FnMut(&mut toml::Table, u32) -> Result<(), String>,
) -> Result<TomlLoad, StateError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut document: toml::Table = text
        .parse()
        .map_err(|err: toml::de::Error| StateError::Parse(err.message().to_owned()))?;

    let meta: Meta = document
        .get("_meta")
        .cloned()
        .ok_or(StateError::MissingSection("_meta"))?
        .try_into()
        .map_err(|err: toml::de::Error| StateError::Parse(err.message().to_owned()))?;
    if meta.plugin != plugin_id {
        return Err(StateError::WrongPlugin {
            expected: plugin_id.to_owned(),
            found: meta.plugin,
        });
    }
    if meta.version != version {
        migrate(&mut document, meta.version).map_err(StateError::Migration)?;
    }

    let preset = match document.get("preset") {
        Some(value) => Some(
            value
                .clone()
                .try_into::<PresetInfo>()
                .map_err(|err| StateError::Parse(err.message().to_owned()))?,
        ),
        None => None,
    };

    let values = document
        .get("params")
        .and_then(toml::Value::as_table)
        .ok_or(StateError::MissingSection("params"))?;

    let mut report = TomlLoad {
        preset,
        skipped_keys: Vec::new(),
        version: meta.version,
    };
    let registry = std::sync::Arc::clone(params.registry());
    for (key, value) in values {
        let number = match value {
            toml::Value::Float(v) => Some(*v),
            toml::Value::Integer(v) => Some(*v as f64),
            _ => None,
        };
        match (registry.id_for_key(key), number) {
            (Some(id), Some(number)) => params.set(id, number),
            _ => report.skipped_keys.push(key.clone()),
        }
    }
    Ok(report)
}

fn to_value<T: Serialize>(value: &T) -> Result<toml::Value, StateError> {
    toml::Value::try_from(value).map_err(|err| StateError::Parse(err.to_string()))
}
