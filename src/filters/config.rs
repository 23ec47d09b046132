//! Filter chain configuration
//!
//! `FilterChainConfig` is the payload accepted by `configure`: two ordered
//! lists of `{name, params?}` entries. [`FilterChainConfig::resolve`] turns it
//! into typed filters, rejecting unknown names and malformed parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MontageError, Result};
use crate::filters::audio::AudioFilter;
use crate::filters::video::VideoFilter;

/// One named filter with its raw parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl FilterSpec {
    /// Filter with no parameters
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    /// Filter with a parameter object; non-object values give empty params
    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params: match params {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Ordered audio and video filter lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterChainConfig {
    pub audio: Vec<FilterSpec>,
    pub video: Vec<FilterSpec>,
}

/// Typed, validated filter chains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedChain {
    pub audio: Vec<AudioFilter>,
    pub video: Vec<VideoFilter>,
}

impl FilterChainConfig {
    /// Parse a configuration payload
    ///
    /// Both `audio` and `video` must be present and be lists (possibly
    /// empty). Every entry needs a string `name`; `params`, when present,
    /// must be an object.
    pub fn from_value(payload: &Value) -> Result<Self> {
        let Some(root) = payload.as_object() else {
            return Err(invalid_config("expected a JSON object"));
        };

        let (Some(audio), Some(video)) = (root.get("audio"), root.get("video")) else {
            return Err(invalid_config("config must contain 'audio' and 'video'"));
        };

        Ok(Self {
            audio: parse_list("audio", audio)?,
            video: parse_list("video", video)?,
        })
    }

    /// Parse a configuration payload from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let payload: Value = serde_json::from_str(text)?;
        Self::from_value(&payload)
    }

    /// Resolve every entry against the audio and video filter sets
    pub fn resolve(&self) -> Result<ResolvedChain> {
        let audio = self
            .audio
            .iter()
            .map(AudioFilter::from_spec)
            .collect::<Result<Vec<_>>>()?;
        let video = self
            .video
            .iter()
            .map(VideoFilter::from_spec)
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedChain { audio, video })
    }
}

fn invalid_config(reason: impl Into<String>) -> MontageError {
    MontageError::InvalidConfig {
        reason: reason.into(),
    }
}

fn parse_list(domain: &str, value: &Value) -> Result<Vec<FilterSpec>> {
    let Some(items) = value.as_array() else {
        return Err(invalid_config(format!("'{}' must be a list", domain)));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let Some(entry) = item.as_object() else {
                return Err(invalid_config(format!("{}[{}] must be an object", domain, i)));
            };

            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                return Err(invalid_config(format!(
                    "{}[{}] is missing a string 'name'",
                    domain, i
                )));
            };

            let params = match entry.get("params") {
                None => Map::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(_) => {
                    return Err(invalid_config(format!(
                        "{} params for '{}' must be an object",
                        domain, name
                    )))
                }
            };

            Ok(FilterSpec {
                name: name.to_string(),
                params,
            })
        })
        .collect()
}
