//! Typed access to a filter's JSON parameter map

use serde_json::{Map, Value};

use crate::error::{MontageError, Result};

/// Read-only view over one filter's `params` object
///
/// Values may arrive as JSON numbers or as numeric strings (form payloads
/// send everything as text).
pub struct Params<'a> {
    filter: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(filter: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { filter, map }
    }

    /// First present key out of `keys`, as a float
    pub fn opt_f32(&self, keys: &[&str]) -> Result<Option<f32>> {
        let Some((key, value)) = self.lookup(keys) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed {
            Some(v) if v.is_finite() => Ok(Some(v as f32)),
            _ => Err(self.invalid(key, value, "a finite number")),
        }
    }

    /// Like [`Params::opt_f32`] with a fallback
    pub fn f32_or(&self, keys: &[&str], default: f32) -> Result<f32> {
        Ok(self.opt_f32(keys)?.unwrap_or(default))
    }

    /// First present key out of `keys`, as a positive integer
    pub fn opt_positive_u32(&self, keys: &[&str]) -> Result<Option<u32>> {
        let Some((key, value)) = self.lookup(keys) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        match parsed.and_then(|v| u32::try_from(v).ok()) {
            Some(v) if v > 0 => Ok(Some(v)),
            _ => Err(self.invalid(key, value, "a positive integer")),
        }
    }

    /// Reject `value` for `param` unless `ok` holds
    pub fn ensure(&self, ok: bool, param: &str, value: f32, expected: &str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(MontageError::InvalidParameter {
                filter: self.filter.to_string(),
                param: param.to_string(),
                value: value.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    fn lookup<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &'a Value)> {
        let map = self.map;
        keys.iter().find_map(|&k| map.get(k).map(|v| (k, v)))
    }

    fn invalid(&self, key: &str, value: &Value, expected: &str) -> MontageError {
        MontageError::InvalidParameter {
            filter: self.filter.to_string(),
            param: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_alias_wins() {
        let m = map(json!({"legacy": 0.5, "modern": 0.3}));
        let p = Params::new("f", &m);
        assert_eq!(p.opt_f32(&["modern", "legacy"]).unwrap(), Some(0.3));
        assert_eq!(p.opt_f32(&["missing"]).unwrap(), None);
        assert_eq!(p.f32_or(&["missing"], 4.0).unwrap(), 4.0);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let m = map(json!({"ratio": " 2.5 ", "fps": "60"}));
        let p = Params::new("f", &m);
        assert_eq!(p.opt_f32(&["ratio"]).unwrap(), Some(2.5));
        assert_eq!(p.opt_positive_u32(&["fps"]).unwrap(), Some(60));
    }

    #[test]
    fn test_malformed_values_rejected() {
        let m = map(json!({"ratio": "loud", "fps": 0, "flag": true, "w": 1.5}));
        let p = Params::new("f", &m);
        assert!(matches!(
            p.opt_f32(&["ratio"]),
            Err(MontageError::InvalidParameter { .. })
        ));
        assert!(p.opt_f32(&["flag"]).is_err());
        assert!(p.opt_positive_u32(&["fps"]).is_err());
        assert!(p.opt_positive_u32(&["w"]).is_err());
    }
}
