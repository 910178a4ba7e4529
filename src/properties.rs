//! Dashboard property definitions with defaults from dashboard.json
//!
//! dashboard.json is embedded at compile time and is the single place where
//! property defaults live. User-supplied values (from a settings file or a
//! host application) are layered on top through `PropertyReader`.

use crate::error::{DashboardError, Result};
use std::collections::HashMap;

/// dashboard.json embedded at compile time
const DASHBOARD_JSON: &str = include_str!("../dashboard.json");

/// Property definition from dashboard.json
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    pub default_value: String,
    pub description: String,
    /// For EnumeratedProperty, the valid values
    pub valid_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String,
    Enumerated,
    Number,
}

/// Registry of all dashboard properties with their defaults
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    properties: HashMap<String, PropertyDef>,
}

impl PropertyRegistry {
    /// Parse a property document shaped like dashboard.json
    pub fn from_json(document: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(document)?;

        let properties_array = json["properties"]
            .as_array()
            .ok_or_else(|| DashboardError::Config("missing 'properties' array".to_string()))?;

        let mut properties = HashMap::new();

        for prop in properties_array {
            let name = prop["name"]
                .as_str()
                .ok_or_else(|| DashboardError::Config("property missing 'name'".to_string()))?
                .to_string();

            let kind = match prop["kind"].as_str() {
                Some("StringProperty") => PropertyKind::String,
                Some("EnumeratedProperty") => PropertyKind::Enumerated,
                Some("NumberProperty") => PropertyKind::Number,
                other => {
                    return Err(DashboardError::Config(format!(
                        "unknown kind {:?} for property '{}'",
                        other, name
                    )))
                }
            };

            let default_value = prop["defaultValue"].as_str().unwrap_or("").to_string();
            let description = prop["description"].as_str().unwrap_or("").to_string();

            let valid_values = if kind == PropertyKind::Enumerated {
                prop["values"].as_array().map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
            } else {
                None
            };

            properties.insert(
                name.clone(),
                PropertyDef {
                    name,
                    kind,
                    default_value,
                    description,
                    valid_values,
                },
            );
        }

        Ok(Self { properties })
    }

    /// Get the default value for a property
    pub fn get_default(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|p| p.default_value.as_str())
    }

    /// Get the property definition
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    /// Check if a value is valid for an enumerated property
    pub fn is_valid_enum_value(&self, name: &str, value: &str) -> bool {
        self.properties
            .get(name)
            .and_then(|p| p.valid_values.as_ref())
            .map(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
            .unwrap_or(true) // Non-enumerated properties accept any value
    }
}

static REGISTRY: std::sync::OnceLock<PropertyRegistry> = std::sync::OnceLock::new();

/// Get the global property registry
pub fn registry() -> &'static PropertyRegistry {
    REGISTRY.get_or_init(|| {
        PropertyRegistry::from_json(DASHBOARD_JSON).unwrap_or_else(|e| {
            tracing::error!("embedded dashboard.json is invalid: {}", e);
            PropertyRegistry::default()
        })
    })
}

/// Typed property reader
///
/// User values win when present and non-empty; everything else falls back to
/// the dashboard.json default.
#[derive(Debug, Clone, Default)]
pub struct PropertyReader {
    user_values: HashMap<String, String>,
}

impl PropertyReader {
    pub fn new(user_values: HashMap<String, String>) -> Self {
        let user_values = user_values
            .into_iter()
            .filter(|(_, v)| !v.is_empty()) // Empty = not set
            .collect();
        Self { user_values }
    }

    /// Build from a flat JSON object, e.g. a settings file
    ///
    /// Strings, numbers and booleans are accepted; nested values are skipped.
    pub fn from_json(document: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(document)?;

        let mut user_values = HashMap::new();
        for (key, value) in map {
            let value_str = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            user_values.insert(key, value_str);
        }

        Ok(Self::new(user_values))
    }

    /// Get string property (user value or default)
    pub fn get_string(&self, name: &str) -> String {
        if let Some(value) = self.user_values.get(name) {
            return value.clone();
        }
        registry().get_default(name).unwrap_or("").to_string()
    }

    /// Get enumerated property with validation
    ///
    /// Invalid user values are logged and replaced by the default.
    pub fn get_enum(&self, name: &str) -> String {
        let reg = registry();
        let default = reg.get_default(name).unwrap_or("");

        if let Some(value) = self.user_values.get(name) {
            if reg.is_valid_enum_value(name, value) {
                return value.clone();
            }
            let valid_values = reg
                .get_property(name)
                .and_then(|p| p.valid_values.as_ref())
                .map(|v| v.join(", "))
                .unwrap_or_default();
            tracing::warn!(
                "Invalid value '{}' for property '{}'. Valid values: [{}]. Using default: '{}'",
                value,
                name,
                valid_values,
                default
            );
        }

        default.to_string()
    }

    /// Get f64 property, falling back to the default when unparseable
    pub fn get_f64(&self, name: &str) -> f64 {
        let default = registry()
            .get_default(name)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let value = self.get_string(name);
        if value.is_empty() {
            return default;
        }

        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                tracing::warn!(
                    "Invalid numeric value '{}' for property '{}'. Using default: {}",
                    value,
                    name,
                    default
                );
                default
            }
        }
    }

    /// Get f64 property with range validation
    pub fn get_f64_in_range(&self, name: &str, min: f64, max: f64) -> f64 {
        let value = self.get_f64(name);
        if (min..=max).contains(&value) {
            return value;
        }

        let default = registry()
            .get_default(name)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(min);
        tracing::warn!(
            "Value {} for property '{}' out of range [{}, {}]. Using default: {}",
            value,
            name,
            min,
            max,
            default
        );
        default
    }

    /// Get a non-negative integer property
    pub fn get_usize(&self, name: &str) -> usize {
        let value = self.get_f64(name);
        if value < 0.0 {
            tracing::warn!("Negative value {} for property '{}', using 0", value, name);
            return 0;
        }
        value.round() as usize
    }
}
