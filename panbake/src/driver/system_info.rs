//! Parsed `show system info` output.

use indexmap::IndexMap;
use serde::Serialize;

/// Key/value pairs from `show system info`, in device order.
///
/// ```text
/// hostname: PA-VM
/// serial: 007951000123456
/// sw-version: 10.1.3
/// vm-license: VM-300
/// vm_series: vm_series-2.1.3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    fields: IndexMap<String, String>,
}

impl SystemInfo {
    /// Parse `key: value` lines. Lines without a colon are skipped.
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { fields }
    }

    /// Value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// All fields in device order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.get("hostname")
    }

    pub fn serial(&self) -> Option<&str> {
        self.get("serial")
    }

    pub fn sw_version(&self) -> Option<&str> {
        self.get("sw-version")
    }

    pub fn vm_license(&self) -> Option<&str> {
        self.get("vm-license")
    }

    /// Installed VM-Series plugin version.
    ///
    /// Older releases print the field as `vm-series`.
    pub fn plugin_version(&self) -> Option<&str> {
        self.get("vm_series").or_else(|| self.get("vm-series"))
    }
}
