//! Backend health and build information (`/actuator/*`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemHealth {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SystemHealth {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub app: AppInfo,
    pub java: RuntimeInfo,
    pub system: HostInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub build_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeInfo {
    pub version: String,
    pub runtime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub processors: u32,
    pub memory: MemoryInfo,
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryInfo {
    pub total: u64,
    pub free: u64,
    pub max: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_decodes_components() {
        let json = r#"{"status":"UP","components":{"db":{"status":"UP","details":{"database":"MySQL"}},"diskSpace":{"status":"UP"}}}"#;
        let health: SystemHealth = serde_json::from_str(json).unwrap();
        assert!(health.is_up());
        assert_eq!(health.components.len(), 2);
        assert!(health.components["diskSpace"].details.is_none());
    }

    #[test]
    fn info_tolerates_missing_sections() {
        let info: SystemInfo =
            serde_json::from_str(r#"{"app":{"name":"efficiency","version":"1.2.0"}}"#).unwrap();
        assert_eq!(info.app.version, "1.2.0");
        assert_eq!(info.system.processors, 0);
    }
}
