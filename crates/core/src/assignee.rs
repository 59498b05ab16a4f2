//! People eligible for ticket assignment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Junior,
    #[default]
    Intermediate,
    Senior,
    Expert,
    Lead,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Junior => "JUNIOR",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Senior => "SENIOR",
            SkillLevel::Expert => "EXPERT",
            SkillLevel::Lead => "LEAD",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JUNIOR" => Ok(SkillLevel::Junior),
            "INTERMEDIATE" => Ok(SkillLevel::Intermediate),
            "SENIOR" => Ok(SkillLevel::Senior),
            "EXPERT" => Ok(SkillLevel::Expert),
            "LEAD" => Ok(SkillLevel::Lead),
            _ => Err(CoreError::Parse {
                kind: "skill level",
                value: s.to_string(),
            }),
        }
    }
}

/// An assignee as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssigneeInfo {
    pub id: DbId,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub skill_level: SkillLevel,
    pub specialization: Vec<String>,
    pub is_active: bool,
}

/// Body for creating an assignee; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignee {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub specialization: Vec<String>,
    pub is_active: bool,
}

/// Partial update. Unset fields are left out of the body so the backend
/// keeps their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl AssigneeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_serializes_only_set_fields() {
        let update = AssigneeUpdate {
            department: Some("Network".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"department": "Network", "isActive": false})
        );
        assert!(!update.is_empty());
        assert!(AssigneeUpdate::default().is_empty());
    }

    #[test]
    fn skill_level_parses_case_insensitively() {
        assert_eq!("senior".parse::<SkillLevel>().unwrap(), SkillLevel::Senior);
        assert_eq!(SkillLevel::Lead.to_string(), "LEAD");
        assert!("guru".parse::<SkillLevel>().is_err());
    }

    #[test]
    fn assignee_decodes_skill_level() {
        let json = r#"{"id":3,"employeeId":"E003","name":"Lin","email":"lin@example.com","department":"Support","skillLevel":"SENIOR","specialization":["network","db"],"isActive":true}"#;
        let a: AssigneeInfo = serde_json::from_str(json).unwrap();
        assert_eq!(a.skill_level, SkillLevel::Senior);
        assert_eq!(a.specialization.len(), 2);
        assert!(a.is_active);
    }
}
