use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// Profile row. Created by the auth provider on sign-up, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    /// Label for patient pickers: full name, else email, else the id.
    pub fn display_name(&self) -> String {
        non_blank(&self.full_name)
            .or_else(|| non_blank(&self.email))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// `profiles(full_name, email)` relation expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name() {
        let profile = Profile {
            id: Uuid::new_v4(),
            role: Role::Patient,
            full_name: Some("Ada Obi".into()),
            email: Some("ada@example.com".into()),
        };
        assert_eq!(profile.display_name(), "Ada Obi");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let profile = Profile {
            id: Uuid::new_v4(),
            role: Role::Patient,
            full_name: Some("  ".into()),
            email: Some("ada@example.com".into()),
        };
        assert_eq!(profile.display_name(), "ada@example.com");
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let id = Uuid::new_v4();
        let profile: Profile =
            serde_json::from_value(serde_json::json!({ "id": id, "role": "patient" })).unwrap();
        assert_eq!(profile.full_name, None);
        assert_eq!(profile.display_name(), id.to_string());
    }
}
