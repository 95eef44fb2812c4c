//! The authenticated portal user as returned by `/users/me/`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, InvalidInputError};

/// Role of a portal account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        };
        f.write_str(s)
    }
}

/// The current user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub second_lastname: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub personal_email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl User {
    /// Full name, skipping blank parts, falling back to the username.
    pub fn display_name(&self) -> String {
        let name = [
            &self.first_name,
            &self.second_name,
            &self.last_name,
            &self.second_lastname,
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        if name.is_empty() {
            self.username.clone()
        } else {
            name
        }
    }

    /// Shallow-merge a JSON object into this profile.
    ///
    /// Keys present in `patch` overwrite the current values; other fields are
    /// kept. The merged result must still describe a valid user.
    pub fn merge(&self, patch: &Value) -> Result<User, Error> {
        let Some(patch) = patch.as_object() else {
            return Err(InvalidInputError::Other {
                message: "user patch must be a JSON object".to_string(),
            }
            .into());
        };

        let mut current = serde_json::to_value(self).map_err(invalid)?;
        if let Some(fields) = current.as_object_mut() {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
        }

        serde_json::from_value(current).map_err(invalid)
    }
}

fn invalid(err: serde_json::Error) -> Error {
    InvalidInputError::Other {
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> User {
        serde_json::from_value(json!({
            "id": 7,
            "username": "1001234567",
            "first_name": "Ana",
            "second_name": "",
            "last_name": "Rojas",
            "second_lastname": "Díaz",
            "email": "ana@example.edu",
            "role": "TEACHER",
            "document_number": "1001234567",
            "personal_email": null,
            "phone_number": null,
            "photo": null
        }))
        .unwrap()
    }

    #[test]
    fn parses_backend_payload() {
        let user = sample();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.display_name(), "Ana Rojas Díaz");
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "username": "admin", "role": "ADMIN"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "admin");
    }

    #[test]
    fn merge_overwrites_only_given_fields() {
        let merged = sample()
            .merge(&json!({"phone_number": "3001112233", "photo": "/media/p.png"}))
            .unwrap();
        assert_eq!(merged.phone_number.as_deref(), Some("3001112233"));
        assert_eq!(merged.photo.as_deref(), Some("/media/p.png"));
        assert_eq!(merged.first_name, "Ana");
    }

    #[test]
    fn merge_rejects_non_object_and_bad_types() {
        assert!(sample().merge(&json!([1, 2])).is_err());
        assert!(sample().merge(&json!({"role": "JANITOR"})).is_err());
    }
}
