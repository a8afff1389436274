//! Account-level records: the signed-in user and their calendars.

use serde::{Deserialize, Serialize};

/// The authenticated user's profile from the OpenID userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Primary email address.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserInfo {
    /// Name to show in output: the profile name, or the email's local part.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// A calendar from the user's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    /// The calendar ID.
    pub id: String,
    /// The calendar summary (name).
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this is the primary calendar.
    #[serde(default)]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    /// The user's access level ("owner", "reader", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_requires_email_only() {
        let info: UserInfo = serde_json::from_str(r#"{"email": "jo@example.com"}"#).unwrap();
        assert_eq!(info.email, "jo@example.com");
        assert!(info.name.is_none());
        assert_eq!(info.display_name(), "jo");

        assert!(serde_json::from_str::<UserInfo>(r#"{"name": "Jo"}"#).is_err());
    }

    #[test]
    fn user_info_display_name_prefers_profile_name() {
        let info: UserInfo = serde_json::from_str(
            r#"{"email": "jo@example.com", "name": "Jo Doe", "picture": "https://example.com/p.png"}"#,
        )
        .unwrap();
        assert_eq!(info.display_name(), "Jo Doe");
        assert!(info.picture.is_some());
    }

    #[test]
    fn parse_calendar_entries() {
        let json = r#"[
            {"id": "primary", "summary": "My Calendar", "primary": true, "timeZone": "America/New_York"},
            {"id": "work@example.com", "summary": "Work", "accessRole": "reader"}
        ]"#;
        let calendars: Vec<Calendar> = serde_json::from_str(json).unwrap();
        assert!(calendars[0].primary);
        assert_eq!(calendars[0].time_zone.as_deref(), Some("America/New_York"));
        assert!(!calendars[1].primary);
        assert_eq!(calendars[1].access_role.as_deref(), Some("reader"));
    }
}
