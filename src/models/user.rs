use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use secrecy::SecretString;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Player,
    Coach,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Player => "player",
            UserRole::Coach => "coach",
            UserRole::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player" => Ok(UserRole::Player),
            "coach" => Ok(UserRole::Coach),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "rejected" => Ok(UserStatus::Rejected),
            other => Err(format!("Unknown status '{}'", other)),
        }
    }
}

/// Login row: the account joined with its profile.
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct UserWithProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub status: String,
    pub player_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "serialize_secret_string", deserialize_with = "deserialize_secret_string")]
    pub password: SecretString,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Requested role; admins can only be granted, never requested.
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() || username.len() > 150 {
            return Err("Username must be between 1 and 150 characters".into());
        }
        if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
            return Err("Username may only contain letters, digits and @/./+/-/_".into());
        }
        if !self.email.contains('@') {
            return Err("Invalid email address".into());
        }
        if matches!(self.role, Some(UserRole::Admin)) {
            return Err("The admin role cannot be requested at registration".into());
        }
        Ok(())
    }
}

impl std::fmt::Display for RegistrationRequest{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username: {}, Email: {}", self.username, self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserProfileRequest {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Link the account to a squad player; `null` leaves the link unchanged.
    pub player_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UserQueryParams {
    pub status: Option<UserStatus>,
}

pub fn serialize_secret_string<S>(_: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("[REDACTED]")
}

pub fn deserialize_secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s.into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, role: Option<UserRole>) -> RegistrationRequest {
        RegistrationRequest {
            username: username.into(),
            email: "coach@smoras.no".into(),
            password: SecretString::new("secret".into()),
            first_name: None,
            last_name: None,
            role,
        }
    }

    #[test]
    fn roles_and_statuses_round_trip_through_strings() {
        assert_eq!("Coach".parse::<UserRole>(), Ok(UserRole::Coach));
        assert_eq!(UserStatus::Approved.to_string(), "approved");
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn registration_rejects_admin_role_and_bad_usernames() {
        assert!(request("ola", Some(UserRole::Coach)).validate().is_ok());
        assert!(request("ola", Some(UserRole::Admin)).validate().is_err());
        assert!(request("ola nordmann", None).validate().is_err());
        assert!(request("", None).validate().is_err());
    }
}
