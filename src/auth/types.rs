//! Wire types exchanged with clients and with the external auth service.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const LOGIN_MESSAGE: &str = "Login successful";
pub const REFRESH_MESSAGE: &str = "Token refreshed successfully";
pub const REGISTER_MESSAGE: &str = "Registration successful";

const DEFAULT_EXPIRES_IN: u64 = 3600;
const DEFAULT_TOKEN_TYPE: &str = "Bearer";
const MINIMUM_AGE: u32 = 18;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub identification_type: String,
    pub identification_number: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(&self) -> Result<(), AppError> {
        require("identificationType", &self.identification_type)?;
        require("identificationNumber", &self.identification_number)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub identification_type: String,
    pub identification_number: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub city_of_residence: String,
    pub nationality: String,
    pub phone_number: String,
    pub civil_status: String,
    pub email: String,
    pub password: String,
    pub gender: String,
    pub data_processing_agreement: bool,
}

impl RegisterInput {
    /// Rejects the request before anything is sent upstream.
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("identificationType", &self.identification_type),
            ("identificationNumber", &self.identification_number),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("cityOfResidence", &self.city_of_residence),
            ("nationality", &self.nationality),
            ("phoneNumber", &self.phone_number),
            ("civilStatus", &self.civil_status),
            ("email", &self.email),
            ("password", &self.password),
            ("gender", &self.gender),
        ] {
            require(field, value)?;
        }

        if self.age < MINIMUM_AGE {
            return Err(AppError::Validation(format!(
                "age must be at least {}",
                MINIMUM_AGE
            )));
        }
        if !is_plausible_email(&self.email) {
            return Err(AppError::Validation("email must be a valid email address".into()));
        }
        if !self.data_processing_agreement {
            return Err(AppError::Validation(
                "dataProcessingAgreement must be accepted".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    pub refresh_token: String,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Profile returned with login and registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub identification_type: String,
    pub identification_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_of_residence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub civil_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
    pub user_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Result of checking a bearer token with the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub valid: bool,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedUser {
    #[serde(default)]
    pub id: Option<String>,
}

/// Loosely shaped payload from the auth service. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthServiceResponse {
    pub id: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub city_of_residence: Option<String>,
    pub nationality: Option<String>,
    pub phone_number: Option<String>,
    pub civil_status: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
    pub user_id: Option<String>,
    pub user: Option<NestedUser>,
    pub message: Option<String>,
}

/// Empty strings count as absent, like a falsy JS value.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl AuthServiceResponse {
    /// Login and registration: token and user id have fallbacks, and the
    /// user profile is attached.
    pub fn into_session(self, default_message: &str) -> AuthResponse {
        let id = present(self.id);
        let user = User {
            id: id.clone().unwrap_or_default(),
            identification_type: self.identification_type.unwrap_or_default(),
            identification_number: self.identification_number.unwrap_or_default(),
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            city_of_residence: self.city_of_residence,
            nationality: self.nationality,
            phone_number: self.phone_number,
            civil_status: self.civil_status,
            email: self.email,
            gender: self.gender,
        };

        AuthResponse {
            token: present(self.token)
                .or_else(|| present(self.access_token))
                .unwrap_or_default(),
            refresh_token: present(self.refresh_token).unwrap_or_default(),
            expires_in: self.expires_in.filter(|&s| s > 0).unwrap_or(DEFAULT_EXPIRES_IN),
            token_type: present(self.token_type).unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into()),
            user_id: id
                .or_else(|| present(self.user_id))
                .or_else(|| present(self.user.and_then(|u| u.id)))
                .unwrap_or_default(),
            message: present(self.message).unwrap_or_else(|| default_message.into()),
            user: Some(user),
        }
    }

    /// Refresh: no access-token alias and no profile.
    pub fn into_refreshed(self) -> AuthResponse {
        AuthResponse {
            token: present(self.token).unwrap_or_default(),
            refresh_token: present(self.refresh_token).unwrap_or_default(),
            expires_in: self.expires_in.filter(|&s| s > 0).unwrap_or(DEFAULT_EXPIRES_IN),
            token_type: present(self.token_type).unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into()),
            user_id: present(self.user_id).unwrap_or_default(),
            message: present(self.message).unwrap_or_else(|| REFRESH_MESSAGE.into()),
            user: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register_input() -> RegisterInput {
        RegisterInput {
            identification_type: "CC".into(),
            identification_number: "123456".into(),
            first_name: "Ana".into(),
            last_name: "Gómez".into(),
            age: 30,
            city_of_residence: "Bogotá".into(),
            nationality: "CO".into(),
            phone_number: "+57 300 000 0000".into(),
            civil_status: "single".into(),
            email: "ana@example.com".into(),
            password: "s3cret".into(),
            gender: "F".into(),
            data_processing_agreement: true,
        }
    }

    #[test]
    fn test_register_validation_accepts_complete_input() {
        assert!(register_input().validate().is_ok());
    }

    #[test]
    fn test_register_validation_rules() {
        let mut input = register_input();
        input.age = 17;
        assert!(matches!(input.validate(), Err(AppError::Validation(m)) if m.contains("18")));

        let mut input = register_input();
        input.email = "ana.example.com".into();
        assert!(matches!(input.validate(), Err(AppError::Validation(m)) if m.contains("email")));

        let mut input = register_input();
        input.data_processing_agreement = false;
        assert!(input.validate().is_err());

        let mut input = register_input();
        input.first_name = "  ".into();
        assert!(matches!(input.validate(), Err(AppError::Validation(m)) if m.contains("firstName")));
    }

    #[test]
    fn test_login_validation() {
        let input = LoginInput {
            identification_type: "CC".into(),
            identification_number: "".into(),
            password: "x".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_session_defaults() {
        let raw: AuthServiceResponse = serde_json::from_value(json!({})).unwrap();
        let resp = raw.into_session(LOGIN_MESSAGE);
        assert_eq!(resp.token, "");
        assert_eq!(resp.refresh_token, "");
        assert_eq!(resp.expires_in, 3600);
        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.user_id, "");
        assert_eq!(resp.message, "Login successful");
        assert_eq!(resp.user, Some(User::default()));
    }

    #[test]
    fn test_session_fallback_chain() {
        let raw: AuthServiceResponse = serde_json::from_value(json!({
            "accessToken": "at-1",
            "user": { "id": "u-nested" },
            "firstName": "Ana"
        }))
        .unwrap();
        let resp = raw.into_session(REGISTER_MESSAGE);
        assert_eq!(resp.token, "at-1");
        assert_eq!(resp.user_id, "u-nested");
        assert_eq!(resp.message, "Registration successful");
        assert_eq!(resp.user.unwrap().first_name.as_deref(), Some("Ana"));

        let raw: AuthServiceResponse = serde_json::from_value(json!({
            "token": "t", "accessToken": "at", "id": "u-top", "userId": "u-field"
        }))
        .unwrap();
        let resp = raw.into_session(LOGIN_MESSAGE);
        assert_eq!(resp.token, "t");
        assert_eq!(resp.user_id, "u-top");
    }

    #[test]
    fn test_refresh_ignores_access_token_alias() {
        let raw: AuthServiceResponse = serde_json::from_value(json!({
            "accessToken": "at", "userId": "u-1", "expiresIn": 900
        }))
        .unwrap();
        let resp = raw.into_refreshed();
        assert_eq!(resp.token, "");
        assert_eq!(resp.user_id, "u-1");
        assert_eq!(resp.expires_in, 900);
        assert_eq!(resp.message, REFRESH_MESSAGE);
        assert!(resp.user.is_none());
    }

    #[test]
    fn test_auth_response_shape() {
        let raw: AuthServiceResponse =
            serde_json::from_value(json!({ "token": "t", "id": "u" })).unwrap();
        let json = serde_json::to_value(raw.into_session(LOGIN_MESSAGE)).unwrap();
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["userId"], "u");
        assert_eq!(json["user"]["id"], "u");
        assert!(json["user"].get("firstName").is_none());
    }
}
