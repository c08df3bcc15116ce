use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{contact_submission, user};
use crate::error::AppError;

use super::shared::{validate_email, validate_len, validate_max_len};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    /// Letters and digits only, 1-50 characters.
    #[schema(example = "jane")]
    pub username: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// At least 6 characters.
    pub password: String,
}

/// Public profile; never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            created_at: m.created_at,
        }
    }
}

pub fn validate_user(req: &CreateUserRequest) -> Result<(), AppError> {
    let username = req.username.trim();
    if username.is_empty()
        || username.chars().count() > 50
        || !username.chars().all(char::is_alphanumeric)
    {
        return Err(AppError::Validation(
            "Username must be 1-50 alphanumeric characters".into(),
        ));
    }
    validate_email(&req.email)?;
    if req.password.chars().count() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[schema(example = "Volunteering")]
    pub subject: String,
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContactResponse {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub subject: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<contact_submission::Model> for ContactResponse {
    fn from(m: contact_submission::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            email: m.email,
            phone_number: m.phone_number,
            subject: m.subject,
            message: m.message,
            submitted_at: m.submitted_at,
        }
    }
}

pub fn validate_contact(req: &ContactRequest) -> Result<(), AppError> {
    validate_len(&req.full_name, "Full name", 2, 100)?;
    validate_email(&req.email)?;
    validate_max_len(req.phone_number.as_deref(), "Phone number", 30)?;
    validate_len(&req.subject, "Subject", 3, 200)?;
    if req.message.trim().chars().count() < 10 {
        return Err(AppError::Validation(
            "Message must be at least 10 characters".into(),
        ));
    }
    Ok(())
}
