//! User data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Common audit fields embedded by every stored record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Audit {
    pub id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// User lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Freshly registered, not yet activated.
    #[default]
    None,
    Active,
    Inactive,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::None => write!(f, "none"),
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(UserStatus::None),
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// User account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Owner,
    Admin,
    #[default]
    User,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Owner => write!(f, "owner"),
            UserType::Admin => write!(f, "admin"),
            UserType::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(UserType::Owner),
            "admin" => Ok(UserType::Admin),
            "user" => Ok(UserType::User),
            _ => Err(format!("unknown user type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {}", s)),
        }
    }
}

macro_rules! sqlite_text_enum {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Sqlite> for $ty {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <String as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                let s = self.to_string();
                <String as sqlx::Encode<sqlx::Sqlite>>::encode(s, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $ty {
            fn decode(
                value: <sqlx::Sqlite as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<'r, sqlx::Sqlite>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }
    };
}

sqlite_text_enum!(UserStatus);
sqlite_text_enum!(UserType);
sqlite_text_enum!(Gender);

/// User entity from the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub birthday: Option<String>,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_type: UserType,
    pub status: UserStatus,
}

/// Role entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Address entity. At most one row per (user_id, address_type).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Address {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
    pub user_id: i64,
    pub address_type: i64,
    pub apartment_number: Option<String>,
    pub floor: Option<String>,
    pub building: Option<String>,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Address payload on create/update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRequest {
    pub apartment_number: Option<String>,
    pub floor: Option<String>,
    pub building: Option<String>,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub address_type: i64,
}

/// Registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreationRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub birthday: Option<String>,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    pub addresses: Option<Vec<AddressRequest>>,
}

/// Update request. Scalar fields are written as given; addresses are upserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub birthday: Option<String>,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub addresses: Option<Vec<AddressRequest>>,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPasswordRequest {
    pub id: i64,
    pub password: String,
    pub confirm_password: String,
}

/// Public user detail (safe to return to clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub birthday: Option<String>,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: UserStatus,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.audit.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            gender: user.gender,
            birthday: user.birthday.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            status: user.status,
        }
    }
}

/// One page of user summaries with totals over the full filtered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPageResponse {
    pub page_number: i64,
    pub page_size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub users: Vec<UserResponse>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    !parts[0].is_empty() && parts[1].contains('.')
}

impl UserCreationRequest {
    /// Explicit request validation, run before any domain logic.
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if is_blank(&self.first_name) {
            violations.push(FieldViolation::new("first_name", "must not be blank"));
        }
        if is_blank(&self.last_name) {
            violations.push(FieldViolation::new("last_name", "must not be blank"));
        }
        if is_blank(&self.username) {
            violations.push(FieldViolation::new("username", "must not be blank"));
        }
        if is_blank(&self.password) {
            violations.push(FieldViolation::new("password", "must not be blank"));
        }
        if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", "invalid email"));
        }
        violations
    }
}

impl UserUpdateRequest {
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.id < 1 {
            violations.push(FieldViolation::new("id", "must be >= 1"));
        }
        if is_blank(&self.first_name) {
            violations.push(FieldViolation::new("first_name", "must not be blank"));
        }
        if is_blank(&self.last_name) {
            violations.push(FieldViolation::new("last_name", "must not be blank"));
        }
        if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", "invalid email"));
        }
        violations
    }
}

impl UserPasswordRequest {
    pub fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.id < 1 {
            violations.push(FieldViolation::new("id", "must be >= 1"));
        }
        if is_blank(&self.password) {
            violations.push(FieldViolation::new("password", "must not be blank"));
        }
        violations
    }
}
