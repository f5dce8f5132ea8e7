//! User service for business logic.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::error::UserError;
use super::models::{
    UserCreationRequest, UserPageResponse, UserPasswordRequest, UserResponse, UserStatus,
    UserUpdateRequest,
};
use super::repository::UserRepository;

/// Role assigned to every newly created user.
const DEFAULT_ROLE: &str = "user";

/// Sort spec grammar: `<fieldName>:<asc|desc>`.
static SORT_SPEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+?):(.*)$").unwrap());

/// Columns a caller may sort by. Anything else falls back to the default.
const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "username",
    "email",
    "phone",
    "created_at",
];

/// Parsed sort order: (column, descending).
fn parse_sort(sort: Option<&str>) -> (&'static str, bool) {
    let default = ("id", false);

    let Some(spec) = sort.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    let Some(captures) = SORT_SPEC.captures(spec) else {
        return default;
    };

    let column = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let Some(column) = SORTABLE_COLUMNS.iter().find(|c| **c == column) else {
        return default;
    };

    let descending = !captures
        .get(2)
        .map(|m| m.as_str().eq_ignore_ascii_case("asc"))
        .unwrap_or(true);

    (column, descending)
}

fn hash_password(password: &str) -> Result<String, UserError> {
    // Lower cost keeps the test suite fast.
    let cost = if cfg!(debug_assertions) { 4 } else { bcrypt::DEFAULT_COST };
    Ok(bcrypt::hash(password, cost)?)
}

/// Service for user management operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &UserRepository {
        &self.repo
    }

    /// Sorted, paginated, optionally keyword-filtered user listing.
    ///
    /// `page` is 1-based from the caller; zero and negative values land on
    /// the first page. Totals cover the full filtered set.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        keyword: Option<&str>,
        sort: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<UserPageResponse, UserError> {
        let (column, descending) = parse_sort(sort);

        let page_index = if page > 0 { page - 1 } else { 0 };
        let size = size.max(1);

        let pattern = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{}%", k.to_lowercase()));

        let total_elements = self.repo.count(pattern.as_deref()).await?;
        let users = self
            .repo
            .page(
                pattern.as_deref(),
                column,
                descending,
                size,
                page_index * size,
            )
            .await?;

        Ok(UserPageResponse {
            page_number: page,
            page_size: size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
            users: users.iter().map(UserResponse::from).collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<UserResponse, UserError> {
        let user = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;
        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<UserResponse, UserError> {
        let user = self
            .repo
            .get_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;
        Ok(UserResponse::from(&user))
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<UserResponse, UserError> {
        let user = self
            .repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;
        Ok(UserResponse::from(&user))
    }

    /// Create a user with its default role, then insert any addresses.
    ///
    /// The user row and role assignment commit together; address inserts run
    /// afterwards and do not unwind a committed user on failure.
    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn create(&self, req: &UserCreationRequest) -> Result<i64, UserError> {
        let violations = req.validate();
        if !violations.is_empty() {
            return Err(UserError::from_violations(violations));
        }

        if self.repo.get_by_email(&req.email).await?.is_some() {
            return Err(UserError::InvalidInput("email already exists".to_string()));
        }

        let password_hash = hash_password(&req.password)?;

        let user_id = self
            .repo
            .create(
                &req.first_name,
                &req.last_name,
                req.gender.map(|g| g.to_string()).as_deref(),
                req.birthday.as_deref(),
                &req.username,
                &req.email,
                req.phone.as_deref(),
                &password_hash,
                &req.user_type.to_string(),
                DEFAULT_ROLE,
            )
            .await?;

        info!(user_id, username = %req.username, "created user");

        if let Some(addresses) = &req.addresses {
            for address in addresses {
                if let Err(e) = self.repo.upsert_address(user_id, address).await {
                    warn!(user_id, error = %e, "address insert failed after user creation");
                }
            }
        }

        Ok(user_id)
    }

    /// Update scalar fields and upsert any supplied addresses.
    #[instrument(skip(self, req), fields(user_id = req.id))]
    pub async fn update(&self, req: &UserUpdateRequest) -> Result<(), UserError> {
        let violations = req.validate();
        if !violations.is_empty() {
            return Err(UserError::from_violations(violations));
        }

        // Re-fetch the authoritative record before mutating; no blind upserts.
        let user = self
            .repo
            .get(req.id)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;

        self.repo.update_scalars(req).await?;
        info!(user_id = user.audit.id, "updated user");

        if let Some(addresses) = &req.addresses {
            for address in addresses {
                self.repo.upsert_address(user.audit.id, address).await?;
            }
        }

        Ok(())
    }

    /// Change a user's password. Mismatched confirmation is rejected.
    #[instrument(skip(self, req), fields(user_id = req.id))]
    pub async fn change_password(&self, req: &UserPasswordRequest) -> Result<(), UserError> {
        let violations = req.validate();
        if !violations.is_empty() {
            return Err(UserError::from_violations(violations));
        }

        let user = self
            .repo
            .get(req.id)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;

        if req.password != req.confirm_password {
            return Err(UserError::InvalidInput(
                "password confirmation does not match".to_string(),
            ));
        }

        let password_hash = hash_password(&req.password)?;
        self.repo.set_password(user.audit.id, &password_hash).await?;
        info!(user_id = user.audit.id, "changed password");

        Ok(())
    }

    /// Soft delete: flip status to inactive, never remove the row.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), UserError> {
        let user = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| UserError::NotFound("user".to_string()))?;

        self.repo.set_status(user.audit.id, UserStatus::Inactive).await?;
        info!(user_id = id, "soft-deleted user");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::user::models::{AddressRequest, Gender, UserType};

    fn creation_request(username: &str, email: &str) -> UserCreationRequest {
        UserCreationRequest {
            first_name: "test".to_string(),
            last_name: username.to_string(),
            gender: Some(Gender::Male),
            birthday: None,
            username: username.to_string(),
            password: "password123".to_string(),
            email: email.to_string(),
            phone: Some("0938749250".to_string()),
            user_type: UserType::User,
            addresses: None,
        }
    }

    async fn test_service() -> UserService {
        let db = Database::in_memory().await.unwrap();
        UserService::new(UserRepository::new(db.pool().clone()))
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None), ("id", false));
        assert_eq!(parse_sort(Some("")), ("id", false));
        assert_eq!(parse_sort(Some("email:asc")), ("email", false));
        assert_eq!(parse_sort(Some("email:desc")), ("email", true));
        assert_eq!(parse_sort(Some("email:DESC")), ("email", true));
        // Malformed specs and unknown columns fall back to id ascending.
        assert_eq!(parse_sort(Some("email")), ("id", false));
        assert_eq!(parse_sort(Some("password_hash:asc")), ("id", false));
        assert_eq!(parse_sort(Some(":desc")), ("id", false));
    }

    #[tokio::test]
    async fn test_find_all_empty_store() {
        let service = test_service().await;

        let page = service.find_all(None, None, 0, 20).await.unwrap();
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.users.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_keyword_search() {
        let service = test_service().await;
        service
            .create(&creation_request("testuser1", "example1@gmail.com"))
            .await
            .unwrap();
        service
            .create(&creation_request("testuser2", "example2@gmail.com"))
            .await
            .unwrap();

        let page = service.find_all(Some("test"), None, 0, 20).await.unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.users[0].username, "testuser1");
        assert_eq!(page.users[1].username, "testuser2");
    }

    #[tokio::test]
    async fn test_find_all_pagination_totals() {
        let service = test_service().await;
        for i in 0..5 {
            service
                .create(&creation_request(
                    &format!("user{i}"),
                    &format!("user{i}@example.com"),
                ))
                .await
                .unwrap();
        }

        let page = service.find_all(None, None, 2, 2).await.unwrap();
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.users.len(), 2);
        assert_eq!(page.users[0].username, "user2");
    }

    #[tokio::test]
    async fn test_find_by_username_and_email() {
        let service = test_service().await;
        let id = service
            .create(&creation_request("testuser1", "example1@gmail.com"))
            .await
            .unwrap();

        let by_username = service.find_by_username("testuser1").await.unwrap();
        assert_eq!(by_username.id, id);

        let by_email = service.find_by_email("example1@gmail.com").await.unwrap();
        assert_eq!(by_email.username, "testuser1");

        assert!(matches!(
            service.find_by_username("nobody").await,
            Err(UserError::NotFound(_))
        ));
        assert!(matches!(
            service.find_by_email("nobody@example.com").await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_email_rejected() {
        let service = test_service().await;
        service
            .create(&creation_request("testuser1", "dup@example.com"))
            .await
            .unwrap();

        let result = service
            .create(&creation_request("testuser2", "dup@example.com"))
            .await;
        assert!(matches!(result, Err(UserError::InvalidInput(_))));

        let page = service.find_all(None, None, 0, 20).await.unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let service = test_service().await;
        let req = UserUpdateRequest {
            id: 42,
            first_name: "test".to_string(),
            last_name: "user".to_string(),
            gender: None,
            birthday: None,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            addresses: None,
        };
        assert!(matches!(
            service.update(&req).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_upserts_address() {
        let service = test_service().await;
        let id = service
            .create(&creation_request("testuser1", "example1@gmail.com"))
            .await
            .unwrap();

        let address = AddressRequest {
            apartment_number: Some("12".to_string()),
            floor: None,
            building: None,
            street_number: None,
            street: Some("First St".to_string()),
            city: Some("Hanoi".to_string()),
            country: Some("VN".to_string()),
            address_type: 1,
        };
        let mut req = UserUpdateRequest {
            id,
            first_name: "test".to_string(),
            last_name: "user1".to_string(),
            gender: None,
            birthday: None,
            username: "testuser1".to_string(),
            email: "example1@gmail.com".to_string(),
            phone: None,
            addresses: Some(vec![address.clone()]),
        };
        service.update(&req).await.unwrap();

        let mut changed = address;
        changed.street = Some("Second St".to_string());
        req.addresses = Some(vec![changed]);
        service.update(&req).await.unwrap();

        let addresses = service.repository().addresses_for(id).await.unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].street.as_deref(), Some("Second St"));
    }

    #[tokio::test]
    async fn test_change_password_mismatch_rejected() {
        let service = test_service().await;
        let id = service
            .create(&creation_request("testuser1", "example1@gmail.com"))
            .await
            .unwrap();

        let req = UserPasswordRequest {
            id,
            password: "newpassword".to_string(),
            confirm_password: "different".to_string(),
        };
        assert!(matches!(
            service.change_password(&req).await,
            Err(UserError::InvalidInput(_))
        ));

        let req = UserPasswordRequest {
            id,
            password: "newpassword".to_string(),
            confirm_password: "newpassword".to_string(),
        };
        service.change_password(&req).await.unwrap();

        let user = service.repository().get(id).await.unwrap().unwrap();
        assert!(bcrypt::verify("newpassword", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_idempotent() {
        let service = test_service().await;
        let id = service
            .create(&creation_request("testuser1", "example1@gmail.com"))
            .await
            .unwrap();

        service.delete(id).await.unwrap();
        service.delete(id).await.unwrap();

        let user = service.repository().get(id).await.unwrap().unwrap();
        assert_eq!(user.status, UserStatus::Inactive);

        assert!(matches!(
            service.delete(9999).await,
            Err(UserError::NotFound(_))
        ));
    }
}
