//! User repository for database operations.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::error::UserError;
use super::models::{Address, AddressRequest, Role, User, UserStatus, UserUpdateRequest};

const USER_COLUMNS: &str = "id, created_at, updated_at, first_name, last_name, gender, birthday, \
     username, email, phone, password_hash, user_type, status";

/// Fields a keyword search matches against.
const SEARCH_PREDICATE: &str = "(lower(first_name) LIKE ?1 OR lower(last_name) LIKE ?1 \
     OR lower(username) LIKE ?1 OR lower(email) LIKE ?1 OR lower(phone) LIKE ?1)";

/// Repository for user, role, and address rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user and its default role assignment in one transaction.
    #[instrument(skip(self, password_hash), fields(username = %username))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        gender: Option<&str>,
        birthday: Option<&str>,
        username: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        user_type: &str,
        default_role: &str,
    ) -> Result<i64, UserError> {
        let mut tx = self.pool.begin().await?;

        let role: Option<Role> =
            sqlx::query_as("SELECT id, name, description FROM tbl_role WHERE name = ?")
                .bind(default_role)
                .fetch_optional(&mut *tx)
                .await?;
        let role = role.ok_or_else(|| UserError::NotFound("role".to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO tbl_user (first_name, last_name, gender, birthday, username, email, phone, password_hash, user_type, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(gender)
        .bind(birthday)
        .bind(username)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(user_type)
        .bind(UserStatus::None)
        .execute(&mut *tx)
        .await?;

        let user_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO tbl_user_has_role (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(user_id, "inserted user with default role");
        Ok(user_id)
    }

    /// Fetch a user by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM tbl_user WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM tbl_user WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM tbl_user WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Role names granted to a user.
    #[instrument(skip(self))]
    pub async fn authorities(&self, user_id: i64) -> Result<Vec<String>, UserError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name FROM tbl_role r
            JOIN tbl_user_has_role ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// One page of users, optionally keyword-filtered.
    ///
    /// `order_column` must come from the service-side whitelist; identifiers
    /// cannot be bound, so it is interpolated.
    #[instrument(skip(self))]
    pub async fn page(
        &self,
        keyword: Option<&str>,
        order_column: &str,
        descending: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, UserError> {
        let direction = if descending { "DESC" } else { "ASC" };

        let users = match keyword {
            Some(pattern) => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM tbl_user WHERE {SEARCH_PREDICATE} \
                     ORDER BY {order_column} {direction} LIMIT ?2 OFFSET ?3"
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(pattern)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM tbl_user \
                     ORDER BY {order_column} {direction} LIMIT ? OFFSET ?"
                );
                sqlx::query_as::<_, User>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(users)
    }

    /// Count of the full filtered set, not just one page.
    #[instrument(skip(self))]
    pub async fn count(&self, keyword: Option<&str>) -> Result<i64, UserError> {
        let count: (i64,) = match keyword {
            Some(pattern) => {
                sqlx::query_as(&format!(
                    "SELECT COUNT(*) FROM tbl_user WHERE {SEARCH_PREDICATE}"
                ))
                .bind(pattern)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM tbl_user")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count.0)
    }

    /// Write the scalar fields of an update request.
    #[instrument(skip(self, req), fields(user_id = req.id))]
    pub async fn update_scalars(&self, req: &UserUpdateRequest) -> Result<(), UserError> {
        sqlx::query(
            r#"
            UPDATE tbl_user
            SET first_name = ?, last_name = ?, gender = ?, birthday = ?,
                username = ?, email = ?, phone = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(req.gender.map(|g| g.to_string()))
        .bind(&req.birthday)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(req.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), UserError> {
        sqlx::query(
            "UPDATE tbl_user SET password_hash = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: i64, status: UserStatus) -> Result<(), UserError> {
        sqlx::query("UPDATE tbl_user SET status = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert-or-update an address keyed on (user_id, address_type).
    #[instrument(skip(self, address), fields(address_type = address.address_type))]
    pub async fn upsert_address(
        &self,
        user_id: i64,
        address: &AddressRequest,
    ) -> Result<(), UserError> {
        sqlx::query(
            r#"
            INSERT INTO tbl_address (user_id, address_type, apartment_number, floor, building,
                                     street_number, street, city, country)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, address_type) DO UPDATE SET
                apartment_number = excluded.apartment_number,
                floor = excluded.floor,
                building = excluded.building,
                street_number = excluded.street_number,
                street = excluded.street,
                city = excluded.city,
                country = excluded.country,
                updated_at = datetime('now')
            "#,
        )
        .bind(user_id)
        .bind(address.address_type)
        .bind(&address.apartment_number)
        .bind(&address.floor)
        .bind(&address.building)
        .bind(&address.street_number)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.country)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All addresses owned by a user.
    #[instrument(skip(self))]
    pub async fn addresses_for(&self, user_id: i64) -> Result<Vec<Address>, UserError> {
        let addresses = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, created_at, updated_at, user_id, address_type, apartment_number, floor,
                   building, street_number, street, city, country
            FROM tbl_address
            WHERE user_id = ?
            ORDER BY address_type
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn test_repo() -> UserRepository {
        let db = Database::in_memory().await.unwrap();
        UserRepository::new(db.pool().clone())
    }

    async fn insert_user(repo: &UserRepository, username: &str, email: &str) -> i64 {
        repo.create(
            "Test",
            "User",
            None,
            None,
            username,
            email,
            Some("0123456789"),
            "hash",
            "user",
            "user",
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_default_role() {
        let repo = test_repo().await;
        let id = insert_user(&repo, "testuser1", "example1@gmail.com").await;

        let user = repo.get(id).await.unwrap().unwrap();
        assert_eq!(user.username, "testuser1");
        assert_eq!(user.status, UserStatus::None);

        let authorities = repo.authorities(id).await.unwrap();
        assert_eq!(authorities, vec!["user".to_string()]);
    }

    #[tokio::test]
    async fn test_create_unknown_role_fails() {
        let repo = test_repo().await;
        let result = repo
            .create(
                "Test", "User", None, None, "u1", "u1@example.com", None, "hash", "user",
                "no-such-role",
            )
            .await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_page_and_count_with_keyword() {
        let repo = test_repo().await;
        insert_user(&repo, "testuser1", "example1@gmail.com").await;
        insert_user(&repo, "testuser2", "example2@gmail.com").await;
        // Must not match "%test%" through any searched column.
        repo.create(
            "Alt", "Person", None, None, "other", "other@example.com", None, "hash", "user",
            "user",
        )
        .await
        .unwrap();

        let users = repo.page(Some("%test%"), "id", false, 20, 0).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "testuser1");
        assert_eq!(users[1].username, "testuser2");

        assert_eq!(repo.count(Some("%test%")).await.unwrap(), 2);
        assert_eq!(repo.count(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_keyword_matches_first_name() {
        let repo = test_repo().await;
        insert_user(&repo, "testuser1", "example1@gmail.com").await;
        repo.create(
            "Alt", "Person", None, None, "other", "other@example.com", None, "hash", "user",
            "user",
        )
        .await
        .unwrap();

        // "Alt" is only reachable through first_name, and lower() makes the
        // match case-insensitive.
        let users = repo.page(Some("%alt%"), "id", false, 20, 0).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "other");
        assert_eq!(repo.count(Some("%test%")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_address_upsert_overwrites() {
        let repo = test_repo().await;
        let id = insert_user(&repo, "testuser1", "example1@gmail.com").await;

        let mut address = AddressRequest {
            apartment_number: None,
            floor: None,
            building: None,
            street_number: None,
            street: Some("First St".to_string()),
            city: Some("Hanoi".to_string()),
            country: Some("VN".to_string()),
            address_type: 1,
        };
        repo.upsert_address(id, &address).await.unwrap();

        address.street = Some("Second St".to_string());
        repo.upsert_address(id, &address).await.unwrap();

        let addresses = repo.addresses_for(id).await.unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].street.as_deref(), Some("Second St"));
    }

    #[tokio::test]
    async fn test_set_status() {
        let repo = test_repo().await;
        let id = insert_user(&repo, "testuser1", "example1@gmail.com").await;

        repo.set_status(id, UserStatus::Inactive).await.unwrap();
        let user = repo.get(id).await.unwrap().unwrap();
        assert_eq!(user.status, UserStatus::Inactive);
    }
}
