use super::{Repository, RepositoryError};
use crate::models::{NewUser, Role, User};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, age";

/// Raw `users` row, before the roles are attached.
#[derive(FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    age: i32,
}

impl UserRow {
    fn into_user(self, roles: Vec<Role>) -> User {
        User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            age: self.age,
            roles,
        }
    }
}

/// One `users_roles` link joined with its role.
#[derive(FromRow)]
struct UserRoleRow {
    user_id: i64,
    id: i64,
    name_role: String,
}

/// Turns unique-constraint violations into `RepositoryError::Duplicate`.
fn classify(err: sqlx::Error, value: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate(value.to_string());
        }
    }
    RepositoryError::Database(err)
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Schema lives in `migrations/`; queries are checked at runtime so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the roles of every given user in a single round-trip.
    async fn attach_roles(&self, rows: Vec<UserRow>) -> Result<Vec<User>, RepositoryError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let links = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT ur.user_id, r.id, r.name_role
            FROM users_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY r.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut roles_by_user: HashMap<i64, Vec<Role>> = HashMap::new();
        for link in links {
            roles_by_user.entry(link.user_id).or_default().push(Role {
                id: link.id,
                name: link.name_role,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let roles = roles_by_user.remove(&row.id).unwrap_or_default();
                row.into_user(roles)
            })
            .collect())
    }

    async fn link_roles(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        roles: &[Role],
    ) -> Result<(), RepositoryError> {
        for role in roles {
            sqlx::query(
                "INSERT INTO users_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(role.id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn reload_user(&self, id: i64) -> Result<User, RepositoryError> {
        self.find_user_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_roles(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_roles(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_roles(rows).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (first_name, last_name, email, password, age)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.age)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, &user.email))?;

        Self::link_roles(&mut tx, id, &user.roles).await?;
        tx.commit().await?;

        self.reload_user(id).await
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, password = $5, age = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.age)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", user.id)));
        }

        sqlx::query("DELETE FROM users_roles WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        Self::link_roles(&mut tx, user.id, &user.roles).await?;
        tx.commit().await?;

        self.reload_user(user.id).await
    }

    async fn delete_user_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        // users_roles rows go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_all_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles WHERE name_role = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_role_by_name_ignore_case(
        &self,
        name: &str,
    ) -> Result<Option<Role>, RepositoryError> {
        Ok(sqlx::query_as::<_, Role>(
            "SELECT id, name_role FROM roles WHERE LOWER(name_role) = LOWER($1) ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_role(&self, name: &str) -> Result<Role, RepositoryError> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name_role) VALUES ($1) RETURNING id, name_role",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, name))
    }

    async fn update_role(&self, role: &Role) -> Result<Role, RepositoryError> {
        sqlx::query_as::<_, Role>(
            "UPDATE roles SET name_role = $1 WHERE id = $2 RETURNING id, name_role",
        )
        .bind(&role.name)
        .bind(role.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, &role.name))?
        .ok_or_else(|| RepositoryError::NotFound(format!("role {}", role.id)))
    }

    async fn delete_role_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
