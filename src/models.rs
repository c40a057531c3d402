use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

pub const ADMIN_ROLE: &str = "admin";

/// Role names compare case-insensitively, with the same Unicode folding as Postgres `LOWER()`.
pub fn same_role_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
pub const DEFAULT_ROLE: &str = "user";

// --- Persistence Entities ---

/// Role
///
/// Named permission group attached to users many-to-many through `users_roles`.
/// The JSON field is `nameRole`, the shape the browser client consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Role {
    pub id: i64,
    #[serde(rename = "nameRole")]
    #[sqlx(rename = "name_role")]
    pub name: String,
}

/// User
///
/// The persisted account record, including the password hash and the resolved roles.
/// Never serialized to clients; the HTTP boundary always goes through `UserDao`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub age: i32,
    pub roles: Vec<Role>,
}

impl User {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles
            .iter()
            .any(|role| same_role_name(&role.name, role_name))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|role| role.name.clone()).collect()
    }
}

/// NewUser
///
/// A user that has not been inserted yet (no id). The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub age: i32,
    pub roles: Vec<Role>,
}

// --- Transfer Objects ---

/// UserDao
///
/// Flat transfer representation of a `User` used by the REST API, the admin forms and
/// the templates. Roles travel as plain names; the password is only ever accepted as
/// input (plain text, hashed by the service) and is omitted from output when unset.
#[derive(Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserDao {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub password: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub email: String,
}

impl From<&User> for UserDao {
    /// The password hash is not copied.
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.id),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password: None,
            age: Some(user.age),
            roles: user.role_names(),
            email: user.email.clone(),
        }
    }
}

impl UserDao {
    /// Case-insensitive role membership test.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles
            .iter()
            .any(|role| same_role_name(role, role_name))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `[]` for no roles, otherwise `[admin, user]`.
    pub fn roles_label(&self) -> String {
        format!("[{}]", self.roles.join(", "))
    }

    /// Builds a DAO from urlencoded form pairs. `roles` may repeat (one per checked box);
    /// unparsable numeric fields are treated as absent and left to validation.
    pub fn from_form_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut dao = UserDao::default();
        for (key, value) in pairs {
            match key.as_str() {
                "id" => dao.id = value.trim().parse().ok(),
                "firstName" => dao.first_name = value,
                "lastName" => dao.last_name = value,
                "email" => dao.email = value,
                "password" => dao.password = Some(value),
                "age" => dao.age = value.trim().parse().ok(),
                "roles" => {
                    if !value.trim().is_empty() {
                        dao.roles.push(value);
                    }
                }
                _ => {}
            }
        }
        dao
    }
}

fn password_marker(password: &Option<String>) -> &'static str {
    if password.is_some() { "[SET]" } else { "[NULL]" }
}

impl fmt::Debug for UserDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDao")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &password_marker(&self.password))
            .field("age", &self.age)
            .field("roles", &self.roles)
            .field("email", &self.email)
            .finish()
    }
}

impl fmt::Display for UserDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UserDao{{id={:?}, firstName='{}', lastName='{}', password='{}', age={:?}, roles={}, email='{}'}}",
            self.id,
            self.first_name,
            self.last_name,
            password_marker(&self.password),
            self.age,
            self.roles_label(),
            self.email
        )
    }
}

// --- Request Payloads ---

/// UserPatch
///
/// Partial update body for `PATCH /api/users/{id}`. Absent fields keep their value;
/// a blank password is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserPatch {
    pub fn apply_to(self, dao: &mut UserDao) {
        if let Some(first_name) = self.first_name {
            dao.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            dao.last_name = last_name;
        }
        if let Some(email) = self.email {
            dao.email = email;
        }
        if let Some(age) = self.age {
            dao.age = Some(age);
        }
        if let Some(roles) = self.roles {
            dao.roles = roles;
        }
        if let Some(password) = self.password.filter(|p| !p.trim().is_empty()) {
            dao.password = Some(password);
        }
    }
}

/// RoleRequest
///
/// Body of `POST /api/roles` and `PUT /api/roles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleRequest {
    #[serde(rename = "nameRole")]
    pub name: String,
}

/// LoginRequest
///
/// Credentials posted to `/login`, either as a form or as JSON.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub is_admin: bool,
}

/// UserInfo
///
/// Output of `GET /api/auth/userinfo`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            age: user.age,
            roles: user.role_names(),
            is_admin: user.is_admin(),
        }
    }
}

/// AuthStatus
///
/// Output of `GET /api/auth/check-auth`. Anonymous callers only get `authenticated`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub authorities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
