use super::{Repository, RepositoryError};
use crate::models::{NewUser, Role, User, same_role_name};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A user as stored: role ids instead of resolved roles, like the join table.
#[derive(Clone)]
struct StoredUser {
    user: User,
    role_ids: Vec<i64>,
}

#[derive(Default)]
struct Store {
    users: BTreeMap<i64, StoredUser>,
    roles: BTreeMap<i64, Role>,
    next_user_id: i64,
    next_role_id: i64,
}

impl Store {
    fn resolve(&self, stored: &StoredUser) -> User {
        let mut user = stored.user.clone();
        user.roles = stored
            .role_ids
            .iter()
            .filter_map(|id| self.roles.get(id).cloned())
            .collect();
        user
    }

    fn email_taken(&self, email: &str, except_id: Option<i64>) -> bool {
        self.users
            .values()
            .any(|stored| stored.user.email == email && Some(stored.user.id) != except_id)
    }

    fn role_name_taken(&self, name: &str, except_id: Option<i64>) -> bool {
        self.roles
            .values()
            .any(|role| role.name == name && Some(role.id) != except_id)
    }
}

fn role_ids(roles: &[Role]) -> Vec<i64> {
    let mut ids: Vec<i64> = roles.iter().map(|role| role.id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. It honours the same constraints as
/// the Postgres schema (unique emails, unique role names, cascading link removal) and
/// backs local runs without `DATABASE_URL` as well as the test-suite.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).map(|stored| store.resolve(stored)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|stored| stored.user.email == email)
            .map(|stored| store.resolve(stored)))
    }

    async fn find_all_users(&self) -> Result<Vec<User>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .map(|stored| store.resolve(stored))
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut store = self.store.write().await;
        if store.email_taken(&user.email, None) {
            return Err(RepositoryError::Duplicate(user.email));
        }

        store.next_user_id += 1;
        let id = store.next_user_id;
        let stored = StoredUser {
            role_ids: role_ids(&user.roles),
            user: User {
                id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password: user.password,
                age: user.age,
                roles: vec![],
            },
        };
        let resolved = store.resolve(&stored);
        store.users.insert(id, stored);
        Ok(resolved)
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(format!("user {}", user.id)));
        }
        if store.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::Duplicate(user.email.clone()));
        }

        let stored = StoredUser {
            role_ids: role_ids(&user.roles),
            user: User {
                roles: vec![],
                ..user.clone()
            },
        };
        let resolved = store.resolve(&stored);
        store.users.insert(user.id, stored);
        Ok(resolved)
    }

    async fn delete_user_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.store.write().await.users.remove(&id).is_some())
    }

    async fn find_all_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(self.store.read().await.roles.values().cloned().collect())
    }

    async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>, RepositoryError> {
        Ok(self.store.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .store
            .read()
            .await
            .roles
            .values()
            .find(|role| role.name == name)
            .cloned())
    }

    async fn find_role_by_name_ignore_case(
        &self,
        name: &str,
    ) -> Result<Option<Role>, RepositoryError> {
        Ok(self
            .store
            .read()
            .await
            .roles
            .values()
            .find(|role| same_role_name(&role.name, name))
            .cloned())
    }

    async fn insert_role(&self, name: &str) -> Result<Role, RepositoryError> {
        let mut store = self.store.write().await;
        if store.role_name_taken(name, None) {
            return Err(RepositoryError::Duplicate(name.to_string()));
        }

        store.next_role_id += 1;
        let role = Role {
            id: store.next_role_id,
            name: name.to_string(),
        };
        store.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role: &Role) -> Result<Role, RepositoryError> {
        let mut store = self.store.write().await;
        if !store.roles.contains_key(&role.id) {
            return Err(RepositoryError::NotFound(format!("role {}", role.id)));
        }
        if store.role_name_taken(&role.name, Some(role.id)) {
            return Err(RepositoryError::Duplicate(role.name.clone()));
        }
        store.roles.insert(role.id, role.clone());
        Ok(role.clone())
    }

    async fn delete_role_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut store = self.store.write().await;
        if store.roles.remove(&id).is_none() {
            return Ok(false);
        }
        for stored in store.users.values_mut() {
            stored.role_ids.retain(|role_id| *role_id != id);
        }
        Ok(true)
    }
}
