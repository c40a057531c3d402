use admin_portal::{
    AppConfig, InMemoryRepository, RoleService, UserService,
    auth::AuthUser,
    error::AppError,
    models::UserDao,
    password,
    repository::{Repository, RepositoryState},
    seed,
};
use std::sync::Arc;

// --- Test Utilities ---

/// An in-memory store with the `user` and `admin` roles and the seeded administrator.
async fn seeded_repo() -> RepositoryState {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    seed::load_initial_data(&repo, &AppConfig::default())
        .await
        .unwrap();
    repo
}

fn dao(email: &str, roles: &[&str]) -> UserDao {
    UserDao {
        id: None,
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        password: Some("secret".to_string()),
        age: Some(28),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        email: email.to_string(),
    }
}

// --- Seed ---

#[tokio::test]
async fn test_seed_creates_roles_and_admin_once() {
    let repo = seeded_repo().await;
    // Second run must not duplicate anything.
    seed::load_initial_data(&repo, &AppConfig::default())
        .await
        .unwrap();

    let roles = repo.find_all_roles().await.unwrap();
    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["user", "admin"]);

    let users = repo.find_all_users().await.unwrap();
    assert_eq!(users.len(), 1);
    let admin = &users[0];
    assert_eq!(admin.email, "admin@admin.com");
    assert_eq!(admin.first_name, "Admin");
    assert_eq!(admin.last_name, "Administrator");
    assert_eq!(admin.age, 30);
    assert!(admin.is_admin());
    assert!(admin.has_role("user"));
    assert!(password::verify_password("admin", &admin.password).await.unwrap());
}

// --- UserService ---

#[tokio::test]
async fn test_add_user_hashes_password_and_resolves_roles() {
    let users = UserService::new(seeded_repo().await);

    let user = users
        .add_user(&dao("jane@example.com", &[" Admin ", "admin", "ghost"]))
        .await
        .unwrap();

    assert_ne!(user.password, "secret");
    assert!(password::verify_password("secret", &user.password).await.unwrap());
    // Trimmed, case-insensitive, de-duplicated, unknown names skipped.
    assert_eq!(user.role_names(), vec!["admin".to_string()]);
}

#[tokio::test]
async fn test_add_user_without_roles_gets_default_role() {
    let users = UserService::new(seeded_repo().await);

    let user = users.add_user(&dao("plain@example.com", &[])).await.unwrap();

    assert_eq!(user.role_names(), vec!["user".to_string()]);
}

#[tokio::test]
async fn test_add_user_rejects_duplicate_email() {
    let users = UserService::new(seeded_repo().await);

    let result = users.add_user(&dao("admin@admin.com", &[])).await;

    assert!(matches!(result, Err(AppError::EmailTaken(email)) if email == "admin@admin.com"));
}

#[tokio::test]
async fn test_add_user_requires_password() {
    let users = UserService::new(seeded_repo().await);
    let mut input = dao("nopass@example.com", &[]);
    input.password = Some("  ".to_string());

    let err = users.add_user(&input).await.unwrap_err();

    assert_eq!(err.to_string(), "Password cannot be empty");
    assert!(users.is_email_unique("nopass@example.com").await.unwrap());
}

#[test]
fn test_validate_user_data_messages() {
    let cases: Vec<(Box<dyn Fn(&mut UserDao)>, &str)> = vec![
        (Box::new(|d: &mut UserDao| d.first_name = " ".to_string()), "First name cannot be empty"),
        (Box::new(|d: &mut UserDao| d.last_name = String::new()), "Last name cannot be empty"),
        (Box::new(|d: &mut UserDao| d.email = "\t".to_string()), "Email cannot be empty"),
        (Box::new(|d: &mut UserDao| d.age = None), "Age must be positive"),
        (Box::new(|d: &mut UserDao| d.age = Some(0)), "Age must be positive"),
        (Box::new(|d: &mut UserDao| d.age = Some(-4)), "Age must be positive"),
    ];

    for (mutate, expected) in cases {
        let mut input = dao("x@example.com", &[]);
        mutate(&mut input);
        let err = UserService::validate_user_data(&input).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), expected);
    }

    assert!(UserService::validate_user_data(&dao("ok@example.com", &[])).is_ok());
}

#[tokio::test]
async fn test_update_user_keeps_password_when_blank() {
    let users = UserService::new(seeded_repo().await);
    let created = users.add_user(&dao("keep@example.com", &["user"])).await.unwrap();

    let mut input = UserDao::from(&created);
    input.first_name = "Janet".to_string();
    input.password = Some(String::new());
    input.roles = vec!["admin".to_string(), "user".to_string()];

    let updated = users.update_user(&input).await.unwrap();

    assert_eq!(updated.first_name, "Janet");
    assert_eq!(updated.password, created.password);
    assert!(updated.is_admin());
}

#[tokio::test]
async fn test_update_user_rehashes_new_password() {
    let users = UserService::new(seeded_repo().await);
    let created = users.add_user(&dao("rehash@example.com", &[])).await.unwrap();

    let mut input = UserDao::from(&created);
    input.password = Some("changed".to_string());
    let updated = users.update_user(&input).await.unwrap();

    assert!(password::verify_password("changed", &updated.password).await.unwrap());
    assert!(!password::verify_password("secret", &updated.password).await.unwrap());
}

#[tokio::test]
async fn test_update_user_errors() {
    let users = UserService::new(seeded_repo().await);
    let created = users.add_user(&dao("first@example.com", &[])).await.unwrap();

    let mut missing = UserDao::from(&created);
    missing.id = Some(999);
    assert!(matches!(
        users.update_user(&missing).await,
        Err(AppError::UserNotFound(_))
    ));

    let mut taken = UserDao::from(&created);
    taken.email = "admin@admin.com".to_string();
    assert!(matches!(
        users.update_user(&taken).await,
        Err(AppError::EmailTaken(_))
    ));

    // Keeping one's own email is fine.
    let same = UserDao::from(&created);
    assert!(users.update_user(&same).await.is_ok());
}

#[tokio::test]
async fn test_update_user_without_roles_falls_back_to_default() {
    let users = UserService::new(seeded_repo().await);
    let created = users.add_user(&dao("demote@example.com", &["admin"])).await.unwrap();

    let mut input = UserDao::from(&created);
    input.roles.clear();
    let updated = users.update_user(&input).await.unwrap();

    assert_eq!(updated.role_names(), vec!["user".to_string()]);
}

#[tokio::test]
async fn test_delete_and_lookup() {
    let users = UserService::new(seeded_repo().await);
    let created = users.add_user(&dao("gone@example.com", &[])).await.unwrap();

    assert_eq!(
        users.get_user_by_email("gone@example.com").await.unwrap().id,
        created.id
    );
    users.delete_user(created.id).await.unwrap();

    assert!(users.get_user_by_id(created.id).await.unwrap().is_none());
    assert!(matches!(
        users.delete_user(created.id).await,
        Err(AppError::UserNotFound(_))
    ));
    let err = users.get_user_by_email("gone@example.com").await.unwrap_err();
    assert_eq!(err.to_string(), "User not found: gone@example.com");
}

#[tokio::test]
async fn test_authenticate() {
    let users = UserService::new(seeded_repo().await);

    assert!(users.authenticate("admin@admin.com", "admin").await.unwrap().is_some());
    assert!(users.authenticate("admin@admin.com", "wrong").await.unwrap().is_none());
    assert!(users.authenticate("nobody@admin.com", "admin").await.unwrap().is_none());
}

#[tokio::test]
async fn test_current_user_for_vanished_account() {
    let users = UserService::new(seeded_repo().await);
    let ghost = AuthUser {
        id: 404,
        email: "ghost@example.com".to_string(),
        roles: vec![],
    };

    assert!(matches!(
        users.current_user(&ghost).await,
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_email_uniqueness_for_user() {
    let users = UserService::new(seeded_repo().await);
    let admin = users.get_user_by_email("admin@admin.com").await.unwrap();

    assert!(users.is_email_unique_for_user(admin.id, "admin@admin.com").await.unwrap());
    assert!(!users.is_email_unique_for_user(admin.id + 1, "admin@admin.com").await.unwrap());
    assert!(users.is_email_unique_for_user(admin.id + 1, "free@admin.com").await.unwrap());
}

// --- RoleService ---

#[tokio::test]
async fn test_role_lookup_by_name_is_trimmed_and_case_insensitive() {
    let roles = RoleService::new(seeded_repo().await);

    assert_eq!(roles.get_role_by_name("  ADMIN ").await.unwrap().name, "admin");

    let err = roles.get_role_by_name(" auditor ").await.unwrap_err();
    assert_eq!(err.to_string(), "Role not found by name: auditor");
}

#[tokio::test]
async fn test_role_crud() {
    let roles = RoleService::new(seeded_repo().await);

    let auditor = roles.add_role("auditor").await.unwrap();
    assert!(matches!(
        roles.add_role("auditor").await,
        Err(AppError::DuplicateRole(_))
    ));
    assert!(matches!(roles.add_role(" ").await, Err(AppError::Validation(_))));

    // Unchanged name is accepted; another role's name is not.
    roles.update_role(auditor.id, "auditor").await.unwrap();
    assert!(matches!(
        roles.update_role(auditor.id, "admin").await,
        Err(AppError::DuplicateRole(_))
    ));
    let renamed = roles.update_role(auditor.id, "reviewer").await.unwrap();
    assert_eq!(renamed.name, "reviewer");
    assert!(matches!(
        roles.update_role(999, "x").await,
        Err(AppError::RoleIdNotFound(999))
    ));

    roles.delete_role(auditor.id).await.unwrap();
    assert!(roles.get_role_by_id(auditor.id).await.unwrap().is_none());
    assert!(matches!(
        roles.delete_role(auditor.id).await,
        Err(AppError::RoleIdNotFound(_))
    ));
    assert_eq!(
        roles.delete_role(999).await.unwrap_err().to_string(),
        "Role not found by id: 999"
    );
}
