use admin_portal::{
    models::{NewUser, Role},
    repository::{InMemoryRepository, PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Holds the pool of the database named by `DATABASE_URL`.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Unique suffix so runs against a shared database never collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn new_user(email: &str, roles: Vec<Role>) -> NewUser {
    NewUser {
        first_name: "Repo".to_string(),
        last_name: "Tester".to_string(),
        email: email.to_string(),
        password: "hash".to_string(),
        age: 33,
        roles,
    }
}

// --- Shared Contract ---

// Both implementations must behave identically; each check runs against both.

async fn check_user_lifecycle(repo: &dyn Repository) {
    let reader = repo.insert_role(&unique("reader")).await.unwrap();
    let writer = repo.insert_role(&unique("writer")).await.unwrap();
    let email = format!("{}@example.com", unique("user"));

    let created = repo
        .insert_user(new_user(&email, vec![writer.clone(), reader.clone()]))
        .await
        .unwrap();
    assert!(created.id > 0);
    // Roles come back ordered by id.
    assert_eq!(created.roles, vec![reader.clone(), writer.clone()]);

    let by_email = repo.find_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(by_email, created);
    assert!(
        repo.find_user_by_email(&email.to_uppercase())
            .await
            .unwrap()
            .is_none(),
        "email lookup is exact"
    );

    let mut changed = created.clone();
    changed.first_name = "Changed".to_string();
    changed.roles = vec![writer.clone()];
    let updated = repo.update_user(&changed).await.unwrap();
    assert_eq!(updated.first_name, "Changed");
    assert_eq!(updated.roles, vec![writer.clone()]);

    let all = repo.find_all_users().await.unwrap();
    assert!(all.iter().any(|user| user.id == created.id));
    assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));

    assert!(repo.delete_user_by_id(created.id).await.unwrap());
    assert!(!repo.delete_user_by_id(created.id).await.unwrap());
    assert!(repo.find_user_by_id(created.id).await.unwrap().is_none());
}

async fn check_constraints(repo: &dyn Repository) {
    let email = format!("{}@example.com", unique("dup"));
    let first = repo.insert_user(new_user(&email, vec![])).await.unwrap();

    let err = repo.insert_user(new_user(&email, vec![])).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));

    let other_email = format!("{}@example.com", unique("other"));
    let mut other = repo.insert_user(new_user(&other_email, vec![])).await.unwrap();
    other.email = email.clone();
    let err = repo.update_user(&other).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));

    let mut ghost = first.clone();
    ghost.id = i64::MAX;
    let err = repo.update_user(&ghost).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));

    let name = unique("role");
    repo.insert_role(&name).await.unwrap();
    let err = repo.insert_role(&name).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));

    let err = repo
        .update_role(&Role {
            id: i64::MAX,
            name: unique("nothing"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));

    repo.delete_user_by_id(first.id).await.unwrap();
    repo.delete_user_by_id(other.id).await.unwrap();
}

async fn check_roles(repo: &dyn Repository) {
    let name = unique("Editor");
    let role = repo.insert_role(&name).await.unwrap();

    assert_eq!(repo.find_role_by_id(role.id).await.unwrap(), Some(role.clone()));
    assert_eq!(repo.find_role_by_name(&name).await.unwrap(), Some(role.clone()));
    assert!(repo.find_role_by_name(&name.to_lowercase()).await.unwrap().is_none());
    assert_eq!(
        repo.find_role_by_name_ignore_case(&name.to_uppercase())
            .await
            .unwrap(),
        Some(role.clone())
    );

    let accented = repo.insert_role(&format!("Éditeur-{}", unique("x"))).await.unwrap();
    assert_eq!(
        repo.find_role_by_name_ignore_case(&accented.name.to_lowercase())
            .await
            .unwrap(),
        Some(accented.clone())
    );
    repo.delete_role_by_id(accented.id).await.unwrap();

    let renamed = Role {
        id: role.id,
        name: unique("Publisher"),
    };
    assert_eq!(repo.update_role(&renamed).await.unwrap(), renamed);

    // Deleting a role detaches it from its users.
    let email = format!("{}@example.com", unique("holder"));
    let holder = repo
        .insert_user(new_user(&email, vec![renamed.clone()]))
        .await
        .unwrap();
    assert!(repo.delete_role_by_id(role.id).await.unwrap());
    assert!(!repo.delete_role_by_id(role.id).await.unwrap());
    let holder = repo.find_user_by_id(holder.id).await.unwrap().unwrap();
    assert!(holder.roles.is_empty());
    assert!(
        !repo
            .find_all_roles()
            .await
            .unwrap()
            .iter()
            .any(|r| r.id == role.id)
    );

    repo.delete_user_by_id(holder.id).await.unwrap();
}

// --- In-memory ---

#[tokio::test]
async fn test_in_memory_user_lifecycle() {
    check_user_lifecycle(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_in_memory_constraints() {
    check_constraints(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_in_memory_roles() {
    check_roles(&InMemoryRepository::new()).await;
}

// --- Postgres (needs DATABASE_URL) ---

#[tokio::test]
#[ignore]
async fn test_postgres_user_lifecycle() {
    let ctx = DbTestContext::setup().await;
    check_user_lifecycle(&ctx.repository()).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_constraints() {
    let ctx = DbTestContext::setup().await;
    check_constraints(&ctx.repository()).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_roles() {
    let ctx = DbTestContext::setup().await;
    check_roles(&ctx.repository()).await;
}

#[tokio::test]
#[ignore]
async fn test_postgres_cascade_on_user_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let role = repo.insert_role(&unique("cascade")).await.unwrap();
    let email = format!("{}@example.com", unique("cascade"));
    let user = repo.insert_user(new_user(&email, vec![role])).await.unwrap();

    repo.delete_user_by_id(user.id).await.unwrap();

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users_roles WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(links, 0);
}
