use chrono::Duration;
use pathway_core::Catalog;
use pathway_core::model::{OwnerKey, UserPath};
use pathway_core::time::fixed_now;
use sqlx::Row;
use storage::repository::{ProgressStore, StorageError};
use storage::sqlite::{PLACEHOLDER_EMAIL_DOMAIN, SqliteRepository};

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn path(category: &str, offset_secs: i64) -> UserPath {
    let catalog = Catalog::builtin().unwrap();
    UserPath::from_template(
        catalog.find_template(category).unwrap(),
        fixed_now() + Duration::seconds(offset_secs),
    )
}

#[tokio::test]
async fn sqlite_round_trips_progress_and_metadata() {
    let repo = connect("memdb_roundtrip").await;
    let owner = OwnerKey::new("user_roundtrip").unwrap();

    let devops = path("DevOps", 0)
        .toggle_milestone(1, fixed_now() + Duration::minutes(5))
        .unwrap()
        .toggle_milestone(3, fixed_now() + Duration::minutes(9))
        .unwrap();
    let paths = vec![devops, path("Data Science", 10)];

    repo.ensure_owner(&owner).await.unwrap();
    repo.replace_all(&owner, &paths).await.unwrap();

    let loaded = repo.load(&owner).await.unwrap();
    assert_eq!(loaded, paths);
    assert_eq!(loaded[0].progress().completed, 2);
    assert_eq!(loaded[0].progress().percent, 50.0);
    assert!(!loaded[1].milestones()[0].skills().is_empty());
}

#[tokio::test]
async fn sqlite_preserves_saved_order() {
    let repo = connect("memdb_order").await;
    let owner = OwnerKey::new("user_order").unwrap();

    // Newest first on purpose: load must not re-sort by creation time.
    let paths = vec![
        path("Cybersecurity", 30),
        path("Web Development", 0),
        path("Machine Learning", 20),
    ];
    repo.ensure_owner(&owner).await.unwrap();
    repo.replace_all(&owner, &paths).await.unwrap();

    let categories: Vec<_> = repo
        .load(&owner)
        .await
        .unwrap()
        .iter()
        .map(|p| p.category().to_string())
        .collect();
    assert_eq!(
        categories,
        vec!["Cybersecurity", "Web Development", "Machine Learning"]
    );
}

#[tokio::test]
async fn sqlite_replace_drops_previous_set() {
    let repo = connect("memdb_replace").await;
    let owner = OwnerKey::new("user_replace").unwrap();
    repo.ensure_owner(&owner).await.unwrap();

    repo.replace_all(&owner, &[path("DevOps", 0), path("Data Science", 1)])
        .await
        .unwrap();
    repo.replace_all(&owner, &[path("Web Development", 2)])
        .await
        .unwrap();

    let loaded = repo.load(&owner).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].category(), "Web Development");

    repo.replace_all(&owner, &[]).await.unwrap();
    assert!(repo.load(&owner).await.unwrap().is_empty());

    let leftover: i64 = sqlx::query("SELECT COUNT(*) AS n FROM milestones WHERE user_id = ?1")
        .bind(owner.as_str())
        .fetch_one(repo.pool())
        .await
        .unwrap()
        .get("n");
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn sqlite_unknown_owner_loads_empty_and_rejects_writes() {
    let repo = connect("memdb_unknown").await;
    let owner = OwnerKey::new("user_ghost").unwrap();

    assert!(repo.load(&owner).await.unwrap().is_empty());
    let err = repo
        .replace_all(&owner, &[path("DevOps", 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    assert!(repo.load(&owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_failed_replace_keeps_prior_state() {
    let repo = connect("memdb_rollback").await;
    let owner = OwnerKey::new("user_rollback").unwrap();
    repo.ensure_owner(&owner).await.unwrap();
    repo.replace_all(&owner, &[path("DevOps", 0)]).await.unwrap();

    // Same category twice violates the per-owner unique key halfway through.
    let err = repo
        .replace_all(&owner, &[path("Data Science", 1), path("Data Science", 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    let loaded = repo.load(&owner).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].category(), "DevOps");
}

#[tokio::test]
async fn sqlite_owners_are_isolated() {
    let repo = connect("memdb_isolated").await;
    let alice = OwnerKey::new("alice").unwrap();
    let bob = OwnerKey::new("bob").unwrap();
    for owner in [&alice, &bob] {
        repo.ensure_owner(owner).await.unwrap();
    }

    let shared = path("Web Development", 0);
    repo.replace_all(&alice, std::slice::from_ref(&shared))
        .await
        .unwrap();
    repo.replace_all(&bob, &[shared, path("DevOps", 1)])
        .await
        .unwrap();

    assert_eq!(repo.load(&alice).await.unwrap().len(), 1);
    assert_eq!(repo.load(&bob).await.unwrap().len(), 2);
}

#[tokio::test]
async fn sqlite_ensure_owner_creates_placeholder_user_once() {
    let repo = connect("memdb_owner").await;
    let owner = OwnerKey::new("user_new").unwrap();

    repo.ensure_owner(&owner).await.unwrap();
    repo.ensure_owner(&owner).await.unwrap();

    let rows = sqlx::query("SELECT email FROM users WHERE id = ?1")
        .bind(owner.as_str())
        .fetch_all(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let email: String = rows[0].get("email");
    assert_eq!(email, format!("user_new@{PLACEHOLDER_EMAIL_DOMAIN}"));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query("SELECT COUNT(*) AS n FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap()
        .get("n");
    assert_eq!(applied, 1);
}
