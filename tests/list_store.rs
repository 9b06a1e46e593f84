use sqlx::PgPool;

use steamlist::list;
use steamlist::util::db::Db;

#[sqlx::test(migrations = "./migrations")]
async fn add_is_idempotent(pool: PgPool) {
    let db = Db { pool };

    assert!(list::add(&db, "user@x.com", 620, 1).await.unwrap());
    // Re-saving the same option writes nothing and is not an error.
    assert!(!list::add(&db, "user@x.com", 620, 1).await.unwrap());

    let rows = list::rows_for(&db, "user@x.com").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].game_id, 620);
    assert_eq!(rows[0].purchase_index, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn remove_of_absent_row_affects_nothing(pool: PgPool) {
    let db = Db { pool };

    assert_eq!(list::remove(&db, "user@x.com", 620, 1).await.unwrap(), 0);

    list::add(&db, "user@x.com", 620, 1).await.unwrap();
    assert_eq!(list::remove(&db, "user@x.com", 620, 1).await.unwrap(), 1);
    assert!(list::rows_for(&db, "user@x.com").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn rows_are_scoped_to_the_requesting_email(pool: PgPool) {
    let db = Db { pool };

    list::add(&db, "a@x.com", 620, 0).await.unwrap();
    list::add(&db, "b@x.com", 400, 0).await.unwrap();

    let rows = list::rows_for(&db, "a@x.com").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].game_id, 620);
}
