//! End-to-end sync cycles against an in-memory SQLite store that carries
//! real change-capture triggers.

use ampli_sync_client::{
    ClientError, LocalStore, MockTransport, Session, SqliteStore, SyncClient, SyncConfig,
};
use ampli_sync_types::{SqlValue, Statement, SyncId, SyncPage};
use serde_json::{json, Value};

const TABLE: &str = "assets_asset";

fn session() -> Session {
    Session::new("http://mock", "token", "device-1")
}

fn trigger_insert() -> String {
    format!(
        "CREATE TRIGGER {TABLE}_ins AFTER INSERT ON {TABLE} WHEN NEW.rowid IS NOT NULL \
         BEGIN UPDATE {TABLE} SET mergeupdate = mergeupdate + 1 WHERE id = NEW.id; END"
    )
}

fn trigger_update() -> String {
    format!(
        "CREATE TRIGGER {TABLE}_upd AFTER UPDATE OF product_name, quantity ON {TABLE} \
         WHEN NEW.rowid IS NOT NULL \
         BEGIN UPDATE {TABLE} SET mergeupdate = OLD.mergeupdate + 1 WHERE id = NEW.id; END"
    )
}

fn trigger_delete() -> String {
    format!(
        "CREATE TRIGGER {TABLE}_del AFTER DELETE ON {TABLE} \
         BEGIN INSERT INTO mergedelete (tableid, rowid) VALUES ('{TABLE}', OLD.rowid); END"
    )
}

async fn device_store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    store
        .execute_batch(&[
            Statement::new(format!(
                "CREATE TABLE {TABLE} (id INTEGER PRIMARY KEY, product_name TEXT, quantity INTEGER, \
                 mergeupdate INTEGER NOT NULL DEFAULT 0, rowid TEXT)"
            )),
            Statement::new("CREATE TABLE mergedelete (tableid TEXT NOT NULL, rowid TEXT)"),
            Statement::new(trigger_insert()),
            Statement::new(trigger_update()),
            Statement::new(trigger_delete()),
        ])
        .await
        .unwrap();
    store
}

fn page(sync_id: i64, max_package_size: i64, records: Value) -> SyncPage {
    SyncPage {
        sync_id: SyncId::new(sync_id),
        max_package_size,
        records: Some(records),
        query_insert: Some(format!(
            "INSERT OR REPLACE INTO {TABLE} (id, product_name, quantity, rowid) VALUES (?, ?, ?, ?)"
        )),
        query_update: Some(format!(
            "UPDATE {TABLE} SET product_name=?, quantity=? WHERE rowid=?"
        )),
        query_delete: Some(format!("DELETE FROM {TABLE} WHERE rowid=?")),
        trigger_insert: Some(trigger_insert()),
        trigger_update: Some(trigger_update()),
        trigger_delete: Some(trigger_delete()),
        trigger_insert_drop: Some(format!("DROP TRIGGER IF EXISTS {TABLE}_ins")),
        trigger_update_drop: Some(format!("DROP TRIGGER IF EXISTS {TABLE}_upd")),
        trigger_delete_drop: Some(format!("DROP TRIGGER IF EXISTS {TABLE}_del")),
        ..SyncPage::default()
    }
}

async fn trigger_count(store: &SqliteStore) -> usize {
    store
        .query_all("SELECT name FROM sqlite_master WHERE type='trigger'", &[])
        .await
        .unwrap()
        .len()
}

async fn rows(store: &SqliteStore) -> Vec<ampli_sync_types::Row> {
    store
        .query_all(&format!("SELECT * FROM {TABLE} ORDER BY id"), &[])
        .await
        .unwrap()
}

// ===========================================
// Round Trip
// ===========================================

#[tokio::test]
async fn pulled_changes_leave_nothing_to_push() {
    let store = device_store().await;
    store
        .execute_batch(&[
            Statement::new(format!(
                "INSERT INTO {TABLE} (id, product_name, quantity, rowid) VALUES (10, 'old', 1, 'R10')"
            )),
            Statement::new(format!(
                "INSERT INTO {TABLE} (id, product_name, quantity, rowid) VALUES (11, 'gone', 1, 'R11')"
            )),
            Statement::new(format!("UPDATE {TABLE} SET mergeupdate = 0")),
        ])
        .await
        .unwrap();

    let transport = MockTransport::new();
    transport.queue_page(
        TABLE,
        page(
            3,
            50,
            json!({
                "inserts": [{"id": 1, "product_name": "Battery", "quantity": 4, "rowid": "R1"}],
                "updates": [{"rowid": "R10", "product_name": "new", "quantity": 9}],
                "deletes": [{"rowid": "R11"}],
            }),
        ),
    );
    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());

    let outcome = client.pull(&session(), |_| {}).await;
    assert!(outcome.is_ok(), "{:?}", outcome.first_error);
    assert_eq!(transport.commits(), vec![SyncId::new(3)]);

    let pending = client.pending().await.unwrap();
    assert!(pending.is_empty(), "unexpected pending state: {:?}", pending);

    let current = rows(client.store()).await;
    assert_eq!(current.len(), 2);
    assert_eq!(current[0]["product_name"], json!("Battery"));
    assert_eq!(current[1]["product_name"], json!("new"));

    // Triggers are back after the page
    assert_eq!(trigger_count(client.store()).await, 3);
}

#[tokio::test]
async fn local_edits_are_captured_after_pull() {
    let store = device_store().await;
    let transport = MockTransport::new();
    transport.queue_page(
        TABLE,
        page(
            1,
            50,
            json!({"inserts": [{"id": 1, "product_name": "Battery", "quantity": 4, "rowid": "R1"}]}),
        ),
    );
    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());
    client.pull(&session(), |_| {}).await.into_result().unwrap();

    client
        .store()
        .execute(
            &format!("UPDATE {TABLE} SET quantity = ? WHERE id = 1"),
            &[SqlValue::Integer(3)],
        )
        .await
        .unwrap();

    let pending = client.pending().await.unwrap();
    assert_eq!(pending.request.update_count(), 1);
    assert_eq!(
        pending.clear_markers[0].args,
        vec![SqlValue::Text("R1".into()), SqlValue::Integer(1)]
    );
}

// ===========================================
// Acknowledgment
// ===========================================

#[tokio::test]
async fn failed_acknowledgment_redelivers_page() {
    let store = device_store().await;
    let transport = MockTransport::new();
    let delivered = page(
        7,
        50,
        json!({"inserts": [{"id": 1, "product_name": "Battery", "quantity": 4, "rowid": "R1"}]}),
    );
    transport.queue_page(TABLE, delivered.clone());
    transport.queue_page(TABLE, delivered);
    transport.fail_next_commit("commit rejected");

    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());

    let first = client.pull(&session(), |_| {}).await;
    assert!(matches!(first.first_error, Some(ClientError::Transport(_))));
    assert_eq!(first.records_applied(), 0);
    assert!(transport.commits().is_empty());

    let second = client.pull(&session(), |_| {}).await;
    assert!(second.is_ok());
    assert_eq!(second.records_applied(), 1);
    assert_eq!(transport.commits(), vec![SyncId::new(7)]);
    assert_eq!(rows(client.store()).await.len(), 1);
}

// ===========================================
// Pagination
// ===========================================

#[tokio::test]
async fn pagination_follows_page_fill() {
    let full: Vec<Value> = (1..=50)
        .map(|id| json!({"id": id, "product_name": "p", "quantity": 1, "rowid": format!("R{id}")}))
        .collect();
    let partial: Vec<Value> = (51..=99)
        .map(|id| json!({"id": id, "product_name": "p", "quantity": 1, "rowid": format!("R{id}")}))
        .collect();

    let store = device_store().await;
    let transport = MockTransport::new();
    transport.queue_page(TABLE, page(1, 50, json!({ "inserts": full })));
    transport.queue_page(TABLE, page(2, 50, json!({ "inserts": partial })));
    transport.queue_page(TABLE, page(3, 50, json!({"inserts": []})));

    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());
    let outcome = client.pull(&session(), |_| {}).await;

    assert!(outcome.is_ok());
    // 50 of 50 continues, 49 of 50 stops: the third page is never requested
    assert_eq!(transport.pulls().len(), 2);
    assert_eq!(outcome.records_applied(), 99);
}

#[tokio::test]
async fn no_changes_page_applies_nothing() {
    let store = device_store().await;
    let transport = MockTransport::new();
    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());

    let outcome = client.pull(&session(), |_| {}).await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.records_applied(), 0);
    assert!(transport.commits().is_empty());
    assert!(rows(client.store()).await.is_empty());
}

// ===========================================
// Push
// ===========================================

#[tokio::test]
async fn push_failure_keeps_pending_sets() {
    let store = device_store().await;
    store
        .execute_batch(&[
            Statement::new(format!(
                "INSERT INTO {TABLE} (id, product_name, quantity) VALUES (1, 'draft', 1)"
            )),
            Statement::new(format!(
                "INSERT INTO {TABLE} (id, product_name, quantity, rowid) VALUES (2, 'synced', 1, 'R2')"
            )),
            Statement::new(format!("DELETE FROM {TABLE} WHERE id = 2")),
        ])
        .await
        .unwrap();

    let transport = MockTransport::new();
    transport.fail_next_push("network unreachable");
    let client = SyncClient::new(store, transport.clone(), SyncConfig::default());

    let before = client.pending().await.unwrap();
    assert!(client.push(&session()).await.is_err());
    let after = client.pending().await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after.request.deletes.len(), 1);

    // Retrying succeeds and consumes the delete audit row
    client.push(&session()).await.unwrap();
    let sent = transport.last_push().unwrap();
    assert_eq!(sent.deletes[0].rowid, "R2");
    assert!(client.pending().await.unwrap().request.deletes.is_empty());
}

#[tokio::test]
async fn identity_table_keeps_its_triggers() {
    let store = SqliteStore::in_memory().await.unwrap();
    store
        .execute_batch(&[
            Statement::new(
                "CREATE TABLE mergeidentity (id INTEGER PRIMARY KEY, name TEXT, mergeupdate INTEGER DEFAULT 0, rowid TEXT)",
            ),
            Statement::new(
                "CREATE TRIGGER mergeidentity_ins AFTER INSERT ON mergeidentity \
                 BEGIN UPDATE mergeidentity SET mergeupdate = 1 WHERE id = NEW.id; END",
            ),
        ])
        .await
        .unwrap();

    let transport = MockTransport::new();
    transport.queue_page(
        "mergeidentity",
        SyncPage {
            sync_id: SyncId::new(1),
            max_package_size: 50,
            records: Some(json!({"inserts": [{"id": 1, "name": "me", "rowid": "I1"}]})),
            query_insert: Some(
                "INSERT INTO mergeidentity (id, name, rowid) VALUES (?, ?, ?)".into(),
            ),
            ..SyncPage::default()
        },
    );
    let client = SyncClient::new(store, transport, SyncConfig::default());

    let outcome = client.pull(&session(), |_| {}).await;
    assert!(outcome.is_ok(), "{:?}", outcome.first_error);

    // The trigger fired, so the row is marked for push
    let pending = client.pending().await.unwrap();
    assert_eq!(pending.request.update_count(), 1);
}
