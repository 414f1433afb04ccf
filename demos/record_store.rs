//! Record store workflow example.
//!
//! Demonstrates schema-free inserts, column inference, exact-match lookup,
//! duplicate rejection, and fetch-or-create against a file-backed store.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p flexrecord-demos --example record_store
//! ```

use flexrecord_core::{Record, Value};
use flexrecord_sqlite::{RecordStore, StoreError};

fn main() {
    let path = std::env::temp_dir().join("flexrecord_example.db");
    std::fs::remove_file(&path).ok();

    // === Step 1: Open the store; table1 is created automatically ===
    let store = RecordStore::open(&path).unwrap();
    println!("Tables: {:?}", store.table_names().unwrap());

    // === Step 2: Insert records without declaring columns ===
    let alice = Record::new().with("name", "alice").with("age", 30);
    let id = store.add("table1", &alice).unwrap();
    println!("Added alice as {id}");

    let bob = Record::from_json(serde_json::json!({
        "name": "bob",
        "age": 25,
        "height": 1.82,
        "admin": true,
        "nickname": null
    }))
    .unwrap();
    store.add("table1", &bob).unwrap();

    println!("\n=== Columns ===");
    for column in store.columns("table1").unwrap().columns() {
        println!("  {} {}", column.name, column.declared_type);
    }

    // === Step 3: Exact-match lookup ===
    println!("\n=== Lookup ===");
    let found = store
        .get("table1", &Record::new().with("name", "alice"))
        .unwrap();
    for record in &found {
        println!("  {}", serde_json::to_string(record).unwrap());
    }

    // === Step 4: Duplicates are rejected ===
    match store.add("table1", &alice) {
        Err(StoreError::DuplicateEntry { table }) => {
            println!("\nalice already exists in {table}")
        }
        other => println!("\nunexpected: {other:?}"),
    }

    // === Step 5: Fetch-or-create ===
    let carol = Record::new().with("name", "carol").with("age", Value::Null);
    let first = store.fetch_or_create("table1", &carol).unwrap();
    let again = store.fetch_or_create("table1", &carol).unwrap();
    println!(
        "carol: {} (same id on second call: {})",
        first[0].record_id().unwrap(),
        first[0].record_id() == again[0].record_id()
    );

    let all = store.get("table1", &Record::new()).unwrap();
    println!("\nTotal rows: {}", all.len());

    store.close().unwrap();
    std::fs::remove_file(&path).ok();
}
