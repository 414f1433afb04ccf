//! Concurrent fetch-or-create example.
//!
//! Several threads race to fetch-or-create the same record through one
//! shared store; exactly one row is created and every thread sees its id.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p flexrecord-demos --example concurrent_fetch
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use flexrecord_core::Record;
use flexrecord_sqlite::RecordStore;

fn main() {
    let store = Arc::new(RecordStore::open_in_memory().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let rows = store
                    .fetch_or_create("table1", &Record::new().with("name", "bob"))
                    .unwrap();
                let id = rows[0].record_id().unwrap().to_string();
                println!("worker {worker}: {id}");
                id
            })
        })
        .collect();

    let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let rows = store.get("table1", &Record::new()).unwrap();
    println!("distinct ids: {}, stored rows: {}", ids.len(), rows.len());
}
