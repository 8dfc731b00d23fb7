//! End-to-end import pipeline: paste list -> lookup -> review -> catalog

use std::sync::Arc;

use schulbib_import::{CancelToken, FieldValue, ImportQueue, ImportStatus, LocalLookupClient};
use schulbib_lookup::ScriptedBackend;
use schulbib_store::{BookQuery, BookStore, SqliteBookStore};

#[tokio::test]
async fn pasted_list_ends_up_in_the_catalog() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_text(
        r#"{"Titel":"Harry Potter und der Stein der Weisen","Autor":"J.K. Rowling","ISBN":"978-3-551-55167-2"}"#,
    );
    backend.push_text(r#"{"Titel":"Mathwelt 2","Verlag":"Schulverlag plus","Stufe":"3. Klasse"}"#);
    // Third query: the backend finds nothing.
    backend.push_text("");
    let client = LocalLookupClient::new(backend);

    let mut queue = ImportQueue::new();
    let added = queue.enqueue(
        "978-3-551-55167-2\nMathwelt 2 Schulverlag\nvöllig unbekanntes Heft\n\n",
    );
    assert_eq!(added, 3);

    let cancel = CancelToken::new();
    let progress = queue.process(&client, &cancel).await;
    assert_eq!(progress.current, 3);
    assert_eq!(progress.total, 3);

    let statuses: Vec<ImportStatus> = queue.items().iter().map(|item| item.status).collect();
    assert_eq!(
        statuses,
        vec![
            ImportStatus::Success,
            ImportStatus::Success,
            ImportStatus::Error
        ]
    );

    // The librarian fixes up a field before committing.
    let mathwelt = queue.items()[1].id;
    queue
        .update_field(mathwelt, "subject", FieldValue::Text("Mathematik".to_string()))
        .unwrap();

    let store = SqliteBookStore::open_in_memory().unwrap();
    let summary = queue.commit_all(&store);
    assert_eq!(summary.saved, 2);
    assert!(summary.failed.is_empty());

    let books = store.list(&BookQuery::default()).unwrap();
    assert_eq!(books.len(), 2);
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert!(titles.contains(&"Harry Potter und der Stein der Weisen"));
    assert!(titles.contains(&"Mathwelt 2"));

    let mathwelt_book = books.iter().find(|b| b.title == "Mathwelt 2").unwrap();
    assert_eq!(mathwelt_book.subject, "Mathematik");
    assert_eq!(mathwelt_book.level, vec!["3. Klasse"]);

    // Failed lookups never block manual completion: the item is still in
    // the queue with its original query for hand entry.
    assert_eq!(queue.items()[2].original_query, "völlig unbekanntes Heft");
}
