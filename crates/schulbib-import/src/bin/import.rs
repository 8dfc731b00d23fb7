//! Bulk-import CLI
//!
//! Reads one query per line (file or stdin), runs the lookup queue, and
//! optionally commits the results into a catalog database. Ctrl-C stops
//! the run cooperatively; already-settled items keep their results.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use schulbib_import::{
    BookLookupClient, CancelToken, HttpLookupClient, ImportQueue, ImportStatus, LocalLookupClient,
};
use schulbib_lookup::{GeminiBackend, GeminiConfig};
use schulbib_store::SqliteBookStore;

#[derive(Parser)]
#[command(name = "schulbib-import", about = "Massen-Import für den Schulkatalog")]
struct Args {
    /// File with one book query per line, or `-` for stdin
    input: String,

    /// Lookup endpoint of a running schulbib server; without it the
    /// lookup runs in-process (needs GOOGLE_GEMINI_API_KEY)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the endpoint
    #[arg(long)]
    token: Option<String>,

    /// Catalog database to commit into
    #[arg(long, default_value = "katalog.sqlite")]
    db: PathBuf,

    /// Commit successful lookups into the catalog after processing
    #[arg(long)]
    commit: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let input = if args.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let client: Box<dyn BookLookupClient> = match &args.endpoint {
        Some(endpoint) => Box::new(HttpLookupClient::new(endpoint.as_str(), args.token.clone())),
        None => {
            let api_key = std::env::var("GOOGLE_GEMINI_API_KEY").unwrap_or_default();
            let backend = GeminiBackend::new(GeminiConfig::new(api_key))?;
            Box::new(LocalLookupClient::new(Arc::new(backend)))
        }
    };

    let mut queue = ImportQueue::new();
    let added = queue.enqueue(&input);
    tracing::info!(added, "queued import items");

    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("stop requested, finishing current batch");
            canceller.cancel();
        }
    });

    let progress = queue.process(client.as_ref(), &cancel).await;
    tracing::info!(
        current = progress.current,
        total = progress.total,
        "processing finished"
    );

    for item in queue.items() {
        match item.status {
            ImportStatus::Success => {
                let data = item.data.as_ref().expect("success item has data");
                println!("OK    {} / {} ({})", data.title, data.author, data.isbn);
            }
            ImportStatus::Error => {
                println!(
                    "FEHL  {}: {}",
                    item.original_query,
                    item.error.as_deref().unwrap_or("unbekannt")
                );
            }
            _ => println!("OFFEN {}", item.original_query),
        }
    }

    if args.commit {
        let store = SqliteBookStore::open(&args.db)?;
        let summary = queue.commit_all(&store);
        println!(
            "Gespeichert: {}, fehlgeschlagen: {}",
            summary.saved,
            summary.failed.len()
        );
        for (id, error) in &summary.failed {
            tracing::warn!(%id, %error, "commit failed");
        }
    }

    Ok(())
}
