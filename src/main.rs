// src/main.rs
mod extractors;
mod idealista;
mod normalize;
mod storage;
mod utils;

use std::path::{Path, PathBuf};

use clap::Parser;
use idealista::{client, load_raw_batch, RawListing};
use normalize::{normalize_batch, to_record_batch};
use storage::{StorageManager, WritePolicy};
use utils::AppError;

/// Harvests real-estate listings into a typed columnar dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listing page to scrape (repeatable)
    #[arg(short, long = "url")]
    urls: Vec<String>,

    /// JSON file with an array of raw listings (repeatable)
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Directory holding the dataset files
    #[arg(short, long, default_value = "./data")]
    output_dir: PathBuf,

    /// Dataset name; ".parquet" is appended when missing
    #[arg(short, long, default_value = "idealista")]
    name: String,

    /// What to do with an existing dataset of the same name
    #[arg(long, value_enum, default_value_t = WritePolicy::MergeWithExisting)]
    policy: WritePolicy,

    /// Abort when any listing has an unparseable price instead of dropping it
    #[arg(long)]
    strict: bool,

    /// Debug mode - save fetched pages and the raw batch
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG overrides the --debug default)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting harvest with args: {:?}", args);

    if args.urls.is_empty() && args.inputs.is_empty() {
        return Err(AppError::Config("Nothing to do: pass at least one --url or --input".to_string()));
    }

    let debug_dir = args.output_dir.join("debug").join(chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string());
    if args.debug {
        std::fs::create_dir_all(&debug_dir)?;
        tracing::info!("Debug artefacts go to {}", debug_dir.display());
    }

    // 3. Collect raw listings: files first, then pages
    let mut raws: Vec<RawListing> = Vec::new();
    for input in &args.inputs {
        raws.extend(load_raw_batch(input).await?);
    }

    let mut fetch_failures = 0;
    for (i, url) in args.urls.iter().enumerate() {
        match client::scrape_listing(url).await {
            Ok((listing, html)) => {
                if args.debug {
                    let page_path = debug_dir.join(format!("page_{:03}.html", i));
                    std::fs::write(&page_path, &html)?;
                    tracing::debug!("Saved page to {}", page_path.display());
                }
                raws.push(listing);
            }
            Err(e) => {
                tracing::error!("Failed to scrape {}: {}", url, e);
                fetch_failures += 1;
            }
        }
    }

    if raws.is_empty() {
        return Err(AppError::Processing(format!(
            "No listings collected ({} pages failed)",
            fetch_failures
        )));
    }

    if args.debug {
        save_raw_batch(&debug_dir, &raws)?;
    }

    // 4. Extract and normalize
    let batch = normalize_batch(&raws);
    for rejected in &batch.rejected {
        tracing::warn!(
            "Row {} (ref {}) dropped: {}",
            rejected.index,
            rejected.reference.as_deref().unwrap_or("?"),
            rejected.error
        );
    }
    if args.strict {
        if let Some(first) = batch.rejected.first() {
            return Err(AppError::Extraction(first.error.clone()));
        }
    }
    if batch.records.is_empty() {
        return Err(AppError::Processing("Every collected listing was rejected".to_string()));
    }

    // 5. Persist
    let table = to_record_batch(&batch.records).map_err(|e| AppError::Storage(e.into()))?;
    let storage = StorageManager::new(&args.output_dir);
    let path = storage.save(&table, &args.name, args.policy)?;

    if args.debug {
        if let Some(stored) = storage.load(&args.name)? {
            tracing::debug!("Dataset {} now holds {} rows", path.display(), stored.num_rows());
        }
    }

    tracing::info!(
        "Harvest finished. Stored: {}, Rejected: {}, Fetch failures: {} -> {}",
        batch.records.len(),
        batch.rejected.len(),
        fetch_failures,
        path.display()
    );

    Ok(())
}

/// Writes the collected raw rows next to the fetched pages; readable again with `--input`.
fn save_raw_batch(debug_dir: &Path, raws: &[RawListing]) -> Result<(), AppError> {
    let path = debug_dir.join("raw_batch.json");
    std::fs::write(&path, serde_json::to_string_pretty(raws)?)?;
    tracing::info!("Saved raw batch to {}", path.display());
    Ok(())
}
