use std::env;
use std::path::PathBuf;

use catalog::{CatalogTable, CsvStore, RecordSink, RecordSource, SnapshotStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let csv_path = args
        .next()
        .or_else(|| env::var("SONGS_CSV").ok())
        .ok_or("SONGS_CSV not set and no path argument")?;
    let snapshot_path = args
        .next()
        .or_else(|| env::var("SNAPSHOT_PATH").ok())
        .unwrap_or_else(|| "data/songs.redb".to_string());

    let rows = CsvStore::new(PathBuf::from(&csv_path)).load()?;
    let (_, report) = CatalogTable::build(&rows);

    let snapshot = SnapshotStore::open(&PathBuf::from(&snapshot_path))?;
    snapshot.persist(&rows)?;
    info!("Wrote {} rows to {}", rows.len(), snapshot_path);

    println!(
        "Imported: {} songs accepted, {} rows rejected",
        report.accepted, report.rejected
    );

    Ok(())
}
