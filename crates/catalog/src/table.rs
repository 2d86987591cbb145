use common::{RawRow, Song};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// In-memory song table. Built once from stored rows and never mutated;
/// [`CatalogTable::append`] returns a new table.
#[derive(Clone, Debug, Default)]
pub struct CatalogTable {
    songs: Vec<Song>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub accepted: usize,
    pub rejected: usize,
}

impl CatalogTable {
    /// Builds the table from stored rows, skipping rows whose year or tempo
    /// is not numeric.
    pub fn build(rows: &[RawRow]) -> (Self, BuildReport) {
        let mut songs = Vec::with_capacity(rows.len());
        let mut report = BuildReport::default();
        for (index, row) in rows.iter().enumerate() {
            match Song::from_row(row) {
                Ok(song) => {
                    songs.push(song);
                    report.accepted += 1;
                }
                Err(err) => {
                    warn!(
                        "Skipping row {} ({:?} / {:?}): {}",
                        index + 1,
                        row.main_artist.as_deref().unwrap_or(""),
                        row.song.as_deref().unwrap_or(""),
                        err
                    );
                    report.rejected += 1;
                }
            }
        }
        info!(
            "Catalog built: {} songs ({} rows rejected)",
            report.accepted, report.rejected
        );
        (Self { songs }, report)
    }

    /// Returns a copy of the table with `song` added at the end. Existing
    /// records are carried over as they are.
    pub fn append(&self, song: Song) -> Self {
        let mut songs = Vec::with_capacity(self.songs.len() + 1);
        songs.extend(self.songs.iter().cloned());
        songs.push(song);
        Self { songs }
    }

    /// Songs in ingestion order.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
