pub mod aggregate;
pub mod facets;
pub mod present;
pub mod query;
pub mod store;
pub mod table;

use std::sync::Arc;

use common::{Category, RawRow, RowError, Song};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use aggregate::{CategoryStats, Limit, StatCount, StatsSummary};
pub use facets::{FacetError, FacetValue, Matcher, Subcategory};
pub use present::{present, present_all, SongView};
pub use query::{Filter, SongQuery, SortField, SortKey};
pub use store::{CsvStore, RecordSink, RecordSource, SnapshotInfo, SnapshotStore, StoreError};
pub use table::{BuildReport, CatalogTable};

/// Song details submitted for addition. Tag columns are comma-separated,
/// the way they are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSong {
    pub main_artist: String,
    pub featuring: Option<String>,
    pub song: String,
    pub year_released: String,
    pub country: String,
    pub language: String,
    pub arrangement: String,
    pub genre: String,
    /// Where the audio can be fetched for feature extraction.
    pub media_url: String,
}

/// Output of the audio feature extractor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub bpm: i64,
    pub key: String,
    pub duration: String,
}

#[derive(Debug)]
pub enum AppendError {
    ExtractionFailed(String),
    RowRejected(RowError),
    PersistenceFailed(StoreError),
}

impl std::fmt::Display for AppendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppendError::ExtractionFailed(message) => {
                write!(f, "feature extraction failed: {}", message)
            }
            AppendError::RowRejected(err) => write!(f, "song rejected: {}", err),
            AppendError::PersistenceFailed(err) => write!(f, "failed to save songs: {}", err),
        }
    }
}

impl std::error::Error for AppendError {}

impl From<RowError> for AppendError {
    fn from(err: RowError) -> Self {
        AppendError::RowRejected(err)
    }
}

impl From<StoreError> for AppendError {
    fn from(err: StoreError) -> Self {
        AppendError::PersistenceFailed(err)
    }
}

impl NewSong {
    /// Stored row for this submission once the audio features are known.
    pub fn into_row(self, features: ExtractedFeatures) -> RawRow {
        let optional = |value: String| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        };
        RawRow {
            main_artist: optional(self.main_artist),
            featuring: self.featuring.and_then(optional),
            song: optional(self.song),
            duration: optional(features.duration),
            year_released: optional(self.year_released),
            bpm: Some(features.bpm.to_string()),
            key: optional(features.key),
            country: optional(self.country),
            language: optional(self.language),
            arrangement: optional(self.arrangement),
            genre: optional(self.genre),
        }
    }
}

/// Shared handle over the current table snapshot.
///
/// Readers clone the snapshot `Arc` and never wait on disk. Appends are
/// serialized by the `rows` lock, which also holds every stored row as it was
/// loaded, including rows the table rejected; the sink always receives that
/// full collection. The new snapshot is published only after the sink has
/// accepted it.
pub struct Catalog {
    table: RwLock<Arc<CatalogTable>>,
    rows: Mutex<Vec<RawRow>>,
    sink: Box<dyn RecordSink>,
}

impl Catalog {
    pub fn new(rows: Vec<RawRow>, sink: Box<dyn RecordSink>) -> (Self, BuildReport) {
        let (table, report) = CatalogTable::build(&rows);
        let catalog = Self {
            table: RwLock::new(Arc::new(table)),
            rows: Mutex::new(rows),
            sink,
        };
        (catalog, report)
    }

    pub fn load(
        source: &dyn RecordSource,
        sink: Box<dyn RecordSink>,
    ) -> Result<(Self, BuildReport), StoreError> {
        let rows = source.load()?;
        Ok(Self::new(rows, sink))
    }

    pub fn snapshot(&self) -> Arc<CatalogTable> {
        Arc::clone(&*self.table.read())
    }

    pub fn list_all_records(&self) -> Vec<SongView> {
        present_all(self.snapshot().songs())
    }

    pub fn list_category_facets(&self, category: Category) -> Vec<FacetValue> {
        self.snapshot().resolve_category(category)
    }

    pub fn list_subcategory_records(
        &self,
        category: Category,
        raw_token: &str,
    ) -> Result<(String, Vec<SongView>), FacetError> {
        let table = self.snapshot();
        let found = table.resolve_subcategory(category, raw_token)?;
        let songs = present_all(found.songs);
        Ok((found.label, songs))
    }

    pub fn list_statistics(&self, category: Category, limit: Limit) -> Vec<StatCount> {
        self.snapshot().aggregate(category, limit)
    }

    /// Adds one song built from a submission and its extracted features.
    /// On any error the table and the stored collection are left as they were.
    pub fn append(
        &self,
        new_song: NewSong,
        features: ExtractedFeatures,
    ) -> Result<SongView, AppendError> {
        let row = new_song.into_row(features);
        let song = Song::from_row(&row)?;

        let mut rows = self.rows.lock();
        let mut next_rows = Vec::with_capacity(rows.len() + 1);
        next_rows.extend(rows.iter().cloned());
        next_rows.push(row);
        if let Err(err) = self.sink.persist(&next_rows) {
            warn!("Failed to persist appended song: {}", err);
            return Err(err.into());
        }
        *rows = next_rows;

        let next = self.snapshot().append(song.clone());
        let total = next.len();
        *self.table.write() = Arc::new(next);
        info!(
            "Added song {:?} by {:?} ({} songs)",
            song.song, song.main_artist, total
        );
        Ok(present(&song))
    }
}
