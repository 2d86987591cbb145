mod category;
mod normalize;

use serde::{Deserialize, Serialize};

pub use category::{
    bucket_label, bucket_of, parse_duration_secs, Category, CategoryKind, BUCKET_WIDTH,
};
pub use normalize::{normalize, normalize_token, split_multi};

/// One row as stored on disk. Every column is optional text; numeric
/// coercion happens when the row becomes a [`Song`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Main Artist")]
    pub main_artist: Option<String>,
    #[serde(rename = "Featuring")]
    pub featuring: Option<String>,
    #[serde(rename = "Song")]
    pub song: Option<String>,
    #[serde(rename = "Duration")]
    pub duration: Option<String>,
    #[serde(rename = "Year Released")]
    pub year_released: Option<String>,
    #[serde(rename = "BPM")]
    pub bpm: Option<String>,
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Language")]
    pub language: Option<String>,
    #[serde(rename = "Arrangement")]
    pub arrangement: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
}

/// Folded lookup keys for a song. Tag vectors line up index for index with
/// the originals on [`Song`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    pub main_artist: String,
    pub featuring: String,
    pub song: String,
    pub key: String,
    pub country: Vec<String>,
    pub language: Vec<String>,
    pub arrangement: Vec<String>,
    pub genre: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub main_artist: String,
    pub featuring: String,
    pub song: String,
    pub duration: String,
    pub year_released: i64,
    pub bpm: i64,
    pub key: String,
    pub country: Vec<String>,
    pub language: Vec<String>,
    pub arrangement: Vec<String>,
    pub genre: Vec<String>,
    normalized: NormalizedFields,
    bpm_range: i64,
    year_range: i64,
}

/// Display fields of a song before its lookup keys are computed.
#[derive(Clone, Debug, Default)]
pub struct SongFields {
    pub main_artist: String,
    pub featuring: String,
    pub song: String,
    pub duration: String,
    pub year_released: i64,
    pub bpm: i64,
    pub key: String,
    pub country: Vec<String>,
    pub language: Vec<String>,
    pub arrangement: Vec<String>,
    pub genre: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowError {
    InvalidYear(String),
    InvalidBpm(String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::InvalidYear(value) => write!(f, "year released is not numeric: {:?}", value),
            RowError::InvalidBpm(value) => write!(f, "bpm is not numeric: {:?}", value),
        }
    }
}

impl std::error::Error for RowError {}

impl Song {
    pub fn new(fields: SongFields) -> Self {
        let normalized = NormalizedFields {
            main_artist: normalize(&fields.main_artist),
            featuring: normalize(&fields.featuring),
            song: normalize(&fields.song),
            key: normalize(&fields.key),
            country: normalize_items(&fields.country),
            language: normalize_items(&fields.language),
            arrangement: normalize_items(&fields.arrangement),
            genre: normalize_items(&fields.genre),
        };
        Self {
            bpm_range: bucket_of(fields.bpm),
            year_range: bucket_of(fields.year_released),
            main_artist: fields.main_artist,
            featuring: fields.featuring,
            song: fields.song,
            duration: fields.duration,
            year_released: fields.year_released,
            bpm: fields.bpm,
            key: fields.key,
            country: fields.country,
            language: fields.language,
            arrangement: fields.arrangement,
            genre: fields.genre,
            normalized,
        }
    }

    /// Builds a song from a stored row. Rows whose year or tempo do not
    /// coerce to a number are rejected.
    pub fn from_row(row: &RawRow) -> Result<Self, RowError> {
        let year_released = coerce_number(row.year_released.as_deref())
            .ok_or_else(|| RowError::InvalidYear(row.year_released.clone().unwrap_or_default()))?;
        let bpm = coerce_number(row.bpm.as_deref())
            .ok_or_else(|| RowError::InvalidBpm(row.bpm.clone().unwrap_or_default()))?;
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let tags = |value: &Option<String>| split_multi(value.as_deref().unwrap_or(""));
        Ok(Self::new(SongFields {
            main_artist: text(&row.main_artist),
            featuring: text(&row.featuring),
            song: text(&row.song),
            duration: text(&row.duration),
            year_released,
            bpm,
            key: text(&row.key),
            country: tags(&row.country),
            language: tags(&row.language),
            arrangement: tags(&row.arrangement),
            genre: tags(&row.genre),
        }))
    }

    pub fn normalized(&self) -> &NormalizedFields {
        &self.normalized
    }

    pub fn bpm_range(&self) -> i64 {
        self.bpm_range
    }

    pub fn year_range(&self) -> i64 {
        self.year_range
    }

    /// Original and folded items of a tag column, or `None` for columns that
    /// are not multi-valued.
    pub fn tags(&self, category: Category) -> Option<(&[String], &[String])> {
        let pair = match category {
            Category::Country => (&self.country, &self.normalized.country),
            Category::Language => (&self.language, &self.normalized.language),
            Category::Arrangement => (&self.arrangement, &self.normalized.arrangement),
            Category::Genre => (&self.genre, &self.normalized.genre),
            _ => return None,
        };
        Some((pair.0.as_slice(), pair.1.as_slice()))
    }

    /// Original and folded value of a single text column.
    pub fn text(&self, category: Category) -> Option<(&str, &str)> {
        match category {
            Category::Key => Some((&self.key, &self.normalized.key)),
            Category::MainArtist => Some((&self.main_artist, &self.normalized.main_artist)),
            Category::Featuring => Some((&self.featuring, &self.normalized.featuring)),
            Category::Song => Some((&self.song, &self.normalized.song)),
            _ => None,
        }
        .map(|(original, folded)| (original.as_str(), folded.as_str()))
    }

    /// Bucket of a ranged column.
    pub fn bucket(&self, category: Category) -> Option<i64> {
        match category {
            Category::Bpm => Some(self.bpm_range),
            Category::YearReleased => Some(self.year_range),
            _ => None,
        }
    }
}

/// Coerces a numeric column. Fractions truncate toward zero and values past
/// the `i64` range saturate; blanks and non-finite values are rejected.
pub fn coerce_number(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(whole) = trimmed.parse::<i64>() {
        return Some(whole);
    }
    let parsed = trimmed.parse::<f64>().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(parsed.trunc() as i64)
}

fn normalize_items(items: &[String]) -> Vec<String> {
    items.iter().map(|item| normalize(item)).collect()
}
