use serde::{Deserialize, Serialize};

/// Width of the tempo and release-year buckets.
pub const BUCKET_WIDTH: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Key,
    Bpm,
    Genre,
    Language,
    Country,
    YearReleased,
    Arrangement,
    MainArtist,
    Featuring,
    Song,
}

/// How a category groups records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryKind {
    /// Numeric column grouped into fixed-width buckets.
    Ranged,
    /// Comma-separated tag column; a record may sit in several groups.
    MultiValued,
    /// Plain text column.
    SingleValued,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Key,
        Category::Bpm,
        Category::Genre,
        Category::Language,
        Category::Country,
        Category::YearReleased,
        Category::Arrangement,
        Category::MainArtist,
        Category::Featuring,
        Category::Song,
    ];

    /// Categories offered on the home listing, in display order.
    pub fn browsable() -> &'static [Category] {
        &Self::ALL[..7]
    }

    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .trim()
            .chars()
            .map(|ch| match ch {
                '_' | '-' => ' ',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "key" => Some(Self::Key),
            "bpm" => Some(Self::Bpm),
            "genre" => Some(Self::Genre),
            "language" => Some(Self::Language),
            "country" => Some(Self::Country),
            "year released" | "year" => Some(Self::YearReleased),
            "arrangement" => Some(Self::Arrangement),
            "main artist" | "artist" => Some(Self::MainArtist),
            "featuring" => Some(Self::Featuring),
            "song" => Some(Self::Song),
            _ => None,
        }
    }

    /// Column header as it appears in the source data.
    pub fn label(self) -> &'static str {
        match self {
            Self::Key => "Key",
            Self::Bpm => "BPM",
            Self::Genre => "Genre",
            Self::Language => "Language",
            Self::Country => "Country",
            Self::YearReleased => "Year Released",
            Self::Arrangement => "Arrangement",
            Self::MainArtist => "Main Artist",
            Self::Featuring => "Featuring",
            Self::Song => "Song",
        }
    }

    pub fn kind(self) -> CategoryKind {
        match self {
            Self::Bpm | Self::YearReleased => CategoryKind::Ranged,
            Self::Genre | Self::Language | Self::Country | Self::Arrangement => {
                CategoryKind::MultiValued
            }
            Self::Key | Self::MainArtist | Self::Featuring | Self::Song => {
                CategoryKind::SingleValued
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower edge of the bucket holding `value`.
/// Values whose bucket would start below `i64::MIN` share the bucket at
/// `i64::MIN`.
pub fn bucket_of(value: i64) -> i64 {
    value
        .checked_sub(value.rem_euclid(BUCKET_WIDTH))
        .unwrap_or(i64::MIN)
}

/// Upper edge of a bucket, or `None` when it does not fit in an `i64`.
fn bucket_end(bucket: i64) -> Option<i64> {
    bucket.checked_add(BUCKET_WIDTH - 1)
}

/// `"120-129"` style label. The top bucket of the `i64` range is cut short at
/// `i64::MAX`.
pub fn bucket_label(bucket: i64) -> String {
    format!("{}-{}", bucket, bucket_end(bucket).unwrap_or(i64::MAX))
}

/// Parses an `M:SS` duration label into seconds.
pub fn parse_duration_secs(value: &str) -> Option<u32> {
    let (minutes, seconds) = value.trim().split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}
