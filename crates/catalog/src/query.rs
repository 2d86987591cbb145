use std::cmp::Ordering;

use common::{normalize, normalize_token, parse_duration_secs, Category, Song};

use crate::facets::Matcher;
use crate::present::search_key;
use crate::table::CatalogTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    MainArtist,
    Song,
    Featuring,
    Key,
    Duration,
    YearReleased,
    Bpm,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match Category::parse(value) {
            Some(Category::MainArtist) => Some(Self::MainArtist),
            Some(Category::Song) => Some(Self::Song),
            Some(Category::Featuring) => Some(Self::Featuring),
            Some(Category::Key) => Some(Self::Key),
            Some(Category::YearReleased) => Some(Self::YearReleased),
            Some(Category::Bpm) => Some(Self::Bpm),
            Some(_) => None,
            None if value.trim().eq_ignore_ascii_case("duration") => Some(Self::Duration),
            None => None,
        }
    }

    fn compare(self, a: &Song, b: &Song) -> Ordering {
        match self {
            Self::MainArtist => compare_text(&a.main_artist, &b.main_artist),
            Self::Song => compare_text(&a.song, &b.song),
            Self::Featuring => compare_text(a.featuring.trim(), b.featuring.trim()),
            Self::Key => compare_text(&a.key, &b.key),
            Self::Duration => duration_secs(a).cmp(&duration_secs(b)),
            Self::YearReleased => a.year_released.cmp(&b.year_released),
            Self::Bpm => a.bpm.cmp(&b.bpm),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    /// Parses `field`, `field:asc` or `field:desc`; a leading `-` also means
    /// descending.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (name, descending) = match value.rsplit_once(':') {
            Some((name, "desc")) => (name, true),
            Some((name, "asc")) => (name, false),
            Some(_) => return None,
            None => match value.strip_prefix('-') {
                Some(name) => (name, true),
                None => (value, false),
            },
        };
        SortField::parse(name).map(|field| SortKey { field, descending })
    }

    /// Parses a comma-separated list of sort keys.
    pub fn parse_list(value: &str) -> Option<Vec<Self>> {
        value
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(SortKey::parse)
            .collect()
    }
}

/// Accepted values for one category. Values match like sub-category tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub category: Category,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SongQuery {
    pub search: Option<String>,
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
}

impl CatalogTable {
    /// Songs passing every filter and the search term, in ingestion order
    /// unless sort keys are given.
    pub fn query(&self, query: &SongQuery) -> Vec<&Song> {
        let term = query
            .search
            .as_deref()
            .map(|value| normalize(value).trim().to_string())
            .filter(|value| !value.is_empty());
        let filters: Vec<Vec<Matcher>> = query
            .filters
            .iter()
            .map(|filter| {
                filter
                    .values
                    .iter()
                    .filter_map(|value| Matcher::for_token(filter.category, &normalize_token(value)).ok())
                    .collect()
            })
            .collect();

        let mut songs: Vec<&Song> = self
            .songs()
            .iter()
            .filter(|song| {
                filters
                    .iter()
                    .all(|any_of| any_of.iter().any(|matcher| matcher.matches(song)))
            })
            .filter(|song| match &term {
                Some(term) => search_key(song).contains(term.as_str()),
                None => true,
            })
            .collect();

        if !query.sort.is_empty() {
            songs.sort_by(|a, b| {
                query.sort.iter().fold(Ordering::Equal, |order, key| {
                    order.then_with(|| {
                        let next = key.field.compare(a, b);
                        if key.descending {
                            next.reverse()
                        } else {
                            next
                        }
                    })
                })
            });
        }
        songs
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn duration_secs(song: &Song) -> u32 {
    parse_duration_secs(&song.duration).unwrap_or(0)
}
