use std::collections::HashMap;

use common::{bucket_label, normalize_token, Category, CategoryKind, Song};
use serde::Serialize;

use crate::table::CatalogTable;

/// One entry of a category listing. `value` is the lookup token to pass back
/// to [`CatalogTable::resolve_subcategory`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub label: String,
    pub count: usize,
}

impl FacetValue {
    fn new(value: impl Into<String>, label: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            count,
        }
    }
}

/// Songs under one sub-category, with the label as written in the data.
#[derive(Clone, Debug)]
pub struct Subcategory<'a> {
    pub label: String,
    pub songs: Vec<&'a Song>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FacetError {
    UnknownCategory(String),
    InvalidToken { category: Category, token: String },
    NotFound { category: Category, token: String },
}

impl std::fmt::Display for FacetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacetError::UnknownCategory(name) => write!(f, "unknown category: {}", name),
            FacetError::InvalidToken { category, token } => {
                write!(f, "invalid {} value: {}", category, token)
            }
            FacetError::NotFound { category, token } => {
                write!(f, "no {} matching: {}", category, token)
            }
        }
    }
}

impl std::error::Error for FacetError {}

/// Membership test for one sub-category, compared on folded keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    Bucket(Category, i64),
    Tag(Category, String),
    Text(Category, String),
}

impl Matcher {
    /// Builds the matcher for an already folded token.
    pub fn for_token(category: Category, token: &str) -> Result<Self, FacetError> {
        match category.kind() {
            CategoryKind::Ranged => token
                .parse::<i64>()
                .map(|bucket| Matcher::Bucket(category, bucket))
                .map_err(|_| FacetError::InvalidToken {
                    category,
                    token: token.to_string(),
                }),
            CategoryKind::MultiValued => Ok(Matcher::Tag(category, token.to_string())),
            CategoryKind::SingleValued => Ok(Matcher::Text(category, token.to_string())),
        }
    }

    pub fn matches(&self, song: &Song) -> bool {
        match self {
            Matcher::Bucket(category, bucket) => song.bucket(*category) == Some(*bucket),
            Matcher::Tag(category, token) => song
                .tags(*category)
                .map(|(_, folded)| folded.iter().any(|item| item == token))
                .unwrap_or(false),
            Matcher::Text(category, token) => song
                .text(*category)
                .map(|(_, folded)| folded == token)
                .unwrap_or(false),
        }
    }

    /// Original spelling of the matched value inside `song`, if any.
    fn original_in<'a>(&self, song: &'a Song) -> Option<&'a str> {
        match self {
            Matcher::Bucket(..) => None,
            Matcher::Tag(category, token) => {
                let (original, folded) = song.tags(*category)?;
                folded
                    .iter()
                    .position(|item| item == token)
                    .map(|index| original[index].as_str())
            }
            Matcher::Text(category, token) => {
                let (original, folded) = song.text(*category)?;
                (folded == token).then_some(original)
            }
        }
    }
}

impl CatalogTable {
    /// Lists every sub-category of `category` with its song count.
    pub fn resolve_category(&self, category: Category) -> Vec<FacetValue> {
        match category.kind() {
            CategoryKind::Ranged => self.ranged_facets(category),
            CategoryKind::MultiValued => self.tag_facets(category),
            CategoryKind::SingleValued => self.text_facets(category),
        }
    }

    /// Resolves a raw path token to the songs it names. The token is
    /// percent-decoded and folded before comparison; the returned label is the
    /// spelling found in the data.
    pub fn resolve_subcategory(
        &self,
        category: Category,
        raw_token: &str,
    ) -> Result<Subcategory<'_>, FacetError> {
        let token = normalize_token(raw_token);
        let matcher = Matcher::for_token(category, &token)?;
        let songs: Vec<&Song> = self
            .songs()
            .iter()
            .filter(|song| matcher.matches(song))
            .collect();

        let label = match &matcher {
            Matcher::Bucket(_, bucket) => bucket_label(*bucket),
            _ => songs
                .iter()
                .find_map(|song| matcher.original_in(song))
                .map(str::to_string)
                .ok_or_else(|| FacetError::NotFound {
                    category,
                    token: token.clone(),
                })?,
        };

        Ok(Subcategory { label, songs })
    }

    fn ranged_facets(&self, category: Category) -> Vec<FacetValue> {
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for bucket in self.songs().iter().filter_map(|song| song.bucket(category)) {
            *counts.entry(bucket).or_insert(0) += 1;
        }
        let mut buckets: Vec<(i64, usize)> = counts.into_iter().collect();
        buckets.sort_by_key(|(bucket, _)| *bucket);
        buckets
            .into_iter()
            .map(|(bucket, count)| FacetValue::new(bucket.to_string(), bucket_label(bucket), count))
            .collect()
    }

    fn tag_facets(&self, category: Category) -> Vec<FacetValue> {
        let mut values: Vec<FacetValue> = Vec::new();
        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        for song in self.songs() {
            let Some((original, folded)) = song.tags(category) else {
                continue;
            };
            let mut seen_in_song: Vec<usize> = Vec::new();
            for (item, key) in original.iter().zip(folded) {
                let slot = *index.entry((key.as_str(), item.as_str())).or_insert_with(|| {
                    values.push(FacetValue::new(key.as_str(), item.as_str(), 0));
                    values.len() - 1
                });
                if !seen_in_song.contains(&slot) {
                    seen_in_song.push(slot);
                    values[slot].count += 1;
                }
            }
        }
        values.sort_by(|a, b| a.label.cmp(&b.label));
        values
    }

    fn text_facets(&self, category: Category) -> Vec<FacetValue> {
        let mut per_key: HashMap<&str, usize> = HashMap::new();
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for (original, folded) in self.songs().iter().filter_map(|song| song.text(category)) {
            *per_key.entry(folded).or_insert(0) += 1;
            if !pairs.contains(&(folded, original)) {
                pairs.push((folded, original));
            }
        }
        let mut values: Vec<FacetValue> = pairs
            .into_iter()
            .map(|(folded, original)| FacetValue::new(folded, original, per_key[folded]))
            .collect();
        values.sort_by(|a, b| a.label.cmp(&b.label));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{raw_row, sample_table};

    fn facet(value: &str, label: &str, count: usize) -> FacetValue {
        FacetValue::new(value, label, count)
    }

    #[test]
    fn key_facets_sorted_by_label() {
        let rows = vec![
            raw_row("A", "One", "2001", "100", "C", "", ""),
            raw_row("B", "Two", "2002", "101", "G", "", ""),
            raw_row("C", "Three", "2003", "102", "C", "", ""),
        ];
        let (table, _) = CatalogTable::build(&rows);
        assert_eq!(
            table.resolve_category(Category::Key),
            vec![facet("c", "C", 2), facet("g", "G", 1)]
        );
    }

    #[test]
    fn text_facets_count_by_folded_value() {
        let rows = vec![
            raw_row("A", "One", "2001", "100", "Am", "", ""),
            raw_row("B", "Two", "2002", "101", "am", "", ""),
        ];
        let (table, _) = CatalogTable::build(&rows);
        assert_eq!(
            table.resolve_category(Category::Key),
            vec![facet("am", "Am", 2), facet("am", "am", 2)]
        );
    }

    #[test]
    fn bpm_facets_are_ascending_buckets() {
        let table = sample_table();
        assert_eq!(
            table.resolve_category(Category::Bpm),
            vec![
                facet("70", "70-79", 1),
                facet("100", "100-109", 1),
                facet("120", "120-129", 3),
            ]
        );
    }

    #[test]
    fn year_facets_are_decades() {
        let table = sample_table();
        let labels: Vec<(String, usize)> = table
            .resolve_category(Category::YearReleased)
            .into_iter()
            .map(|value| (value.label, value.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("1940-1949".to_string(), 1),
                ("1990-1999".to_string(), 1),
                ("2000-2009".to_string(), 3),
            ]
        );
    }

    #[test]
    fn tag_facets_keep_spellings_apart() {
        let table = sample_table();
        assert_eq!(
            table.resolve_category(Category::Country),
            vec![
                facet("belgium", "Belgium", 1),
                facet("canada", "Canada", 1),
                facet("colombia", "Colombia", 1),
                facet("france", "France", 3),
                facet("france", "france", 1),
            ]
        );
    }

    #[test]
    fn tag_facets_count_records_not_occurrences() {
        let rows = vec![raw_row("A", "One", "2001", "100", "C", "", "Pop, Pop")];
        let (table, _) = CatalogTable::build(&rows);
        assert_eq!(table.resolve_category(Category::Genre), vec![facet("pop", "Pop", 1)]);
    }

    #[test]
    fn country_lookup_ignores_case_and_returns_source_label() {
        let table = sample_table();
        let found = table.resolve_subcategory(Category::Country, "frANCE").unwrap();
        assert_eq!(found.label, "France");
        let artists: Vec<&str> = found.songs.iter().map(|song| song.main_artist.as_str()).collect();
        assert_eq!(artists, vec!["Céline Dion", "Stromae", "Édith Piaf", "Daft Punk"]);
    }

    #[test]
    fn tag_label_uses_first_spelling_in_table_order() {
        let rows = vec![
            raw_row("A", "One", "2001", "100", "C", "FRANCE", ""),
            raw_row("B", "Two", "2002", "101", "C", "France", ""),
        ];
        let (table, _) = CatalogTable::build(&rows);
        let found = table.resolve_subcategory(Category::Country, "france").unwrap();
        assert_eq!(found.label, "FRANCE");
        assert_eq!(found.songs.len(), 2);
    }

    #[test]
    fn lookup_folds_diacritics_and_escapes() {
        let rows = vec![raw_row("A", "One", "2001", "100", "C", "Côte d'Ivoire", "")];
        let (table, _) = CatalogTable::build(&rows);
        let found = table
            .resolve_subcategory(Category::Country, "C%C3%B4te%20D'Ivoire")
            .unwrap();
        assert_eq!(found.label, "Côte d'Ivoire");
    }

    #[test]
    fn bpm_lookup_matches_bucket() {
        let table = sample_table();
        let found = table.resolve_subcategory(Category::Bpm, "120").unwrap();
        assert_eq!(found.label, "120-129");
        assert_eq!(found.songs.len(), 3);
        assert!(found.songs.iter().all(|song| (120..=129).contains(&song.bpm)));
    }

    #[test]
    fn bpm_lookup_rejects_non_integer() {
        let table = sample_table();
        let err = table.resolve_subcategory(Category::Bpm, "abc").unwrap_err();
        assert_eq!(
            err,
            FacetError::InvalidToken {
                category: Category::Bpm,
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn extreme_bucket_tokens_do_not_overflow() {
        let table = sample_table();
        let max = i64::MAX.to_string();
        let found = table.resolve_subcategory(Category::Bpm, &max).unwrap();
        assert_eq!(found.label, format!("{}-{}", max, max));
        assert!(found.songs.is_empty());
        assert!(matches!(
            table.resolve_subcategory(Category::Bpm, "99999999999999999999"),
            Err(FacetError::InvalidToken { .. })
        ));
    }

    #[test]
    fn extreme_stored_values_still_facet() {
        let huge = i64::MAX.to_string();
        let rows = vec![raw_row("A", "One", "2001", &huge, "C", "", "")];
        let (table, _) = CatalogTable::build(&rows);
        let top = common::bucket_of(i64::MAX);
        let label = format!("{}-{}", top, i64::MAX);
        assert_eq!(
            table.resolve_category(Category::Bpm),
            vec![facet(&top.to_string(), &label, 1)]
        );
        let found = table.resolve_subcategory(Category::Bpm, &top.to_string()).unwrap();
        assert_eq!(found.label, label);
        assert_eq!(found.songs.len(), 1);
        assert_eq!(
            table.aggregate(Category::Bpm, crate::Limit::All),
            vec![crate::StatCount { label, count: 1 }]
        );
    }

    // Ranged lookups synthesize their label, so an unpopulated bucket is an
    // empty result rather than `NotFound`; `NotFound` is kept for tag and text
    // values that no record carries.
    #[test]
    fn empty_bucket_is_not_an_error() {
        let table = sample_table();
        let found = table.resolve_subcategory(Category::YearReleased, "1800").unwrap();
        assert_eq!(found.label, "1800-1809");
        assert!(found.songs.is_empty());
    }

    #[test]
    fn single_valued_lookup() {
        let table = sample_table();
        let found = table.resolve_subcategory(Category::MainArtist, "edith piaf").unwrap();
        assert_eq!(found.label, "Édith Piaf");
        assert_eq!(found.songs.len(), 1);
    }

    #[test]
    fn missing_values_are_not_found() {
        let table = sample_table();
        assert!(matches!(
            table.resolve_subcategory(Category::Genre, "polka"),
            Err(FacetError::NotFound { .. })
        ));
        assert!(matches!(
            table.resolve_subcategory(Category::Key, "f#"),
            Err(FacetError::NotFound { .. })
        ));
    }
}
