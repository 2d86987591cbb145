use std::collections::HashMap;

use common::{bucket_label, Category, CategoryKind};
use serde::Serialize;

use crate::table::CatalogTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Top(usize),
    All,
}

impl Limit {
    pub fn from_option(value: Option<usize>) -> Self {
        match value {
            Some(n) => Limit::Top(n),
            None => Limit::All,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatCount {
    pub label: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub label: &'static str,
    pub items: Vec<StatCount>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatsSummary {
    pub total_songs: usize,
    pub categories: Vec<CategoryStats>,
}

impl CatalogTable {
    /// Ranked counts for one category. Tag columns are exploded, so a tag
    /// listed twice on a song counts twice. Groups are keyed by the spelling
    /// in the data, not by the folded key.
    pub fn aggregate(&self, category: Category, limit: Limit) -> Vec<StatCount> {
        let mut counter = Counter::default();
        for song in self.songs() {
            match category.kind() {
                CategoryKind::Ranged => {
                    if let Some(bucket) = song.bucket(category) {
                        counter.add(bucket_label(bucket));
                    }
                }
                CategoryKind::MultiValued => {
                    if let Some((original, _)) = song.tags(category) {
                        for item in original {
                            counter.add(item.clone());
                        }
                    }
                }
                CategoryKind::SingleValued => {
                    if let Some((original, _)) = song.text(category) {
                        counter.add(original.to_string());
                    }
                }
            }
        }
        counter.ranked(limit)
    }

    /// Top entries for every browsable category.
    pub fn summary(&self, top_n: usize) -> StatsSummary {
        let categories = Category::browsable()
            .iter()
            .map(|category| CategoryStats {
                category: *category,
                label: category.label(),
                items: self.aggregate(*category, Limit::Top(top_n)),
            })
            .collect();
        StatsSummary {
            total_songs: self.len(),
            categories,
        }
    }
}

/// Counts labels, remembering the order each label was first seen.
#[derive(Default)]
struct Counter {
    slots: HashMap<String, usize>,
    items: Vec<StatCount>,
}

impl Counter {
    fn add(&mut self, label: String) {
        if let Some(slot) = self.slots.get(&label) {
            self.items[*slot].count += 1;
            return;
        }
        self.slots.insert(label.clone(), self.items.len());
        self.items.push(StatCount { label, count: 1 });
    }

    fn ranked(self, limit: Limit) -> Vec<StatCount> {
        let mut items = self.items;
        items.sort_by(|a, b| b.count.cmp(&a.count));
        if let Limit::Top(n) = limit {
            items.truncate(n);
        }
        items
    }
}
