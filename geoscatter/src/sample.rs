use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::CoordGeo;

// --------------------------------------------------------------------------
// Categories

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub title: String,
}

impl Category {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }
}

/// Ordered set of categories counted per sample. The order is significant:
/// it fixes the column order of [`Sample::counts`] and breaks ties when
/// picking a dominant category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

const SOCIAL_EXPLORER_RACE: [(&str, &str); 8] = [
    ("SE_T054_001", "Total population"),
    ("SE_T054_002", "Total population: White alone"),
    ("SE_T054_003", "Total population: Black or African American alone"),
    ("SE_T054_004", "Total population: American Indian and Alaska Native alone"),
    ("SE_T054_005", "Total population: Asian alone"),
    ("SE_T054_006", "Total population: Native Hawaiian and Other Pacific Islander alone"),
    ("SE_T054_007", "Total population: Some Other Race alone"),
    ("SE_T054_008", "Total population: Two or More Races"),
];

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Race table (T054) of socialexplorer.com census exports.
    pub fn social_explorer_race() -> Self {
        Self::new(
            SOCIAL_EXPLORER_RACE
                .iter()
                .map(|(code, title)| Category::new(*code, *title))
                .collect(),
        )
    }

    /// Reads a JSON array of `{"code": ..., "title": ...}` objects.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let data = fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.code == code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::social_explorer_race()
    }
}

impl<'a> IntoIterator for &'a CategoryTable {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}

// --------------------------------------------------------------------------
// Sample

/// One geocoded row: a location and one count per category of the owning
/// dataset's [`CategoryTable`], in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    location: CoordGeo,
    counts: Vec<u64>,
    dominant: Option<usize>,
}

impl Sample {
    pub fn new(location: CoordGeo, counts: Vec<u64>) -> Self {
        let dominant = dominant_index(&counts);
        Self {
            location,
            counts,
            dominant,
        }
    }

    pub fn location(&self) -> CoordGeo {
        self.location
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn count(&self, category: usize) -> Option<u64> {
        self.counts.get(category).copied()
    }

    /// Index into the category table of the category with the highest count.
    pub fn dominant_category(&self) -> Option<usize> {
        self.dominant
    }
}

/// Index of the largest count. Among equal maxima the first one wins, and
/// an all-zero row has no dominant category.
pub fn dominant_index(counts: &[u64]) -> Option<usize> {
    let mut dominant = None;
    let mut dominant_count = 0;
    for (index, &count) in counts.iter().enumerate() {
        if count > dominant_count {
            dominant_count = count;
            dominant = Some(index);
        }
    }
    dominant
}

/// Anything with a position on the globe.
pub trait Located {
    fn location(&self) -> CoordGeo;
}

impl Located for CoordGeo {
    fn location(&self) -> CoordGeo {
        *self
    }
}

impl Located for Sample {
    fn location(&self) -> CoordGeo {
        self.location
    }
}
