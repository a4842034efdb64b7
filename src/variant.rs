//! Variant tokens, target categories and the token -> category mapping.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use serde::{Serialize, Serializer};

/// The short marker `innounp` appends after a comma to tell flavours of one file apart
/// (`tool,1.exe`, `tool,2.exe`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VariantToken(String);

impl VariantToken {
    pub fn new(token: impl Into<String>) -> Self {
        VariantToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Finds the first `,<digit>` marker in a manifest source pattern.
    pub fn from_source_pattern(source: &str) -> Option<Self> {
        let bytes = source.as_bytes();
        bytes
            .windows(2)
            .find(|w| w[0] == b',' && w[1].is_ascii_digit())
            .map(|w| VariantToken((w[1] as char).to_string()))
    }
}

impl fmt::Display for VariantToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A target category, which becomes one output tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Derived from a recognized `Check:` function.
    Named(String),
    /// The entry carried a variant token, but its `Check:` was absent or not recognized.
    Other,
    /// A variant token that never appeared in the manifest.
    Unknown,
}

impl Category {
    pub fn named(name: impl Into<String>) -> Self {
        Category::Named(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Named(name) => name,
            Category::Other => "Other",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lookup table from `Check:` function names to categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRules {
    rules: Vec<(String, Category)>,
}

impl Default for CheckRules {
    fn default() -> Self {
        CheckRules {
            rules: vec![
                ("InstallX64".to_owned(), Category::named("x64")),
                ("InstallARM64".to_owned(), Category::named("ARM64")),
            ],
        }
    }
}

impl CheckRules {
    /// Rules without any entries; every tagged entry maps to [`Category::Other`].
    pub fn empty() -> Self {
        CheckRules { rules: vec![] }
    }

    /// Adds (or replaces) a rule.
    pub fn with_rule(mut self, check: impl Into<String>, category: impl Into<String>) -> Self {
        let check = check.into();
        let category = Category::Named(category.into());
        match self.rules.iter_mut().find(|(c, _)| *c == check) {
            Some(existing) => existing.1 = category,
            None => self.rules.push((check, category)),
        }
        self
    }

    /// Parses a `Check=Category` rule as given on the command line.
    pub fn parse_rule(rule: &str) -> Option<(String, String)> {
        let (check, category) = rule.split_once('=')?;
        let (check, category) = (check.trim(), category.trim());
        if check.is_empty() || category.is_empty() {
            return None;
        }
        Some((check.to_owned(), category.to_owned()))
    }

    pub fn category_for(&self, check: Option<&str>) -> Category {
        let Some(check) = check else {
            return Category::Other;
        };
        self.rules
            .iter()
            .find(|(c, _)| c == check.trim())
            .map(|(_, category)| category.clone())
            .unwrap_or(Category::Other)
    }
}

/// Two manifest entries assigned different categories to the same token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantConflict {
    pub token: VariantToken,
    pub previous: Category,
    pub current: Category,
    /// Manifest line of the entry that won.
    pub line: usize,
}

/// Token -> category mapping derived from a manifest. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantCategoryMap {
    mapping: BTreeMap<VariantToken, Category>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<VariantConflict>,
}

impl VariantCategoryMap {
    pub fn builder() -> VariantMapBuilder {
        VariantMapBuilder::default()
    }

    pub fn get(&self, token: &VariantToken) -> Option<&Category> {
        self.mapping.get(token)
    }

    /// Category for `token`, or [`Category::Unknown`] when the manifest never mentioned it.
    pub fn resolve(&self, token: &VariantToken) -> Category {
        self.get(token).cloned().unwrap_or(Category::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariantToken, &Category)> {
        self.mapping.iter()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = self.mapping.values().cloned().collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn conflicts(&self) -> &[VariantConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct VariantMapBuilder {
    mapping: BTreeMap<VariantToken, Category>,
    conflicts: Vec<VariantConflict>,
}

impl VariantMapBuilder {
    /// Records `token -> category`. A different category for a known token replaces the old
    /// one and is recorded as a conflict.
    pub fn record(&mut self, token: VariantToken, category: Category, line: usize) {
        if let Some(previous) = self.mapping.get(&token) {
            if *previous != category {
                warn!(
                    "manifest line {line}: variant {token} was mapped to {previous}, now mapped to {category}"
                );
                self.conflicts.push(VariantConflict {
                    token: token.clone(),
                    previous: previous.clone(),
                    current: category.clone(),
                    line,
                });
            }
        }
        self.mapping.insert(token, category);
    }

    pub fn build(self) -> VariantCategoryMap {
        VariantCategoryMap {
            mapping: self.mapping,
            conflicts: self.conflicts,
        }
    }
}
