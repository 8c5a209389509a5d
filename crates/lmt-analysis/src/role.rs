//! Role (rank) labels of individuals
//!
//! Roles come from an external reference table with an `ID_Animal` and a
//! `rank` column. Animal ids in that table are free text; only their digits
//! are kept, and an id matches a [`Tag`] when the last `suffix_len` digits
//! agree with the end of the tag.
//!
//! Analyses select individuals with a [`RoleSelection`], which may span
//! several labels (for example a `male` group standing for ranks `1` and `3`).
//!
//! # Examples
//!
//! ```
//! use lmt_analysis::role::{RoleSelection, RoleTable};
//! use lmt_table::Tag;
//!
//! let roles = RoleTable::from_csv(
//!     "ID_Animal,rank\nM-001042,1\nM-001043,2\nM-001044,3\n",
//!     3,
//! )?;
//! let tags = [Tag::new("000004711042"), Tag::new("000004711043")];
//! assert_eq!(roles.role_of(&tags[0]), Some("1"));
//!
//! let selected = roles.select(&tags, &RoleSelection::new(["1", "3"]));
//! assert_eq!(selected, [Tag::new("000004711042")]);
//! # Ok::<(), lmt_analysis::AnalysisConfigError>(())
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use lmt_table::Tag;
use serde::{Deserialize, Serialize};

use crate::AnalysisConfigError;

/// Number of trailing digits compared when matching ids to tags.
pub const DEFAULT_SUFFIX_LEN: usize = 3;

const ID_COLUMN: &str = "ID_Animal";
const ROLE_COLUMN: &str = "rank";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    /// Digits of the reference id.
    pub id_digits: String,
    pub role: String,
}

/// Reference table of role labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    entries: Vec<RoleEntry>,
    suffix_len: usize,
}

impl RoleTable {
    pub fn new(entries: Vec<RoleEntry>, suffix_len: usize) -> Result<Self, AnalysisConfigError> {
        if suffix_len == 0 {
            return Err(AnalysisConfigError::ZeroSuffixLength);
        }
        let table = Self {
            entries,
            suffix_len,
        };
        table.warn_ambiguous_suffixes();
        Ok(table)
    }

    /// Parses a comma-separated table with a header row.
    ///
    /// Rows whose id has no digits or whose role is empty are ignored.
    pub fn from_csv(text: &str, suffix_len: usize) -> Result<Self, AnalysisConfigError> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .map(split_fields)
            .ok_or(AnalysisConfigError::MissingRoleColumn { column: ID_COLUMN })?;
        let column = |name: &'static str| {
            header
                .iter()
                .position(|field| *field == name)
                .ok_or(AnalysisConfigError::MissingRoleColumn { column: name })
        };
        let id_col = column(ID_COLUMN)?;
        let role_col = column(ROLE_COLUMN)?;

        let mut entries = Vec::new();
        let mut ignored = 0;
        for line in lines {
            let fields = split_fields(line);
            let id_digits = fields
                .get(id_col)
                .map(|id| id.chars().filter(char::is_ascii_digit).collect::<String>())
                .unwrap_or_default();
            let role = fields.get(role_col).copied().unwrap_or_default();
            if id_digits.is_empty() || role.is_empty() {
                ignored += 1;
                continue;
            }
            entries.push(RoleEntry {
                id_digits,
                role: role.to_owned(),
            });
        }
        if ignored > 0 {
            tracing::debug!(ignored, "ignored incomplete role table rows");
        }
        Self::new(entries, suffix_len)
    }

    #[must_use]
    pub fn entries(&self) -> &[RoleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Distinct role labels, sorted.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|entry| entry.role.as_str()).collect()
    }

    /// Role of the first entry matching `tag`.
    #[must_use]
    pub fn role_of(&self, tag: &Tag) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| self.matches(entry, tag))
            .map(|entry| entry.role.as_str())
    }

    /// Tags, in the given order, that match an entry with a selected role.
    #[must_use]
    pub fn select(&self, tags: &[Tag], selection: &RoleSelection) -> Vec<Tag> {
        tags.iter()
            .filter(|tag| {
                self.entries
                    .iter()
                    .any(|entry| selection.contains(&entry.role) && self.matches(entry, tag))
            })
            .cloned()
            .collect()
    }

    fn suffix<'s>(&self, digits: &'s str) -> &'s str {
        let start = digits.len().saturating_sub(self.suffix_len);
        &digits[start..]
    }

    fn matches(&self, entry: &RoleEntry, tag: &Tag) -> bool {
        self.suffix(&entry.id_digits) == tag.suffix(self.suffix_len)
    }

    fn warn_ambiguous_suffixes(&self) {
        let mut roles = BTreeMap::<&str, BTreeSet<&str>>::new();
        for entry in &self.entries {
            roles
                .entry(self.suffix(&entry.id_digits))
                .or_default()
                .insert(&entry.role);
        }
        for (suffix, labels) in roles.iter().filter(|(_, labels)| labels.len() > 1) {
            tracing::warn!(suffix, ?labels, "id suffix maps to several roles");
        }
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"').trim())
        .collect()
}

/// Set of role labels an analysis is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSelection {
    labels: BTreeSet<String>,
}

impl RoleSelection {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolves `name` through named role groups, or takes it as a single
    /// label.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use lmt_analysis::role::RoleSelection;
    /// let groups = BTreeMap::from([("male".to_owned(), vec!["1".to_owned(), "3".to_owned()])]);
    /// assert_eq!(RoleSelection::resolve("male", &groups), RoleSelection::new(["1", "3"]));
    /// assert_eq!(RoleSelection::resolve("2", &groups), RoleSelection::new(["2"]));
    /// ```
    #[must_use]
    pub fn resolve(name: &str, groups: &BTreeMap<String, Vec<String>>) -> Self {
        match groups.get(name) {
            Some(labels) => Self::new(labels.iter().cloned()),
            None => Self::new([name]),
        }
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl fmt::Display for RoleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

/// How the non-acting individuals of an event get their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleAssignment {
    /// The non-acting individuals, in sorted tag order, get these labels in
    /// turn. Individuals beyond the list have no role.
    Positional(Vec<String>),
    /// Roles are looked up in a reference table.
    Table(RoleTable),
}

impl RoleAssignment {
    /// Every label this assignment can produce, in reporting order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Positional(labels) => {
                let mut seen = BTreeSet::new();
                labels
                    .iter()
                    .filter(|label| seen.insert(label.as_str()))
                    .cloned()
                    .collect()
            }
            Self::Table(table) => table.labels().into_iter().map(str::to_owned).collect(),
        }
    }

    /// Roles of every individual in `tags` except `actor`.
    #[must_use]
    pub fn assign(&self, tags: &[Tag], actor: &Tag) -> Vec<(Tag, Option<String>)> {
        match self {
            Self::Positional(labels) => {
                let mut others = tags.iter().filter(|tag| *tag != actor).collect::<Vec<_>>();
                others.sort();
                others
                    .into_iter()
                    .enumerate()
                    .map(|(i, tag)| (tag.clone(), labels.get(i).cloned()))
                    .collect()
            }
            Self::Table(table) => tags
                .iter()
                .filter(|tag| *tag != actor)
                .map(|tag| (tag.clone(), table.role_of(tag).map(str::to_owned)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
\"ID_Animal\",\"sex\",\"rank\"
\"F 12-042\",F,1
F12043,F,2
F12044,F,3
no-id,F,1
F12045,F,
";

    #[test]
    fn test_parse_quoted_csv() {
        let table = RoleTable::from_csv(CSV, 3).unwrap();
        assert_eq!(table.entries().len(), 3);
        assert_eq!(table.entries()[0].id_digits, "12042");
        assert_eq!(table.labels().into_iter().collect::<Vec<_>>(), ["1", "2", "3"]);
    }

    #[test]
    fn test_missing_column() {
        let err = RoleTable::from_csv("ID_Animal,sex\n1,F\n", 3).unwrap_err();
        assert_eq!(err, AnalysisConfigError::MissingRoleColumn { column: "rank" });
        let err = RoleTable::from_csv("", 3).unwrap_err();
        assert_eq!(
            err,
            AnalysisConfigError::MissingRoleColumn { column: "ID_Animal" }
        );
    }

    #[test]
    fn test_suffix_matching() {
        let table = RoleTable::from_csv(CSV, 3).unwrap();
        assert_eq!(table.role_of(&Tag::new("000000000043")), Some("2"));
        assert_eq!(table.role_of(&Tag::new("000000099043")), Some("2"));
        assert_eq!(table.role_of(&Tag::new("000000000143")), None);

        let strict = RoleTable::from_csv(CSV, 5).unwrap();
        assert_eq!(strict.role_of(&Tag::new("000000099043")), None);
        assert_eq!(strict.role_of(&Tag::new("000000012043")), Some("2"));
    }

    #[test]
    fn test_multi_label_selection() {
        let table = RoleTable::from_csv(CSV, 3).unwrap();
        let tags = ["000000000044", "000000000043", "000000000042"].map(Tag::new);
        let selected = table.select(&tags, &RoleSelection::new(["1", "3"]));
        assert_eq!(selected, [Tag::new("000000000044"), Tag::new("000000000042")]);
        assert_eq!(RoleSelection::new(["3", "1"]).to_string(), "1+3");
    }

    #[test]
    fn test_positional_assignment() {
        let assignment = RoleAssignment::Positional(vec!["1".to_owned(), "3".to_owned()]);
        let tags = ["C", "A", "B"].map(Tag::new);
        let roles = assignment.assign(&tags, &Tag::new("B"));
        assert_eq!(
            roles,
            [
                (Tag::new("A"), Some("1".to_owned())),
                (Tag::new("C"), Some("3".to_owned())),
            ]
        );

        let crowded = ["A", "B", "C", "D"].map(Tag::new);
        let roles = assignment.assign(&crowded, &Tag::new("A"));
        assert_eq!(roles[2], (Tag::new("D"), None));
    }

    #[test]
    fn test_zero_suffix_length() {
        assert_eq!(
            RoleTable::new(vec![], 0).unwrap_err(),
            AnalysisConfigError::ZeroSuffixLength
        );
    }
}
