use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Transient numeric identifier assigned to an individual by the tracker.
pub type AnimalId = u32;

/// Persistent identifier (RFID) of a tracked individual.
///
/// Tags are compared as strings. Before identity resolution a tag is simply the
/// decimal [`AnimalId`].
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag of an individual whose identity has not been resolved.
    #[must_use]
    pub fn from_animal_id(id: AnimalId) -> Self {
        Self(id.to_string())
    }

    /// Left-pads `raw` with zeros up to `width` characters.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_table::Tag;
    /// assert_eq!(Tag::zero_padded("4711", 12).as_str(), "000000004711");
    /// assert_eq!(Tag::zero_padded("1234567890123", 12).as_str(), "1234567890123");
    /// ```
    #[must_use]
    pub fn zero_padded(raw: &str, width: usize) -> Self {
        Self(format!("{:0>width$}", raw.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric id this tag was derived from, if it is still unresolved.
    ///
    /// Only the canonical decimal form counts: a zero-padded RFID such as
    /// `000004711042` is already a resolved tag.
    #[must_use]
    pub fn animal_id(&self) -> Option<AnimalId> {
        self.0
            .parse::<AnimalId>()
            .ok()
            .filter(|id| id.to_string() == self.0)
    }

    /// The last `len` characters of the tag (the whole tag if it is shorter).
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_table::Tag;
    /// assert_eq!(Tag::new("000004711042").suffix(3), "042");
    /// assert_eq!(Tag::new("42").suffix(3), "42");
    /// ```
    #[must_use]
    pub fn suffix(&self, len: usize) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(len.saturating_sub(1))
            .map_or(0, |(idx, _)| idx);
        if len == 0 { "" } else { &self.0[start..] }
    }
}

/// One entry of the tracker's animal table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub id: AnimalId,
    pub rfid: String,
}

/// Mapping from transient numeric ids to persistent tags.
///
/// Ids without an entry resolve to their decimal form, so resolution never
/// fails on its own. Collisions are detected when the table is rebuilt with
/// the resolved tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AnimalRecord>", into = "Vec<AnimalRecord>")]
pub struct IdentityMap {
    map: BTreeMap<AnimalId, Tag>,
}

impl IdentityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AnimalId, tag: Tag) {
        self.map.insert(id, tag);
    }

    #[must_use]
    pub fn get(&self, id: AnimalId) -> Option<&Tag> {
        self.map.get(&id)
    }

    /// Resolves `id`, falling back to its decimal form.
    #[must_use]
    pub fn resolve(&self, id: AnimalId) -> Tag {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| Tag::from_animal_id(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(AnimalId, Tag)> for IdentityMap {
    fn from_iter<T: IntoIterator<Item = (AnimalId, Tag)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<AnimalRecord>> for IdentityMap {
    fn from(records: Vec<AnimalRecord>) -> Self {
        records
            .into_iter()
            .map(|record| (record.id, Tag::new(record.rfid.trim())))
            .collect()
    }
}

impl From<IdentityMap> for Vec<AnimalRecord> {
    fn from(map: IdentityMap) -> Self {
        map.map
            .into_iter()
            .map(|(id, tag)| AnimalRecord { id, rfid: tag.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_id() {
        let map = IdentityMap::from_iter([(1, Tag::new("A1"))]);
        assert_eq!(map.resolve(1), Tag::new("A1"));
        assert_eq!(map.resolve(7), Tag::new("7"));
    }

    #[test]
    fn test_animal_id_of_unresolved_tag() {
        assert_eq!(Tag::from_animal_id(12).animal_id(), Some(12));
        assert_eq!(Tag::new("A1").animal_id(), None);
        assert_eq!(Tag::new("000004711042").animal_id(), None);
        assert_eq!(Tag::new("+7").animal_id(), None);
    }

    #[test]
    fn test_suffix() {
        let tag = Tag::new("000004711042");
        assert_eq!(tag.suffix(0), "");
        assert_eq!(tag.suffix(1), "2");
        assert_eq!(tag.suffix(12), "000004711042");
        assert_eq!(tag.suffix(20), "000004711042");
    }

    #[test]
    fn test_json_form() {
        let json = r#"[{"id": 1, "rfid": " 000004711042 "}, {"id": 2, "rfid": "000004711043"}]"#;
        let map: IdentityMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve(1), Tag::new("000004711042"));
    }
}
