use std::collections::HashMap;

use indexmap::IndexMap;

use crate::core::geometry::{union_all, BBox};
use crate::core::model::{LayoutElement, UNKNOWN_QUESTION};

/// Mutable mapping from question id to the elements currently believed to
/// belong to it.
///
/// Each element id lives in at most one bucket; inserting an element that is
/// already owned moves it. The owner index keeps "who owns element N" an O(1)
/// lookup.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    buckets: IndexMap<String, Vec<LayoutElement>>,
    owners: HashMap<u32, String>,
}

impl Assignment {
    pub fn new<I, S>(question_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets = IndexMap::new();
        for id in question_ids {
            buckets.entry(id.into()).or_insert_with(Vec::new);
        }
        Self {
            buckets,
            owners: HashMap::new(),
        }
    }

    /// Places `element` under `question_id`, removing it from any previous
    /// bucket. Returns the previous owner, if any.
    pub fn insert(&mut self, question_id: &str, element: LayoutElement) -> Option<String> {
        let previous = self.detach(element.id);
        self.owners.insert(element.id, question_id.to_string());
        self.buckets
            .entry(question_id.to_string())
            .or_default()
            .push(element);
        previous.map(|(owner, _)| owner)
    }

    /// Moves an element between buckets. Returns false when `from` does not
    /// currently hold the element.
    pub fn move_element(&mut self, element_id: u32, from: &str, to: &str) -> bool {
        if self.owner_of(element_id) != Some(from) {
            return false;
        }
        match self.detach(element_id) {
            Some((_, element)) => {
                self.insert(to, element);
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, element_id: u32) -> Option<(String, LayoutElement)> {
        let owner = self.owners.remove(&element_id)?;
        let bucket = self.buckets.get_mut(&owner)?;
        let pos = bucket.iter().position(|e| e.id == element_id)?;
        Some((owner, bucket.remove(pos)))
    }

    pub fn owner_of(&self, element_id: u32) -> Option<&str> {
        self.owners.get(&element_id).map(String::as_str)
    }

    /// Locates the owner of an element by box geometry alone, for element
    /// copies whose id is not tracked here. The first bucket in question order
    /// holding a box within `epsilon` pixels on every side wins.
    pub fn find_owner_by_box(&self, bbox: &BBox, epsilon: i32) -> Option<(&str, u32)> {
        self.buckets.iter().find_map(|(question_id, elements)| {
            elements
                .iter()
                .find(|e| e.bbox.approx_eq(bbox, epsilon))
                .map(|e| (question_id.as_str(), e.id))
        })
    }

    pub fn elements(&self, question_id: &str) -> &[LayoutElement] {
        self.buckets
            .get(question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn unknown(&self) -> &[LayoutElement] {
        self.elements(UNKNOWN_QUESTION)
    }

    /// Union box of a question's elements; empty when nothing with a box is
    /// assigned.
    pub fn question_box(&self, question_id: &str) -> BBox {
        union_all(self.elements(question_id).iter().map(|e| &e.bbox))
    }

    /// Question ids in bucket order, without the `unknown` bucket.
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.buckets
            .keys()
            .map(String::as_str)
            .filter(|id| *id != UNKNOWN_QUESTION)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Question id to element ids, questions in bucket order and `unknown`
    /// last (always present).
    pub fn to_id_map(&self) -> IndexMap<String, Vec<u32>> {
        let mut map: IndexMap<String, Vec<u32>> = self
            .question_ids()
            .map(|id| {
                (
                    id.to_string(),
                    self.elements(id).iter().map(|e| e.id).collect(),
                )
            })
            .collect();
        map.insert(
            UNKNOWN_QUESTION.to_string(),
            self.unknown().iter().map(|e| e.id).collect(),
        );
        map
    }
}
