use snitch_diff_client::NodeIndexMap;
use snitch_diff_client::NodeRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("node {model}/{id} has offset {offset}, outside nodecount {nodecount}")]
    OffsetOutOfRange {
        model: String,
        id: String,
        offset: usize,
        nodecount: usize,
    },
}

/// Result of [`NodeIndex::fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Applied,
    /// The page starts behind the cursor and was dropped untouched.
    Stale,
}

/// Fixed-size record array addressed through the structure's `nodemap`.
///
/// The map and the slot count are set once at allocation and never change.
/// Slots start as holes and are filled in increasing-offset order as node
/// pages arrive; a hole simply means "not loaded yet".
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    map: NodeIndexMap,
    records: Vec<Option<NodeRecord>>,
    cursor: usize,
    loaded: usize,
}

impl NodeIndex {
    /// Allocate `nodecount` holes. Every offset in `map` must be addressable.
    pub fn allocate(map: NodeIndexMap, nodecount: usize) -> Result<Self, IndexError> {
        for (model, ids) in &map {
            for (id, &offset) in ids {
                if offset >= nodecount {
                    return Err(IndexError::OffsetOutOfRange {
                        model: model.clone(),
                        id: id.clone(),
                        offset,
                        nodecount,
                    });
                }
            }
        }
        Ok(Self {
            map,
            records: vec![None; nodecount],
            cursor: 0,
            loaded: 0,
        })
    }

    pub fn offset_of(&self, model: &str, id: &str) -> Option<usize> {
        self.map.get(model)?.get(id).copied()
    }

    pub fn record(&self, model: &str, id: &str) -> Option<&NodeRecord> {
        self.record_at(self.offset_of(model, id)?)
    }

    pub fn record_at(&self, offset: usize) -> Option<&NodeRecord> {
        self.records.get(offset)?.as_ref()
    }

    /// Store a page that starts at `offset`. Records past the end of the
    /// array are dropped with a warning; the cursor still advances by the
    /// full page length so the next request lines up with the server.
    pub fn fill(&mut self, offset: usize, records: Vec<NodeRecord>) -> FillOutcome {
        if offset < self.cursor {
            tracing::trace!(offset, cursor = self.cursor, "dropping stale node page");
            return FillOutcome::Stale;
        }

        let page_len = records.len();
        let mut overflow = 0usize;
        for (slot, record) in (offset..).zip(records) {
            match self.records.get_mut(slot) {
                Some(entry) => {
                    if entry.is_none() {
                        self.loaded += 1;
                    }
                    *entry = Some(record);
                }
                None => overflow += 1,
            }
        }
        if overflow > 0 {
            tracing::warn!(
                offset,
                overflow,
                nodecount = self.records.len(),
                "node page runs past nodecount; extra records dropped"
            );
        }

        self.cursor = offset + page_len;
        FillOutcome::Applied
    }

    /// Offset the next page is expected at.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of filled slots.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Number of slots, i.e. the structure's `nodecount`.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.loaded == self.records.len()
    }

    pub fn map(&self) -> &NodeIndexMap {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn map(entries: &[(&str, &str, usize)]) -> NodeIndexMap {
        let mut map: NodeIndexMap = BTreeMap::new();
        for (model, id, offset) in entries {
            map.entry(model.to_string())
                .or_default()
                .insert(id.to_string(), *offset);
        }
        map
    }

    fn record(name: &str) -> NodeRecord {
        NodeRecord {
            both: [("name".to_string(), json!(name))].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn allocation_rejects_offsets_outside_nodecount() {
        let err = NodeIndex::allocate(map(&[("Host", "h1", 0), ("Host", "h2", 2)]), 2)
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::OffsetOutOfRange {
                model: "Host".to_string(),
                id: "h2".to_string(),
                offset: 2,
                nodecount: 2,
            }
        );
    }

    #[test]
    fn holes_until_filled() {
        let mut index =
            NodeIndex::allocate(map(&[("Host", "h1", 0), ("Host", "h2", 1)]), 2).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.record("Host", "h1"), None);
        assert_eq!(index.record("Host", "nope"), None);

        assert_eq!(index.fill(0, vec![record("a")]), FillOutcome::Applied);
        assert_eq!(index.record("Host", "h1"), Some(&record("a")));
        assert_eq!(index.record("Host", "h2"), None);
        assert_eq!(index.loaded(), 1);
        assert_eq!(index.cursor(), 1);
        assert!(!index.is_complete());

        index.fill(1, vec![record("b")]);
        assert!(index.is_complete());
    }

    #[test]
    fn stale_page_does_not_mutate() {
        let mut index = NodeIndex::allocate(map(&[("Host", "h1", 0)]), 3).unwrap();
        index.fill(0, vec![record("a"), record("b")]);

        assert_eq!(index.fill(0, vec![record("x"), record("y")]), FillOutcome::Stale);
        assert_eq!(index.record_at(0), Some(&record("a")));
        assert_eq!(index.cursor(), 2);
        assert_eq!(index.loaded(), 2);
    }

    #[test]
    fn overflow_past_nodecount_is_dropped() {
        let mut index = NodeIndex::allocate(BTreeMap::new(), 2).unwrap();
        let outcome = index.fill(0, vec![record("a"), record("b"), record("c")]);

        assert_eq!(outcome, FillOutcome::Applied);
        assert_eq!(index.len(), 2);
        assert_eq!(index.loaded(), 2);
        assert_eq!(index.cursor(), 3);
    }

    #[test]
    fn empty_index_is_complete() {
        let index = NodeIndex::default();
        assert!(index.is_empty());
        assert!(index.is_complete());
        assert_eq!(index.record_at(0), None);
    }
}
