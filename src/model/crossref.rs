//! Cross-reference blocks and the per-page queue.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A pre-laid-out block of cross-references for one citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceBlock {
    /// Citation the block belongs to (e.g. "Gen 1:3")
    pub citation: String,

    /// Rendered lines of the block
    pub entries: Vec<String>,

    /// Total height in points
    pub total_height: f32,
}

impl CrossReferenceBlock {
    /// Create a block with a known height.
    pub fn new(citation: impl Into<String>, entries: Vec<String>, total_height: f32) -> Self {
        Self {
            citation: citation.into(),
            entries,
            total_height,
        }
    }

    /// Height of each entry line.
    pub fn entry_height(&self) -> f32 {
        if self.entries.is_empty() {
            0.0
        } else {
            self.total_height / self.entries.len() as f32
        }
    }
}

/// Supplies cross-reference blocks by citation.
pub trait CrossReferenceSource {
    /// Look up the block for a citation.
    fn lookup(&self, citation: &str) -> Option<CrossReferenceBlock>;
}

impl<F> CrossReferenceSource for F
where
    F: Fn(&str) -> Option<CrossReferenceBlock>,
{
    fn lookup(&self, citation: &str) -> Option<CrossReferenceBlock> {
        self(citation)
    }
}

/// In-memory cross-reference table with a fixed height per entry line.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceTable {
    entries: HashMap<String, Vec<String>>,
    line_height: f32,
}

impl CrossReferenceTable {
    /// Create an empty table.
    pub fn new(line_height: f32) -> Self {
        Self {
            entries: HashMap::new(),
            line_height,
        }
    }

    /// Load a table from a JSON object mapping citations to entry lists.
    pub fn from_json(json: &str, line_height: f32) -> Result<Self> {
        let entries: HashMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            entries,
            line_height,
        })
    }

    /// Add the entries for a citation.
    pub fn insert(&mut self, citation: impl Into<String>, entries: Vec<String>) {
        self.entries.insert(citation.into(), entries);
    }

    /// Number of citations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CrossReferenceSource for CrossReferenceTable {
    fn lookup(&self, citation: &str) -> Option<CrossReferenceBlock> {
        let entries = self.entries.get(citation)?;
        if entries.is_empty() {
            return None;
        }
        Some(CrossReferenceBlock::new(
            citation,
            entries.clone(),
            entries.len() as f32 * self.line_height,
        ))
    }
}

/// A block waiting to be drawn, with the page position of the line that
/// introduced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedCrossReference {
    /// The looked-up entries
    pub block: CrossReferenceBlock,
    /// Offset of the introducing line from the page top
    pub page_y: f32,
}

/// Cross-reference blocks pending on the current page.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceQueue {
    items: Vec<QueuedCrossReference>,
}

impl CrossReferenceQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a block introduced at `page_y`.
    pub fn push(&mut self, block: CrossReferenceBlock, page_y: f32) {
        self.items.push(QueuedCrossReference { block, page_y });
    }

    /// Sum of the heights of all queued blocks.
    pub fn total_height(&self) -> f32 {
        self.items.iter().map(|q| q.block.total_height).sum()
    }

    /// Number of queued blocks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over queued blocks in order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedCrossReference> {
        self.items.iter()
    }

    /// Remove and return all queued blocks.
    pub fn drain(&mut self) -> Vec<QueuedCrossReference> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        let mut table = CrossReferenceTable::new(7.0);
        table.insert("Gen 1:1", vec!["John 1:1".into(), "Heb 11:3".into()]);

        let block = table.lookup("Gen 1:1").unwrap();
        assert_eq!(block.total_height, 14.0);
        assert_eq!(block.entry_height(), 7.0);
        assert!(table.lookup("Gen 1:2").is_none());
    }

    #[test]
    fn test_table_from_json() {
        let table =
            CrossReferenceTable::from_json(r#"{"Ps 23:1": ["John 10:11"]}"#, 8.0).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("Ps 23:1").unwrap().total_height, 8.0);
        assert!(CrossReferenceTable::from_json("[1, 2]", 8.0).is_err());
    }

    #[test]
    fn test_closure_source() {
        let source = |citation: &str| Some(CrossReferenceBlock::new(citation, vec![], 3.0));
        assert_eq!(source.lookup("x").unwrap().total_height, 3.0);
    }

    #[test]
    fn test_queue() {
        let mut queue = CrossReferenceQueue::new();
        queue.push(CrossReferenceBlock::new("a", vec!["b".into()], 10.0), 50.0);
        queue.push(CrossReferenceBlock::new("c", vec!["d".into()], 5.0), 80.0);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.total_height(), 15.0);

        let drained = queue.drain();
        assert_eq!(drained[1].page_y, 80.0);
        assert!(queue.is_empty());
    }
}
