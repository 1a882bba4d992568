use bson::Document as BsonDocument;

/// Result sequence of a find or aggregate. Iterates lazily over the matched documents and
/// can be rewound to replay the same results.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    docs: Vec<BsonDocument>,
    pos: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(docs: Vec<BsonDocument>) -> Self {
        Self { docs, pos: 0 }
    }

    pub fn advance(&mut self) -> Option<BsonDocument> {
        let d = self.docs.get(self.pos)?.clone();
        self.pos += 1;
        Some(d)
    }

    /// Restart from the first result.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Total number of results, independent of the current position.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// All results from the current position on.
    #[must_use]
    pub fn to_vec(mut self) -> Vec<BsonDocument> {
        if self.pos == 0 {
            return self.docs;
        }
        self.docs.split_off(self.pos.min(self.docs.len()))
    }
}

impl Iterator for Cursor {
    type Item = BsonDocument;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.docs.len().saturating_sub(self.pos);
        (rest, Some(rest))
    }
}
