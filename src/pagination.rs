//! Fixed-size result pages plus a lookup table by document id

use crate::retrieval::Hit;
use ahash::{HashMap, HashMapExt};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Ranked hits split into 1-based pages
///
/// Concatenating the pages in order yields the input sequence. An empty
/// result is a single empty page 1.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPages {
    pages: BTreeMap<usize, Vec<Hit>>,
    #[serde(skip)]
    index: HashMap<String, Hit>,
    total: usize,
    page_size: usize,
}

impl ResultPages {
    /// A `page_size` of 0 is treated as 1
    pub fn paginate(hits: Vec<Hit>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total = hits.len();

        let mut index = HashMap::with_capacity(total);
        for hit in &hits {
            index.entry(hit.doc_id.clone()).or_insert_with(|| hit.clone());
        }

        let mut pages = BTreeMap::new();
        for (i, chunk) in hits.chunks(page_size).enumerate() {
            pages.insert(i + 1, chunk.to_vec());
        }
        if pages.is_empty() {
            pages.insert(1, Vec::new());
        }

        Self {
            pages,
            index,
            total,
            page_size,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Hits on page `n` (1-based)
    pub fn page(&self, n: usize) -> Option<&[Hit]> {
        self.pages.get(&n).map(Vec::as_slice)
    }

    pub fn pages(&self) -> &BTreeMap<usize, Vec<Hit>> {
        &self.pages
    }

    /// No results remain past page `n`
    pub fn is_last_page(&self, n: usize) -> bool {
        self.total <= n.saturating_mul(self.page_size)
    }

    /// Look up a returned document by id
    pub fn get(&self, doc_id: &str) -> Option<&Hit> {
        self.index.get(doc_id)
    }

    pub fn index(&self) -> &HashMap<String, Hit> {
        &self.index
    }

    /// All hits in rank order
    pub fn hits(&self) -> impl Iterator<Item = &Hit> {
        self.pages.values().flatten()
    }
}
