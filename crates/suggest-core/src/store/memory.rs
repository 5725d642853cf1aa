//! In-process backend.
//!
//! Indices are ordered maps from id to JSON document, so unsorted scans and
//! searches return documents in id order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use serde_json::Value;
use uuid::Uuid;

use super::{
    compare_values, get_field, BulkFailure, BulkOperation, BulkResponse, Condition, Hit, ScanPage, ScanRequest,
    SearchRequest, SearchResponse, SettingsStore, SortField, SortOrder, SuggestStore,
};
use crate::error::{Error, Result};
use crate::item::{apply_update, SuggestItem};

type Documents = BTreeMap<String, Value>;

struct Scan {
    pending: VecDeque<Hit>,
    page_size: usize,
}

impl Scan {
    fn next_page(&mut self, cursor: &str) -> ScanPage {
        let take = self.page_size.min(self.pending.len());
        ScanPage {
            cursor: Some(cursor.to_string()),
            hits: self.pending.drain(..take).collect(),
        }
    }
}

/// [`SuggestStore`] kept entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    indices: RwLock<FxHashMap<String, Documents>>,
    scans: Mutex<FxHashMap<String, Scan>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indices = self.indices.read();
        let mut sizes: Vec<(&String, usize)> = indices.iter().map(|(k, v)| (k, v.len())).collect();
        sizes.sort();
        f.debug_struct("InMemoryStore")
            .field("indices", &sizes)
            .field("open_scans", &self.scans.lock().len())
            .finish()
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `index`.
    #[must_use]
    pub fn len(&self, index: &str) -> usize {
        self.indices.read().get(index).map_or(0, BTreeMap::len)
    }

    /// Returns true if `index` holds no documents.
    #[must_use]
    pub fn is_empty(&self, index: &str) -> bool {
        self.len(index) == 0
    }

    /// Number of scans not yet closed.
    #[must_use]
    pub fn open_scans(&self) -> usize {
        self.scans.lock().len()
    }

    fn matching(&self, index: &str, filter: &Condition, sort: &[SortField]) -> Vec<Hit> {
        let indices = self.indices.read();
        let mut hits: Vec<Hit> = indices
            .get(index)
            .into_iter()
            .flatten()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, doc)| Hit {
                id: id.clone(),
                source: doc.clone(),
            })
            .collect();
        drop(indices);
        sort_hits(&mut hits, sort);
        hits
    }
}

fn sort_hits(hits: &mut [Hit], sort: &[SortField]) {
    if sort.is_empty() {
        return;
    }
    hits.sort_by(|a, b| {
        sort.iter()
            .map(|key| {
                let left = get_field(&a.source, &key.field);
                let right = get_field(&b.source, &key.field);
                // Missing values sort last in either direction
                match (left, right) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(l), Some(r)) => {
                        let ord = compare_values(l, r).unwrap_or(Ordering::Equal);
                        match key.order {
                            SortOrder::Asc => ord,
                            SortOrder::Desc => ord.reverse(),
                        }
                    }
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });
}

impl SuggestStore for InMemoryStore {
    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let mut hits = self.matching(index, &request.filter, &request.sort);
        let total = hits.len() as u64;

        if let Some(rescore) = request.rescore {
            let window = rescore.window_size.min(hits.len());
            let mut rng = StdRng::seed_from_u64(rescore.seed);
            hits[..window].shuffle(&mut rng);
        }

        let hits = hits.into_iter().skip(request.from).take(request.size).collect();
        Ok(SearchResponse {
            total,
            hits,
            took: started.elapsed(),
        })
    }

    fn count(&self, index: &str, filter: &Condition) -> Result<u64> {
        let indices = self.indices.read();
        let count = indices
            .get(index)
            .map_or(0, |docs| docs.values().filter(|doc| filter.matches(doc)).count());
        Ok(count as u64)
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<Value>> {
        Ok(self.indices.read().get(index).and_then(|docs| docs.get(id)).cloned())
    }

    fn bulk(&self, index: &str, operations: Vec<BulkOperation>) -> Result<BulkResponse> {
        let mut indices = self.indices.write();
        let docs = indices.entry(index.to_string()).or_default();
        let mut response = BulkResponse::default();

        for op in operations {
            match op {
                BulkOperation::Index { id, document } => {
                    docs.insert(id, document);
                    response.succeeded += 1;
                }
                BulkOperation::Upsert { item } => match upsert(docs, &item) {
                    Ok(()) => response.succeeded += 1,
                    Err(e) => response.failures.push(BulkFailure {
                        id: item.id().to_string(),
                        message: e.to_string(),
                    }),
                },
                BulkOperation::Delete { id } => {
                    docs.remove(&id);
                    response.succeeded += 1;
                }
            }
        }
        Ok(response)
    }

    fn delete_by_query(&self, index: &str, filter: &Condition) -> Result<u64> {
        let mut indices = self.indices.write();
        let Some(docs) = indices.get_mut(index) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    fn open_scan(&self, index: &str, request: &ScanRequest) -> Result<ScanPage> {
        let mut hits = self.matching(index, &request.filter, &request.sort);
        if let Some(max) = request.max_docs {
            hits.truncate(max);
        }
        let cursor = Uuid::new_v4().to_string();
        let mut scan = Scan {
            pending: hits.into(),
            page_size: request.page_size.max(1),
        };
        let page = scan.next_page(&cursor);
        self.scans.lock().insert(cursor, scan);
        Ok(page)
    }

    fn continue_scan(&self, cursor: &str) -> Result<ScanPage> {
        let mut scans = self.scans.lock();
        let scan = scans
            .get_mut(cursor)
            .ok_or_else(|| Error::backend(format!("unknown scan cursor '{cursor}'")))?;
        Ok(scan.next_page(cursor))
    }

    fn close_scan(&self, cursor: &str) -> Result<()> {
        self.scans.lock().remove(cursor);
        Ok(())
    }

    fn refresh(&self, _index: &str) -> Result<()> {
        Ok(())
    }
}

fn upsert(docs: &mut Documents, incoming: &SuggestItem) -> Result<()> {
    let stored = docs
        .get(incoming.id())
        .map(|doc| SuggestItem::from_document(doc.clone()))
        .transpose()?;
    let merged = apply_update(stored, incoming);
    docs.insert(merged.id().to_string(), merged.to_document()?);
    Ok(())
}

/// [`SettingsStore`] kept in memory.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: Mutex<FxHashMap<String, String>>,
}

impl InMemorySettings {
    /// Creates an empty settings store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}
