//! Ordered, key-indexed record collections

use std::collections::{HashMap, HashSet};

use crate::types::{member_url, Page, Record};

/// Records of one type bound to a list endpoint.
///
/// Records keep their insertion order; lookups by key go through an index.
/// The pagination metadata of the last parsed page is kept alongside.
#[derive(Debug, Clone)]
pub struct Collection<R: Record> {
    url: String,
    records: Vec<R>,
    index: HashMap<R::Key, usize>,
    next: Option<String>,
    previous: Option<String>,
    count: Option<u64>,
}

impl<R: Record> Collection<R> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            records: Vec::new(),
            index: HashMap::new(),
            next: None,
            previous: None,
            count: None,
        }
    }

    /// List endpoint this collection is bound to
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// Mutable access by key. Changing the record's key through this
    /// reference leaves the index stale; use [`Collection::add`] instead.
    pub fn get_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        match self.index.get(key) {
            Some(&i) => self.records.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.index.contains_key(key)
    }

    /// URL of the next page from the last response
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Total count reported by the last response
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Record a page's pagination metadata and hand back its results
    pub fn parse(&mut self, page: Page<R>) -> Vec<R> {
        self.next = page.next;
        self.previous = page.previous;
        self.count = page.count;
        page.results
    }

    /// Merge `records` into the collection.
    ///
    /// Records whose key is already present replace the existing entry in
    /// place; others are appended. With `remove`, existing records missing
    /// from `records` are dropped first.
    pub fn set(&mut self, records: Vec<R>, remove: bool) {
        if remove {
            let keep: HashSet<R::Key> = records.iter().filter_map(|r| r.key()).collect();
            self.records
                .retain(|r| r.key().map(|k| keep.contains(&k)).unwrap_or(false));
            self.reindex();
        }
        for record in records {
            self.add(record);
        }
    }

    /// Insert a record, replacing any existing one with the same key
    pub fn add(&mut self, record: R) -> &R {
        let key = record.key();
        let existing = key.as_ref().and_then(|k| self.index.get(k).copied());
        let position = match existing {
            Some(i) => {
                self.records[i] = record;
                i
            }
            None => {
                let i = self.records.len();
                if let Some(k) = key {
                    self.index.insert(k, i);
                }
                self.records.push(record);
                i
            }
        };
        &self.records[position]
    }

    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        let i = self.index.remove(key)?;
        let record = self.records.remove(i);
        self.reindex();
        Some(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Detail URL for a key, built from the collection URL
    pub fn member_url(&self, key: &R::Key) -> String {
        member_url(&self.url, key)
    }

    /// Detail URL for a record: its `self` link, else built from its key
    pub fn record_url(&self, record: &R) -> Option<String> {
        record.url(&self.url)
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.key().map(|k| (k, i)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;

    fn task(id: u64, name: &str) -> Task {
        Task {
            id: Some(id),
            name: name.to_string(),
            ..Task::default()
        }
    }

    fn names(collection: &Collection<Task>) -> Vec<&str> {
        collection.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_parse_records_pagination() {
        let mut tasks = Collection::<Task>::new("http://api/tasks/");
        let page = Page {
            next: Some("http://api/tasks/?page=2".to_string()),
            previous: None,
            count: Some(3),
            results: vec![task(1, "a")],
        };

        let results = tasks.parse(page);

        assert_eq!(results.len(), 1);
        assert_eq!(tasks.next(), Some("http://api/tasks/?page=2"));
        assert_eq!(tasks.count(), Some(3));
    }

    #[test]
    fn test_set_merges_in_place() {
        let mut tasks = Collection::new("http://api/tasks/");
        tasks.set(vec![task(1, "a"), task(2, "b")], true);
        tasks.set(vec![task(2, "b2"), task(3, "c")], false);

        assert_eq!(names(&tasks), vec!["a", "b2", "c"]);
        assert_eq!(tasks.get(&2).unwrap().name, "b2");
    }

    #[test]
    fn test_set_with_remove_drops_missing() {
        let mut tasks = Collection::new("http://api/tasks/");
        tasks.set(vec![task(1, "a"), task(2, "b"), task(3, "c")], true);
        tasks.set(vec![task(3, "c"), task(4, "d")], true);

        assert_eq!(names(&tasks), vec!["c", "d"]);
        assert!(!tasks.contains(&1));
        assert_eq!(tasks.get(&4).unwrap().name, "d");
    }

    #[test]
    fn test_remove_reindexes() {
        let mut tasks = Collection::new("http://api/tasks/");
        tasks.set(vec![task(1, "a"), task(2, "b"), task(3, "c")], true);

        let removed = tasks.remove(&1).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(tasks.get(&3).unwrap().name, "c");
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_unsaved_records_are_appended() {
        let mut tasks = Collection::new("http://api/tasks/");
        tasks.add(Task::new("draft"));
        tasks.add(Task::new("draft"));
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_member_url() {
        let tasks = Collection::<Task>::new("http://api/tasks/");
        assert_eq!(tasks.member_url(&9), "http://api/tasks/9");
    }
}
