use crate::domain::ports::collection_directory::CollectionDirectory;
use dashmap::DashMap;

/// Process-local collection name → id map.
#[derive(Default)]
pub struct InMemoryDirectory {
    entries: DashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionDirectory for InMemoryDirectory {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    fn get_or_insert(&self, name: &str, id: String) -> String {
        self.entries
            .entry(name.to_string())
            .or_insert(id)
            .value()
            .clone()
    }

    fn put(&self, name: &str, id: String) {
        self.entries.insert(name.to_string(), id);
    }

    fn remove(&self, name: &str) -> Option<String> {
        self.entries.remove(name).map(|(_, id)| id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_insert_wins() {
        let dir = InMemoryDirectory::new();
        assert_eq!(dir.get_or_insert("docs", "a".into()), "a");
        assert_eq!(dir.get_or_insert("docs", "b".into()), "a");
        assert_eq!(dir.get("docs").as_deref(), Some("a"));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_put_overwrites_and_remove() {
        let dir = InMemoryDirectory::new();
        dir.put("docs", "a".into());
        dir.put("docs", "b".into());
        assert_eq!(dir.remove("docs").as_deref(), Some("b"));
        assert!(dir.get("docs").is_none());
        assert!(dir.is_empty());
    }

    #[test]
    fn test_concurrent_get_or_insert_agrees() {
        let dir = Arc::new(InMemoryDirectory::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = Arc::clone(&dir);
                std::thread::spawn(move || dir.get_or_insert("docs", format!("id-{i}")))
            })
            .collect();
        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert_eq!(dir.len(), 1);
    }
}
