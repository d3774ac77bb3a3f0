/// Name → identifier cache for collections.
///
/// Not authoritative: any entry can be rebuilt from a live listing. Shared by
/// concurrent callers, so every operation is atomic per key.
pub trait CollectionDirectory: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// Inserts `id` unless the name is already mapped, and returns whichever
    /// identifier ends up stored.
    fn get_or_insert(&self, name: &str, id: String) -> String;

    fn put(&self, name: &str, id: String);

    /// Returns the removed identifier, if any.
    fn remove(&self, name: &str) -> Option<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
