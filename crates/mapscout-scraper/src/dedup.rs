use std::collections::HashSet;

/// Names captured during one collection run.
///
/// Created fresh by every run and dropped with it; nothing is shared
/// between runs.
#[derive(Debug, Default, Clone)]
pub struct DedupRegistry {
    names: HashSet<String>,
}

impl DedupRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name`. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
