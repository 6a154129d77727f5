//! Tag graph derived from post metadata.
//!
//! Tags are created on first mention and never removed. Each tag remembers the
//! posts that mention it, in first-mention order and without duplicates.

use crate::registry::{Id, Registry, RegistryError, tag_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub label: String,
    pub id: Id,
    /// Posts mentioning this tag, in insertion order.
    pub mentions: Vec<Id>,
}

#[derive(Debug, Default)]
pub struct Taxonomy {
    tags: Vec<Tag>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `post` mentions `label` and return the tag's identifier.
    ///
    /// Labels match byte for byte; `Rust` and `rust` are different tags. A
    /// new label mints its identifier through `registry` under `TAG:<label>`.
    pub fn assure_label(
        &mut self,
        registry: &mut Registry,
        label: &str,
        post: Id,
    ) -> Result<Id, RegistryError> {
        if let Some(tag) = self.tags.iter_mut().find(|tag| tag.label == label) {
            if !tag.mentions.contains(&post) {
                tag.mentions.push(post);
            }
            return Ok(tag.id);
        }

        let id = registry.assure(&tag_key(label))?;
        self.tags.push(Tag {
            label: label.to_owned(),
            id,
            mentions: vec![post],
        });
        Ok(id)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get(&self, id: Id) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn registry() -> Registry {
        Registry::empty(Path::new("lock.xml"))
    }

    #[test]
    fn test_new_label_mints_tag_key() {
        let mut registry = registry();
        let post = registry.assure("POST:a").unwrap();
        let mut taxonomy = Taxonomy::new();

        let id = taxonomy.assure_label(&mut registry, "rust", post).unwrap();

        assert_eq!(id.get(), 2);
        assert_eq!(registry.assure("TAG:rust").unwrap(), id);
        assert_eq!(taxonomy.tags()[0].mentions, [post]);
    }

    #[test]
    fn test_repeated_mention_is_recorded_once() {
        let mut registry = registry();
        let post = registry.assure("POST:a").unwrap();
        let mut taxonomy = Taxonomy::new();

        let first = taxonomy.assure_label(&mut registry, "rust", post).unwrap();
        let second = taxonomy.assure_label(&mut registry, "rust", post).unwrap();

        assert_eq!(first, second);
        assert_eq!(taxonomy.len(), 1);
        assert_eq!(taxonomy.get(first).unwrap().mentions, [post]);
    }

    #[test]
    fn test_mentions_keep_insertion_order() {
        let mut registry = registry();
        let a = registry.assure("POST:a").unwrap();
        let b = registry.assure("POST:b").unwrap();
        let mut taxonomy = Taxonomy::new();

        let tag = taxonomy.assure_label(&mut registry, "x", b).unwrap();
        taxonomy.assure_label(&mut registry, "x", a).unwrap();
        taxonomy.assure_label(&mut registry, "x", b).unwrap();

        assert_eq!(taxonomy.get(tag).unwrap().mentions, [b, a]);
        // Existing labels never touch the registry again.
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let mut registry = registry();
        let post = registry.assure("POST:a").unwrap();
        let mut taxonomy = Taxonomy::new();

        let lower = taxonomy.assure_label(&mut registry, "rust", post).unwrap();
        let upper = taxonomy.assure_label(&mut registry, "Rust", post).unwrap();

        assert_ne!(lower, upper);
        assert_eq!(taxonomy.len(), 2);
    }

    #[test]
    fn test_tag_reuses_id_from_previous_run() {
        let mut registry = registry();
        registry.assure("TAG:old").unwrap();
        let post = registry.assure("POST:a").unwrap();
        let mut taxonomy = Taxonomy::new();

        let id = taxonomy.assure_label(&mut registry, "old", post).unwrap();
        assert_eq!(id.get(), 1);
    }
}
