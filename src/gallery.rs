use std::collections::HashMap;

use crate::Embedding;

/// One known identity.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub name: String,
    pub embedding: Embedding,
}

/// Named reference embeddings, iterated in insertion order.
///
/// Names are unique. Inserting a name that is already present replaces its
/// embedding in place, so the entry keeps its original position. Iteration
/// order matters to the matcher, which resolves exact distance ties in favour
/// of the entry seen first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    /// Name to position in `entries`.
    index: HashMap<String, usize>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the embedding previously stored under `name`, if any.
    pub fn insert(&mut self, name: impl Into<String>, embedding: Embedding) -> Option<Embedding> {
        let name = name.into();
        if let Some(&idx) = self.index.get(&name) {
            return Some(std::mem::replace(&mut self.entries[idx].embedding, embedding));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(GalleryEntry { name, embedding });
        None
    }

    pub fn get(&self, name: &str) -> Option<&Embedding> {
        self.index.get(name).map(|&idx| &self.entries[idx].embedding)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Embedding> {
        let idx = self.index.remove(name)?;
        let entry = self.entries.remove(idx);
        // Later entries moved down by one.
        for e in &self.entries[idx..] {
            if let Some(pos) = self.index.get_mut(&e.name) {
                *pos -= 1;
            }
        }
        Some(entry.embedding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GalleryEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

impl<'a> IntoIterator for &'a Gallery {
    type Item = &'a GalleryEntry;
    type IntoIter = std::slice::Iter<'a, GalleryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<N: Into<String>> FromIterator<(N, Embedding)> for Gallery {
    fn from_iter<I: IntoIterator<Item = (N, Embedding)>>(iter: I) -> Self {
        let mut gallery = Gallery::new();
        gallery.extend(iter);
        gallery
    }
}

impl<N: Into<String>> Extend<(N, Embedding)> for Gallery {
    fn extend<I: IntoIterator<Item = (N, Embedding)>>(&mut self, iter: I) {
        for (name, embedding) in iter {
            self.insert(name, embedding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::from_vec(v.to_vec())
    }

    #[test]
    fn test_iterates_in_insertion_order() {
        let gallery: Gallery = vec![
            ("zoe", emb(&[1.0])),
            ("adam", emb(&[2.0])),
            ("mia", emb(&[3.0])),
        ]
        .into_iter()
        .collect();
        assert_eq!(gallery.names().collect::<Vec<_>>(), ["zoe", "adam", "mia"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut gallery = Gallery::new();
        assert!(gallery.insert("alice", emb(&[0.0])).is_none());
        gallery.insert("bob", emb(&[1.0]));
        let old = gallery.insert("alice", emb(&[9.0]));

        assert_eq!(old, Some(emb(&[0.0])));
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.names().collect::<Vec<_>>(), ["alice", "bob"]);
        assert_eq!(gallery.get("alice"), Some(&emb(&[9.0])));
    }

    #[test]
    fn test_remove() {
        let mut gallery: Gallery = vec![("a", emb(&[0.0])), ("b", emb(&[1.0]))]
            .into_iter()
            .collect();
        assert_eq!(gallery.remove("a"), Some(emb(&[0.0])));
        assert!(gallery.remove("a").is_none());
        assert!(!gallery.contains("a"));
        assert!(gallery.contains("b"));
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_lookups_follow_removal_from_the_middle() {
        let mut gallery: Gallery = vec![
            ("a", emb(&[0.0])),
            ("b", emb(&[1.0])),
            ("c", emb(&[2.0])),
            ("d", emb(&[3.0])),
        ]
        .into_iter()
        .collect();
        gallery.remove("b");

        assert_eq!(gallery.get("c"), Some(&emb(&[2.0])));
        assert_eq!(gallery.get("d"), Some(&emb(&[3.0])));

        // Replacing a shifted entry must hit that entry, not its old slot.
        assert_eq!(gallery.insert("d", emb(&[9.0])), Some(emb(&[3.0])));
        assert_eq!(gallery.get("c"), Some(&emb(&[2.0])));

        gallery.insert("b", emb(&[5.0]));
        assert_eq!(gallery.names().collect::<Vec<_>>(), ["a", "c", "d", "b"]);
        assert_eq!(gallery.get("b"), Some(&emb(&[5.0])));
        assert_eq!(gallery.get("d"), Some(&emb(&[9.0])));
    }
}
