use std::{
    collections::{hash_map, HashMap},
    hash::Hash,
};

use crate::in_mem::InMemTable;

/// Maps a key derived from each entry to the rows holding it.
pub struct Index<K, E> {
    map: HashMap<K, Vec<usize>>,
    keys: Vec<Option<K>>,
    get_key: fn(&E) -> K,
}

impl<K, E> Index<K, E>
where
    K: Hash + Eq + Clone,
{
    pub fn new(get_key: fn(&E) -> K) -> Self {
        Self {
            map: HashMap::new(),
            keys: Vec::new(),
            get_key,
        }
    }

    pub fn key_of(&self, entry: &E) -> K {
        (self.get_key)(entry)
    }

    /// First row holding `key`.
    pub fn row_of(&self, key: &K) -> Option<usize> {
        self.map.get(key).and_then(|rows| rows.first().copied())
    }

    pub fn rows_of(&self, key: &K) -> &[usize] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, Vec<usize>> {
        self.map.keys()
    }

    pub fn rebuild(&mut self, table: &InMemTable<E>) {
        self.map.clear();
        self.keys.clear();
        for row in table.iter() {
            self.set(row.row, row.entry);
        }
    }

    pub fn set(&mut self, row: usize, entry: &E) {
        let key = (self.get_key)(entry);

        if row >= self.keys.len() {
            self.keys.resize_with(row + 1, || None);
        }

        if let Some(old) = self.keys[row].take() {
            if let hash_map::Entry::Occupied(mut e) = self.map.entry(old) {
                e.get_mut().retain(|r| *r != row);
                if e.get().is_empty() {
                    e.remove();
                }
            }
        }

        let rows = self.map.entry(key.clone()).or_default();
        if let Err(pos) = rows.binary_search(&row) {
            rows.insert(pos, row);
        }
        self.keys[row] = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_char(s: &&'static str) -> char {
        s.chars().next().unwrap_or_default()
    }

    #[test]
    fn rebuild_skips_holes() {
        let table = InMemTable::from_rows(vec![Some("apple"), None, Some("avocado")]);
        let mut index = Index::new(first_char);

        index.rebuild(&table);

        assert_eq!(index.rows_of(&'a'), &[0, 2]);
        assert_eq!(index.row_of(&'b'), None);
    }

    #[test]
    fn set_moves_row_between_keys() {
        let mut index = Index::new(first_char);
        index.set(0, &"apple");
        index.set(1, &"banana");

        index.set(0, &"cherry");

        assert_eq!(index.row_of(&'a'), None);
        assert_eq!(index.row_of(&'c'), Some(0));
        assert_eq!(index.keys().count(), 2);
    }
}
