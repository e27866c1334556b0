use std::ops::{Deref, DerefMut};

/// An entry together with its row number inside the table.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Row<E> {
    pub row: usize,
    pub entry: E,
}

impl<E> Row<E> {
    pub const fn new(row: usize, entry: E) -> Self {
        Self { row, entry }
    }

    pub fn into_entry(self) -> E {
        self.entry
    }
}

impl<E> Deref for Row<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl<E> DerefMut for Row<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entry
    }
}

impl<E: Clone> From<Row<&E>> for Row<E> {
    fn from(row: Row<&E>) -> Self {
        Self {
            row: row.row,
            entry: row.entry.clone(),
        }
    }
}

impl<E> From<(usize, E)> for Row<E> {
    fn from((row, entry): (usize, E)) -> Self {
        Self { row, entry }
    }
}
