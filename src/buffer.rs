use crate::error::{Error, Result};

const INITIAL_CAPACITY: usize = 8;

/// Append-only storage used for every unbounded collection of the renderer.
///
/// Growth relocates the storage, so callers hold indices, never references,
/// across a push.
#[derive(Clone, Debug)]
pub struct AppendBuffer<T> {
    items: Vec<T>,
}

impl<T> Default for AppendBuffer<T> {
    fn default() -> Self {
        AppendBuffer { items: Vec::new() }
    }
}

impl<T> AppendBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // capacity doubles until it covers `additional` more elements
    fn grow_for(&mut self, additional: usize) -> Result<()> {
        let required = self
            .items
            .len()
            .checked_add(additional)
            .ok_or(Error::OutOfMemory {
                requested: usize::MAX,
            })?;
        if required <= self.items.capacity() {
            return Ok(());
        }
        let mut target = self.items.capacity().max(INITIAL_CAPACITY);
        while target < required {
            target = target.checked_mul(2).unwrap_or(required);
        }
        self.items
            .try_reserve_exact(target - self.items.len())
            .map_err(|_| Error::OutOfMemory { requested: target })
    }

    pub fn push_value(&mut self, value: T) -> Result<usize> {
        self.grow_for(1)?;
        self.items.push(value);
        Ok(self.items.len() - 1)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn release(&mut self) {
        self.items = Vec::new();
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Default> AppendBuffer<T> {
    pub fn push(&mut self) -> Result<&mut T> {
        let index = self.push_value(T::default())?;
        Ok(&mut self.items[index])
    }

    pub fn push_array(&mut self, n: usize) -> Result<&mut [T]> {
        self.grow_for(n)?;
        let start = self.items.len();
        self.items.resize_with(start + n, T::default);
        Ok(&mut self.items[start..])
    }
}

impl<'a, T> IntoIterator for &'a AppendBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
