use crate::collection::CollectionError;
use im::Vector;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, sync::Arc};

///
/// List
///
/// Ordered immutable list with structural sharing.
/// Elements live behind `Arc`; every transform returns a new list whose
/// untouched elements are the same allocations as in the source.
/// Two lists are `ptr_eq` only when they share the same backing storage.
///

pub struct List<T> {
    items: Arc<Vector<Arc<T>>>,
}

impl<T> List<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vector::new()),
        }
    }

    /// Build a list from any iterable of owned values.
    pub fn create<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        values.into_iter().collect()
    }

    fn from_vector(items: Vector<Arc<T>>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Return the element at `index`.
    pub fn get(&self, index: usize) -> Result<&T, CollectionError> {
        self.items
            .get(index)
            .map(AsRef::as_ref)
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    /// Return the shared handle for the element at `index`.
    pub fn get_shared(&self, index: usize) -> Result<Arc<T>, CollectionError> {
        self.items
            .get(index)
            .cloned()
            .ok_or(CollectionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    /// Append a value, returning the extended list.
    #[must_use]
    pub fn push(&self, value: T) -> Self {
        let mut items = (*self.items).clone();
        items.push_back(Arc::new(value));

        Self::from_vector(items)
    }

    /// Replace the element at `index`, returning the updated list.
    pub fn set(&self, index: usize, value: T) -> Result<Self, CollectionError> {
        if index >= self.items.len() {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let mut items = (*self.items).clone();
        items.set(index, Arc::new(value));

        Ok(Self::from_vector(items))
    }

    /// Remove the first element matching `predicate`.
    /// When nothing matches the result shares this list's storage.
    #[must_use]
    pub fn find_and_delete<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let Some(index) = self.items.iter().position(|item| predicate(&**item)) else {
            return self.clone();
        };

        let mut items = (*self.items).clone();
        items.remove(index);

        Self::from_vector(items)
    }

    /// Map every element into a new list.
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> List<U>
    where
        F: FnMut(&T) -> U,
    {
        self.iter().map(|item| f(item)).collect()
    }

    /// Keep the elements matching `predicate`, in order.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool,
    {
        let items = self
            .items
            .iter()
            .filter(|item| predicate(&***item))
            .cloned()
            .collect();

        Self::from_vector(items)
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(f);
    }

    /// Returns `true` if any element matches.
    pub fn some<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().any(predicate)
    }

    /// Returns `true` if every element matches (vacuously true when empty).
    pub fn every<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().all(predicate)
    }

    pub fn first(&self) -> Result<&T, CollectionError> {
        self.items
            .front()
            .map(AsRef::as_ref)
            .ok_or(CollectionError::EmptyCollection)
    }

    pub fn last(&self) -> Result<&T, CollectionError> {
        self.items
            .back()
            .map(AsRef::as_ref)
            .ok_or(CollectionError::EmptyCollection)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().map(AsRef::as_ref)
    }

    /// Whether both lists share the same backing storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<T: Clone> List<T> {
    /// Plain snapshot of the current elements.
    #[must_use]
    pub fn array_view(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Clone for List<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.size() == other.size() && self.iter().eq(other.iter()))
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vector(iter.into_iter().map(Arc::new).collect())
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T, const N: usize> From<[T; N]> for List<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Serialize> Serialize for List<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

///
/// TESTS
///
