//! Entry chain: the single-threaded structural layer.
//!
//! One `Chain` is the collision list of a single bucket. It owns its entries
//! outright (a `Box`-linked singly-linked list) and knows nothing about
//! hashing or locking; the table layer decides which chain a key belongs to
//! and holds that bucket's lock around every call in here.
//!
//! The node-level `push_front`/`pop_front` pair exists for the resizer, which
//! relinks entries into a new bucket array by moving the boxed node — the key
//! and value bytes are never copied during a resize.

/// A single key/value record. The key is fixed at creation; the value buffer
/// is replaced in place on an overwriting insert.
pub(crate) struct Entry {
    key: Box<[u8]>,
    value: Vec<u8>,
    next: Option<Box<Entry>>,
}

impl Entry {
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }
}

/// Head of one bucket's collision list.
#[derive(Default)]
pub(crate) struct Chain {
    head: Option<Box<Entry>>,
}

impl Chain {
    /// Borrow the value stored under `key`, if present.
    pub(crate) fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut cur = self.head.as_deref();
        while let Some(entry) = cur {
            if entry.key.as_ref() == key {
                return Some(&entry.value);
            }
            cur = entry.next.as_deref();
        }
        None
    }

    /// Insert or overwrite. Returns `true` when a new entry was created and
    /// `false` when an existing entry had its value bytes replaced in place.
    /// New entries are prepended, so the most recently inserted key in a
    /// bucket is found first.
    pub(crate) fn upsert(&mut self, key: &[u8], value: &[u8]) -> bool {
        let mut cur = self.head.as_deref_mut();
        while let Some(entry) = cur {
            if entry.key.as_ref() == key {
                entry.value.clear();
                entry.value.extend_from_slice(value);
                return false;
            }
            cur = entry.next.as_deref_mut();
        }
        self.push_front(Box::new(Entry {
            key: key.into(),
            value: value.to_vec(),
            next: None,
        }));
        true
    }

    /// Unlink and drop the entry for `key`. Returns whether it was present.
    pub(crate) fn remove(&mut self, key: &[u8]) -> bool {
        let mut cur = &mut self.head;
        while cur.as_ref().is_some_and(|e| e.key.as_ref() != key) {
            cur = &mut cur.as_mut().unwrap().next;
        }
        match cur.take() {
            Some(mut entry) => {
                *cur = entry.next.take();
                true
            }
            None => false,
        }
    }

    /// Detach the head node. Combined with `push_front` this drains a chain
    /// node-by-node without touching the entry payloads.
    pub(crate) fn pop_front(&mut self) -> Option<Box<Entry>> {
        let mut entry = self.head.take()?;
        self.head = entry.next.take();
        Some(entry)
    }

    pub(crate) fn push_front(&mut self, mut entry: Box<Entry>) {
        entry.next = self.head.take();
        self.head = Some(entry);
    }

    /// Walk all live entries, front to back.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            cur: self.head.as_deref(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.iter().count()
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        // Unlink iteratively; the default recursive drop would overflow the
        // stack on a pathologically long chain.
        while self.pop_front().is_some() {}
    }
}

pub(crate) struct Iter<'a> {
    cur: Option<&'a Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cur?;
        self.cur = entry.next.as_deref();
        Some((&entry.key, &entry.value))
    }
}
