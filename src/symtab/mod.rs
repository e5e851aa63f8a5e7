//! Interned symbol names with explicit reference counts.
//!
//! The table sits outside the collector: heap slots holding a
//! symbol keep one count each on the shared name and give it back from the
//! sweep's release step. An entry lives exactly as long as its count is
//! positive.

use std::rc::Rc;

/// Bucket count. Prime, to spread the DJB2 hash.
pub const SYMTAB_BUCKETS: usize = 1439;

/// Handle to a canonical, interned name. Two handles for the same name
/// share storage, so identity is a pointer comparison.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the canonical storage.
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymtabError {
    #[error("refcount overflow for symbol \"{name}\"")]
    RefcountOverflow { name: String },
}

struct Entry {
    name: Rc<str>,
    count: u32,
    next: Option<Box<Entry>>,
}

pub struct SymbolTable {
    buckets: Box<[Option<Box<Entry>>]>,
    len: usize,
}

fn hash(name: &str) -> usize {
    let mut h: u64 = 5381;
    for b in name.bytes() {
        h = h.wrapping_mul(33).wrapping_add(b as u64);
    }
    (h % SYMTAB_BUCKETS as u64) as usize
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            buckets: (0..SYMTAB_BUCKETS).map(|_| None).collect(),
            len: 0,
        }
    }

    /// Return the canonical handle for `name`, creating the entry on first
    /// use and bumping its count otherwise.
    pub fn intern(&mut self, name: &str) -> Result<Symbol, SymtabError> {
        let idx = hash(name);

        let mut cur = self.buckets[idx].as_deref_mut();
        while let Some(entry) = cur {
            if &*entry.name == name {
                entry.count = entry.count.checked_add(1).ok_or_else(|| {
                    SymtabError::RefcountOverflow { name: name.to_string() }
                })?;
                return Ok(Symbol(Rc::clone(&entry.name)));
            }
            cur = entry.next.as_deref_mut();
        }

        if self.buckets[idx].is_some() {
            tracing::trace!(symbol = name, bucket = idx, "symbol table collision");
        }
        let entry = Box::new(Entry {
            name: Rc::from(name),
            count: 1,
            next: self.buckets[idx].take(),
        });
        let symbol = Symbol(Rc::clone(&entry.name));
        self.buckets[idx] = Some(entry);
        self.len += 1;
        Ok(symbol)
    }

    /// Give back one count on `name`, unlinking the entry when it reaches
    /// zero. Returns false (and warns) if the name was never interned.
    pub fn release(&mut self, name: &str) -> bool {
        let idx = hash(name);

        let mut link = &mut self.buckets[idx];
        loop {
            let found = match link.as_deref() {
                Some(entry) => &*entry.name == name,
                None => {
                    tracing::warn!(symbol = name, "symbol is not in the table");
                    return false;
                }
            };
            if found {
                break;
            }
            link = match { link } {
                Some(entry) => &mut entry.next,
                None => return false,
            };
        }

        let Some(entry) = link.as_deref_mut() else {
            return false;
        };
        debug_assert!(entry.count > 0);
        entry.count -= 1;
        if entry.count == 0 {
            let next = entry.next.take();
            *link = next;
            self.len -= 1;
        }
        true
    }

    /// Current reference count of `name`, if interned.
    pub fn count(&self, name: &str) -> Option<u32> {
        let mut cur = self.buckets[hash(name)].as_deref();
        while let Some(entry) = cur {
            if &*entry.name == name {
                return Some(entry.count);
            }
            cur = entry.next.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.count(name).is_some()
    }

    /// Number of distinct live names.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
