//! The object heap: a fixed arena of slots, the root stack and the symbol
//! table, owned together by one `Heap` value.
//!
//! Slots are only ever freed by a collection. Any heap reference that must
//! survive a call which may allocate, and that is not yet stored inside
//! another reachable object, has to be on the root stack for the duration
//! of that call (`push_root`/`pop_root`, or `rooted`).

mod gc;
mod slot;

pub use slot::{Object, ObjectKind, SlotFlags};

use std::ffi::{CStr, CString};

use serde::Serialize;

use crate::buffer::ByteBuffer;
use crate::stack::{Stack, StackError};
use crate::symtab::{Symbol, SymbolTable, SymtabError};
use crate::value::{SlotRef, Tagged, Value};

use slot::Slot;

/// Number of slots when nothing else is configured.
pub const DEFAULT_HEAP_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Fixed number of object slots in the arena.
    pub capacity: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig { capacity: DEFAULT_HEAP_CAPACITY }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcStats {
    pub capacity: usize,
    pub live: usize,
    pub allocations: u64,
    pub collections: u64,
    pub reclaimed: u64,
    pub symbols_released: u64,
    pub strings_freed: u64,
    pub pairs_released: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    #[error("could not allocate an object: all {capacity} slots are live after collection")]
    OutOfMemory { capacity: usize },
    #[error("pop from an empty root stack")]
    EmptyRootStack,
    #[error("expected a {expected}, got a {found}")]
    Type { expected: &'static str, found: &'static str },
    #[error("heap reference #{index} does not name a live slot")]
    Dangling { index: usize },
    #[error("{value:?} is not a heap reference")]
    NotHeapReference { value: Value },
    #[error("string contains a NUL byte at offset {position}")]
    InteriorNul { position: usize },
    #[error(transparent)]
    Symtab(#[from] SymtabError),
}

impl From<StackError> for HeapError {
    fn from(e: StackError) -> Self {
        match e {
            StackError::Empty => HeapError::EmptyRootStack,
        }
    }
}

impl HeapError {
    /// Registry code, see `rescheme --explain`.
    pub fn code(&self) -> &'static str {
        match self {
            HeapError::OutOfMemory { .. } => "RS-H001",
            HeapError::EmptyRootStack => "RS-H002",
            HeapError::Type { .. } => "RS-H003",
            HeapError::Dangling { .. } => "RS-H004",
            HeapError::NotHeapReference { .. } => "RS-H005",
            HeapError::InteriorNul { .. } => "RS-H006",
            HeapError::Symtab(_) => "RS-H007",
        }
    }
}

type Result<T> = std::result::Result<T, HeapError>;

pub struct Heap {
    slots: Box<[Slot]>,
    next: usize,
    symbols: SymbolTable,
    roots: Stack<Value>,
    stats: GcStats,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        let capacity = config.capacity.max(1);
        tracing::debug!(capacity, "heap initialised");
        Heap {
            slots: (0..capacity).map(|_| Slot::default()).collect(),
            next: 0,
            symbols: SymbolTable::new(),
            roots: Stack::new(),
            stats: GcStats { capacity, ..GcStats::default() },
        }
    }

    /// Release every allocated slot and tear the heap down.
    pub fn shutdown(mut self) -> GcStats {
        self.release_all();
        let stats = self.stats();
        tracing::debug!(?stats, "heap shut down");
        stats
    }

    fn release_all(&mut self) {
        for s in self.slots.iter_mut() {
            if s.flags.is_allocated() {
                s.flags = SlotFlags::default();
                let object = std::mem::take(&mut s.object);
                self.stats.record_release(slot::release(object, &mut self.symbols));
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.flags.is_allocated()).count()
    }

    pub fn stats(&self) -> GcStats {
        GcStats { live: self.live_count(), ..self.stats.clone() }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    // ---- Allocation ----

    /// Cyclic scan from the cursor for a free slot.
    fn next_free(&mut self) -> Option<usize> {
        let n = self.slots.len();
        let start = self.next;
        let mut i = start;
        loop {
            if !self.slots[i].flags.is_allocated() {
                self.next = (i + 1) % n;
                return Some(i);
            }
            i = (i + 1) % n;
            if i == start {
                return None;
            }
        }
    }

    /// Hand out a free slot, collecting once if the arena is full. The slot
    /// comes back `Vacant`; fill it with [`Heap::populate`] before anything
    /// else allocates, or root it.
    pub fn allocate_slot(&mut self) -> Result<SlotRef> {
        let index = match self.next_free() {
            Some(i) => i,
            None => {
                tracing::debug!(capacity = self.slots.len(), "arena full");
                self.collect();
                self.next_free()
                    .ok_or(HeapError::OutOfMemory { capacity: self.slots.len() })?
            }
        };
        let s = &mut self.slots[index];
        s.flags.set_allocated(true);
        s.flags.set_marked(false);
        s.object = Object::Vacant;
        self.stats.allocations += 1;
        Ok(SlotRef::new(index))
    }

    /// Store `object` in an allocated slot and return the reference to it.
    pub fn populate(&mut self, slot: SlotRef, object: Object) -> Result<Value> {
        let s = self.slots.get_mut(slot.index())
            .filter(|s| s.flags.is_allocated())
            .ok_or(HeapError::Dangling { index: slot.index() })?;
        let old = std::mem::replace(&mut s.object, object);
        slot::release(old, &mut self.symbols);
        Ok(Value::heap(slot))
    }

    /// The new slot holds the one count taken on the interned name; the
    /// sweep gives it back.
    pub fn make_symbol(&mut self, name: &str) -> Result<Value> {
        let slot = self.allocate_slot()?;
        let sym = self.symbols.intern(name)?;
        self.populate(slot, Object::Symbol(sym))
    }

    pub fn make_string(&mut self, content: &str) -> Result<Value> {
        self.make_string_bytes(content.as_bytes())
    }

    /// Copy the buffer's full contents, rejecting an embedded NUL as
    /// `make_string` does.
    pub fn make_string_from(&mut self, buf: &ByteBuffer) -> Result<Value> {
        self.make_string_bytes(buf.as_bytes())
    }

    fn make_string_bytes(&mut self, content: &[u8]) -> Result<Value> {
        let bytes = CString::new(content)
            .map_err(|e| HeapError::InteriorNul { position: e.nul_position() })?;
        let slot = self.allocate_slot()?;
        self.populate(slot, Object::String(bytes))
    }

    pub fn cons(&mut self, car: Value, cdr: Value) -> Result<Value> {
        self.push_root(car);
        self.push_root(cdr);
        let slot = self.allocate_slot();
        self.pop_root()?;
        self.pop_root()?;
        self.populate(slot?, Object::Pair { car, cdr })
    }

    /// Build a proper list of `items`, each of which stays rooted until the
    /// list holds it.
    pub fn list(&mut self, items: &[Value]) -> Result<Value> {
        for &item in items {
            self.push_root(item);
        }
        let mut built = Ok(Value::NULL);
        for &item in items.iter().rev() {
            built = built.and_then(|tail| self.cons(item, tail));
            self.pop_root()?;
        }
        built
    }

    // ---- Roots ----

    pub fn push_root(&mut self, value: Value) {
        self.roots = std::mem::take(&mut self.roots).push(value);
    }

    pub fn pop_root(&mut self) -> Result<Value> {
        Ok(self.roots.pop()?)
    }

    pub fn root_depth(&self) -> usize {
        self.roots.len()
    }

    /// Run `f` with `value` on the root stack.
    pub fn rooted<T>(&mut self, value: Value, f: impl FnOnce(&mut Heap) -> Result<T>) -> Result<T> {
        self.push_root(value);
        let out = f(self);
        self.pop_root()?;
        out
    }

    // ---- Predicates and accessors ----

    fn slot(&self, value: Value) -> Result<&Slot> {
        if !value.is_heap() {
            return Err(HeapError::NotHeapReference { value });
        }
        let index = value.as_slot().index();
        self.slots.get(index)
            .filter(|s| s.flags.is_allocated())
            .ok_or(HeapError::Dangling { index })
    }

    fn slot_mut(&mut self, value: Value) -> Result<&mut Slot> {
        if !value.is_heap() {
            return Err(HeapError::NotHeapReference { value });
        }
        let index = value.as_slot().index();
        self.slots.get_mut(index)
            .filter(|s| s.flags.is_allocated())
            .ok_or(HeapError::Dangling { index })
    }

    pub fn kind_of(&self, value: Value) -> Option<ObjectKind> {
        if !value.is_heap() {
            return None;
        }
        self.slot(value).ok()?.object.kind()
    }

    /// True when `value` names an allocated slot, populated or not.
    pub fn is_live(&self, value: Value) -> bool {
        self.slot(value).is_ok()
    }

    pub fn is_symbol(&self, value: Value) -> bool {
        self.kind_of(value) == Some(ObjectKind::Symbol)
    }

    pub fn is_string(&self, value: Value) -> bool {
        self.kind_of(value) == Some(ObjectKind::String)
    }

    pub fn is_pair(&self, value: Value) -> bool {
        self.kind_of(value) == Some(ObjectKind::Pair)
    }

    /// Short type name for error messages.
    pub fn describe(&self, value: Value) -> &'static str {
        match value.decode() {
            Tagged::Fixnum(_) => "fixnum",
            Tagged::Character(_) => "character",
            Tagged::Boolean(_) => "boolean",
            Tagged::Null => "empty list",
            Tagged::Eof => "eof object",
            Tagged::Heap(_) => match self.slot(value) {
                Ok(s) => s.object.kind().map_or("unpopulated slot", ObjectKind::name),
                Err(_) => "dangling reference",
            },
        }
    }

    fn type_error(&self, expected: ObjectKind, value: Value) -> HeapError {
        HeapError::Type { expected: expected.name(), found: self.describe(value) }
    }

    pub fn symbol(&self, value: Value) -> Result<&Symbol> {
        match &self.slot(value)?.object {
            Object::Symbol(sym) => Ok(sym),
            _ => Err(self.type_error(ObjectKind::Symbol, value)),
        }
    }

    pub fn symbol_name(&self, value: Value) -> Result<&str> {
        Ok(self.symbol(value)?.name())
    }

    pub fn string_cstr(&self, value: Value) -> Result<&CStr> {
        match &self.slot(value)?.object {
            Object::String(bytes) => Ok(bytes.as_c_str()),
            _ => Err(self.type_error(ObjectKind::String, value)),
        }
    }

    pub fn string_bytes(&self, value: Value) -> Result<&[u8]> {
        Ok(self.string_cstr(value)?.to_bytes())
    }

    fn pair(&self, value: Value) -> Result<(Value, Value)> {
        match self.slot(value)?.object {
            Object::Pair { car, cdr } => Ok((car, cdr)),
            _ => Err(self.type_error(ObjectKind::Pair, value)),
        }
    }

    pub fn car(&self, pair: Value) -> Result<Value> {
        Ok(self.pair(pair)?.0)
    }

    pub fn cdr(&self, pair: Value) -> Result<Value> {
        Ok(self.pair(pair)?.1)
    }

    pub fn set_car(&mut self, pair: Value, value: Value) -> Result<()> {
        let err = self.type_error(ObjectKind::Pair, pair);
        match &mut self.slot_mut(pair)?.object {
            Object::Pair { car, .. } => {
                *car = value;
                Ok(())
            }
            _ => Err(err),
        }
    }

    pub fn set_cdr(&mut self, pair: Value, value: Value) -> Result<()> {
        let err = self.type_error(ObjectKind::Pair, pair);
        match &mut self.slot_mut(pair)?.object {
            Object::Pair { cdr, .. } => {
                *cdr = value;
                Ok(())
            }
            _ => Err(err),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new(HeapConfig::default())
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap(capacity: usize) -> Heap {
        Heap::new(HeapConfig { capacity })
    }

    #[test]
    fn allocate_advances_cursor_and_sets_flags() {
        let mut h = heap(4);
        let a = h.allocate_slot().unwrap();
        let b = h.allocate_slot().unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(h.slots[0].flags.is_allocated());
        assert!(!h.slots[0].flags.is_marked());
        assert_eq!(h.live_count(), 2);
        assert_eq!(h.kind_of(Value::heap(a)), None);
    }

    #[test]
    fn allocate_wraps_around_to_freed_slots() {
        let mut h = heap(3);
        let keep = h.make_symbol("keep").unwrap();
        h.push_root(keep);
        h.make_symbol("x").unwrap();
        h.make_symbol("y").unwrap();
        // full: the next allocation collects and wraps to slot 1
        let z = h.allocate_slot().unwrap();
        assert_eq!(z.index(), 1);
        assert_eq!(h.stats().collections, 1);
    }

    #[test]
    fn everything_rooted_is_out_of_memory() {
        let mut h = heap(2);
        let a = h.make_symbol("a").unwrap();
        h.push_root(a);
        let b = h.make_symbol("b").unwrap();
        h.push_root(b);
        assert_eq!(h.allocate_slot(), Err(HeapError::OutOfMemory { capacity: 2 }));
        assert!(h.is_symbol(a) && h.is_symbol(b));
    }

    #[test]
    fn make_symbol_interns_the_name() {
        let mut h = heap(4);
        let a = h.make_symbol("foo").unwrap();
        let b = h.make_symbol("foo").unwrap();
        assert_ne!(a, b);
        assert!(h.symbol(a).unwrap().ptr_eq(h.symbol(b).unwrap()));
        assert_eq!(h.symbols().count("foo"), Some(2));
    }

    #[test]
    fn make_string_rejects_interior_nul() {
        let mut h = heap(4);
        assert_eq!(h.make_string("a\0b"), Err(HeapError::InteriorNul { position: 1 }));
        assert_eq!(h.live_count(), 0);
    }

    #[test]
    fn string_from_buffer() {
        let mut h = heap(4);
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"hello").unwrap();
        let s = h.make_string_from(&buf).unwrap();
        buf.reset();
        assert!(h.is_string(s));
        assert_eq!(h.string_bytes(s).unwrap(), b"hello");
        assert_eq!(h.string_cstr(s).unwrap(), c"hello");
    }

    #[test]
    fn string_from_buffer_rejects_interior_nul() {
        let mut h = heap(4);
        let mut buf = ByteBuffer::new();
        buf.extend_from_slice(b"ab\0cd").unwrap();
        assert_eq!(h.make_string_from(&buf), Err(HeapError::InteriorNul { position: 2 }));
        assert_eq!(h.make_string("ab\0cd"), Err(HeapError::InteriorNul { position: 2 }));
        assert_eq!(h.live_count(), 0);
    }

    #[test]
    fn symbol_counts_return_to_zero() {
        let mut h = heap(4);
        let kept = h.make_symbol("kept").unwrap();
        h.push_root(kept);
        h.make_symbol("dropped").unwrap();
        h.make_symbol("kept").unwrap();
        assert_eq!(h.symbols().count("kept"), Some(2));

        h.collect();
        assert!(!h.symbols().contains("dropped"));
        assert_eq!(h.symbols().count("kept"), Some(1));

        h.release_all();
        assert!(h.symbols().is_empty());
    }

    #[test]
    fn cons_roots_its_operands() {
        // with one free slot left, cons must collect without losing car/cdr
        let mut h = heap(3);
        let a = h.make_symbol("a").unwrap();
        let b = h.make_symbol("b").unwrap();
        h.make_symbol("junk").unwrap();
        let p = h.cons(a, b).unwrap();
        assert_eq!(h.symbol_name(h.car(p).unwrap()).unwrap(), "a");
        assert_eq!(h.symbol_name(h.cdr(p).unwrap()).unwrap(), "b");
        assert_eq!(h.root_depth(), 0);
        assert!(!h.symbols().contains("junk"));
    }

    #[test]
    fn list_builds_proper_list() {
        let mut h = heap(8);
        let l = h.list(&[Value::fixnum(1), Value::fixnum(2), Value::fixnum(3)]).unwrap();
        assert_eq!(h.car(l).unwrap(), Value::fixnum(1));
        let rest = h.cdr(l).unwrap();
        assert_eq!(h.car(rest).unwrap(), Value::fixnum(2));
        let last = h.cdr(rest).unwrap();
        assert_eq!(h.cdr(last).unwrap(), Value::NULL);
        assert_eq!(h.root_depth(), 0);
        assert_eq!(h.list(&[]).unwrap(), Value::NULL);
    }

    #[test]
    fn accessors_check_types() {
        let mut h = heap(4);
        let s = h.make_symbol("s").unwrap();
        assert_eq!(
            h.car(s),
            Err(HeapError::Type { expected: "pair", found: "symbol" })
        );
        assert_eq!(
            h.symbol_name(Value::fixnum(1)),
            Err(HeapError::NotHeapReference { value: Value::fixnum(1) })
        );
        assert_eq!(
            h.string_bytes(Value::heap(SlotRef::new(3))),
            Err(HeapError::Dangling { index: 3 })
        );
        assert!(h.set_cdr(s, Value::NULL).is_err());
        assert!(!h.is_pair(Value::NULL));
    }

    #[test]
    fn root_stack_is_lifo() {
        let mut h = heap(4);
        h.push_root(Value::fixnum(1));
        h.push_root(Value::fixnum(2));
        assert_eq!(h.root_depth(), 2);
        assert_eq!(h.pop_root(), Ok(Value::fixnum(2)));
        assert_eq!(h.pop_root(), Ok(Value::fixnum(1)));
        assert_eq!(h.pop_root(), Err(HeapError::EmptyRootStack));
    }

    #[test]
    fn rooted_pops_even_on_error() {
        let mut h = heap(1);
        let a = h.make_symbol("a").unwrap();
        let r: Result<Value> = h.rooted(a, |h| h.make_symbol("b"));
        assert_eq!(r, Err(HeapError::OutOfMemory { capacity: 1 }));
        assert_eq!(h.root_depth(), 0);
    }

    #[test]
    fn release_all_drains_symbols() {
        let mut h = heap(4);
        let a = h.make_symbol("a").unwrap();
        h.push_root(a);
        h.make_symbol("a").unwrap();
        h.make_string("s").unwrap();
        h.release_all();
        assert_eq!(h.live_count(), 0);
        assert!(h.symbols().is_empty());
    }

    #[test]
    fn shutdown_reports_final_stats() {
        let mut h = heap(4);
        h.make_symbol("a").unwrap();
        h.make_string("s").unwrap();
        let stats = h.shutdown();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.symbols_released, 1);
        assert_eq!(stats.strings_freed, 1);
        assert_eq!(stats.allocations, 2);
    }

    #[test]
    fn describe_names_every_kind() {
        let mut h = heap(4);
        let p = h.cons(Value::NULL, Value::NULL).unwrap();
        let raw = Value::heap(h.allocate_slot().unwrap());
        assert_eq!(h.describe(p), "pair");
        assert_eq!(h.describe(raw), "unpopulated slot");
        assert_eq!(h.describe(Value::NULL), "empty list");
        assert_eq!(h.describe(Value::character('a')), "character");
        assert_eq!(h.describe(Value::heap(SlotRef::new(3))), "dangling reference");
    }

    #[test]
    fn config_capacity_reaches_stats() {
        assert_eq!(Heap::default().stats().capacity, DEFAULT_HEAP_CAPACITY);
        let h = Heap::new(HeapConfig { capacity: 0 });
        assert_eq!(h.capacity(), 1);
        let json = serde_json::to_value(h.stats()).unwrap();
        assert_eq!(json["capacity"], 1);
    }

    #[test]
    fn stats_serialize_as_json() {
        let h = heap(16);
        let json = serde_json::to_value(h.stats()).unwrap();
        assert_eq!(json["capacity"], 16);
        assert_eq!(json["collections"], 0);
    }
}
