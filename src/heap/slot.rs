use std::ffi::CString;

use serde::Serialize;

use crate::symtab::{Symbol, SymbolTable};
use crate::value::Value;

/// Per-slot GC bits. ALLOCATED and MARKED are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotFlags(u8);

impl SlotFlags {
    const ALLOCATED: u8 = 1;
    const MARKED: u8 = 2;

    pub fn is_allocated(self) -> bool {
        self.0 & Self::ALLOCATED != 0
    }

    pub fn set_allocated(&mut self, on: bool) {
        if on { self.0 |= Self::ALLOCATED } else { self.0 &= !Self::ALLOCATED }
    }

    pub fn is_marked(self) -> bool {
        self.0 & Self::MARKED != 0
    }

    pub fn set_marked(&mut self, on: bool) {
        if on { self.0 |= Self::MARKED } else { self.0 &= !Self::MARKED }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Symbol,
    String,
    Pair,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Symbol => "symbol",
            ObjectKind::String => "string",
            ObjectKind::Pair => "pair",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of a heap slot.
#[derive(Debug, Default)]
pub enum Object {
    /// Allocated but not yet populated, or free.
    #[default]
    Vacant,
    /// Canonical name owned by the symbol table; the slot holds one count.
    Symbol(Symbol),
    /// Owned NUL-terminated bytes.
    String(CString),
    /// Neither half is owned; the mark phase governs their lifetime.
    Pair { car: Value, cdr: Value },
}

impl Object {
    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            Object::Vacant => None,
            Object::Symbol(_) => Some(ObjectKind::Symbol),
            Object::String(_) => Some(ObjectKind::String),
            Object::Pair { .. } => Some(ObjectKind::Pair),
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Slot {
    pub(super) object: Object,
    pub(super) flags: SlotFlags,
}

/// Type-specific cleanup for an object leaving the heap. Called from the
/// sweep and from shutdown only.
pub(super) fn release(object: Object, symbols: &mut SymbolTable) -> Option<ObjectKind> {
    let kind = object.kind();
    match object {
        Object::Vacant => {}
        Object::Symbol(sym) => {
            symbols.release(sym.name());
        }
        Object::String(bytes) => drop(bytes),
        Object::Pair { .. } => {}
    }
    kind
}
