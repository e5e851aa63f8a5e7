//! External representation of values.
//!
//! Pairs print as proper or dotted lists. A pair already being printed
//! further up the same path prints as `...`, so cyclic structure terminates.

use std::collections::HashSet;

use crate::heap::{Heap, HeapError, ObjectKind};
use crate::value::{SlotRef, Tagged, Value};

/// Render `value` the way the REPL echoes it.
pub fn write(heap: &Heap, value: Value) -> Result<String, HeapError> {
    let mut out = String::new();
    Printer { heap, path: HashSet::new() }.value(&mut out, value)?;
    Ok(out)
}

fn write_char(out: &mut String, c: char) {
    out.push_str("#\\");
    match c {
        '\n' => out.push_str("newline"),
        '\t' => out.push_str("tab"),
        ' ' => out.push_str("space"),
        c => out.push(c),
    }
}

fn write_string(out: &mut String, bytes: &[u8]) {
    out.push('"');
    for c in String::from_utf8_lossy(bytes).chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

struct Printer<'h> {
    heap: &'h Heap,
    path: HashSet<SlotRef>,
}

impl Printer<'_> {
    fn value(&mut self, out: &mut String, value: Value) -> Result<(), HeapError> {
        match value.decode() {
            Tagged::Fixnum(n) => out.push_str(&n.to_string()),
            Tagged::Character(c) => write_char(out, c),
            Tagged::Boolean(b) => out.push_str(if b { "#t" } else { "#f" }),
            Tagged::Null => out.push_str("()"),
            Tagged::Eof => out.push_str("#<eof>"),
            Tagged::Heap(slot) => match self.heap.kind_of(value) {
                Some(ObjectKind::Symbol) => out.push_str(self.heap.symbol_name(value)?),
                Some(ObjectKind::String) => write_string(out, self.heap.string_bytes(value)?),
                Some(ObjectKind::Pair) if self.path.contains(&slot) => out.push_str("..."),
                Some(ObjectKind::Pair) => self.list(out, value)?,
                None if self.heap.is_live(value) => out.push_str("#<unpopulated>"),
                None => return Err(HeapError::Dangling { index: slot.index() }),
            },
        }
        Ok(())
    }

    fn list(&mut self, out: &mut String, head: Value) -> Result<(), HeapError> {
        let mut entered = Vec::new();
        let mut cur = head;
        out.push('(');
        loop {
            self.path.insert(cur.as_slot());
            entered.push(cur.as_slot());
            self.value(out, self.heap.car(cur)?)?;

            let next = self.heap.cdr(cur)?;
            if next.is_null() {
                break;
            }
            if self.heap.is_pair(next) {
                if self.path.contains(&next.as_slot()) {
                    out.push_str(" . ...");
                    break;
                }
                out.push(' ');
                cur = next;
                continue;
            }
            out.push_str(" . ");
            self.value(out, next)?;
            break;
        }
        out.push(')');
        for slot in entered {
            self.path.remove(&slot);
        }
        Ok(())
    }
}
