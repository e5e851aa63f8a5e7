//! Stop-the-world mark-sweep over the arena.
//!
//! Mark walks from every frame of the root stack with an explicit work
//! list. A slot is marked before it is queued, so each slot is expanded at
//! most once and cyclic pair graphs terminate. Sweep then visits every slot:
//! marked slots lose the mark and stay, unmarked allocated slots are freed
//! through `slot::release`.

use crate::stack::Stack;
use crate::symtab::SymbolTable;
use crate::value::{SlotRef, Value};

use super::slot::{self, Object, ObjectKind, Slot};
use super::{GcStats, Heap};

impl Heap {
    /// Run a full collection now. Returns the number of slots reclaimed.
    pub fn collect(&mut self) -> usize {
        tracing::debug!(live = self.live_count(), roots = self.roots.len(), "collection starting");

        let marked = mark(&mut self.slots, &self.roots);
        let reclaimed = sweep(&mut self.slots, &mut self.symbols, &mut self.stats);
        self.stats.collections += 1;

        tracing::debug!(marked, reclaimed, "collection finished");
        reclaimed
    }
}

fn mark(slots: &mut [Slot], roots: &Stack<Value>) -> usize {
    let mut work: Vec<SlotRef> = Vec::new();
    let mut marked = 0;

    for root in roots.iter() {
        if root.is_heap() {
            marked += mark_one(slots, root.as_slot(), &mut work);
        }
    }

    while let Some(slot) = work.pop() {
        if let Object::Pair { car, cdr } = slots[slot.index()].object {
            for half in [car, cdr] {
                if half.is_heap() {
                    marked += mark_one(slots, half.as_slot(), &mut work);
                }
            }
        }
    }
    marked
}

fn mark_one(slots: &mut [Slot], slot: SlotRef, work: &mut Vec<SlotRef>) -> usize {
    let Some(s) = slots.get_mut(slot.index()) else {
        tracing::warn!(slot = slot.index(), "reference outside the arena while marking");
        return 0;
    };
    if !s.flags.is_allocated() {
        tracing::warn!(slot = slot.index(), "reference to a free slot while marking");
        return 0;
    }
    if s.flags.is_marked() {
        return 0;
    }
    s.flags.set_marked(true);
    work.push(slot);
    1
}

fn sweep(slots: &mut [Slot], symbols: &mut SymbolTable, stats: &mut GcStats) -> usize {
    let mut reclaimed = 0;
    for s in slots.iter_mut() {
        if s.flags.is_marked() {
            s.flags.set_marked(false);
            continue;
        }
        if !s.flags.is_allocated() {
            continue;
        }
        s.flags.set_allocated(false);
        let object = std::mem::take(&mut s.object);
        stats.record_release(slot::release(object, symbols));
        reclaimed += 1;
    }
    stats.reclaimed += reclaimed as u64;
    reclaimed
}

impl GcStats {
    pub(super) fn record_release(&mut self, kind: Option<ObjectKind>) {
        match kind {
            Some(ObjectKind::Symbol) => self.symbols_released += 1,
            Some(ObjectKind::String) => self.strings_freed += 1,
            Some(ObjectKind::Pair) => self.pairs_released += 1,
            None => {}
        }
    }
}
