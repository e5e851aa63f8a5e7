use rescheme::heap::{DEFAULT_HEAP_CAPACITY, Heap, HeapConfig, HeapError};
use rescheme::reader::{ReadError, Reader};
use rescheme::symtab::SymbolTable;
use rescheme::value::{FIXNUM_MAX, FIXNUM_MIN, Tagged, Value};

fn heap(capacity: usize) -> Heap {
    Heap::new(HeapConfig { capacity })
}

// --- Tag round-trips ---

#[test]
fn fixnum_round_trip_random() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..10_000 {
        let n = rng.i64(FIXNUM_MIN..=FIXNUM_MAX);
        let v = Value::fixnum(n);
        assert!(v.is_fixnum() && !v.is_heap());
        assert_eq!(v.as_fixnum(), n);
        assert_eq!(v.decode(), Tagged::Fixnum(n));
    }
}

#[test]
fn character_round_trip_random() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..10_000 {
        let c = rng.char(..);
        let v = Value::character(c);
        assert!(v.is_character());
        assert_eq!(v.as_character(), c);
    }
}

#[test]
fn fixnum_boundaries_are_enforced() {
    assert!(Value::try_fixnum(FIXNUM_MIN).is_ok());
    assert!(Value::try_fixnum(FIXNUM_MAX).is_ok());
    assert!(Value::try_fixnum(FIXNUM_MIN - 1).is_err());
    assert!(Value::try_fixnum(FIXNUM_MAX + 1).is_err());

    let mut h = heap(4);
    for text in [(FIXNUM_MIN - 1).to_string(), (FIXNUM_MAX + 1).to_string()] {
        let err = Reader::new(&text).read(&mut h).unwrap_err();
        assert!(matches!(err, ReadError::FixnumOutOfRange { .. }), "{text}: {err:?}");
    }
}

// --- Reachability ---

#[test]
fn rooted_chain_survives_forced_collection() {
    let mut h = heap(64);
    let mut head = Value::NULL;
    for i in 0..50 {
        head = h.cons(Value::fixnum(i), head).unwrap();
    }
    h.push_root(head);

    // fill the rest of the arena with garbage until a collection runs
    while h.stats().collections == 0 {
        h.make_string("garbage").unwrap();
    }

    let mut cur = head;
    for i in (0..50).rev() {
        assert_eq!(h.car(cur).unwrap().as_fixnum(), i);
        cur = h.cdr(cur).unwrap();
    }
    assert!(cur.is_null());
    assert_eq!(h.pop_root().unwrap(), head);
}

#[test]
fn unrooted_symbols_never_exhaust_the_arena() {
    let mut h = heap(DEFAULT_HEAP_CAPACITY);
    for i in 0..2000 {
        h.make_symbol(&format!("symbol-{i}")).unwrap();
    }
    let stats = h.stats();
    assert_eq!(stats.allocations, 2000);
    assert!(stats.collections >= 1);
    assert!(h.symbols().len() <= DEFAULT_HEAP_CAPACITY);
}

#[test]
fn fully_rooted_arena_is_out_of_memory() {
    let mut h = heap(3);
    for name in ["a", "b", "c"] {
        let v = h.make_symbol(name).unwrap();
        h.push_root(v);
    }
    assert_eq!(h.make_symbol("d").unwrap_err(), HeapError::OutOfMemory { capacity: 3 });
}

// --- Interning ---

#[test]
fn interning_identity_and_release() {
    let mut tab = SymbolTable::new();
    let a = tab.intern("foo").unwrap();
    let b = tab.intern("foo").unwrap();
    assert_eq!(a.as_ptr(), b.as_ptr());
    assert_eq!(tab.count("foo"), Some(2));
    assert!(tab.release("foo"));
    assert!(tab.release("foo"));
    assert!(!tab.contains("foo"));
    assert!(!tab.release("foo"));
}

#[test]
fn heap_symbols_share_canonical_names() {
    let mut h = heap(8);
    let a = h.make_symbol("foo").unwrap();
    let b = h.make_symbol("foo").unwrap();
    assert_ne!(a, b);
    assert!(h.symbol(a).unwrap().ptr_eq(h.symbol(b).unwrap()));
    assert_eq!(h.symbols().count("foo"), Some(2));

    h.push_root(a);
    h.collect();
    assert_eq!(h.symbols().count("foo"), Some(1));
    h.pop_root().unwrap();
    h.collect();
    assert!(!h.symbols().contains("foo"));
}

// --- Cycles ---

#[test]
fn two_pair_cycle_survives_collection() {
    let mut h = heap(8);
    let a = h.cons(Value::fixnum(1), Value::NULL).unwrap();
    let b = h.rooted(a, |h| h.cons(Value::fixnum(2), a)).unwrap();
    h.set_cdr(a, b).unwrap();
    h.push_root(a);
    h.make_symbol("garbage").unwrap();

    assert_eq!(h.collect(), 1);
    assert!(h.is_pair(a) && h.is_pair(b));
    assert_eq!(h.cdr(a).unwrap(), b);
    assert_eq!(h.cdr(b).unwrap(), a);
}

// --- Finalization ---

#[test]
fn swept_string_is_freed_and_slot_reused() {
    let mut h = heap(1);
    let s = h.make_string("temporary").unwrap();
    assert!(h.is_string(s));

    assert_eq!(h.collect(), 1);
    assert_eq!(h.stats().strings_freed, 1);
    assert!(!h.is_live(s));

    let t = h.make_symbol("next").unwrap();
    assert_eq!(t, s, "single slot is handed out again");
    assert!(h.is_symbol(t));
}

#[test]
fn shutdown_releases_everything() {
    let mut h = heap(8);
    let s = h.make_symbol("kept").unwrap();
    h.push_root(s);
    h.make_string("also kept").unwrap();
    let stats = h.shutdown();
    assert_eq!(stats.live, 0);
    assert_eq!(stats.symbols_released, 1);
    assert_eq!(stats.strings_freed, 1);
}
