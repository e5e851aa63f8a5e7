// ---- Tagged value word ----
//
// Every rescheme value is one 64-bit word. The two low bits say how to
// read the rest:
//
//   00  heap reference   (slot index + 1) << 2, never zero
//   01  fixnum           signed payload << 2
//   10  character        Unicode scalar << 2
//   11  singleton        #t, #f, () and eof, compared as whole words
//
// This module is the only place that touches the raw bits. Everything
// else goes through the predicates/accessors below or through `Tagged`.

const TAG_BITS: u32 = 2;
const TAG_MASK: u64 = 0b11;

const HEAP_TAG: u64 = 0b00;
const FIXNUM_TAG: u64 = 0b01;
const CHARACTER_TAG: u64 = 0b10;
const SINGLETON_TAG: u64 = 0b11;

const TRUE_WORD: u64 = 0b0011;
const FALSE_WORD: u64 = 0b0111;
const NULL_WORD: u64 = 0b1011;
const EOF_WORD: u64 = 0b1111;

/// Smallest representable fixnum. The range is kept symmetric.
pub const FIXNUM_MIN: i64 = ((1i64 << 63) >> TAG_BITS) + 1;
/// Largest representable fixnum.
pub const FIXNUM_MAX: i64 = -FIXNUM_MIN;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("fixnum {value} is out of range [{}, {}]", FIXNUM_MIN, FIXNUM_MAX)]
    FixnumOutOfRange { value: i128 },
}

/// Index of a slot in a heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef(usize);

impl SlotRef {
    pub const fn new(index: usize) -> Self {
        SlotRef(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Decoded form of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagged {
    Heap(SlotRef),
    Fixnum(i64),
    Character(char),
    Boolean(bool),
    Null,
    Eof,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value(u64);

impl Value {
    pub const TRUE: Value = Value(TRUE_WORD);
    pub const FALSE: Value = Value(FALSE_WORD);
    pub const NULL: Value = Value(NULL_WORD);
    pub const EOF: Value = Value(EOF_WORD);

    #[inline]
    fn tag(self) -> u64 {
        self.0 & TAG_MASK
    }

    /// The raw word, for diagnostics and identity checks only.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_immediate(self) -> bool {
        !self.is_heap()
    }

    #[inline]
    pub fn is_heap(self) -> bool {
        debug_assert_ne!(self.0, 0, "zero word is not a value");
        self.tag() == HEAP_TAG
    }

    #[inline]
    pub fn heap(slot: SlotRef) -> Self {
        Value((((slot.index() as u64) + 1) << TAG_BITS) | HEAP_TAG)
    }

    #[inline]
    pub fn as_slot(self) -> SlotRef {
        debug_assert!(self.is_heap(), "not a heap reference: {self:?}");
        SlotRef(((self.0 >> TAG_BITS) as usize).wrapping_sub(1))
    }

    // ---- fixnums ----

    #[inline]
    pub fn is_fixnum(self) -> bool {
        self.tag() == FIXNUM_TAG
    }

    /// Encode `n` without range checking. Use [`Value::try_fixnum`] for
    /// untrusted input.
    #[inline]
    pub fn fixnum(n: i64) -> Self {
        debug_assert!((FIXNUM_MIN..=FIXNUM_MAX).contains(&n), "fixnum out of range: {n}");
        Value(((n << TAG_BITS) as u64) | FIXNUM_TAG)
    }

    pub fn try_fixnum(n: i64) -> Result<Self, ValueError> {
        if (FIXNUM_MIN..=FIXNUM_MAX).contains(&n) {
            Ok(Value::fixnum(n))
        } else {
            Err(ValueError::FixnumOutOfRange { value: n as i128 })
        }
    }

    #[inline]
    pub fn as_fixnum(self) -> i64 {
        debug_assert!(self.is_fixnum(), "not a fixnum: {self:?}");
        (self.0 as i64) >> TAG_BITS
    }

    // ---- characters ----

    #[inline]
    pub fn is_character(self) -> bool {
        self.tag() == CHARACTER_TAG
    }

    #[inline]
    pub fn character(c: char) -> Self {
        Value(((c as u64) << TAG_BITS) | CHARACTER_TAG)
    }

    #[inline]
    pub fn as_character(self) -> char {
        debug_assert!(self.is_character(), "not a character: {self:?}");
        let code = (self.0 >> TAG_BITS) as u32;
        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    // ---- singletons ----

    #[inline]
    pub fn boolean(b: bool) -> Self {
        if b { Value::TRUE } else { Value::FALSE }
    }

    #[inline]
    pub fn is_boolean(self) -> bool {
        self == Value::TRUE || self == Value::FALSE
    }

    #[inline]
    pub fn as_boolean(self) -> bool {
        debug_assert!(self.is_boolean(), "not a boolean: {self:?}");
        self == Value::TRUE
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Value::NULL
    }

    #[inline]
    pub fn is_eof(self) -> bool {
        self == Value::EOF
    }

    pub fn decode(self) -> Tagged {
        match self.tag() {
            HEAP_TAG => Tagged::Heap(self.as_slot()),
            FIXNUM_TAG => Tagged::Fixnum(self.as_fixnum()),
            CHARACTER_TAG => Tagged::Character(self.as_character()),
            _ => match self.0 {
                TRUE_WORD => Tagged::Boolean(true),
                FALSE_WORD => Tagged::Boolean(false),
                NULL_WORD => Tagged::Null,
                _ => {
                    debug_assert_eq!(self.0, EOF_WORD, "unknown singleton word {:#x}", self.0);
                    debug_assert_eq!(self.tag(), SINGLETON_TAG);
                    Tagged::Eof
                }
            },
        }
    }
}

impl From<Tagged> for Value {
    fn from(t: Tagged) -> Self {
        match t {
            Tagged::Heap(slot) => Value::heap(slot),
            Tagged::Fixnum(n) => Value::fixnum(n),
            Tagged::Character(c) => Value::character(c),
            Tagged::Boolean(b) => Value::boolean(b),
            Tagged::Null => Value::NULL,
            Tagged::Eof => Value::EOF,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            return write!(f, "Value(<zero>)");
        }
        match self.decode() {
            Tagged::Heap(slot) => write!(f, "Value(heap #{})", slot.index()),
            other => write!(f, "Value({other:?})"),
        }
    }
}
