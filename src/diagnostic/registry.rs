/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one line, used in JSON output
    pub long: &'static str,  // full text for --explain
}

/// Every stable error code the reader, lexer and heap can report.
pub static REGISTRY: &[ErrorEntry] = &[
    // ---- Lexer ----
    ErrorEntry {
        code: "RS-L001",
        short: "unexpected character",
        long: r#"## RS-L001: unexpected character

The input contains a character that cannot start any datum the reader
knows about. String literals, quotation marks and vectors are not read
yet.

**Example:**

    "hello"
"#,
    },
    ErrorEntry {
        code: "RS-L002",
        short: "unknown character name",
        long: r#"## RS-L002: unknown character name

A `#\` character literal was followed by a word that is not a known
character name. The names are `newline`, `space` and `tab`, in any case.
Anything else must be a single printable character.

**Example:**

    #\linefeed

**Fix:**

    #\newline
"#,
    },

    // ---- Reader ----
    ErrorEntry {
        code: "RS-R001",
        short: "missing delimiter after datum",
        long: r#"## RS-R001: missing delimiter after datum

Every atom must be followed by whitespace, a `;` comment or the end of
the input.

**Example:**

    12abc

**Fix:**

    12 abc
"#,
    },
    ErrorEntry {
        code: "RS-R002",
        short: "fixnum out of range",
        long: r#"## RS-R002: fixnum out of range

Numbers are stored as 62-bit fixnums. The literal lies outside
[-2305843009213693951, 2305843009213693951].
"#,
    },
    ErrorEntry {
        code: "RS-R003",
        short: "non-empty list",
        long: r#"## RS-R003: non-empty lists have not been implemented

The reader accepts only the empty list `()`. An opening parenthesis
followed by anything else is rejected.
"#,
    },
    ErrorEntry {
        code: "RS-R004",
        short: "unexpected close parenthesis",
        long: r#"## RS-R004: unexpected ')'

A closing parenthesis appeared without a matching opening one.
"#,
    },
    ErrorEntry {
        code: "RS-R005",
        short: "text buffer allocation failed",
        long: r#"## RS-R005: text buffer allocation failed

The reader could not grow its scratch buffer while collecting the text
of a symbol. The process is out of memory.
"#,
    },

    // ---- Heap ----
    ErrorEntry {
        code: "RS-H001",
        short: "heap exhausted",
        long: r#"## RS-H001: heap exhausted

An allocation found no free slot, a full collection reclaimed nothing,
and the retry failed. Every slot is reachable from the root stack.

Run with a larger arena:

    rescheme --heap-size 65536
"#,
    },
    ErrorEntry {
        code: "RS-H002",
        short: "root stack underflow",
        long: r#"## RS-H002: root stack underflow

A root was popped while the root stack was empty. Pushes and pops must
be balanced.
"#,
    },
    ErrorEntry {
        code: "RS-H003",
        short: "wrong object type",
        long: r#"## RS-H003: wrong object type

An accessor was applied to an object of another type, for example
`car` on a symbol.
"#,
    },
    ErrorEntry {
        code: "RS-H004",
        short: "dangling heap reference",
        long: r#"## RS-H004: dangling heap reference

A heap reference named a slot that is free or outside the arena. The
object it referred to was collected because it was not rooted.
"#,
    },
    ErrorEntry {
        code: "RS-H005",
        short: "not a heap reference",
        long: r#"## RS-H005: not a heap reference

A slot operation received an immediate value (fixnum, character,
boolean, the empty list or eof).
"#,
    },
    ErrorEntry {
        code: "RS-H006",
        short: "NUL byte in string",
        long: r#"## RS-H006: NUL byte in string

Heap strings are NUL-terminated and may not contain a NUL byte.
"#,
    },
    ErrorEntry {
        code: "RS-H007",
        short: "symbol refcount overflow",
        long: r#"## RS-H007: symbol refcount overflow

One symbol name is referenced by more heap objects than its reference
count can represent.
"#,
    },
];

/// Look up an error entry by code (e.g. `"RS-R002"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code))
}
