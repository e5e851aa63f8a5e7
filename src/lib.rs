//! ReScheme: tagged values, a fixed-size object heap with a mark-sweep
//! collector, a reference-counted symbol table, and the reader and printer
//! that sit on top of them.

pub mod buffer;
pub mod diagnostic;
pub mod heap;
pub mod lexer;
pub mod printer;
pub mod reader;
pub mod stack;
pub mod symtab;
pub mod value;

pub use heap::{GcStats, Heap, HeapConfig, HeapError};
pub use value::Value;
