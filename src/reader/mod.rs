//! Datum reader: turns source text into tagged values one datum at a time.
//!
//! Atoms must be followed by a delimiter (whitespace, `;`) or end of input.
//! Symbol text is folded to lower case through a byte buffer before it is
//! interned. Only the empty list has a list literal.

use logos::Logos;

use crate::buffer::{BufferError, ByteBuffer};
use crate::heap::{Heap, HeapError};
use crate::lexer::{LexError, Span, Token, is_delimiter};
use crate::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected a delimiter after '{text}'")]
    MissingDelimiter { text: String, span: Span },
    #[error("number {text} does not fit in a fixnum")]
    FixnumOutOfRange { text: String, span: Span },
    #[error("non-empty lists have not been implemented")]
    ListsUnsupported { span: Span },
    #[error("unexpected ')'")]
    UnexpectedCloseParen { span: Span },
    #[error("could not buffer symbol text: {source}")]
    Buffer {
        #[source]
        source: BufferError,
        span: Span,
    },
    #[error(transparent)]
    Heap(#[from] HeapError),
}

impl ReadError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ReadError::Lex(e) => Some(Span { start: e.position, end: e.position + e.snippet.len() }),
            ReadError::MissingDelimiter { span, .. }
            | ReadError::FixnumOutOfRange { span, .. }
            | ReadError::ListsUnsupported { span }
            | ReadError::UnexpectedCloseParen { span }
            | ReadError::Buffer { span, .. } => Some(*span),
            ReadError::Heap(_) => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ReadError::Lex(e) => e.code(),
            ReadError::MissingDelimiter { .. } => "RS-R001",
            ReadError::FixnumOutOfRange { .. } => "RS-R002",
            ReadError::ListsUnsupported { .. } => "RS-R003",
            ReadError::UnexpectedCloseParen { .. } => "RS-R004",
            ReadError::Buffer { .. } => "RS-R005",
            ReadError::Heap(e) => e.code(),
        }
    }

    /// Heap failures end the session; everything else only loses the datum.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReadError::Heap(_))
    }
}

pub struct Reader<'src> {
    source: &'src str,
    lexer: logos::Lexer<'src, Token>,
    text: ByteBuffer,
}

impl<'src> Reader<'src> {
    pub fn new(source: &'src str) -> Self {
        Reader {
            source,
            lexer: Token::lexer(source),
            text: ByteBuffer::new(),
        }
    }

    /// Read the next datum. Returns `Value::EOF` once the input is used up.
    ///
    /// A returned heap value is not rooted.
    pub fn read(&mut self, heap: &mut Heap) -> Result<Value, ReadError> {
        let Some(next) = self.lexer.next() else {
            return Ok(Value::EOF);
        };
        let span = Span::from(self.lexer.span());
        let token = next.map_err(|()| LexError::new(self.source, span))?;

        if !matches!(token, Token::OpenParen | Token::CloseParen) {
            self.expect_delimiter(span)?;
        }

        let value = match token {
            Token::OpenParen => return Err(ReadError::ListsUnsupported { span }),
            Token::CloseParen => return Err(ReadError::UnexpectedCloseParen { span }),
            Token::EmptyList => Value::NULL,
            Token::True => Value::TRUE,
            Token::False => Value::FALSE,
            Token::Character(c) => Value::character(c),
            Token::Symbol => self.symbol(heap, span)?,
            Token::Decimal | Token::Binary | Token::Octal | Token::RadixDecimal | Token::Hex => {
                self.fixnum(&token, span)?
            }
        };
        tracing::trace!(start = span.start, end = span.end, "read datum");
        Ok(value)
    }

    /// Read every remaining datum, stopping at the first error.
    pub fn read_all(&mut self, heap: &mut Heap) -> Result<Vec<Value>, ReadError> {
        let mut out = Vec::new();
        loop {
            let v = self.read(heap)?;
            if v.is_eof() {
                return Ok(out);
            }
            out.push(v);
        }
    }

    fn expect_delimiter(&self, span: Span) -> Result<(), ReadError> {
        match self.source[span.end..].chars().next() {
            None => Ok(()),
            Some(c) if is_delimiter(c) => Ok(()),
            Some(c) => Err(ReadError::MissingDelimiter {
                text: self.source[span.start..span.end].to_string(),
                span: Span { start: span.end, end: span.end + c.len_utf8() },
            }),
        }
    }

    fn fixnum(&self, token: &Token, span: Span) -> Result<Value, ReadError> {
        let text = &self.source[span.start..span.end];
        let out_of_range = || ReadError::FixnumOutOfRange { text: text.to_string(), span };
        let Some((radix, prefix)) = token.radix() else {
            return Err(out_of_range());
        };
        let n = i64::from_str_radix(&text[prefix..], radix).map_err(|_| out_of_range())?;
        Value::try_fixnum(n).map_err(|_| out_of_range())
    }

    fn symbol(&mut self, heap: &mut Heap, span: Span) -> Result<Value, ReadError> {
        let buffer_err = |source| ReadError::Buffer { source, span };
        self.text.reset();
        for b in self.source[span.start..span.end].bytes() {
            self.text.push(b.to_ascii_lowercase()).map_err(buffer_err)?;
        }
        // lexer only admits ASCII here
        let name = self.text.as_str().unwrap_or_default();
        Ok(heap.make_symbol(name)?)
    }
}
