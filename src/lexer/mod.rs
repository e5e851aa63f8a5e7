use logos::Logos;

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<std::ops::Range<usize>> for Span {
    fn from(r: std::ops::Range<usize>) -> Self {
        Span { start: r.start, end: r.end }
    }
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub enum Token {
    // Fixnums. The reader parses the slice so it can report range errors.
    #[regex(r"[+-]?[0-9]+")]
    Decimal,
    #[regex(r"#[bB][+-]?[01]+")]
    Binary,
    #[regex(r"#[oO][+-]?[0-7]+")]
    Octal,
    #[regex(r"#[dD][+-]?[0-9]+")]
    RadixDecimal,
    #[regex(r"#[xX][+-]?[0-9a-fA-F]+")]
    Hex,

    #[regex(r"#[tT]")]
    True,
    #[regex(r"#[fF]")]
    False,

    #[regex(r"#\\[!-~]", |lex| lex.slice()[2..].chars().next())]
    #[regex(r"#\\[a-zA-Z][a-zA-Z]+", |lex| char_name(&lex.slice()[2..]))]
    Character(char),

    // Only the empty list has a literal form so far.
    #[token("()")]
    EmptyList,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[regex(r"[a-zA-Z!$%*/:<=>?^_~][a-zA-Z0-9!$%*/:<=>?^_~+.@-]*")]
    #[token("+")]
    #[token("-")]
    Symbol,
}

fn char_name(name: &str) -> Option<char> {
    match name.to_ascii_lowercase().as_str() {
        "newline" => Some('\n'),
        "space" => Some(' '),
        "tab" => Some('\t'),
        _ => None,
    }
}

impl Token {
    /// Radix and prefix length of a fixnum token.
    pub fn radix(&self) -> Option<(u32, usize)> {
        match self {
            Token::Decimal => Some((10, 0)),
            Token::Binary => Some((2, 2)),
            Token::Octal => Some((8, 2)),
            Token::RadixDecimal => Some((10, 2)),
            Token::Hex => Some((16, 2)),
            _ => None,
        }
    }
}

/// Characters that may follow an atom.
pub fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | ';')
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lex error at position {position}: '{snippet}'. {suggestion}")]
pub struct LexError {
    pub position: usize,
    pub snippet: String,
    pub suggestion: String,
}

impl LexError {
    pub fn new(source: &str, span: Span) -> Self {
        let snippet = source.get(span.start..span.end).unwrap_or_default().to_string();
        LexError {
            position: span.start,
            suggestion: suggest_fix(&snippet),
            snippet,
        }
    }

    pub fn code(&self) -> &'static str {
        if self.snippet.starts_with("#\\") { "RS-L002" } else { "RS-L001" }
    }
}

/// Every lex error carries a hint about what would have been accepted.
fn suggest_fix(bad: &str) -> String {
    if bad.starts_with("#\\") {
        "Character names are #\\newline, #\\space and #\\tab; otherwise use one printable character.".to_string()
    } else if bad.starts_with('#') {
        "After '#' expect t, f, \\ or a radix prefix (b, o, d, x).".to_string()
    } else if bad.starts_with('"') {
        "String literals are not supported by the reader yet.".to_string()
    } else if bad.starts_with('\'') || bad.starts_with('`') || bad.starts_with(',') {
        "Quotation syntax is not supported by the reader yet.".to_string()
    } else {
        format!("Unexpected character(s): '{}'.", bad)
    }
}
