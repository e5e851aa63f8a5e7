use super::{Diagnostic, Severity, SourceMap};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn paint(&self, style: &str, s: &str) -> String {
        if self.use_color { format!("\x1b[{style}m{s}\x1b[0m") } else { s.to_string() }
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    fn red(&self, s: &str) -> String {
        self.paint("1;31", s)
    }

    fn yellow(&self, s: &str) -> String {
        self.paint("1;33", s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        // "error[RS-R002]: message"
        let head = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let head = match d.code {
            Some(code) => format!("{head}[{code}]"),
            None => head.to_string(),
        };
        let head = match d.severity {
            Severity::Error => self.red(&head),
            Severity::Warning => self.yellow(&head),
        };
        out.push_str(&format!("{}: {}\n", head, self.bold(&d.message)));

        if let Some(source) = &d.source {
            let map = SourceMap::new(source);
            for label in &d.labels {
                let (line, col) = map.lookup(label.span.start);
                let gutter = line.to_string().len();
                let pad = " ".repeat(gutter);
                let pipe = self.cyan("|");

                out.push_str(&format!("{pad}{} {}:{}\n", self.cyan("-->"), line, col));
                out.push_str(&format!("{pad} {pipe}\n"));
                out.push_str(&format!(
                    "{} {pipe} {}\n",
                    self.cyan(&format!("{line:>gutter$}")),
                    map.line(line)
                ));

                let width = map.width(label.span.start, label.span.end);
                let carets = self.red(&"^".repeat(width));
                let indent = " ".repeat(col - 1);
                if label.message.is_empty() {
                    out.push_str(&format!("{pad} {pipe} {indent}{carets}\n"));
                } else {
                    out.push_str(&format!(
                        "{pad} {pipe} {indent}{carets} {}\n",
                        self.red(&label.message)
                    ));
                }
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.dim("="), note));
        }
        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} help: {}\n", self.dim("="), suggestion));
        }
        if let Some(code) = d.code {
            out.push_str(&format!(
                "  {} run `rescheme --explain {code}` for details\n",
                self.dim("=")
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn plain() -> AnsiRenderer {
        AnsiRenderer { use_color: false }
    }

    fn sample() -> Diagnostic {
        Diagnostic::error("number 99999999999999999999 does not fit in a fixnum")
            .with_code("RS-R002")
            .with_span(Span { start: 4, end: 24 }, "out of range")
            .with_source("foo 99999999999999999999 bar")
            .with_note("fixnums are 62-bit")
            .with_suggestion("use a smaller number")
    }

    #[test]
    fn render_heading_carries_code() {
        let out = plain().render(&sample());
        assert!(out.starts_with("error[RS-R002]: number"), "got:\n{out}");
    }

    #[test]
    fn render_source_line_and_carets() {
        let out = plain().render(&sample());
        assert!(out.contains("--> 1:5"), "got:\n{out}");
        assert!(out.contains("1 | foo 99999999999999999999 bar"), "got:\n{out}");
        assert!(out.contains(&format!("    {} out of range", "^".repeat(20))), "got:\n{out}");
    }

    #[test]
    fn render_note_help_and_explain_hint() {
        let out = plain().render(&sample());
        assert!(out.contains("note: fixnums are 62-bit"));
        assert!(out.contains("help: use a smaller number"));
        assert!(out.contains("rescheme --explain RS-R002"));
    }

    #[test]
    fn render_second_line() {
        let d = Diagnostic::error("unexpected ')'")
            .with_span(Span { start: 3, end: 4 }, "")
            .with_source("42\n)");
        let out = plain().render(&d);
        assert!(out.contains("--> 2:1"), "got:\n{out}");
        assert!(out.contains("2 | )"), "got:\n{out}");
    }

    #[test]
    fn carets_line_up_under_multibyte_text() {
        let d = Diagnostic::error("expected a delimiter after '12'")
            .with_span(Span { start: 5, end: 6 }, "")
            .with_source("λ 12abc");
        let out = plain().render(&d);
        assert!(out.contains("--> 1:5"), "got:\n{out}");
        assert!(out.contains("  |     ^\n"), "got:\n{out}");

        let d = Diagnostic::error("unexpected character")
            .with_span(Span { start: 1, end: 3 }, "here")
            .with_source("(λ)");
        let out = plain().render(&d);
        assert!(out.contains("--> 1:2"), "got:\n{out}");
        assert!(out.contains("  |  ^ here"), "got:\n{out}");
        assert!(!out.contains("^^"), "got:\n{out}");
    }

    #[test]
    fn render_without_source_has_no_snippet() {
        let d = Diagnostic::error("pop from an empty root stack");
        let out = plain().render(&d);
        assert_eq!(out, "error: pop from an empty root stack\n");
    }

    #[test]
    fn warning_heading() {
        let out = plain().render(&Diagnostic::warning("heap size 0 raised to 1"));
        assert!(out.starts_with("warning: heap size"));
    }

    #[test]
    fn color_toggle() {
        let colored = AnsiRenderer { use_color: true }.render(&sample());
        assert!(colored.contains("\x1b["));
        assert!(!plain().render(&sample()).contains("\x1b["));
    }
}
