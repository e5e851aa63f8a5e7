/// Line index over a borrowed source, for turning byte offsets into
/// 1-based `line:col` positions. Columns count characters, not bytes.
pub struct SourceMap<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { source, line_starts }
    }

    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        let col = self.source.get(start..offset).map_or(offset - start, |s| s.chars().count());
        (line, col + 1)
    }

    /// Number of characters in `start..end`, at least one.
    pub fn width(&self, start: usize, end: usize) -> usize {
        self.source
            .get(start..end)
            .map_or(end.saturating_sub(start), |s| s.chars().count())
            .max(1)
    }

    /// Text of a 1-based line without its terminator. Empty when out of range.
    pub fn line(&self, line: usize) -> &'a str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.line_starts.get(i)) else {
            return "";
        };
        let end = self.line_starts.get(line).map_or(self.source.len(), |&next| next);
        self.source[start..end].trim_end_matches('\n').trim_end_matches('\r')
    }
}
