/// Calculates the 1-based line and column number for a byte position in the
/// source text. Only called on the diagnostic path, so the linear walk over
/// the source is fine.
#[must_use]
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (offset, c) in source.char_indices() {
        if offset >= position {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
