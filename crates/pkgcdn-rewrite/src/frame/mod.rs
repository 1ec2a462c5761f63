//! Source excerpts for error reports

/// Lines of context shown above and below the offending line
const CONTEXT_LINES: usize = 2;

/// 1-based line and 0-based column (in characters) of a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count();
    (line, column)
}

/// Render the lines around `line` with a marker and a caret under `column`:
///
/// ```text
///   1 | import a from "a";
/// > 2 | const s = "oops
///     |           ^
///   3 | next()
/// ```
pub fn code_frame(source: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let target = line.clamp(1, lines.len());
    let first = target.saturating_sub(CONTEXT_LINES).max(1);
    let last = (target + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();

    let mut frame = Vec::new();
    for number in first..=last {
        let text = lines[number - 1];
        if number == target {
            frame.push(format!("> {:>width$} | {}", number, text, width = width));
            frame.push(format!("  {:>width$} | {}^", "", " ".repeat(column), width = width));
        } else {
            frame.push(format!("  {:>width$} | {}", number, text, width = width));
        }
    }
    frame.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "ab\ncd\nef";
        assert_eq!(line_col(source, 0), (1, 0));
        assert_eq!(line_col(source, 4), (2, 1));
        assert_eq!(line_col(source, 6), (3, 0));
        assert_eq!(line_col(source, 100), (3, 2));
    }

    #[test]
    fn test_code_frame() {
        let source = "one\ntwo\nthree\nfour\nfive\nsix";
        let frame = code_frame(source, 4, 2);
        assert_eq!(
            frame,
            "  2 | two\n  3 | three\n> 4 | four\n    |   ^\n  5 | five\n  6 | six"
        );
    }

    #[test]
    fn test_code_frame_at_start() {
        let frame = code_frame("x = 'oops", 1, 4);
        assert_eq!(frame, "> 1 | x = 'oops\n    |     ^");
    }
}
