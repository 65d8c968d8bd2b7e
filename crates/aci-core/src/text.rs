//! Line and tab helpers shared by the editor, linter and viewer.

pub const TAB_SIZE: usize = 8;

/// Replace tabs with spaces up to the next multiple of `tab_size`.
///
/// The column resets at `\n` and `\r`, so each line expands independently.
pub fn expand_tabs(s: &str, tab_size: usize) -> String {
    if !s.contains('\t') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 16);
    let mut col = 0usize;
    for ch in s.chars() {
        match ch {
            '\t' => {
                if tab_size > 0 {
                    let pad = tab_size - (col % tab_size);
                    out.extend(std::iter::repeat(' ').take(pad));
                    col += pad;
                }
            }
            '\n' | '\r' => {
                out.push(ch);
                col = 0;
            }
            _ => {
                out.push(ch);
                col += 1;
            }
        }
    }
    out
}

/// Number of lines as a line-by-line file read yields them.
pub fn count_lines(s: &str) -> usize {
    s.lines().count()
}

/// Lines `start..=end` (1-based), keeping their terminators.
pub fn line_range(s: &str, start: usize, end: usize) -> String {
    s.split_inclusive('\n')
        .enumerate()
        .filter(|(i, _)| {
            let n = i + 1;
            n >= start && n <= end
        })
        .map(|(_, line)| line)
        .collect()
}

/// Render `content` the way `cat -n` does, numbering from `start`.
///
/// A single trailing newline does not produce an extra numbered line.
pub fn number_lines(content: &str, start: usize) -> String {
    let body = content.strip_suffix('\n').unwrap_or(content);
    body.split('\n')
        .enumerate()
        .map(|(i, line)| format!("{:6}\t{}", i + start, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 1-based line number of the byte offset `idx`.
pub fn line_of_offset(s: &str, idx: usize) -> usize {
    s[..idx].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tabs_matches_column_stops() {
        assert_eq!(expand_tabs("\tx", 8), "        x");
        assert_eq!(expand_tabs("ab\tc", 8), "ab      c");
        assert_eq!(expand_tabs("a\n\tb", 4), "a\n    b");
        assert_eq!(expand_tabs("no tabs", 8), "no tabs");
    }

    #[test]
    fn count_lines_ignores_trailing_newline() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\nb\n"), 2);
        assert_eq!(count_lines("a\n\n"), 2);
    }

    #[test]
    fn line_range_is_inclusive() {
        let s = "one\ntwo\nthree\nfour";
        assert_eq!(line_range(s, 2, 3), "two\nthree\n");
        assert_eq!(line_range(s, 4, 10), "four");
        assert_eq!(line_range(s, 5, 6), "");
    }

    #[test]
    fn number_lines_like_cat() {
        assert_eq!(number_lines("a\nb", 1), "     1\ta\n     2\tb");
        assert_eq!(number_lines("a\nb\n", 9), "     9\ta\n    10\tb");
        assert_eq!(number_lines("", 1), "     1\t");
    }

    #[test]
    fn offsets_map_to_lines() {
        let s = "x\ny\nz";
        assert_eq!(line_of_offset(s, 0), 1);
        assert_eq!(line_of_offset(s, 2), 2);
        assert_eq!(line_of_offset(s, 4), 3);
    }
}
