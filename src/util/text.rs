use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns.
///
/// Unicode-aware: CJK and most emoji count as 2 columns, combining marks as 0.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within `max_width` terminal columns, appending
/// "..." when text was cut off.
///
/// Returns `Cow::Borrowed` when the string already fits (no allocation).
/// Widths of 3 columns or fewer return the bare prefix that fits, without an
/// ellipsis, since there is no room for both a character and "...".
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(prefix_fitting(s, max_width).to_string());
    }

    let kept = prefix_fitting(s, max_width - ELLIPSIS_WIDTH);
    let mut out = String::with_capacity(kept.len() + ELLIPSIS.len());
    out.push_str(kept);
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

/// Longest prefix of `s` whose display width fits in `columns`.
fn prefix_fitting(s: &str, columns: usize) -> &str {
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > columns {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }
    &s[..end]
}

/// Collapses whitespace runs to single spaces and clips to `max_chars`
/// characters. Card summaries are clipped rather than wrapped.
pub fn clip_summary(s: &str, max_chars: usize) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}
