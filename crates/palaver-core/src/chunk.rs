//! Output chunking for transport-bounded replies.
//!
//! Splits arbitrarily long text into segments that fit a transport's message
//! size ceiling, cutting only on line boundaries so structural formatting
//! (code fences, lists) is never broken mid-line. Joining the segments back
//! with newlines reproduces the input exactly.

/// Segment ceiling matching the transport limit the store was built against.
pub const DEFAULT_SEGMENT_CHARS: usize = 4096;

/// Split `text` into segments of at most `max_unit` characters, cutting on
/// line boundaries only.
///
/// Lines accumulate into the current segment while the segment length plus
/// the line (counting one character for each rejoined newline) stays within
/// `max_unit`. A line that would overflow closes the current segment and
/// starts the next one. The final partial segment is always flushed.
///
/// A single line longer than `max_unit` is NOT sub-split: it is emitted as
/// its own over-long segment. Callers must tolerate that one documented
/// exception to the ceiling.
pub fn chunk_text(text: &str, max_unit: usize) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count() + 1;
        if !current.is_empty() && current_len + line_len > max_unit {
            segments.push(current.join("\n"));
            current = vec![line];
            current_len = line_len;
        } else {
            current.push(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        segments.push(current.join("\n"));
    }

    segments
}
