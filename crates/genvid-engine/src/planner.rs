//! Segment planning.
//!
//! Decides how many independent generation calls a script needs and
//! partitions the script into them. Everything here is a pure function
//! of the text and the requested count, so a restarted run produces the
//! same plan.

/// Seconds of video one generation call covers.
pub const SEGMENT_WINDOW_SECS: u32 = 10;

/// Number of segments needed for a requested duration.
pub fn segment_count(duration_secs: u32) -> usize {
    if duration_secs <= SEGMENT_WINDOW_SECS {
        1
    } else {
        duration_secs.div_ceil(SEGMENT_WINDOW_SECS) as usize
    }
}

/// Partition a script into up to `segments` prompt chunks.
///
/// Splits on sentence boundaries and distributes sentences so that
/// group sizes differ by at most one, keeping original order. With
/// fewer sentences than requested segments the plan collapses to one
/// segment per sentence; with no sentences at all the full text is the
/// single segment.
pub fn split_script(text: &str, segments: usize) -> Vec<String> {
    if segments <= 1 {
        return vec![text.to_string()];
    }

    let sentences = split_sentences(text);
    let segments = segments.min(sentences.len());
    if segments == 0 {
        return vec![text.to_string()];
    }

    let per_segment = sentences.len() / segments;
    let extra = sentences.len() % segments;

    let mut result = Vec::with_capacity(segments);
    let mut idx = 0;
    for i in 0..segments {
        // The remainder goes to the leading groups, one sentence each.
        let count = per_segment + usize::from(i < extra);
        result.push(sentences[idx..idx + count].join(" "));
        idx += count;
    }

    result
}

/// Split text into sentences on `.`, `!` and `?`, keeping the
/// terminator with its sentence. A trailing fragment without a
/// terminator counts as a sentence of its own.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}
