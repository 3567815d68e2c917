//! Marker comment recognition.
//!
//! A marker is any comment whose text contains `_tracker`. When it also
//! contains `_trackerParam`, the text between the first `{` and the first `}`
//! of the whole comment is carried verbatim as the call argument.

use swc_core::{
    common::{
        comments::{Comment, Comments},
        BytePos, Spanned,
    },
    ecma::ast::Program,
};

/// Substring that marks a comment as a tracker marker.
pub const TRACKER_TAG: &str = "_tracker";
/// Substring that enables payload extraction inside a marker.
pub const TRACKER_PARAM_TAG: &str = "_trackerParam";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub raw_text: String,
    /// Empty when the comment embeds no payload.
    pub param_text: String,
}

impl Marker {
    pub fn from_text(text: &str) -> Self {
        Self {
            raw_text: text.to_string(),
            param_text: extract_param(text),
        }
    }
}

pub fn is_marker_text(text: &str) -> bool {
    text.contains(TRACKER_TAG)
}

/// First marker in list order; later markers on the same node are ignored.
pub fn find_marker(comments: &[Comment]) -> Option<Marker> {
    comments
        .iter()
        .find(|c| is_marker_text(&c.text))
        .map(|c| Marker::from_text(&c.text))
}

/// Payload between the first `{` and the first `}` anywhere in the comment.
///
/// The brace search is not anchored after `_trackerParam` and does not balance
/// nested braces. When the first `}` precedes the first `{` the text strictly
/// between them is returned, matching JavaScript `substring` argument swapping.
pub fn extract_param(text: &str) -> String {
    if !text.contains(TRACKER_PARAM_TAG) {
        return String::new();
    }
    let (Some(open), Some(close)) = (text.find('{'), text.find('}')) else {
        return String::new();
    };
    let end = close + 1;
    let (start, end) = if open <= end { (open, end) } else { (end, open) };
    text[start..end].to_string()
}

// -----------------------------------------------------------------------------
// File-wide pre-scan
// -----------------------------------------------------------------------------

/// Whether any comment in the program contains the marker tag.
///
/// SWC keeps comments in a store keyed by token position and offers no way to
/// enumerate it, so every position of the program span is checked.
pub fn has_marker_comments<C: Comments>(program: &Program, comments: &C) -> bool {
    let span = program.span();
    if span.is_dummy() {
        return false;
    }
    let found = (span.lo.0..=span.hi.0)
        .map(BytePos)
        .any(|pos| has_marker_at(comments, pos));
    tracing::trace!(found, "marker pre-scan finished");
    found
}

fn has_marker_at<C: Comments>(comments: &C, pos: BytePos) -> bool {
    let any_marker = |cs: Vec<Comment>| cs.iter().any(|c| is_marker_text(&c.text));
    comments.get_leading(pos).is_some_and(any_marker)
        || comments.get_trailing(pos).is_some_and(any_marker)
}
