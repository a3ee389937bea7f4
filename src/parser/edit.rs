//! Text edits and the old-to-new offset mapping they induce.

use thiserror::Error;

/// One text replacement, in byte offsets of the text as it was when the
/// edit was made: `start_byte..old_end_byte` was replaced by text ending
/// at `new_end_byte`.
///
/// Several edits are applied in order; each one is expressed in the
/// coordinates produced by the edits before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl InputEdit {
    pub fn new(start_byte: usize, old_end_byte: usize, new_end_byte: usize) -> Self {
        Self {
            start_byte,
            old_end_byte,
            new_end_byte,
        }
    }
}

/// Edits that do not describe a transformation of the previous text into
/// the new one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEdit {
    #[error("edit {index} ({edit:?}) lies outside the {len}-byte text it applies to")]
    OutOfRange {
        index: usize,
        edit: InputEdit,
        len: usize,
    },

    #[error("edit {index} ({edit:?}) ends before it starts")]
    Inconsistent { index: usize, edit: InputEdit },

    #[error("edits produce {expected} bytes but the new text has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A run of bytes the edits left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    old_start: usize,
    new_start: usize,
    len: usize,
}

/// Maps offsets of the new text back to the previous text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EditMap {
    segments: Vec<Segment>,
    old_len: usize,
    /// The last segment runs to the end of both texts.
    open_end: bool,
}

impl EditMap {
    /// Validate `edits` against both texts and build the mapping.
    pub(crate) fn new(old_len: usize, new_len: usize, edits: &[InputEdit]) -> Result<Self, InvalidEdit> {
        let mut segments = vec![Segment {
            old_start: 0,
            new_start: 0,
            len: old_len,
        }];
        let mut len = old_len;

        for (index, &edit) in edits.iter().enumerate() {
            let InputEdit {
                start_byte: start,
                old_end_byte: old_end,
                new_end_byte: new_end,
            } = edit;
            if old_end < start || new_end < start {
                return Err(InvalidEdit::Inconsistent { index, edit });
            }
            if old_end > len {
                return Err(InvalidEdit::OutOfRange { index, edit, len });
            }

            let mut next = Vec::with_capacity(segments.len() + 1);
            for segment in segments {
                let seg_end = segment.new_start + segment.len;
                if segment.new_start < start {
                    let kept = seg_end.min(start) - segment.new_start;
                    if kept > 0 {
                        next.push(Segment { len: kept, ..segment });
                    }
                }
                if seg_end > old_end {
                    let from = segment.new_start.max(old_end);
                    let skipped = from - segment.new_start;
                    next.push(Segment {
                        old_start: segment.old_start + skipped,
                        new_start: from - old_end + new_end,
                        len: seg_end - from,
                    });
                }
            }
            segments = next;
            len = len - (old_end - start) + (new_end - start);
        }

        if len != new_len {
            return Err(InvalidEdit::LengthMismatch {
                expected: len,
                actual: new_len,
            });
        }

        let open_end = segments
            .last()
            .is_some_and(|s| s.old_start + s.len == old_len && s.new_start + s.len == new_len);
        Ok(Self {
            segments,
            old_len,
            open_end,
        })
    }

    /// Old offset of the byte at `new_pos`, if that byte survived the edits.
    pub(crate) fn to_old(&self, new_pos: usize) -> Option<usize> {
        let index = self.segments.partition_point(|s| s.new_start + s.len <= new_pos);
        let segment = self.segments.get(index)?;
        (segment.new_start <= new_pos).then(|| segment.old_start + (new_pos - segment.new_start))
    }

    /// Whether old bytes `from..to` all lie in one untouched run. Ranges
    /// running past the end of the old text count as untouched when no
    /// edit touched the end.
    pub(crate) fn is_preserved(&self, from: usize, to: usize) -> bool {
        let index = self.segments.partition_point(|s| s.old_start + s.len <= from);
        let Some(segment) = self.segments.get(index) else {
            return false;
        };
        let seg_end = segment.old_start + segment.len;
        let open = self.open_end && index + 1 == self.segments.len() && seg_end == self.old_len;
        segment.old_start <= from && (to <= seg_end || open)
    }
}
