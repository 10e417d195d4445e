//! Text metadata (`tEXt` chunks) attached to saved images.

use std::io::Write;

use crate::error::SnapshotError;
use crate::io::encoding_failure;

/// Longest keyword the PNG format allows, in bytes.
pub const MAX_KEYWORD_LEN: usize = 79;

/// A key/text comment pair written as an uncompressed text chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    key: String,
    text: String,
}

impl Comment {
    /// Create a comment, validating it against PNG text chunk rules.
    ///
    /// Keywords are 1 to 79 Latin-1 characters without leading, trailing or
    /// consecutive spaces. Text may be any Latin-1 string.
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Result<Self, SnapshotError> {
        let key = key.into();
        let text = text.into();
        validate_keyword(&key)?;
        if let Some(c) = text.chars().find(|&c| !is_latin1(c)) {
            return Err(SnapshotError::InvalidComment(format!(
                "text for {key:?} contains non-Latin-1 character {c:?}"
            )));
        }
        Ok(Self { key, text })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn is_latin1(c: char) -> bool {
    u32::from(c) <= 0xFF
}

fn validate_keyword(key: &str) -> Result<(), SnapshotError> {
    let invalid = |why: &str| -> Result<(), SnapshotError> {
        Err(SnapshotError::InvalidComment(format!("keyword {key:?} {why}")))
    };

    if key.is_empty() {
        return invalid("is empty");
    }
    // Latin-1 characters encode to one byte each in the file.
    if key.chars().count() > MAX_KEYWORD_LEN {
        return invalid("is longer than 79 characters");
    }
    if !key.chars().all(|c| is_latin1(c) && !c.is_control()) {
        return invalid("must be printable Latin-1");
    }
    if key.starts_with(' ') || key.ends_with(' ') || key.contains("  ") {
        return invalid("has leading, trailing or repeated spaces");
    }
    Ok(())
}

/// Register `comments` with the encoder, in order.
///
/// Must run before the header is written. Does nothing for an empty list.
pub(crate) fn write_comments<W: Write>(
    encoder: &mut png::Encoder<'_, W>,
    comments: &[Comment],
) -> Result<(), SnapshotError> {
    for comment in comments {
        encoder
            .add_text_chunk(comment.key.clone(), comment.text.clone())
            .map_err(encoding_failure)?;
    }
    if !comments.is_empty() {
        log::trace!("registered {} text chunk(s)", comments.len());
    }
    Ok(())
}

/// Collect the uncompressed text chunks the decoder has seen.
pub(crate) fn read_comments(info: &png::Info<'_>) -> Vec<Comment> {
    info.uncompressed_latin1_text
        .iter()
        .map(|chunk| Comment {
            key: chunk.keyword.clone(),
            text: chunk.text.clone(),
        })
        .collect()
}
