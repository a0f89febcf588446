//! Text encoding detection for CSV files exported by spreadsheet tools.

use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

use crate::error::ImportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, with a leading byte-order mark removed if present.
    Utf8Sig,
    Utf8,
    Latin1,
    Iso8859_1,
    Cp1252,
}

impl TextEncoding {
    /// Tried in this order; the first that decodes the first line wins.
    pub const CANDIDATES: [TextEncoding; 5] = [
        Self::Utf8Sig,
        Self::Utf8,
        Self::Latin1,
        Self::Iso8859_1,
        Self::Cp1252,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8Sig => "utf-8-sig",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Cp1252 => "cp1252",
        }
    }

    /// Strict decode; `None` if any byte is invalid in this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Self::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(Cow::Borrowed)
            }
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            // Every byte maps to the code point of the same value.
            Self::Latin1 | Self::Iso8859_1 => {
                Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect()))
            }
            Self::Cp1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes),
        }
    }
}

fn first_line(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(end) => &bytes[..=end],
        None => bytes,
    }
}

/// Pick an encoding by probing the first line, then decode the whole buffer.
///
/// A candidate whose first line decodes but whose body does not is passed over
/// in favour of the next one.
pub fn decode_text(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    let head = first_line(bytes);
    for encoding in TextEncoding::CANDIDATES {
        if encoding.decode(head).is_none() {
            continue;
        }
        match encoding.decode(bytes) {
            Some(text) => return Some((text.into_owned(), encoding)),
            None => debug!(encoding = encoding.as_str(), "first line decoded but body did not"),
        }
    }
    None
}

/// Read a file and decode it with the first workable candidate encoding.
pub fn read_text(path: &Path) -> Result<(String, TextEncoding), ImportError> {
    if !path.exists() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, encoding) =
        decode_text(&bytes).ok_or_else(|| ImportError::Encoding(path.to_path_buf()))?;
    debug!(path = %path.display(), encoding = encoding.as_str(), "decoded CSV file");
    Ok((text, encoding))
}
