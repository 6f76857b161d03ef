//! Response classification and staged-file naming
//!
//! A response is accepted as a PDF when its `content-type` says so directly,
//! or when it is a generic binary stream whose `content-disposition` filename
//! ends in `.pdf`. Anything else is rejected.

use std::path::{Path, PathBuf};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";
pub const PDF_EXTENSION: &str = "pdf";

/// Extracts the attachment filename from a `content-disposition` value
///
/// Handles both `filename="x.pdf"` and RFC 5987 `filename*=UTF-8''x.pdf`;
/// the encoded form wins when both are present. The result is reduced to its
/// final path component, and names that end up empty, `.` or `..` count as
/// absent.
pub fn attachment_filename(content_disposition: &str) -> Option<String> {
    let mut plain = None;
    let mut encoded = None;

    for part in split_parameters(content_disposition) {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => {
                plain = Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string());
            }
            "filename*" => {
                // charset'lang'percent-encoded
                let raw = value.trim();
                let raw = raw.rfind('\'').map(|idx| &raw[idx + 1..]).unwrap_or(raw);
                if let Ok(decoded) = urlencoding::decode(raw) {
                    encoded = Some(decoded.into_owned());
                }
            }
            _ => {}
        }
    }

    encoded.or(plain).and_then(|name| sanitize_filename(&name))
}

/// Splits a header value on `;` outside double-quoted strings
fn split_parameters(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Keeps only the final path component of a server-supplied name
fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

/// Returns true if `filename` carries the `.pdf` extension (any case)
pub fn has_pdf_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// Decides whether a response is a PDF from its headers alone
///
/// # Arguments
///
/// * `content_type` - The `content-type` header, if any
/// * `filename_hint` - The attachment filename, if any
pub fn is_pdf_response(content_type: Option<&str>, filename_hint: Option<&str>) -> bool {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains(PDF_CONTENT_TYPE) {
        return true;
    }

    if content_type.contains(BINARY_CONTENT_TYPE) {
        return filename_hint.is_some_and(has_pdf_extension);
    }

    false
}

/// Name of the staged file for item `index` (0-based)
///
/// The attachment hint is used when present, otherwise a positional
/// `download_NNN.pdf` with the 1-based item number.
pub fn staged_filename(filename_hint: Option<&str>, index: usize) -> String {
    match filename_hint {
        Some(hint) => hint.to_string(),
        None => format!("download_{:03}.{}", index + 1, PDF_EXTENSION),
    }
}

/// Returns `directory/filename`, suffixed `_1`, `_2`, ... if already taken
pub fn unique_path(directory: &Path, filename: &str) -> PathBuf {
    let candidate = directory.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let extension = name.extension().and_then(|e| e.to_str());

    (1..)
        .map(|n| match extension {
            Some(ext) => directory.join(format!("{}_{}.{}", stem, n, ext)),
            None => directory.join(format!("{}_{}", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
