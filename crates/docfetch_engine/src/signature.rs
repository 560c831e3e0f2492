/// Magic header every PDF document starts with.
pub const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Bytes of received content shown in a signature-mismatch diagnostic.
const PREVIEW_LEN: usize = 16;

/// Returns true when `bytes` carries the PDF magic at offset 0.
pub fn matches_pdf_signature(bytes: &[u8]) -> bool {
    bytes.len() >= PDF_MAGIC.len() && &bytes[..PDF_MAGIC.len()] == PDF_MAGIC
}

/// Renders the leading bytes as printable ASCII for diagnostics.
/// Non-printable bytes become `.`; output is capped at a fixed length.
pub fn leading_bytes_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(PREVIEW_LEN)
        .map(|&b| {
            if (0x20..=0x7e).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}
