use sha2::{Digest, Sha256};

/// Hex digest of the bytes as-is.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hex digest with leading and trailing ASCII whitespace stripped first.
/// Used to tell a presentation error apart from a wrong answer.
pub fn digest_trimmed(data: &[u8]) -> String {
    digest(trim_ascii(data))
}

fn trim_ascii(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}
