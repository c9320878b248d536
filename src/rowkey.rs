//! Row-key composition for the event store.
//!
//! A row key is `chain:address:sequence`. Sequences are left-padded with
//! zeros so that lexicographic key order matches numeric sequence order
//! within an address.

pub const KEY_DELIMITER: char = ':';

/// Width sequences are padded to. Longer sequences pass through unmodified,
/// so key order is not guaranteed for oversized sequences.
pub const PADDED_SEQUENCE_WIDTH: usize = 16;

/// Numeric identifier for a well-known chain name.
fn chain_id(name: &str) -> Option<&'static str> {
    match name {
        "solana" => Some("1"),
        "ethereum" => Some("2"),
        "terra" => Some("3"),
        "bsc" => Some("4"),
        _ => None,
    }
}

/// Map a human-readable chain name to its numeric id, case-insensitively.
/// Numeric ids and unrecognized names pass through unchanged.
pub fn normalize_chain(chain: &str) -> String {
    match chain_id(&chain.to_lowercase()) {
        Some(id) => id.to_string(),
        None => chain.to_string(),
    }
}

pub fn pad_sequence(sequence: &str) -> String {
    if sequence.len() < PADDED_SEQUENCE_WIDTH {
        format!("{:0>width$}", sequence, width = PADDED_SEQUENCE_WIDTH)
    } else {
        sequence.to_string()
    }
}

/// Compose the row key addressing a single event.
pub fn compose_row_key(chain: &str, address: &str, sequence: &str) -> String {
    format!(
        "{}{}{}{}{}",
        normalize_chain(chain),
        KEY_DELIMITER,
        address,
        KEY_DELIMITER,
        pad_sequence(sequence)
    )
}

/// Build the key prefix for an optional chain / address filter. An address
/// filter only applies together with a chain filter.
pub fn scan_prefix(for_chain: &str, for_address: &str) -> String {
    if for_chain.is_empty() {
        return String::new();
    }
    let chain = normalize_chain(for_chain);
    if for_address.is_empty() {
        chain
    } else {
        format!("{}{}{}", chain, KEY_DELIMITER, for_address)
    }
}

/// Derive the result bucket for a row key. Zero segments means everything
/// lands in the grand-total bucket `"*"`; otherwise the bucket is the first
/// `key_segments` colon-delimited segments of the key, rejoined with colons.
pub fn group_key(key_segments: usize, row_key: &str) -> String {
    if key_segments == 0 {
        return "*".to_string();
    }
    row_key
        .split(KEY_DELIMITER)
        .take(key_segments)
        .collect::<Vec<_>>()
        .join(":")
}
