//! Chirp body rules: length cap and profanity masking.

pub const MAX_CHIRP_LENGTH: usize = 140;

const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

/// Too-long bodies are rejected before cleaning.
#[must_use]
pub fn too_long(body: &str) -> bool {
    body.chars().count() > MAX_CHIRP_LENGTH
}

/// Replace banned words with `****`.
///
/// Words are split on single spaces and compared case-insensitively, so
/// punctuation attached to a word (`fornax!`) keeps it from matching.
#[must_use]
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if BANNED_WORDS.contains(&lowered.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
