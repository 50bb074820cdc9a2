/// Strips separators (space, `.`, `-`, tab) and upper-cases the rest.
///
/// Never fails and is idempotent.
pub fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '.' | '-' | '\t'))
        .flat_map(|ch| ch.to_uppercase())
        .collect()
}

pub(crate) fn normalize_if(input: &str, cleanup: bool) -> String {
    if cleanup {
        normalize(input)
    } else {
        input.to_string()
    }
}

/// Replaces everything but the first `front` and last `back` characters with
/// `*`. Values too short to keep both ends are masked completely.
pub(crate) fn mask_middle(value: &str, front: usize, back: usize) -> String {
    let length = value.chars().count();
    if length <= front + back {
        return "*".repeat(length);
    }
    value
        .chars()
        .enumerate()
        .map(|(idx, ch)| {
            if idx < front || idx >= length - back {
                ch
            } else {
                '*'
            }
        })
        .collect()
}
