//! Card name normalization shared by the index and the query path

/// Normalize a card name or user input for lookup
///
/// Lower-cases, drops punctuation, and folds whitespace runs into a single
/// space. "Avatar of the Fox", "avatar-of the  fox!" and " AVATAR OF THE FOX"
/// all normalize to `avatar of the fox`.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/' {
            // Separators become word breaks; other punctuation just vanishes
            pending_space = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  Avatar of the Fox  "), "avatar of the fox");
    }

    #[test]
    fn test_folds_whitespace() {
        assert_eq!(normalize("Avatar\tof   the\nFox"), "avatar of the fox");
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(normalize("Philosopher's Stone!"), "philosophers stone");
        assert_eq!(normalize("Pit, Vipers."), "pit vipers");
    }

    #[test]
    fn test_separators_become_spaces() {
        assert_eq!(normalize("Lance-of-Light"), "lance of light");
        assert_eq!(normalize("Fire/Water"), "fire water");
    }

    #[test]
    fn test_unicode_letters_survive() {
        assert_eq!(normalize("Ærin Élan"), "ærin élan");
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ?!  "), "");
    }
}
