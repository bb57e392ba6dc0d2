//! Name sanitation helpers shared by the catalog and the backup engine.

use crate::TitleId;

/// Characters that may not appear in archive folder names.
const FORBIDDEN: &[char] = &['.', ',', '!', '\\', '/', ':', '?', '*', '"', '<', '>', '|'];

// Parallel accent-folding tables; kept in sync by test below.
const ACCENTED: &str = "ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖ×ØÙÚÛÜÝÞßàáâãäåæçèéêëìíîïðñòóôõö÷øùúûüūýþÿ";
const FOLDED: &str = "AAAAAAECEEEEIIIIDNOOOOOx0UUUUYPsaaaaaaeceeeeiiiionooooo/0uuuuuuypy";

/// True if the string cannot be represented in an archive folder name
/// (any non-ASCII byte).
pub fn contains_invalid_char(s: &str) -> bool {
    !s.is_ascii()
}

/// Replace forbidden filename characters with spaces and trim the tail.
pub fn remove_forbidden_characters(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { ' ' } else { c })
        .collect();
    cleaned.trim_end().to_string()
}

/// Blank out everything outside ASCII.
pub fn remove_not_ascii(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii() { c } else { ' ' }).collect()
}

/// Fold common accented Latin characters to their ASCII neighbours.
pub fn remove_accents(s: &str) -> String {
    s.chars()
        .map(|c| match ACCENTED.chars().position(|a| a == c) {
            Some(i) => FOLDED.chars().nth(i).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Hex form used for archive paths and configuration keys.
pub fn hex_id(id: TitleId) -> String {
    format!("0x{:016X}", id)
}

/// Filesystem-safe derivation of a title name. Unrepresentable or empty
/// names fall back to the hex-formatted id.
pub fn safe_name(name: &str, id: TitleId) -> String {
    if contains_invalid_char(name) {
        return hex_id(id);
    }
    let safe = remove_forbidden_characters(name);
    if safe.trim().is_empty() {
        hex_id(id)
    } else {
        safe
    }
}

/// Split a raw title name into (primary, subtitle) for presentation.
///
/// The rightmost colon wins; failing that, a trailing parenthetical. Both
/// halves are accent-folded and trimmed. Names with no separator come back
/// as (raw name, "").
pub fn display_name_parts(name: &str) -> (String, String) {
    let folded = remove_accents(name);

    if let Some(pos) = folded.rfind(':') {
        let first = folded[..pos].trim().to_string();
        let second = folded[pos + 1..].trim().to_string();
        return (first, second);
    }

    if let (Some(open), Some(close)) = (folded.rfind('('), folded.rfind(')')) {
        if open < close {
            let first = folded[..open].trim().to_string();
            let second = folded[open + 1..close].trim().to_string();
            return (first, second);
        }
    }

    (name.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_tables_are_parallel() {
        assert_eq!(ACCENTED.chars().count(), FOLDED.chars().count());
    }

    #[test]
    fn test_remove_accents() {
        assert_eq!(remove_accents("Pokémon Édition"), "Pokemon Edition");
        assert_eq!(remove_accents("plain"), "plain");
    }

    #[test]
    fn test_forbidden_characters_replaced_and_trimmed() {
        assert_eq!(
            remove_forbidden_characters("Game: The/Sequel?!"),
            "Game  The Sequel"
        );
        assert_eq!(remove_forbidden_characters("..."), "");
    }

    #[test]
    fn test_safe_name_fallbacks() {
        assert_eq!(safe_name("Okay Name", 0x10), "Okay Name");
        assert_eq!(safe_name("日本語", 0x10), "0x0000000000000010");
        assert_eq!(safe_name("???", 0x10), "0x0000000000000010");
    }

    #[test]
    fn test_display_name_colon_split() {
        assert_eq!(
            display_name_parts("Zelda: Breath of the Wild"),
            ("Zelda".to_string(), "Breath of the Wild".to_string())
        );
    }

    #[test]
    fn test_display_name_parenthetical_split() {
        assert_eq!(
            display_name_parts("Mario Kart 8 (Deluxe)"),
            ("Mario Kart 8".to_string(), "Deluxe".to_string())
        );
    }

    #[test]
    fn test_display_name_no_separator() {
        assert_eq!(
            display_name_parts("Splatoon"),
            ("Splatoon".to_string(), String::new())
        );
        // A ')' before '(' is not a parenthetical suffix
        assert_eq!(
            display_name_parts("weird ) name ("),
            ("weird ) name (".to_string(), String::new())
        );
    }
}
