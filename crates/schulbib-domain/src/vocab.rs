//! Closed vocabularies for catalog classification
//!
//! These lists mirror the Lehrplan-21 oriented taxonomy the school uses.
//! They are advisory: the lookup pipeline suggests them to the generative
//! backend and the UI offers them in dropdowns, but nothing rejects a
//! record carrying an off-list value.

/// School subjects ("Fächer")
pub const SUBJECTS: &[&str] = &[
    "Mathematik",
    "Deutsch",
    "Natur Mensch Gesellschaft",
    "Englisch",
    "Französisch",
    "Bildnerisches Gestalten",
    "Sport",
    "Textiles und Technisches Gestalten",
    "Musik",
    "Medien und Informatik",
    "Religion Kultur Ethik",
    "Divers",
];

/// Media types ("Medientypen")
pub const MEDIA_TYPES: &[&str] = &[
    "Buch",
    "Lehrmittel",
    "Fachbuch",
    "Spiel",
    "Material",
    "Divers",
];

/// Grade levels ("Schulstufen")
pub const LEVELS: &[&str] = &[
    "Kindergarten",
    "1. Klasse",
    "2. Klasse",
    "3. Klasse",
    "4. Klasse",
    "5. Klasse",
    "6. Klasse",
    "7. Klasse",
    "8. Klasse",
    "9. Klasse",
    "Erwachsenenbildung",
];

pub fn is_known_subject(value: &str) -> bool {
    SUBJECTS.contains(&value)
}

pub fn is_known_media_type(value: &str) -> bool {
    MEDIA_TYPES.contains(&value)
}

pub fn is_known_level(value: &str) -> bool {
    LEVELS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabularies_are_nonempty_and_deduplicated() {
        for list in [SUBJECTS, MEDIA_TYPES, LEVELS] {
            assert!(!list.is_empty());
            let mut seen = std::collections::HashSet::new();
            for entry in list {
                assert!(seen.insert(entry), "duplicate vocabulary entry: {}", entry);
            }
        }
    }

    #[test]
    fn membership_checks() {
        assert!(is_known_subject("Mathematik"));
        assert!(!is_known_subject("Astrologie"));
        assert!(is_known_media_type("Lehrmittel"));
        assert!(is_known_level("Kindergarten"));
        assert!(!is_known_level("10. Klasse"));
    }
}
