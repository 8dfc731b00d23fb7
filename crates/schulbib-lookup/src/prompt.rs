//! Prompt construction for the book lookup

use schulbib_domain::{LEVELS, MEDIA_TYPES, SUBJECTS};

fn quoted_list(entries: &[&str]) -> String {
    entries
        .iter()
        .map(|e| format!("\"{}\"", e))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the deterministic lookup prompt for a query.
///
/// The backend is told to web-search the query and fill exactly one JSON
/// object with German field names, picking classification values from the
/// closed vocabularies. The same query always yields the same prompt.
pub fn build_lookup_prompt(query: &str) -> String {
    format!(
        r#"Suche mit Google nach "{query}" und VERWENDE DIE GEFUNDENEN INFORMATIONEN um das folgende JSON auszufüllen.
Suche gezielt nach Buchinformationen (Titel, Autor, ISBN, Verlag, etc.).

WICHTIG: Extrahiere die Buchinformationen AUS DEN GOOGLE-SUCHERGEBNISSEN und fülle das JSON damit aus!

ZULÄSSIGE WERTE (bitte genau diese verwenden, wenn passend):
- Fächer: {subjects}.
- Medientypen: {media_types}.
- Schulstufen: {levels}.

Wähle für "Fach" und "Typ" den jeweils am besten passenden Begriff.
Wähle für "Stufe" ALLE passenden Stufen als Array. Wenn ein Buch für mehrere Klassen geeignet ist (z.B. 1.-3. Klasse), liste alle einzeln auf.

JSON-Format (EXAKT diese Feldnamen verwenden):
{{
  "Titel": "HIER DEN GEFUNDENEN BUCHTITEL EINTRAGEN",
  "Autor": "HIER DEN GEFUNDENEN AUTOR EINTRAGEN",
  "ISBN": "HIER DIE GEFUNDENE ISBN EINTRAGEN (bevorzugt ISBN-13)",
  "Verlag": "HIER DEN GEFUNDENEN VERLAG EINTRAGEN",
  "Erscheinungsjahr": HIER DAS JAHR ALS ZAHL,
  "Stufe": ["Stufe 1", "Stufe 2"],
  "Fach": "Eines der zulässigen Fächer",
  "Typ": "Einer der zulässigen Medientypen",
  "Beschreibung": "Beschreibung aus Suchergebnissen"
}}

ABLAUF:
1. Google-Suche nach "{query}"
2. Buchinformationen aus den Ergebnissen extrahieren. Nimm das relevanteste Buch, das zur Suche passt.
3. JSON ausfüllen mit den GEFUNDENEN Daten. Versuche Fach, Typ und Stufe den obigen Listen zuzuordnen.
4. Nur wenn wirklich nicht gefunden: null verwenden

BEISPIEL was du AUS den Suchergebnissen extrahieren sollst:
- Von Buchhändler-Seiten (Thalia, Amazon): Titel, Autor, Verlag, Jahr, ISBN
- Von Verlagsseiten: Beschreibung, Zielgruppe
- Von Bibliothekskatalogen: Schlagwörter, Kategorien

Gib NUR das ausgefüllte JSON zurück!"#,
        query = query,
        subjects = quoted_list(SUBJECTS),
        media_types = quoted_list(MEDIA_TYPES),
        levels = quoted_list(LEVELS),
    )
}
