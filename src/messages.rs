//! Localized diagnostic text.
//!
//! Nothing else in the crate formats user-facing error text directly: callers
//! hand a [`MessageKey`] plus its arguments to a [`MessageResolver`] together
//! with the active [`Locale`]. The locale only ever changes wording.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Languages shipped in [`BundledMessages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    English,
    German,
    French,
}

impl Locale {
    /// Primary language subtag, e.g. `"de"`.
    pub fn tag(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::German => "de",
            Locale::French => "fr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLocale(pub String);

impl fmt::Display for UnknownLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported locale tag: {}", self.0)
    }
}

impl std::error::Error for UnknownLocale {}

impl FromStr for Locale {
    type Err = UnknownLocale;

    /// Accepts `en`, `en-US`, `de_DE`, `FR` and similar; only the primary
    /// subtag is significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Ok(Locale::English),
            "de" => Ok(Locale::German),
            "fr" => Ok(Locale::French),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// Symbolic identifiers for every diagnostic the crate can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// `{0}`: requested header name.
    HeaderNonexistent,
    /// `{0}`: record number, `{1}`: fields found, `{2}`: header width.
    HeaderDataMismatch,
    /// No arguments.
    TargetUnset,
    /// No arguments.
    LineValidationUnsupported,
    /// `{0}`: physical line number where the open quote started.
    UnterminatedQuote,
    /// `{0}`: configured limit, `{1}`: physical line number.
    MultilineLimitBroken,
    /// `{0}`: physical line the text started on, `{1}`: records found in it.
    RecordOverrun,
}

/// Turns a key, locale and arguments into display text.
pub trait MessageResolver: fmt::Debug + Send + Sync {
    fn resolve(&self, locale: Locale, key: MessageKey, args: &[String]) -> String;
}

/// The built-in English/German/French bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledMessages;

impl BundledMessages {
    fn template(locale: Locale, key: MessageKey) -> &'static str {
        use MessageKey as K;
        match (locale, key) {
            (Locale::English, K::HeaderNonexistent) => {
                "The header name {0} was not found in the header record."
            }
            (Locale::English, K::HeaderDataMismatch) => {
                "Error on record number {0}: found {1} data elements but the header has {2}."
            }
            (Locale::English, K::TargetUnset) => {
                "A target schema must be set on the column mapping before records are bound."
            }
            (Locale::English, K::LineValidationUnsupported) => {
                "This record source does not expose raw lines, so a line validator cannot be installed."
            }
            (Locale::English, K::UnterminatedQuote) => {
                "Unterminated quoted field at end of input (opened on line {0})."
            }
            (Locale::English, K::MultilineLimitBroken) => {
                "A record spanning more than {0} lines was found ending at line {1}."
            }
            (Locale::English, K::RecordOverrun) => {
                "The text starting on line {0} splits into {1} records where one was expected."
            }

            (Locale::German, K::HeaderNonexistent) => {
                "Der Spaltenname {0} kommt im Kopfdatensatz nicht vor."
            }
            (Locale::German, K::HeaderDataMismatch) => {
                "Fehler in Datensatz {0}: {1} Datenelemente gefunden, der Kopfdatensatz hat aber {2}."
            }
            (Locale::German, K::TargetUnset) => {
                "Vor dem Binden von Datensätzen muss ein Zielschema für die Spaltenzuordnung gesetzt werden."
            }
            (Locale::German, K::LineValidationUnsupported) => {
                "Diese Datenquelle liefert keine Rohzeilen, daher kann kein Zeilenvalidator installiert werden."
            }
            (Locale::German, K::UnterminatedQuote) => {
                "Nicht abgeschlossenes Feld in Anführungszeichen am Ende der Eingabe (begonnen in Zeile {0})."
            }
            (Locale::German, K::MultilineLimitBroken) => {
                "Ein Datensatz mit mehr als {0} Zeilen wurde gefunden, endend in Zeile {1}."
            }
            (Locale::German, K::RecordOverrun) => {
                "Der Text ab Zeile {0} zerfällt in {1} Datensätze, erwartet war einer."
            }

            (Locale::French, K::HeaderNonexistent) => {
                "Le nom de colonne {0} est absent de l'enregistrement d'en-tête."
            }
            (Locale::French, K::HeaderDataMismatch) => {
                "Erreur à l'enregistrement {0} : {1} éléments trouvés alors que l'en-tête en compte {2}."
            }
            (Locale::French, K::TargetUnset) => {
                "Un schéma cible doit être défini sur le mappage de colonnes avant toute liaison."
            }
            (Locale::French, K::LineValidationUnsupported) => {
                "Cette source ne fournit pas les lignes brutes ; impossible d'installer un validateur de ligne."
            }
            (Locale::French, K::UnterminatedQuote) => {
                "Champ entre guillemets non terminé en fin d'entrée (ouvert à la ligne {0})."
            }
            (Locale::French, K::MultilineLimitBroken) => {
                "Un enregistrement de plus de {0} lignes a été trouvé, se terminant à la ligne {1}."
            }
            (Locale::French, K::RecordOverrun) => {
                "Le texte commençant à la ligne {0} se découpe en {1} enregistrements au lieu d'un seul."
            }
        }
    }
}

impl MessageResolver for BundledMessages {
    fn resolve(&self, locale: Locale, key: MessageKey, args: &[String]) -> String {
        fill(Self::template(locale, key), args)
    }
}

/// Substitutes `{0}`, `{1}`, ... with `args`. Unknown or out-of-range
/// placeholders are left as written.
pub fn fill(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let arg = tail.find('}').and_then(|close| {
            tail[1..close]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .map(|value| (value, close))
        });
        match arg {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Locale plus resolver, shared by the reader and its source.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    locale: Locale,
    resolver: Arc<dyn MessageResolver>,
}

impl Diagnostics {
    pub fn new(locale: Locale, resolver: Arc<dyn MessageResolver>) -> Self {
        Self { locale, resolver }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Same resolver, different locale.
    pub fn with_locale(&self, locale: Locale) -> Self {
        Self {
            locale,
            resolver: Arc::clone(&self.resolver),
        }
    }

    pub fn message(&self, key: MessageKey, args: &[String]) -> String {
        self.resolver.resolve(self.locale, key, args)
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Locale::default(), Arc::new(BundledMessages))
    }
}
