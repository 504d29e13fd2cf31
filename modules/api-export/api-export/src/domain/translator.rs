use std::collections::HashMap;

use api_export_sdk::Translator;

/// Translation domains and keys used by the export action.
pub mod messages {
    /// Domain of entity labels (plural labels in filenames).
    pub const ENTITIES_DOMAIN: &str = "entities";
    /// Domain of error messages.
    pub const EXCEPTIONS_DOMAIN: &str = "exceptions";

    pub const INVALID_FORMAT: &str = "api_export.invalid_format";
    pub const ERROR: &str = "api_export.error";
}

/// locale -> domain -> key -> message
pub type Catalog = HashMap<String, HashMap<String, HashMap<String, String>>>;

pub const DEFAULT_LOCALE: &str = "en";

/// Translator backed by an in-memory catalog.
///
/// Lookup tries the requested locale, then the default locale, then returns
/// the key. `%name%` placeholders are replaced by the matching parameter.
#[derive(Debug, Clone)]
pub struct CatalogTranslator {
    catalog: Catalog,
    default_locale: String,
}

impl CatalogTranslator {
    #[must_use]
    pub fn new(catalog: Catalog, default_locale: impl Into<String>) -> Self {
        Self {
            catalog,
            default_locale: default_locale.into(),
        }
    }

    /// Catalog with the module's English messages, overridden by `catalog`.
    #[must_use]
    pub fn with_builtin_messages(catalog: Catalog, default_locale: impl Into<String>) -> Self {
        let mut merged = builtin_catalog();
        for (locale, domains) in catalog {
            let target = merged.entry(locale).or_default();
            for (domain, entries) in domains {
                target.entry(domain).or_default().extend(entries);
            }
        }
        Self::new(merged, default_locale)
    }

    fn lookup(&self, locale: &str, domain: &str, key: &str) -> Option<&str> {
        self.catalog
            .get(locale)
            .and_then(|domains| domains.get(domain))
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }
}

impl Translator for CatalogTranslator {
    fn trans(
        &self,
        key: &str,
        params: &[(&str, &str)],
        domain: &str,
        locale: Option<&str>,
    ) -> String {
        let message = locale
            .and_then(|l| self.lookup(l, domain, key))
            .or_else(|| self.lookup(&self.default_locale, domain, key))
            .unwrap_or(key);

        params
            .iter()
            .fold(message.to_owned(), |acc, (name, value)| {
                acc.replace(&format!("%{name}%"), value)
            })
    }
}

fn builtin_catalog() -> Catalog {
    let exceptions = HashMap::from([
        (
            messages::INVALID_FORMAT.to_owned(),
            "The \"%format%\" format is not supported for this export".to_owned(),
        ),
        (
            messages::ERROR.to_owned(),
            "An error occurred while exporting the data".to_owned(),
        ),
    ]);
    HashMap::from([(
        DEFAULT_LOCALE.to_owned(),
        HashMap::from([(messages::EXCEPTIONS_DOMAIN.to_owned(), exceptions)]),
    )])
}
