// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário
const CATALOGS: [(&str, &str); 3] = [
    ("en", include_str!("../../locales/en.json")),
    ("fr", include_str!("../../locales/fr.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

type Catalog = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, Catalog>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: Catalog = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de tradução inválido: {lang}"))?;
            catalogs.insert(lang.to_string(), catalog);
        }
        Ok(Self { catalogs: Arc::new(catalogs) })
    }

    /// Busca a mensagem no idioma pedido, cai para o inglês e, em último caso,
    /// devolve a própria chave. `{nome}` é substituído pelos argumentos.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(String::as_str)
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{name}}}"), value)
        })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        for lang in ["fr", "pt"] {
            let other = &store.catalogs[lang];
            for key in en.keys() {
                assert!(other.contains_key(key), "{lang} sem a chave {key}");
            }
        }
    }

    #[test]
    fn interpolates_arguments() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("fr", "errors.not_found", &[("resource", "commande".into())]);
        assert!(msg.contains("commande"));
        assert!(!msg.contains("{resource}"));
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load().unwrap();
        assert!(!store.supports("de"));
        assert_eq!(
            store.translate("de", "errors.invalid_credentials", &[]),
            store.translate("en", "errors.invalid_credentials", &[])
        );
        assert_eq!(store.translate("fr", "errors.inexistente", &[]), "errors.inexistente");
    }
}
