// src/models/measurements.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{common::error::AppError, models::order::Measurements};

pub const ADULTE: &str = "adulte";
pub const ENFANT: &str = "enfant";

/// Limite de uma medida em cm.
pub const MAX_MEASUREMENT: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

const GENRES_ADULTE: [&str; 2] = ["homme", "femme"];
const GENRES_ENFANT: [&str; 2] = ["garcon", "fille"];

// ---
// Listas de medidas reaproveitadas entre modelos
// ---
const COSTUME: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur pantalon",
    "Entrejambe",
    "Largeur pantalon (cuisse)",
];

const PANTALON_CLASSIQUE: &[&str] = &[
    "Tour de taille",
    "Tour de hanches",
    "Longueur pantalon",
    "Entrejambe",
    "Largeur pantalon (cuisse)",
    "Largeur pantalon (bas)",
];

const CHEMISE_SUR_MESURE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur chemise",
];

const VESTE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur veste",
];

const BOUBOU: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur boubou",
    "Largeur bas",
];

const CAFTAN: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur caftan",
    "Largeur bas",
];

const GANDOURA: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur gandoura",
    "Largeur bas",
];

const ROBE_HABILLEE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur robe",
    "Hauteur poitrine",
];

const TAILLEUR_JUPE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur jupe",
    "Hauteur poitrine",
];

const TAILLEUR_PANTALON: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Tour de bras",
    "Longueur pantalon",
    "Entrejambe",
    "Hauteur poitrine",
];

const ROBE_TRADITIONNELLE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur robe",
    "Largeur bas",
];

const ENSEMBLE_PAGNE: &[&str] = &[
    "Tour de cou",
    "Largeur épaules",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur pagne",
    "Largeur bas",
];

// --- Enfant ---

const COSTUME_ENFANT: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur pantalon",
    "Entrejambe",
];

const PANTALON_ENFANT: &[&str] = &[
    "Tour de taille",
    "Tour de hanches",
    "Longueur pantalon",
    "Entrejambe",
    "Largeur pantalon (cuisse)",
];

const CHEMISE_ENFANT: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur chemise",
];

const ENSEMBLE_TRADITIONNEL: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur ensemble",
    "Largeur bas",
];

const BOUBOU_ENFANT: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Longueur dos",
    "Longueur manche",
    "Longueur boubou",
    "Largeur bas",
];

const ROBE_FILLE: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur robe",
];

const ROBE_TRADITIONNELLE_FILLE: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur robe",
    "Largeur bas",
];

const ENSEMBLE_JUPE: &[&str] = &[
    "Tour de cou",
    "Tour de poitrine",
    "Tour de taille",
    "Tour de hanches",
    "Longueur dos",
    "Longueur manche",
    "Longueur jupe",
];

/// (categorie, sexe, modele) -> medidas esperadas.
const CATALOGUE: &[(&str, &str, &str, &[&str])] = &[
    (ADULTE, "homme", "Costume 3 pièces", COSTUME),
    (ADULTE, "homme", "Costume 2 pièces", COSTUME),
    (ADULTE, "homme", "Pantalon classique", PANTALON_CLASSIQUE),
    (ADULTE, "homme", "Chemise sur mesure", CHEMISE_SUR_MESURE),
    (ADULTE, "homme", "Veste", VESTE),
    (ADULTE, "homme", "Boubou", BOUBOU),
    (ADULTE, "homme", "Caftan", CAFTAN),
    (ADULTE, "homme", "Gandoura", GANDOURA),
    (ADULTE, "femme", "Robe de soirée", ROBE_HABILLEE),
    (ADULTE, "femme", "Robe cocktail", ROBE_HABILLEE),
    (ADULTE, "femme", "Tailleur jupe", TAILLEUR_JUPE),
    (ADULTE, "femme", "Tailleur pantalon", TAILLEUR_PANTALON),
    (ADULTE, "femme", "Robe traditionnelle", ROBE_TRADITIONNELLE),
    (ADULTE, "femme", "Caftan", CAFTAN),
    (ADULTE, "femme", "Boubou", BOUBOU),
    (ADULTE, "femme", "Ensemble pagne", ENSEMBLE_PAGNE),
    (ENFANT, "garcon", "Costume enfant", COSTUME_ENFANT),
    (ENFANT, "garcon", "Pantalon", PANTALON_ENFANT),
    (ENFANT, "garcon", "Chemise", CHEMISE_ENFANT),
    (ENFANT, "garcon", "Ensemble traditionnel", ENSEMBLE_TRADITIONNEL),
    (ENFANT, "garcon", "Boubou enfant", BOUBOU_ENFANT),
    (ENFANT, "fille", "Robe de cérémonie", ROBE_FILLE),
    (ENFANT, "fille", "Robe casual", ROBE_FILLE),
    (ENFANT, "fille", "Ensemble jupe", ENSEMBLE_JUPE),
    (ENFANT, "fille", "Robe traditionnelle", ROBE_TRADITIONNELLE_FILLE),
    (ENFANT, "fille", "Boubou enfant", BOUBOU_ENFANT),
];

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GarmentModel {
    #[schema(example = "adulte")]
    pub categorie: String,
    #[schema(example = "homme")]
    pub sexe: String,
    #[schema(example = "Veste")]
    pub modele: String,
    pub mesures: Vec<String>,
}

pub fn genders_for(categorie: &str) -> Option<&'static [&'static str]> {
    match categorie {
        ADULTE => Some(&GENRES_ADULTE),
        ENFANT => Some(&GENRES_ENFANT),
        _ => None,
    }
}

pub fn expected_keys(categorie: &str, sexe: &str, modele: &str) -> Option<&'static [&'static str]> {
    CATALOGUE
        .iter()
        .find(|(c, s, m, _)| *c == categorie && *s == sexe && *m == modele)
        .map(|(_, _, _, keys)| *keys)
}

/// Catálogo completo, opcionalmente filtrado por categoria e sexo.
pub fn catalogue(categorie: Option<&str>, sexe: Option<&str>) -> Vec<GarmentModel> {
    CATALOGUE
        .iter()
        .filter(|(c, s, _, _)| categorie.is_none_or(|v| v == *c) && sexe.is_none_or(|v| v == *s))
        .map(|(c, s, m, keys)| GarmentModel {
            categorie: c.to_string(),
            sexe: s.to_string(),
            modele: m.to_string(),
            mesures: keys.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

/// Valida as medidas de uma commande.
///
/// Modelos do catálogo exigem todas as medidas previstas; chaves extras são
/// aceitas. Modelos livres aceitam qualquer conjunto não vazio. Os erros são
/// devolvidos por chave (`missing`, `negative`, `too_large`, `too_precise`).
pub fn validate(categorie: &str, sexe: &str, modele: &str, mesures: &Measurements) -> Result<(), AppError> {
    let genders = genders_for(categorie)
        .ok_or_else(|| AppError::InvalidInput(format!("catégorie inconnue: {categorie}")))?;
    if !genders.contains(&sexe) {
        return Err(AppError::InvalidInput(format!("sexe '{sexe}' invalide pour '{categorie}'")));
    }
    if modele.trim().is_empty() {
        return Err(AppError::InvalidInput("modèle obligatoire".into()));
    }
    if mesures.is_empty() {
        return Err(AppError::InvalidInput("mesures obligatoires".into()));
    }

    let mut errors = HashMap::new();

    if let Some(keys) = expected_keys(categorie, sexe, modele) {
        for key in keys {
            if !mesures.contains_key(*key) {
                errors.insert(key.to_string(), "missing".to_string());
            }
        }
    }

    for (key, value) in mesures {
        if key.trim().is_empty() {
            errors.insert(key.clone(), "empty_key".to_string());
        } else if *value < Decimal::ZERO {
            errors.insert(key.clone(), "negative".to_string());
        } else if *value > MAX_MEASUREMENT {
            errors.insert(key.clone(), "too_large".to_string());
        } else if value.normalize().scale() > 2 {
            errors.insert(key.clone(), "too_precise".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::InvalidMeasurements(errors));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesures(keys: &[&str], value: i64) -> Measurements {
        keys.iter().map(|k| (k.to_string(), Decimal::new(value, 0))).collect()
    }

    #[test]
    fn complete_catalogued_model_is_accepted() {
        let m = mesures(COSTUME, 40);
        assert!(validate(ADULTE, "homme", "Costume 2 pièces", &m).is_ok());
    }

    #[test]
    fn missing_keys_are_reported_individually() {
        let m = mesures(&["Tour de cou", "Tour de poitrine"], 40);
        let err = validate(ADULTE, "homme", "Costume 2 pièces", &m).unwrap_err();
        match err {
            AppError::InvalidMeasurements(errors) => {
                assert_eq!(errors.get("Entrejambe").map(String::as_str), Some("missing"));
                assert!(!errors.contains_key("Tour de cou"));
                assert_eq!(errors.len(), COSTUME.len() - 2);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn free_models_accept_arbitrary_keys() {
        let m = mesures(&["Longueur traîne"], 120);
        assert!(validate(ADULTE, "femme", "Robe de mariée", &m).is_ok());
    }

    #[test]
    fn negative_values_and_empty_maps_fail() {
        let mut m = mesures(&["Longueur traîne"], 120);
        m.insert("Tour de taille".into(), Decimal::new(-3, 0));
        assert!(matches!(
            validate(ADULTE, "femme", "Robe de mariée", &m),
            Err(AppError::InvalidMeasurements(_))
        ));
        assert!(matches!(
            validate(ADULTE, "femme", "Robe de mariée", &Measurements::new()),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_values_are_reported_not_stored() {
        let mut m = mesures(&["Longueur traîne"], 120);
        m.insert("Tour de taille".into(), Decimal::new(100_000_000_000, 0));
        match validate(ADULTE, "femme", "Robe de mariée", &m).unwrap_err() {
            AppError::InvalidMeasurements(errors) => {
                assert_eq!(errors.get("Tour de taille").map(String::as_str), Some("too_large"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
        m.insert("Tour de taille".into(), MAX_MEASUREMENT);
        assert!(validate(ADULTE, "femme", "Robe de mariée", &m).is_ok());
    }

    #[test]
    fn gender_must_match_category() {
        let m = mesures(ROBE_FILLE, 30);
        assert!(validate(ENFANT, "femme", "Robe casual", &m).is_err());
        assert!(validate("bebe", "fille", "Robe casual", &m).is_err());
        assert!(validate(ENFANT, "fille", "Robe casual", &m).is_ok());
    }

    #[test]
    fn adult_and_child_traditional_dress_differ() {
        let adult = expected_keys(ADULTE, "femme", "Robe traditionnelle").unwrap();
        let child = expected_keys(ENFANT, "fille", "Robe traditionnelle").unwrap();
        assert!(adult.contains(&"Largeur épaules"));
        assert!(!child.contains(&"Largeur épaules"));
    }

    #[test]
    fn catalogue_filters() {
        assert_eq!(catalogue(Some(ENFANT), Some("garcon")).len(), 5);
        assert_eq!(catalogue(None, None).len(), CATALOGUE.len());
    }
}
