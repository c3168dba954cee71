//! GeoJSON feature reading shared by the demand and site loaders

use std::path::Path;

use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;

use crate::Error;

/// Accepted source names for one logical field, in preference order
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
}

pub const ID_FIELD: FieldAliases = FieldAliases {
    field: "identifier",
    aliases: &["GEOID", "geoid", "GEOID20", "GEOID10", "tract_id", "id"],
};

pub const VULNERABILITY_FIELD: FieldAliases = FieldAliases {
    field: "vulnerability",
    aliases: &["HVI", "hvi"],
};

pub const RISK_FIELD: FieldAliases = FieldAliases {
    field: "risk",
    aliases: &["RISK", "risk"],
};

pub const SITE_ID_FIELD: FieldAliases = FieldAliases {
    field: "site identifier",
    aliases: &["id", "site_id", "ID", "name"],
};

pub const SITE_NAME_FIELD: FieldAliases = FieldAliases {
    field: "site name",
    aliases: &["name", "NAME", "site_name"],
};

impl FieldAliases {
    /// First alias present on any feature, resolved once per file
    pub fn resolve(&self, features: &[Feature]) -> Option<&'static str> {
        self.aliases.iter().copied().find(|alias| {
            features.iter().any(|feature| {
                feature
                    .properties
                    .as_ref()
                    .is_some_and(|props| props.contains_key(*alias))
            })
        })
    }

    /// Like [`FieldAliases::resolve`], failing when no alias is present
    pub fn require(&self, features: &[Feature], source: &Path) -> Result<&'static str, Error> {
        self.resolve(features).ok_or_else(|| {
            Error::InvalidInput(format!(
                "{}: no {} column (accepted: {})",
                source.display(),
                self.field,
                self.aliases.join(", ")
            ))
        })
    }
}

/// Read every feature of a GeoJSON file
pub fn read_features(path: &Path) -> Result<Vec<Feature>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    parse_features(&text).map_err(|e| match e {
        Error::GeoJsonError(msg) => Error::GeoJsonError(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn parse_features(text: &str) -> Result<Vec<Feature>, Error> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::GeoJsonError(e.to_string()))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(Error::GeoJsonError(
            "expected a Feature or FeatureCollection, found a bare geometry".to_string(),
        )),
    }
}

pub fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a JsonValue> {
    feature.properties.as_ref().and_then(|props| props.get(key))
}

/// Property as text; numbers are rendered without quotes
pub fn text_property(feature: &Feature, key: &str) -> Option<String> {
    match property(feature, key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Property as a finite number; numeric strings are accepted
pub fn number_property(feature: &Feature, key: &str) -> Option<f64> {
    let value = match property(feature, key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Feature geometry converted to a `geo` geometry
pub fn feature_geometry(feature: &Feature) -> Result<Option<geo::Geometry<f64>>, Error> {
    feature
        .geometry
        .clone()
        .map(|geometry| {
            geo::Geometry::<f64>::try_from(geometry)
                .map_err(|e| Error::GeoJsonError(e.to_string()))
        })
        .transpose()
}
