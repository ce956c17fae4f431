//! Raw per-source row shapes.
//!
//! Each catalog keeps its native column names. Rows are immutable once
//! read and are consumed by the normalizer. The column tables here are the
//! single place that says which native columns a source contributes.

use serde::{Deserialize, Deserializer};

use crate::core::domain::SourceCatalog;

/// Accepts ids written either as JSON strings or as JSON integers.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(u64),
        Float(f64),
    }

    Ok(match Option::<StringOrInt>::deserialize(deserializer)? {
        None => None,
        Some(StringOrInt::String(s)) => Some(s),
        Some(StringOrInt::Int(i)) => Some(i.to_string()),
        // Keep the float rendering so the identifier parser can flag it
        Some(StringOrInt::Float(f)) => Some(format!("{:e}", f)),
    })
}

/// NASA Exoplanet Archive (`pscomppars`) row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExoplanetRow {
    pub pl_name: Option<String>,
    pub hostname: Option<String>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    /// System distance, parsecs
    pub sy_dist: Option<f64>,
    /// System parallax, milliarcseconds
    pub sy_plx: Option<f64>,
    pub pl_rade: Option<f64>,
    pub pl_radj: Option<f64>,
    pub pl_bmasse: Option<f64>,
    #[serde(alias = "pl_massj")]
    pub pl_bmassj: Option<f64>,
    pub pl_orbper: Option<f64>,
    pub pl_orbsmax: Option<f64>,
    pub pl_orbeccen: Option<f64>,
    pub pl_insol: Option<f64>,
    pub pl_dens: Option<f64>,
    pub pl_eqt: Option<f64>,
    pub st_teff: Option<f64>,
    pub st_rad: Option<f64>,
    pub sy_gmag: Option<f64>,
    pub sy_vmag: Option<f64>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub gaia_id: Option<String>,
}

/// Gaia DR3 `gaia_source` row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaiaRow {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub source_id: Option<String>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    /// Milliarcseconds
    pub parallax: Option<f64>,
    pub phot_g_mean_mag: Option<f64>,
    pub phot_bp_mean_mag: Option<f64>,
    pub phot_rp_mean_mag: Option<f64>,
    pub ruwe: Option<f64>,
    pub teff_gspphot: Option<f64>,
    pub radial_velocity: Option<f64>,
}

/// SIMBAD naming row, keyed by the Gaia id it was resolved from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimbadRow {
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub gaia_id: Option<String>,
    pub main_id: Option<String>,
    /// Pipe-separated alias list
    #[serde(alias = "simbad_names")]
    pub ids: Option<String>,
    #[serde(alias = "object_type")]
    pub otype: Option<String>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
}

/// Messier catalog row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessierRow {
    #[serde(rename = "M_number")]
    pub m_number: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub distance_ly: Option<f64>,
    #[serde(alias = "magnitude")]
    pub apparent_magnitude: Option<f64>,
}

/// Heliocentric ephemeris row for a solar-system body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolarSystemRow {
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub body_type: Option<String>,
    pub x_au: Option<f64>,
    pub y_au: Option<f64>,
    pub z_au: Option<f64>,
    pub velocity_km_s: Option<f64>,
    pub mass_kg: Option<f64>,
    pub radius_km: Option<f64>,
    pub semi_major_axis_au: Option<f64>,
    pub eccentricity: Option<f64>,
}

/// One row from one external source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSourceRecord {
    Exoplanet(ExoplanetRow),
    Gaia(GaiaRow),
    Simbad(SimbadRow),
    Messier(MessierRow),
    SolarSystem(SolarSystemRow),
}

impl RawSourceRecord {
    pub fn catalog(&self) -> SourceCatalog {
        match self {
            RawSourceRecord::Exoplanet(_) => SourceCatalog::Exoplanets,
            RawSourceRecord::Gaia(_) => SourceCatalog::Gaia,
            RawSourceRecord::Simbad(_) => SourceCatalog::Simbad,
            RawSourceRecord::Messier(_) => SourceCatalog::Messier,
            RawSourceRecord::SolarSystem(_) => SourceCatalog::SolarSystem,
        }
    }

    /// The source's own key for this row, if present.
    pub fn native_id(&self) -> Option<&str> {
        match self {
            RawSourceRecord::Exoplanet(r) => r.pl_name.as_deref(),
            RawSourceRecord::Gaia(r) => r.source_id.as_deref(),
            RawSourceRecord::Simbad(r) => r.gaia_id.as_deref().or(r.main_id.as_deref()),
            RawSourceRecord::Messier(r) => r.m_number.as_deref(),
            RawSourceRecord::SolarSystem(r) => r.id.as_deref().or(r.name.as_deref()),
        }
    }
}

/// Column layout of a source table.
///
/// Implemented by every raw row type so the tabular readers can map
/// columns without per-source code paths.
pub trait SourceSchema: Sized {
    const CATALOG: SourceCatalog;
    /// Native columns read as 64-bit floats.
    const FLOAT_COLUMNS: &'static [&'static str];
    /// Native columns read as text (ids are text to keep all digits).
    const TEXT_COLUMNS: &'static [&'static str];

    /// Builds a row from a column lookup.
    fn from_columns(row: &impl ColumnLookup) -> Self;

    fn into_record(self) -> RawSourceRecord;
}

/// Read access to one row of a tabular source.
pub trait ColumnLookup {
    fn float(&self, column: &str) -> Option<f64>;
    fn text(&self, column: &str) -> Option<String>;
}

impl SourceSchema for ExoplanetRow {
    const CATALOG: SourceCatalog = SourceCatalog::Exoplanets;
    const FLOAT_COLUMNS: &'static [&'static str] = &[
        "ra", "dec", "sy_dist", "sy_plx", "pl_rade", "pl_radj", "pl_bmasse", "pl_bmassj",
        "pl_orbper", "pl_orbsmax", "pl_orbeccen", "pl_insol", "pl_dens", "pl_eqt", "st_teff",
        "st_rad", "sy_gmag", "sy_vmag",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["pl_name", "hostname", "gaia_id"];

    fn from_columns(row: &impl ColumnLookup) -> Self {
        Self {
            pl_name: row.text("pl_name"),
            hostname: row.text("hostname"),
            ra: row.float("ra"),
            dec: row.float("dec"),
            sy_dist: row.float("sy_dist"),
            sy_plx: row.float("sy_plx"),
            pl_rade: row.float("pl_rade"),
            pl_radj: row.float("pl_radj"),
            pl_bmasse: row.float("pl_bmasse"),
            pl_bmassj: row.float("pl_bmassj"),
            pl_orbper: row.float("pl_orbper"),
            pl_orbsmax: row.float("pl_orbsmax"),
            pl_orbeccen: row.float("pl_orbeccen"),
            pl_insol: row.float("pl_insol"),
            pl_dens: row.float("pl_dens"),
            pl_eqt: row.float("pl_eqt"),
            st_teff: row.float("st_teff"),
            st_rad: row.float("st_rad"),
            sy_gmag: row.float("sy_gmag"),
            sy_vmag: row.float("sy_vmag"),
            gaia_id: row.text("gaia_id"),
        }
    }

    fn into_record(self) -> RawSourceRecord {
        RawSourceRecord::Exoplanet(self)
    }
}

impl SourceSchema for GaiaRow {
    const CATALOG: SourceCatalog = SourceCatalog::Gaia;
    const FLOAT_COLUMNS: &'static [&'static str] = &[
        "ra", "dec", "parallax", "phot_g_mean_mag", "phot_bp_mean_mag", "phot_rp_mean_mag",
        "ruwe", "teff_gspphot", "radial_velocity",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["source_id"];

    fn from_columns(row: &impl ColumnLookup) -> Self {
        Self {
            source_id: row.text("source_id"),
            ra: row.float("ra"),
            dec: row.float("dec"),
            parallax: row.float("parallax"),
            phot_g_mean_mag: row.float("phot_g_mean_mag"),
            phot_bp_mean_mag: row.float("phot_bp_mean_mag"),
            phot_rp_mean_mag: row.float("phot_rp_mean_mag"),
            ruwe: row.float("ruwe"),
            teff_gspphot: row.float("teff_gspphot"),
            radial_velocity: row.float("radial_velocity"),
        }
    }

    fn into_record(self) -> RawSourceRecord {
        RawSourceRecord::Gaia(self)
    }
}

impl SourceSchema for SimbadRow {
    const CATALOG: SourceCatalog = SourceCatalog::Simbad;
    const FLOAT_COLUMNS: &'static [&'static str] = &["ra", "dec"];
    const TEXT_COLUMNS: &'static [&'static str] =
        &["gaia_id", "main_id", "ids", "simbad_names", "otype", "object_type"];

    fn from_columns(row: &impl ColumnLookup) -> Self {
        Self {
            gaia_id: row.text("gaia_id"),
            main_id: row.text("main_id"),
            ids: row.text("ids").or_else(|| row.text("simbad_names")),
            otype: row.text("otype").or_else(|| row.text("object_type")),
            ra: row.float("ra"),
            dec: row.float("dec"),
        }
    }

    fn into_record(self) -> RawSourceRecord {
        RawSourceRecord::Simbad(self)
    }
}

impl SourceSchema for MessierRow {
    const CATALOG: SourceCatalog = SourceCatalog::Messier;
    const FLOAT_COLUMNS: &'static [&'static str] =
        &["ra", "dec", "distance_ly", "apparent_magnitude", "magnitude"];
    const TEXT_COLUMNS: &'static [&'static str] = &["M_number", "name", "type"];

    fn from_columns(row: &impl ColumnLookup) -> Self {
        Self {
            m_number: row.text("M_number"),
            name: row.text("name"),
            object_type: row.text("type"),
            ra: row.float("ra"),
            dec: row.float("dec"),
            distance_ly: row.float("distance_ly"),
            apparent_magnitude: row
                .float("apparent_magnitude")
                .or_else(|| row.float("magnitude")),
        }
    }

    fn into_record(self) -> RawSourceRecord {
        RawSourceRecord::Messier(self)
    }
}

impl SourceSchema for SolarSystemRow {
    const CATALOG: SourceCatalog = SourceCatalog::SolarSystem;
    const FLOAT_COLUMNS: &'static [&'static str] = &[
        "x_au", "y_au", "z_au", "velocity_km_s", "mass_kg", "radius_km", "semi_major_axis_au",
        "eccentricity",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &["name", "id", "type"];

    fn from_columns(row: &impl ColumnLookup) -> Self {
        Self {
            name: row.text("name"),
            id: row.text("id"),
            body_type: row.text("type"),
            x_au: row.float("x_au"),
            y_au: row.float("y_au"),
            z_au: row.float("z_au"),
            velocity_km_s: row.float("velocity_km_s"),
            mass_kg: row.float("mass_kg"),
            radius_km: row.float("radius_km"),
            semi_major_axis_au: row.float("semi_major_axis_au"),
            eccentricity: row.float("eccentricity"),
        }
    }

    fn into_record(self) -> RawSourceRecord {
        RawSourceRecord::SolarSystem(self)
    }
}
