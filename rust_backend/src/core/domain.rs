//! Canonical astronomical objects and the value types they are built from.
//!
//! Every catalog row, whatever its source, ends up as a [`CanonicalObject`].
//! Optional numeric attributes are carried as [`Measurement`] so that an
//! absent value can never be confused with a measured zero.

use qtty::{Degrees, LightYears};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::algorithms::coordinates;
use crate::core::error::{PipelineError, PipelineResult};

/// A numeric attribute that is either known or explicitly unknown.
///
/// Non-finite values are never stored as known. Serializes as a plain
/// number or `null`.
///
/// # Examples
///
/// ```
/// use cosmic_atlas::core::domain::Measurement;
///
/// assert_eq!(Measurement::from(Some(4.2)).value(), Some(4.2));
/// assert!(!Measurement::from(None).is_known());
/// assert!(!Measurement::known(f64::NAN).is_known());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Measurement {
    Known(f64),
    #[default]
    Unknown,
}

impl Measurement {
    /// Wraps a raw value, demoting NaN and infinities to `Unknown`.
    pub fn known(value: f64) -> Self {
        if value.is_finite() {
            Measurement::Known(value)
        } else {
            Measurement::Unknown
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Measurement::Known(v) => Some(v),
            Measurement::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Measurement::Known(_))
    }

    /// Keeps the value only when `predicate` holds.
    pub fn filter(self, predicate: impl FnOnce(f64) -> bool) -> Self {
        match self {
            Measurement::Known(v) if predicate(v) => self,
            _ => Measurement::Unknown,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Measurement::Known(v) => Measurement::known(f(v)),
            Measurement::Unknown => Measurement::Unknown,
        }
    }

    /// Returns `self` if known, otherwise `other`.
    pub fn or(self, other: Measurement) -> Self {
        if self.is_known() {
            self
        } else {
            other
        }
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measurement::Unknown, Measurement::known)
    }
}

impl From<Measurement> for Option<f64> {
    fn from(value: Measurement) -> Self {
        value.value()
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::known(value)
    }
}

/// What kind of object a canonical record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Star,
    Exoplanet,
    DeepSkyObject,
    SolarSystemBody,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Star => "star",
            ObjectKind::Exoplanet => "exoplanet",
            ObjectKind::DeepSkyObject => "deep_sky_object",
            ObjectKind::SolarSystemBody => "solar_system_body",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCatalog {
    Exoplanets,
    Gaia,
    Simbad,
    Messier,
    SolarSystem,
    Fallback,
}

impl SourceCatalog {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCatalog::Exoplanets => "exoplanets",
            SourceCatalog::Gaia => "gaia",
            SourceCatalog::Simbad => "simbad",
            SourceCatalog::Messier => "messier",
            SourceCatalog::SolarSystem => "solar_system",
            SourceCatalog::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SourceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equatorial sky position. RA is always in `[0, 360)`, Dec in `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra: Degrees,
    dec: Degrees,
}

impl SkyPosition {
    /// Validates and normalizes a position. RA is wrapped into `[0, 360)`.
    pub fn new(ra: Degrees, dec: Degrees) -> PipelineResult<Self> {
        coordinates::validate_sky_position(ra, dec)
    }

    /// Builds a position from values already known to be in range.
    pub(crate) fn from_validated(ra: Degrees, dec: Degrees) -> Self {
        Self { ra, dec }
    }

    pub fn ra(&self) -> Degrees {
        self.ra
    }

    pub fn dec(&self) -> Degrees {
        self.dec
    }
}

/// Heliocentric-equatorial position in light-years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cartesian {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Spectral class derived from effective temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StellarClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl StellarClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StellarClass::O => "O",
            StellarClass::B => "B",
            StellarClass::A => "A",
            StellarClass::F => "F",
            StellarClass::G => "G",
            StellarClass::K => "K",
            StellarClass::M => "M",
            StellarClass::Unknown => "unknown",
        }
    }

    /// Label used by the viewers, e.g. `"G-type"`.
    pub fn star_type(&self) -> String {
        match self {
            StellarClass::Unknown => "Unknown".to_string(),
            class => format!("{}-type", class.as_str()),
        }
    }
}

impl fmt::Display for StellarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planet size class from radius in Earth radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetClass {
    Terrestrial,
    SuperEarth,
    NeptuneLike,
    GasGiant,
    #[default]
    Unknown,
}

impl PlanetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanetClass::Terrestrial => "Terrestrial",
            PlanetClass::SuperEarth => "Super-Earth",
            PlanetClass::NeptuneLike => "Neptune-like",
            PlanetClass::GasGiant => "Gas Giant",
            PlanetClass::Unknown => "Unknown",
        }
    }
}

/// Coarse temperature-based habitability bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Habitability {
    PotentiallyHabitable,
    TooCold,
    TooHot,
    #[default]
    Unknown,
}

impl Habitability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Habitability::PotentiallyHabitable => "Potentially Habitable",
            Habitability::TooCold => "Too Cold",
            Habitability::TooHot => "Too Hot",
            Habitability::Unknown => "Unknown",
        }
    }
}

/// Provenance and validity markers attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingDistance,
    MissingTemperature,
    MissingPhysicalProperties,
    SuspectZeroDistance,
    SuspectZeroVelocity,
    LowConfidenceMatch,
    FallbackUsed,
    GaiaUnavailable,
    DegenerateIdentifier,
    PoorAstrometry,
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::MissingDistance => "missing_distance",
            QualityFlag::MissingTemperature => "missing_temperature",
            QualityFlag::MissingPhysicalProperties => "missing_physical_properties",
            QualityFlag::SuspectZeroDistance => "suspect_zero_distance",
            QualityFlag::SuspectZeroVelocity => "suspect_zero_velocity",
            QualityFlag::LowConfidenceMatch => "low_confidence_match",
            QualityFlag::FallbackUsed => "fallback_used",
            QualityFlag::GaiaUnavailable => "gaia_unavailable",
            QualityFlag::DegenerateIdentifier => "degenerate_identifier",
            QualityFlag::PoorAstrometry => "poor_astrometry",
        }
    }
}

/// Measured physical attributes, each independently optional.
///
/// For stars `temperature_k` is the effective temperature; for exoplanets
/// it is the catalog equilibrium temperature and the host's values live in
/// the `host_*` fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicalProperties {
    pub temperature_k: Measurement,
    pub radius_earth: Measurement,
    pub mass_earth: Measurement,
    pub orbital_period_days: Measurement,
    pub semi_major_axis_au: Measurement,
    pub eccentricity: Measurement,
    pub density_g_cm3: Measurement,
    pub insolation_earth_flux: Measurement,
    pub host_temperature_k: Measurement,
    pub host_radius_solar: Measurement,
    pub apparent_magnitude: Measurement,
    pub velocity_km_s: Measurement,
    pub astrometric_quality: Measurement,
}

impl PhysicalProperties {
    /// Column names, in export order.
    pub const FIELD_NAMES: [&'static str; 13] = [
        "temperature_k",
        "radius_earth",
        "mass_earth",
        "orbital_period_days",
        "semi_major_axis_au",
        "eccentricity",
        "density_g_cm3",
        "insolation_earth_flux",
        "host_temperature_k",
        "host_radius_solar",
        "apparent_magnitude",
        "velocity_km_s",
        "astrometric_quality",
    ];

    /// Values in the same order as [`Self::FIELD_NAMES`].
    pub fn values(&self) -> [Measurement; 13] {
        [
            self.temperature_k,
            self.radius_earth,
            self.mass_earth,
            self.orbital_period_days,
            self.semi_major_axis_au,
            self.eccentricity,
            self.density_g_cm3,
            self.insolation_earth_flux,
            self.host_temperature_k,
            self.host_radius_solar,
            self.apparent_magnitude,
            self.velocity_km_s,
            self.astrometric_quality,
        ]
    }

    /// Fills every unknown field of `self` from `other`.
    pub fn fill_unknown_from(&mut self, other: &PhysicalProperties) {
        self.temperature_k = self.temperature_k.or(other.temperature_k);
        self.radius_earth = self.radius_earth.or(other.radius_earth);
        self.mass_earth = self.mass_earth.or(other.mass_earth);
        self.orbital_period_days = self.orbital_period_days.or(other.orbital_period_days);
        self.semi_major_axis_au = self.semi_major_axis_au.or(other.semi_major_axis_au);
        self.eccentricity = self.eccentricity.or(other.eccentricity);
        self.density_g_cm3 = self.density_g_cm3.or(other.density_g_cm3);
        self.insolation_earth_flux = self.insolation_earth_flux.or(other.insolation_earth_flux);
        self.host_temperature_k = self.host_temperature_k.or(other.host_temperature_k);
        self.host_radius_solar = self.host_radius_solar.or(other.host_radius_solar);
        self.apparent_magnitude = self.apparent_magnitude.or(other.apparent_magnitude);
        self.velocity_km_s = self.velocity_km_s.or(other.velocity_km_s);
        self.astrometric_quality = self.astrometric_quality.or(other.astrometric_quality);
    }
}

/// Quantities computed during enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedQuantities {
    pub stellar_class: StellarClass,
    pub equilibrium_temp_k: Measurement,
    pub esi: Measurement,
    pub planet_class: PlanetClass,
    pub habitability: Habitability,
    pub surface_gravity_m_s2: Measurement,
    pub escape_velocity_km_s: Measurement,
}

/// The unified record every source is normalized into.
///
/// Position fields are private: `cartesian` is always recomputed from the
/// sky position and distance through [`CanonicalObject::relocate`]. A
/// serialized `cartesian` is ignored on input and derived again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredObject")]
pub struct CanonicalObject {
    pub object_id: String,
    pub kind: ObjectKind,
    pub source: SourceCatalog,
    pub name: String,
    /// Object id of the host star, for exoplanets.
    pub host_id: Option<String>,
    sky_position: SkyPosition,
    distance_ly: Measurement,
    cartesian: Option<Cartesian>,
    pub physical: PhysicalProperties,
    pub derived: DerivedQuantities,
    pub quality_flags: BTreeSet<QualityFlag>,
    pub cross_refs: BTreeMap<String, String>,
}

/// Serialized form of [`CanonicalObject`], checked through `new` on input.
#[derive(Deserialize)]
struct StoredObject {
    object_id: String,
    kind: ObjectKind,
    source: SourceCatalog,
    #[serde(default)]
    name: String,
    #[serde(default)]
    host_id: Option<String>,
    sky_position: SkyPosition,
    #[serde(default)]
    distance_ly: Measurement,
    #[serde(default)]
    physical: PhysicalProperties,
    #[serde(default)]
    derived: DerivedQuantities,
    #[serde(default)]
    quality_flags: BTreeSet<QualityFlag>,
    #[serde(default)]
    cross_refs: BTreeMap<String, String>,
}

impl TryFrom<StoredObject> for CanonicalObject {
    type Error = PipelineError;

    fn try_from(stored: StoredObject) -> Result<Self, Self::Error> {
        let sky = SkyPosition::new(stored.sky_position.ra(), stored.sky_position.dec())?;
        let mut object = CanonicalObject::new(
            stored.object_id,
            stored.kind,
            stored.source,
            stored.name,
            sky,
            stored.distance_ly,
        )?;
        object.host_id = stored.host_id;
        object.physical = stored.physical;
        object.derived = stored.derived;
        object.quality_flags = stored.quality_flags;
        object.cross_refs = stored.cross_refs;
        Ok(object)
    }
}

impl CanonicalObject {
    /// Creates an object and derives its Cartesian position.
    ///
    /// Fails with `InvalidDistance` for a negative or non-finite distance.
    pub fn new(
        object_id: impl Into<String>,
        kind: ObjectKind,
        source: SourceCatalog,
        name: impl Into<String>,
        sky_position: SkyPosition,
        distance_ly: Measurement,
    ) -> PipelineResult<Self> {
        let cartesian = Self::project(sky_position, distance_ly)?;
        Ok(Self {
            object_id: object_id.into(),
            kind,
            source,
            name: name.into(),
            host_id: None,
            sky_position,
            distance_ly,
            cartesian,
            physical: PhysicalProperties::default(),
            derived: DerivedQuantities::default(),
            quality_flags: BTreeSet::new(),
            cross_refs: BTreeMap::new(),
        })
    }

    fn project(sky: SkyPosition, distance: Measurement) -> PipelineResult<Option<Cartesian>> {
        distance
            .value()
            .map(|d| coordinates::to_cartesian(sky.ra(), sky.dec(), LightYears::new(d)))
            .transpose()
    }

    pub fn sky_position(&self) -> SkyPosition {
        self.sky_position
    }

    pub fn distance_ly(&self) -> Measurement {
        self.distance_ly
    }

    /// `None` exactly when the distance is unknown.
    pub fn cartesian(&self) -> Option<Cartesian> {
        self.cartesian
    }

    /// Replaces position inputs and recomputes `cartesian`.
    ///
    /// On error the object is left unchanged.
    pub fn relocate(&mut self, sky_position: SkyPosition, distance_ly: Measurement) -> PipelineResult<()> {
        let cartesian = Self::project(sky_position, distance_ly)?;
        self.sky_position = sky_position;
        self.distance_ly = distance_ly;
        self.cartesian = cartesian;
        if distance_ly.is_known() {
            self.quality_flags.remove(&QualityFlag::MissingDistance);
        } else {
            self.quality_flags.insert(QualityFlag::MissingDistance);
        }
        Ok(())
    }

    pub fn flag(&mut self, flag: QualityFlag) {
        self.quality_flags.insert(flag);
    }

    pub fn has_flag(&self, flag: QualityFlag) -> bool {
        self.quality_flags.contains(&flag)
    }

    /// Human-facing label: the common name if one was resolved, else the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.object_id
        } else {
            &self.name
        }
    }
}
