//! Maps raw source rows into [`CanonicalObject`]s.
//!
//! Each source keeps its own mapping rules, but every one of them ends in
//! the same canonical shape with explicit unknowns. Rows that cannot be
//! placed on the sky or carry no identity are rejected with a reason;
//! they never abort the batch.

use log::{debug, warn};
use qtty::length::nominal::{EarthRadius, JupiterRadii, SolarRadiuses};
use qtty::{AstronomicalUnits, Degrees, Kilometers, LightYear, Parsecs};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::algorithms::coordinates::to_spherical;
use crate::algorithms::derived::{EARTH_MASSES_PER_JUPITER_MASS, EARTH_MASS_KG};
use crate::core::domain::{
    CanonicalObject, Cartesian, Measurement, ObjectKind, QualityFlag, SkyPosition, SourceCatalog,
};
use crate::core::error::{PipelineError, PipelineResult};
use crate::parsing::identifiers::{
    common_name_from_aliases, messier_designation, parse_source_id, SourceId, MIN_GAIA_SOURCE_ID,
};
use crate::parsing::sources::{
    ExoplanetRow, GaiaRow, MessierRow, RawSourceRecord, SimbadRow, SolarSystemRow,
};
use crate::preprocessing::fallback::FallbackTable;

/// A row that did not make it into the canonical set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub catalog: SourceCatalog,
    /// Zero-based row index in the source.
    pub row: usize,
    pub native_id: Option<String>,
    pub reason: String,
}

/// Output of normalizing one source.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub objects: Vec<CanonicalObject>,
    pub rejections: Vec<Rejection>,
    /// Plausible Gaia source ids carried by objects, keyed by object id.
    pub claimed_ids: BTreeMap<String, u64>,
    pub input_rows: usize,
}

impl NormalizedBatch {
    /// Share of input rows that were rejected.
    pub fn rejected_fraction(&self) -> f64 {
        if self.input_rows == 0 {
            0.0
        } else {
            self.rejections.len() as f64 / self.input_rows as f64
        }
    }
}

/// Objects produced by a single row, with the Gaia id one of them claims.
#[derive(Debug)]
struct NormalizedRow {
    objects: Vec<CanonicalObject>,
    claimed_id: Option<(String, u64)>,
}

impl NormalizedRow {
    fn single(object: CanonicalObject) -> Self {
        Self {
            objects: vec![object],
            claimed_id: None,
        }
    }
}

/// Per-source normalization rules.
pub struct Normalizer<'a> {
    min_gaia_source_id: u64,
    fallback: &'a FallbackTable,
}

impl<'a> Normalizer<'a> {
    pub fn new(fallback: &'a FallbackTable) -> Self {
        Self {
            min_gaia_source_id: MIN_GAIA_SOURCE_ID,
            fallback,
        }
    }

    pub fn with_min_gaia_source_id(mut self, min_id: u64) -> Self {
        self.min_gaia_source_id = min_id;
        self
    }

    /// Normalizes every row of one source.
    ///
    /// Rows are mapped in parallel and assembled in input order, so the
    /// result does not depend on scheduling. Exoplanet rows also yield
    /// their host star; hosts seen more than once are merged into the
    /// first occurrence. Any other repeated object id is rejected.
    pub fn normalize_batch(&self, records: &[RawSourceRecord]) -> NormalizedBatch {
        let results: Vec<PipelineResult<NormalizedRow>> = records
            .par_iter()
            .map(|record| self.normalize_record(record))
            .collect();

        let mut batch = NormalizedBatch {
            input_rows: records.len(),
            ..Default::default()
        };
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row, (record, result)) in records.iter().zip(results).enumerate() {
            let normalized = match result {
                Ok(normalized) => normalized,
                Err(e) => {
                    debug!("{} row {} rejected: {}", record.catalog(), row, e);
                    batch.rejections.push(Rejection {
                        catalog: record.catalog(),
                        row,
                        native_id: record.native_id().map(str::to_string),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let mut duplicate = false;
            for object in normalized.objects {
                match seen.get(&object.object_id) {
                    Some(&existing) if is_host_anchor(&object) => {
                        merge_host(&mut batch.objects[existing], &object);
                    }
                    Some(_) => duplicate = true,
                    None => {
                        seen.insert(object.object_id.clone(), batch.objects.len());
                        batch.objects.push(object);
                    }
                }
            }
            if duplicate {
                batch.rejections.push(Rejection {
                    catalog: record.catalog(),
                    row,
                    native_id: record.native_id().map(str::to_string),
                    reason: "duplicate object_id".to_string(),
                });
            }
            if let Some((object_id, id)) = normalized.claimed_id {
                batch.claimed_ids.entry(object_id).or_insert(id);
            }
        }

        if !batch.rejections.is_empty() {
            warn!(
                "Normalization rejected {} of {} rows",
                batch.rejections.len(),
                batch.input_rows
            );
        }
        batch
    }

    fn normalize_record(&self, record: &RawSourceRecord) -> PipelineResult<NormalizedRow> {
        match record {
            RawSourceRecord::Exoplanet(row) => self.normalize_exoplanet(row),
            RawSourceRecord::Gaia(row) => self.normalize_gaia(row),
            RawSourceRecord::Simbad(row) => self.normalize_simbad(row),
            RawSourceRecord::Messier(row) => normalize_messier(row).map(NormalizedRow::single),
            RawSourceRecord::SolarSystem(row) => self.normalize_solar_system(row).map(NormalizedRow::single),
        }
    }

    fn normalize_exoplanet(&self, row: &ExoplanetRow) -> PipelineResult<NormalizedRow> {
        let catalog = SourceCatalog::Exoplanets;
        let pl_name = required_text(catalog, "pl_name", &row.pl_name)?;
        let sky = required_sky(catalog, row.ra, row.dec)?;
        let (distance, distance_flag) = system_distance(row.sy_plx, row.sy_dist)?;

        let mut planet = CanonicalObject::new(
            format!("exoplanet:{}", pl_name),
            ObjectKind::Exoplanet,
            catalog,
            pl_name,
            sky,
            distance,
        )?;

        let radius_earth = Measurement::from(row.pl_rade).or(Measurement::from(row.pl_radj)
            .map(|r| JupiterRadii::new(r).to::<EarthRadius>().value()));
        let mass_earth = Measurement::from(row.pl_bmasse)
            .or(Measurement::from(row.pl_bmassj).map(|m| m * EARTH_MASSES_PER_JUPITER_MASS));

        let physical = &mut planet.physical;
        physical.temperature_k = row.pl_eqt.into();
        physical.radius_earth = radius_earth.filter(|r| r > 0.0);
        physical.mass_earth = mass_earth.filter(|m| m > 0.0);
        physical.orbital_period_days = Measurement::from(row.pl_orbper).filter(|p| p > 0.0);
        physical.semi_major_axis_au = Measurement::from(row.pl_orbsmax).filter(|a| a > 0.0);
        physical.eccentricity = Measurement::from(row.pl_orbeccen).filter(|e| e >= 0.0);
        physical.density_g_cm3 = Measurement::from(row.pl_dens).filter(|d| d > 0.0);
        physical.insolation_earth_flux = Measurement::from(row.pl_insol).filter(|s| s >= 0.0);
        physical.host_temperature_k = Measurement::from(row.st_teff).filter(|t| t > 0.0);
        physical.host_radius_solar = Measurement::from(row.st_rad).filter(|r| r > 0.0);

        if !physical.radius_earth.is_known() && !physical.mass_earth.is_known() {
            planet.flag(QualityFlag::MissingPhysicalProperties);
        }
        if !planet.physical.temperature_k.is_known() && !planet.physical.host_temperature_k.is_known() {
            planet.flag(QualityFlag::MissingTemperature);
        }
        apply_distance_flags(&mut planet, distance_flag);

        let Some(hostname) = row.hostname.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(NormalizedRow::single(planet));
        };

        let host_id = format!("star:{}", hostname);
        planet.host_id = Some(host_id.clone());

        let mut host = CanonicalObject::new(
            host_id.clone(),
            ObjectKind::Star,
            catalog,
            hostname,
            sky,
            distance,
        )?;
        host.physical.temperature_k = planet.physical.host_temperature_k;
        host.physical.radius_earth = planet
            .physical
            .host_radius_solar
            .map(|r| SolarRadiuses::new(r).to::<EarthRadius>().value());
        host.physical.apparent_magnitude = Measurement::from(row.sy_gmag).or(row.sy_vmag.into());
        if !host.physical.temperature_k.is_known() {
            host.flag(QualityFlag::MissingTemperature);
        }
        apply_distance_flags(&mut host, distance_flag);

        let claimed_id = match parse_source_id(row.gaia_id.as_deref(), self.min_gaia_source_id) {
            SourceId::Valid(id) => Some((host_id, id)),
            SourceId::Degenerate => {
                host.flag(QualityFlag::DegenerateIdentifier);
                None
            }
            SourceId::Absent => None,
        };

        Ok(NormalizedRow {
            objects: vec![planet, host],
            claimed_id,
        })
    }

    fn normalize_gaia(&self, row: &GaiaRow) -> PipelineResult<NormalizedRow> {
        let catalog = SourceCatalog::Gaia;
        let raw_id = required_text(catalog, "source_id", &row.source_id)?;
        let sky = required_sky(catalog, row.ra, row.dec)?;
        let distance = parallax_distance(row.parallax);

        let mut star = CanonicalObject::new(
            format!("gaia:{}", raw_id),
            ObjectKind::Star,
            catalog,
            format!("Gaia {}", raw_id),
            sky,
            distance,
        )?;
        star.physical.temperature_k = Measurement::from(row.teff_gspphot).filter(|t| t > 0.0);
        star.physical.apparent_magnitude = row.phot_g_mean_mag.into();
        star.physical.astrometric_quality = row.ruwe.into();
        star.physical.velocity_km_s = nonzero_velocity(&mut star, row.radial_velocity);
        if !star.physical.temperature_k.is_known() {
            star.flag(QualityFlag::MissingTemperature);
        }
        apply_distance_flags(&mut star, None);

        let claimed_id = match parse_source_id(Some(raw_id), self.min_gaia_source_id) {
            SourceId::Valid(id) => Some((star.object_id.clone(), id)),
            _ => {
                star.flag(QualityFlag::DegenerateIdentifier);
                None
            }
        };

        Ok(NormalizedRow {
            objects: vec![star],
            claimed_id,
        })
    }

    fn normalize_simbad(&self, row: &SimbadRow) -> PipelineResult<NormalizedRow> {
        let catalog = SourceCatalog::Simbad;
        let main_id = row
            .main_id
            .as_deref()
            .or(row.gaia_id.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::missing_field(catalog.as_str(), "main_id"))?;
        let sky = required_sky(catalog, row.ra, row.dec)?;

        let name = row
            .ids
            .as_deref()
            .and_then(common_name_from_aliases)
            .unwrap_or_else(|| main_id.to_string());

        let mut candidate = CanonicalObject::new(
            format!("simbad:{}", main_id),
            ObjectKind::Star,
            catalog,
            name,
            sky,
            Measurement::Unknown,
        )?;
        candidate.cross_refs.insert("simbad".to_string(), main_id.to_string());

        let claimed_id = parse_source_id(row.gaia_id.as_deref(), self.min_gaia_source_id)
            .valid()
            .map(|id| (candidate.object_id.clone(), id));

        Ok(NormalizedRow {
            objects: vec![candidate],
            claimed_id,
        })
    }

    fn normalize_solar_system(&self, row: &SolarSystemRow) -> PipelineResult<CanonicalObject> {
        let catalog = SourceCatalog::SolarSystem;
        let key = row
            .id
            .as_deref()
            .or(row.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::missing_field(catalog.as_str(), "id"))?;

        let component = |value: Option<f64>, field: &str| {
            value
                .filter(|v| v.is_finite())
                .ok_or_else(|| PipelineError::missing_field(catalog.as_str(), field))
        };
        let au = [
            component(row.x_au, "x_au")?,
            component(row.y_au, "y_au")?,
            component(row.z_au, "z_au")?,
        ];
        let ly = au.map(|v| AstronomicalUnits::new(v).to::<LightYear>().value());
        let point = Cartesian::new(ly[0], ly[1], ly[2]);

        let is_sun = row.id.as_deref().map(str::trim) == Some("10")
            || row.name.as_deref().is_some_and(|n| n.trim().eq_ignore_ascii_case("sun"));
        if point.norm() == 0.0 && !is_sun {
            return Err(PipelineError::InvalidCoordinate(format!(
                "{} sits exactly at the origin",
                key
            )));
        }

        let (sky, distance) = to_spherical(&point);
        let name = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty()).unwrap_or(key);
        let mut body = CanonicalObject::new(
            format!("solar:{}", key),
            ObjectKind::SolarSystemBody,
            catalog,
            name,
            sky,
            Measurement::known(distance.value()),
        )?;

        let physical = &mut body.physical;
        physical.mass_earth = Measurement::from(row.mass_kg)
            .filter(|m| m > 0.0)
            .map(|m| m / EARTH_MASS_KG);
        physical.radius_earth = Measurement::from(row.radius_km)
            .filter(|r| r > 0.0)
            .map(|r| Kilometers::new(r).to::<EarthRadius>().value());
        physical.semi_major_axis_au = Measurement::from(row.semi_major_axis_au).filter(|a| a > 0.0);
        physical.eccentricity = Measurement::from(row.eccentricity).filter(|e| e >= 0.0);
        body.physical.velocity_km_s = nonzero_velocity(&mut body, row.velocity_km_s);

        if let Some(reference) = self.fallback.body(row.id.as_deref(), row.name.as_deref()) {
            let physical = &mut body.physical;
            let mut used = false;
            if !physical.mass_earth.is_known() {
                physical.mass_earth = Measurement::known(reference.mass_kg / EARTH_MASS_KG);
                used = true;
            }
            if !physical.radius_earth.is_known() {
                physical.radius_earth = Measurement::known(
                    Kilometers::new(reference.radius_km)
                        .to::<EarthRadius>()
                        .value(),
                );
                used = true;
            }
            if used {
                body.flag(QualityFlag::FallbackUsed);
            }
        }
        if !body.physical.mass_earth.is_known() || !body.physical.radius_earth.is_known() {
            body.flag(QualityFlag::MissingPhysicalProperties);
        }

        Ok(body)
    }
}

fn normalize_messier(row: &MessierRow) -> PipelineResult<CanonicalObject> {
    let catalog = SourceCatalog::Messier;
    let designation = row
        .m_number
        .as_deref()
        .and_then(messier_designation)
        .ok_or_else(|| PipelineError::missing_field(catalog.as_str(), "M_number"))?;
    let sky = required_sky(catalog, row.ra, row.dec)?;

    let (distance, flag) = match row.distance_ly {
        Some(d) if d == 0.0 => (Measurement::Unknown, Some(QualityFlag::SuspectZeroDistance)),
        other => (Measurement::from(other), None),
    };
    let name = row
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&designation)
        .to_string();

    let mut object = CanonicalObject::new(
        format!("messier:{}", designation),
        ObjectKind::DeepSkyObject,
        catalog,
        name,
        sky,
        distance,
    )?;
    object.physical.apparent_magnitude = row.apparent_magnitude.into();
    object.cross_refs.insert("messier".to_string(), designation);
    apply_distance_flags(&mut object, flag);
    Ok(object)
}

fn is_host_anchor(object: &CanonicalObject) -> bool {
    object.kind == ObjectKind::Star && object.source == SourceCatalog::Exoplanets
}

/// Folds a later sighting of a host star into the first one.
fn merge_host(existing: &mut CanonicalObject, later: &CanonicalObject) {
    if !existing.distance_ly().is_known() && later.distance_ly().is_known() {
        // Same sky position rules apply to both, so this cannot fail
        if existing
            .relocate(existing.sky_position(), later.distance_ly())
            .is_ok()
        {
            existing.quality_flags.remove(&QualityFlag::SuspectZeroDistance);
        }
    }
    existing.physical.fill_unknown_from(&later.physical);
    if existing.physical.temperature_k.is_known() {
        existing.quality_flags.remove(&QualityFlag::MissingTemperature);
    }
}

fn required_text<'r>(catalog: SourceCatalog, field: &str, value: &'r Option<String>) -> PipelineResult<&'r str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::missing_field(catalog.as_str(), field))
}

fn required_sky(catalog: SourceCatalog, ra: Option<f64>, dec: Option<f64>) -> PipelineResult<SkyPosition> {
    let ra = ra.ok_or_else(|| PipelineError::missing_field(catalog.as_str(), "ra"))?;
    let dec = dec.ok_or_else(|| PipelineError::missing_field(catalog.as_str(), "dec"))?;
    SkyPosition::new(Degrees::new(ra), Degrees::new(dec))
}

/// Light-years from a parallax in milliarcseconds; non-positive is unknown.
fn parallax_distance(parallax_mas: Option<f64>) -> Measurement {
    Measurement::from(parallax_mas)
        .filter(|p| p > 0.0)
        .map(|p| Parsecs::new(1000.0 / p).to::<LightYear>().value())
}

/// System distance, preferring parallax over the catalog distance.
fn system_distance(
    parallax_mas: Option<f64>,
    distance_pc: Option<f64>,
) -> PipelineResult<(Measurement, Option<QualityFlag>)> {
    let from_parallax = parallax_distance(parallax_mas);
    if from_parallax.is_known() {
        return Ok((from_parallax, None));
    }
    match Measurement::from(distance_pc).value() {
        None => Ok((Measurement::Unknown, None)),
        Some(d) if d == 0.0 => Ok((Measurement::Unknown, Some(QualityFlag::SuspectZeroDistance))),
        Some(d) if d < 0.0 => Err(PipelineError::InvalidDistance(format!(
            "negative system distance {} pc",
            d
        ))),
        Some(d) => Ok((
            Measurement::known(Parsecs::new(d).to::<LightYear>().value()),
            None,
        )),
    }
}

fn apply_distance_flags(object: &mut CanonicalObject, extra: Option<QualityFlag>) {
    if !object.distance_ly().is_known() {
        object.flag(QualityFlag::MissingDistance);
    }
    if let Some(flag) = extra {
        object.flag(flag);
    }
}

/// A velocity of exactly zero is a placeholder, not a measurement.
fn nonzero_velocity(object: &mut CanonicalObject, velocity_km_s: Option<f64>) -> Measurement {
    match Measurement::from(velocity_km_s) {
        Measurement::Known(v) if v == 0.0 => {
            object.flag(QualityFlag::SuspectZeroVelocity);
            Measurement::Unknown
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn exoplanet(name: &str, host: &str) -> ExoplanetRow {
        ExoplanetRow {
            pl_name: Some(name.to_string()),
            hostname: Some(host.to_string()),
            ra: Some(346.6223),
            dec: Some(-5.0414),
            sy_plx: Some(80.4512),
            pl_rade: Some(1.116),
            pl_bmasse: Some(1.374),
            st_teff: Some(2559.0),
            st_rad: Some(0.1192),
            gaia_id: Some("Gaia DR3 2305944521456675456".to_string()),
            ..Default::default()
        }
    }

    fn normalize(records: Vec<RawSourceRecord>) -> NormalizedBatch {
        Normalizer::new(FallbackTable::builtin()).normalize_batch(&records)
    }

    #[test]
    fn test_exoplanet_row_yields_planet_and_host() {
        let batch = normalize(vec![RawSourceRecord::Exoplanet(exoplanet("TRAPPIST-1 b", "TRAPPIST-1"))]);
        assert_eq!(batch.objects.len(), 2);
        assert!(batch.rejections.is_empty());

        let planet = &batch.objects[0];
        assert_eq!(planet.object_id, "exoplanet:TRAPPIST-1 b");
        assert_eq!(planet.host_id.as_deref(), Some("star:TRAPPIST-1"));
        // 1000 / 80.4512 pc in light-years
        assert_relative_eq!(planet.distance_ly().value().unwrap(), 40.54, epsilon = 0.01);

        let host = &batch.objects[1];
        assert_eq!(host.kind, ObjectKind::Star);
        assert_eq!(host.physical.temperature_k, Measurement::Known(2559.0));
        assert_eq!(
            batch.claimed_ids.get("star:TRAPPIST-1"),
            Some(&2_305_944_521_456_675_456)
        );
    }

    #[test]
    fn test_hosts_are_synthesized_once() {
        let mut c = exoplanet("TRAPPIST-1 c", "TRAPPIST-1");
        c.st_teff = None;
        c.sy_gmag = Some(15.6);
        let batch = normalize(vec![
            RawSourceRecord::Exoplanet(exoplanet("TRAPPIST-1 b", "TRAPPIST-1")),
            RawSourceRecord::Exoplanet(c),
        ]);
        let hosts: Vec<_> = batch.objects.iter().filter(|o| o.kind == ObjectKind::Star).collect();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].physical.temperature_k, Measurement::Known(2559.0));
        assert_eq!(hosts[0].physical.apparent_magnitude, Measurement::Known(15.6));
        assert_eq!(batch.objects.len(), 3);
    }

    #[test]
    fn test_jupiter_units_only_fill_missing_earth_units() {
        let mut row = exoplanet("HD 209458 b", "HD 209458");
        row.pl_rade = None;
        row.pl_radj = Some(1.0);
        row.pl_bmasse = Some(219.0);
        row.pl_bmassj = Some(1.0);
        let batch = normalize(vec![RawSourceRecord::Exoplanet(row)]);
        let planet = &batch.objects[0];
        assert_relative_eq!(planet.physical.radius_earth.value().unwrap(), 11.2215, epsilon = 1e-3);
        assert_eq!(planet.physical.mass_earth, Measurement::Known(219.0));
    }

    #[test]
    fn test_missing_distance_is_unknown_not_zero() {
        let mut row = exoplanet("Far b", "Far");
        row.sy_plx = None;
        row.sy_dist = Some(0.0);
        let batch = normalize(vec![RawSourceRecord::Exoplanet(row)]);
        let planet = &batch.objects[0];
        assert_eq!(planet.distance_ly(), Measurement::Unknown);
        assert!(planet.cartesian().is_none());
        assert!(planet.has_flag(QualityFlag::MissingDistance));
        assert!(planet.has_flag(QualityFlag::SuspectZeroDistance));
    }

    #[test]
    fn test_rows_without_coordinates_are_rejected() {
        let mut row = exoplanet("Lost b", "Lost");
        row.dec = None;
        let mut bad_dec = exoplanet("Odd b", "Odd");
        bad_dec.dec = Some(91.0);
        let batch = normalize(vec![
            RawSourceRecord::Exoplanet(row),
            RawSourceRecord::Exoplanet(bad_dec),
            RawSourceRecord::Exoplanet(exoplanet("TRAPPIST-1 b", "TRAPPIST-1")),
        ]);
        assert_eq!(batch.rejections.len(), 2);
        assert_eq!(batch.rejections[0].row, 0);
        assert!(batch.rejections[0].reason.contains("dec"));
        assert_eq!(batch.rejections[1].native_id.as_deref(), Some("Odd b"));
        assert_eq!(batch.objects.len(), 2);
        assert_relative_eq!(batch.rejected_fraction(), 2.0 / 3.0);
    }

    #[test]
    fn test_duplicate_planets_are_rejected() {
        let batch = normalize(vec![
            RawSourceRecord::Exoplanet(exoplanet("TRAPPIST-1 b", "TRAPPIST-1")),
            RawSourceRecord::Exoplanet(exoplanet("TRAPPIST-1 b", "TRAPPIST-1")),
        ]);
        assert_eq!(batch.rejections.len(), 1);
        assert_eq!(batch.rejections[0].reason, "duplicate object_id");
    }

    #[test]
    fn test_degenerate_gaia_id_is_flagged_not_claimed() {
        let mut row = exoplanet("Small b", "Small");
        row.gaia_id = Some("42".to_string());
        let batch = normalize(vec![RawSourceRecord::Exoplanet(row)]);
        assert!(batch.claimed_ids.is_empty());
        assert!(batch.objects[1].has_flag(QualityFlag::DegenerateIdentifier));
    }

    #[test]
    fn test_gaia_row() {
        let row = GaiaRow {
            source_id: Some("5256310677471630720".to_string()),
            ra: Some(217.4289),
            dec: Some(-62.6795),
            parallax: Some(768.0669),
            phot_g_mean_mag: Some(8.98),
            ruwe: Some(1.1),
            radial_velocity: Some(0.0),
            ..Default::default()
        };
        let batch = normalize(vec![RawSourceRecord::Gaia(row)]);
        let star = &batch.objects[0];
        assert_eq!(star.object_id, "gaia:5256310677471630720");
        assert_eq!(star.name, "Gaia 5256310677471630720");
        assert_relative_eq!(star.distance_ly().value().unwrap(), 4.2465, epsilon = 1e-3);
        assert_eq!(star.physical.velocity_km_s, Measurement::Unknown);
        assert!(star.has_flag(QualityFlag::SuspectZeroVelocity));
        assert!(star.has_flag(QualityFlag::MissingTemperature));
    }

    #[test]
    fn test_negative_parallax_is_unknown_distance() {
        let row = GaiaRow {
            source_id: Some("4000000000000".to_string()),
            ra: Some(10.0),
            dec: Some(10.0),
            parallax: Some(-0.3),
            ..Default::default()
        };
        let batch = normalize(vec![RawSourceRecord::Gaia(row)]);
        assert!(batch.objects[0].has_flag(QualityFlag::MissingDistance));
    }

    #[test]
    fn test_simbad_row_becomes_named_candidate() {
        let row = SimbadRow {
            gaia_id: Some("5853498713190525696".to_string()),
            main_id: Some("* alf Cen C".to_string()),
            ids: Some("Gaia DR3 5853498713190525696|NAME Proxima Centauri".to_string()),
            otype: Some("Star".to_string()),
            ra: Some(217.4289),
            dec: Some(-62.6795),
        };
        let batch = normalize(vec![RawSourceRecord::Simbad(row)]);
        let candidate = &batch.objects[0];
        assert_eq!(candidate.name, "Proxima Centauri");
        assert_eq!(candidate.cross_refs.get("simbad").map(String::as_str), Some("* alf Cen C"));
        assert_eq!(batch.claimed_ids.len(), 1);
    }

    #[test]
    fn test_messier_row() {
        let row = MessierRow {
            m_number: Some("M 31".to_string()),
            name: Some("Andromeda Galaxy".to_string()),
            object_type: Some("Galaxy".to_string()),
            ra: Some(10.6847),
            dec: Some(41.2687),
            distance_ly: Some(2_537_000.0),
            apparent_magnitude: Some(3.4),
        };
        let batch = normalize(vec![RawSourceRecord::Messier(row)]);
        let m31 = &batch.objects[0];
        assert_eq!(m31.object_id, "messier:M31");
        assert_eq!(m31.kind, ObjectKind::DeepSkyObject);
        assert!(m31.cartesian().is_some());
    }

    #[test]
    fn test_solar_system_rows() {
        let sun = SolarSystemRow {
            name: Some("Sun".to_string()),
            id: Some("10".to_string()),
            x_au: Some(0.0),
            y_au: Some(0.0),
            z_au: Some(0.0),
            ..Default::default()
        };
        let jupiter = SolarSystemRow {
            name: Some("Jupiter".to_string()),
            id: Some("599".to_string()),
            x_au: Some(5.2),
            y_au: Some(0.0),
            z_au: Some(0.0),
            velocity_km_s: Some(0.0),
            ..Default::default()
        };
        let stray = SolarSystemRow {
            name: Some("Ceres".to_string()),
            id: Some("2000001".to_string()),
            x_au: Some(0.0),
            y_au: Some(0.0),
            z_au: Some(0.0),
            ..Default::default()
        };
        let batch = normalize(vec![
            RawSourceRecord::SolarSystem(sun),
            RawSourceRecord::SolarSystem(jupiter),
            RawSourceRecord::SolarSystem(stray),
        ]);
        assert_eq!(batch.objects.len(), 2);
        assert_eq!(batch.rejections.len(), 1);
        assert_eq!(batch.rejections[0].native_id.as_deref(), Some("2000001"));

        let sun = &batch.objects[0];
        assert_eq!(sun.distance_ly(), Measurement::Known(0.0));

        let jupiter = &batch.objects[1];
        assert!(jupiter.has_flag(QualityFlag::FallbackUsed));
        assert!(jupiter.has_flag(QualityFlag::SuspectZeroVelocity));
        assert_relative_eq!(jupiter.physical.mass_earth.value().unwrap(), 317.8, epsilon = 0.5);
        assert_relative_eq!(
            jupiter.distance_ly().value().unwrap(),
            5.2 / 63_241.077,
            max_relative = 1e-6
        );
    }
}
