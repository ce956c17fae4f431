use rayon::prelude::*;

use crate::algorithms::derived::{
    bulk_density, earth_similarity_index, equilibrium_temp, escape_velocity, habitability, insolation,
    planet_class, stellar_class, surface_gravity, DEFAULT_ALBEDO,
};
use crate::core::domain::{CanonicalObject, DerivedQuantities, ObjectKind};

/// Fills [`DerivedQuantities`] from measured properties.
///
/// Enrichment is a pure function of each object's own fields, so objects
/// are processed in parallel and re-running it gives the same result.
pub struct ObjectEnricher {
    albedo: f64,
}

impl ObjectEnricher {
    /// Enricher with the default Bond albedo
    pub fn new() -> Self {
        Self {
            albedo: DEFAULT_ALBEDO,
        }
    }

    pub fn with_albedo(albedo: f64) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> f64 {
        self.albedo
    }

    /// Enrich all objects in place
    pub fn enrich_objects(&self, objects: &mut [CanonicalObject]) {
        objects.par_iter_mut().for_each(|object| self.enrich_object(object));
    }

    /// Recompute the derived quantities of one object
    pub fn enrich_object(&self, object: &mut CanonicalObject) {
        let p = object.physical;
        let mut derived = DerivedQuantities::default();

        match object.kind {
            ObjectKind::Star => {
                derived.stellar_class = stellar_class(p.temperature_k);
            }
            ObjectKind::Exoplanet => {
                derived.stellar_class = stellar_class(p.host_temperature_k);
                derived.equilibrium_temp_k = equilibrium_temp(
                    p.host_temperature_k,
                    p.host_radius_solar,
                    p.semi_major_axis_au,
                    self.albedo,
                );

                // Catalog values win over estimates
                let temperature = p.temperature_k.or(derived.equilibrium_temp_k);
                let density = p
                    .density_g_cm3
                    .or(bulk_density(p.mass_earth, p.radius_earth));
                let flux = p.insolation_earth_flux.or(insolation(
                    p.host_temperature_k,
                    p.host_radius_solar,
                    p.semi_major_axis_au,
                ));

                derived.esi = earth_similarity_index(p.radius_earth, density, temperature, flux);
                derived.planet_class = planet_class(p.radius_earth);
                derived.habitability = habitability(temperature);
                derived.surface_gravity_m_s2 = surface_gravity(p.mass_earth, p.radius_earth);
                derived.escape_velocity_km_s = escape_velocity(p.mass_earth, p.radius_earth);
            }
            ObjectKind::SolarSystemBody => {
                derived.surface_gravity_m_s2 = surface_gravity(p.mass_earth, p.radius_earth);
                derived.escape_velocity_km_s = escape_velocity(p.mass_earth, p.radius_earth);
            }
            ObjectKind::DeepSkyObject => {}
        }

        object.derived = derived;
    }
}

impl Default for ObjectEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Habitability, Measurement, PlanetClass, SkyPosition, SourceCatalog, StellarClass,
    };
    use approx::assert_relative_eq;
    use qtty::Degrees;

    fn object(kind: ObjectKind) -> CanonicalObject {
        let sky = SkyPosition::new(Degrees::new(346.6223), Degrees::new(-5.0414)).unwrap();
        CanonicalObject::new(
            "test:1",
            kind,
            SourceCatalog::Exoplanets,
            "Test",
            sky,
            Measurement::Known(40.5),
        )
        .unwrap()
    }

    fn trappist_e() -> CanonicalObject {
        let mut planet = object(ObjectKind::Exoplanet);
        planet.physical.radius_earth = Measurement::Known(0.92);
        planet.physical.mass_earth = Measurement::Known(0.692);
        planet.physical.semi_major_axis_au = Measurement::Known(0.02925);
        planet.physical.host_temperature_k = Measurement::Known(2559.0);
        planet.physical.host_radius_solar = Measurement::Known(0.1192);
        planet
    }

    #[test]
    fn test_exoplanet_enrichment() {
        let mut planet = trappist_e();
        ObjectEnricher::new().enrich_object(&mut planet);

        let d = planet.derived;
        assert_eq!(d.stellar_class, StellarClass::M);
        assert_eq!(d.planet_class, PlanetClass::Terrestrial);
        let t_eq = d.equilibrium_temp_k.value().unwrap();
        assert!(t_eq > 215.0 && t_eq < 245.0, "T_eq = {}", t_eq);
        assert_eq!(d.habitability, Habitability::PotentiallyHabitable);
        let esi = d.esi.value().unwrap();
        assert!(esi > 0.7 && esi <= 1.0, "ESI = {}", esi);
        assert!(d.surface_gravity_m_s2.is_known());
    }

    #[test]
    fn test_catalog_temperature_wins_over_estimate() {
        let mut planet = trappist_e();
        planet.physical.temperature_k = Measurement::Known(450.0);
        ObjectEnricher::new().enrich_object(&mut planet);
        assert_eq!(planet.derived.habitability, Habitability::TooHot);
        // The derived estimate is still reported on its own
        assert!(planet.derived.equilibrium_temp_k.value().unwrap() < 300.0);
    }

    #[test]
    fn test_missing_inputs_stay_unknown() {
        let mut planet = object(ObjectKind::Exoplanet);
        ObjectEnricher::new().enrich_object(&mut planet);
        assert_eq!(planet.derived.esi, Measurement::Unknown);
        assert_eq!(planet.derived.equilibrium_temp_k, Measurement::Unknown);
        assert_eq!(planet.derived.stellar_class, StellarClass::Unknown);
        assert_eq!(planet.derived.planet_class, PlanetClass::Unknown);
    }

    #[test]
    fn test_star_and_solar_system_body() {
        let mut star = object(ObjectKind::Star);
        star.physical.temperature_k = Measurement::Known(5772.0);
        let mut earth = object(ObjectKind::SolarSystemBody);
        earth.physical.mass_earth = Measurement::Known(1.0);
        earth.physical.radius_earth = Measurement::Known(1.0);

        let mut objects = vec![star, earth];
        ObjectEnricher::new().enrich_objects(&mut objects);
        assert_eq!(objects[0].derived.stellar_class, StellarClass::G);
        assert_relative_eq!(
            objects[1].derived.surface_gravity_m_s2.value().unwrap(),
            9.82,
            epsilon = 0.01
        );
        assert_eq!(objects[1].derived.esi, Measurement::Unknown);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let mut once = trappist_e();
        let enricher = ObjectEnricher::with_albedo(0.1);
        enricher.enrich_object(&mut once);
        let mut twice = once.clone();
        enricher.enrich_object(&mut twice);
        assert_eq!(once, twice);
    }
}
