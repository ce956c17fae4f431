#[cfg(test)]
mod tests {
    use crate::algorithms::matching::{
        CatalogEntry, CatalogIndex, MatchCriteria, MatchMethod, SpatialMatcher,
    };
    use crate::core::domain::{Measurement, SkyPosition};
    use qtty::Degrees;

    const MIN_ID: u64 = 1_000_000_000;

    fn sky(ra: f64, dec: f64) -> SkyPosition {
        SkyPosition::new(Degrees::new(ra), Degrees::new(dec)).unwrap()
    }

    /// Position `arcsec` north of (ra, dec)
    fn north_of(ra: f64, dec: f64, arcsec: f64) -> SkyPosition {
        sky(ra, dec + arcsec / 3600.0)
    }

    fn entry(id: u64, position: SkyPosition, mag: Option<f64>, ruwe: Option<f64>) -> CatalogEntry {
        CatalogEntry {
            native_id: id.to_string(),
            numeric_id: Some(id),
            sky: position,
            magnitude: Measurement::from(mag),
            quality: Measurement::from(ruwe),
        }
    }

    fn gaia_index(entries: Vec<CatalogEntry>) -> CatalogIndex {
        CatalogIndex::build("gaia", entries, Some(MIN_ID))
    }

    #[test]
    fn test_ten_arcsec_is_no_match() {
        let index = gaia_index(vec![entry(
            2_305_944_521_456_675_456,
            north_of(346.6223, -5.0414, 10.0),
            Some(18.8),
            Some(1.0),
        )]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        assert!(matcher.match_position(&sky(346.6223, -5.0414)).is_none());
    }

    #[test]
    fn test_tenth_arcsec_is_a_match() {
        let index = gaia_index(vec![entry(
            2_305_944_521_456_675_456,
            north_of(346.6223, -5.0414, 0.1),
            Some(18.8),
            Some(1.0),
        )]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        let m = matcher.match_position(&sky(346.6223, -5.0414)).unwrap();
        assert_eq!(m.native_id, "2305944521456675456");
        assert_eq!(m.method, MatchMethod::Position);
        assert!((m.separation.value() - 0.1).abs() < 1e-6);
        assert!(!m.low_confidence);
    }

    #[test]
    fn test_quality_gate_drops_poor_astrometry() {
        let index = gaia_index(vec![
            entry(5_000_000_001, north_of(10.0, 10.0, 0.2), Some(9.0), Some(2.5)),
            entry(5_000_000_002, north_of(10.0, 10.0, 0.3), Some(12.0), None),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        assert!(matcher.match_position(&sky(10.0, 10.0)).is_none());

        // The same catalog with a looser, configurable threshold
        let loose = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(3.0)));
        let m = loose.match_position(&sky(10.0, 10.0)).unwrap();
        assert_eq!(m.native_id, "5000000001");
    }

    #[test]
    fn test_passes_quality() {
        let gated = MatchCriteria::new(1.0, Some(1.4));
        assert!(gated.passes_quality(&entry(5_000_000_001, sky(1.0, 1.0), None, Some(1.1))));
        assert!(!gated.passes_quality(&entry(5_000_000_001, sky(1.0, 1.0), None, Some(1.4))));
        assert!(!gated.passes_quality(&entry(5_000_000_001, sky(1.0, 1.0), None, None)));
        let open = MatchCriteria::new(1.0, None);
        assert!(open.passes_quality(&entry(5_000_000_001, sky(1.0, 1.0), None, None)));
    }

    #[test]
    fn test_brightest_candidate_wins() {
        let index = gaia_index(vec![
            entry(5_000_000_001, north_of(50.0, 20.0, 0.1), Some(14.0), Some(1.0)),
            entry(5_000_000_002, north_of(50.0, 20.0, 0.4), Some(11.0), Some(1.0)),
            entry(5_000_000_003, north_of(50.0, 20.0, 0.2), None, Some(1.0)),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        let m = matcher.match_position(&sky(50.0, 20.0)).unwrap();
        assert_eq!(m.native_id, "5000000002");
        assert_eq!(m.qualifying, 3);
        assert!(m.low_confidence);
    }

    #[test]
    fn test_equal_magnitudes_resolve_to_catalog_order() {
        let index = gaia_index(vec![
            entry(5_000_000_009, north_of(50.0, 20.0, 0.3), Some(11.0), Some(1.0)),
            entry(5_000_000_001, north_of(50.0, 20.0, 0.1), Some(11.0), Some(1.0)),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        for _ in 0..5 {
            let m = matcher.match_position(&sky(50.0, 20.0)).unwrap();
            assert_eq!(m.native_id, "5000000009");
        }
    }

    #[test]
    fn test_small_integer_identifiers_never_match() {
        // A recycled placeholder id sitting exactly on the anchor
        let index = gaia_index(vec![entry(42, sky(120.0, -30.0), Some(5.0), Some(1.0))]);
        assert_eq!(index.len(), 0);
        assert_eq!(index.excluded_degenerate(), 1);

        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        assert!(matcher.match_position(&sky(120.0, -30.0)).is_none());
        assert!(matcher.match_anchor(&sky(120.0, -30.0), Some(42), MIN_ID).is_none());
    }

    #[test]
    fn test_small_claimed_id_falls_back_to_position() {
        let index = gaia_index(vec![
            entry(5_000_000_001, north_of(80.0, 0.0, 0.2), Some(12.0), Some(1.0)),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        let m = matcher.match_anchor(&sky(80.0, 0.0), Some(7), MIN_ID).unwrap();
        assert_eq!(m.method, MatchMethod::Position);
        assert_eq!(m.native_id, "5000000001");
    }

    #[test]
    fn test_claimed_id_selects_fainter_neighbour() {
        let index = gaia_index(vec![
            entry(5_000_000_001, north_of(80.0, 0.0, 0.3), Some(9.0), Some(1.0)),
            entry(5_000_000_002, north_of(80.0, 0.0, 0.1), Some(13.0), Some(1.0)),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        let m = matcher
            .match_anchor(&sky(80.0, 0.0), Some(5_000_000_002), MIN_ID)
            .unwrap();
        assert_eq!(m.method, MatchMethod::Identifier);
        assert_eq!(m.native_id, "5000000002");
    }

    #[test]
    fn test_claimed_id_outside_tolerance_is_not_trusted() {
        let index = gaia_index(vec![
            entry(5_000_000_002, north_of(80.0, 0.0, 30.0), Some(13.0), Some(1.0)),
        ]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        assert!(matcher
            .match_anchor(&sky(80.0, 0.0), Some(5_000_000_002), MIN_ID)
            .is_none());
    }

    #[test]
    fn test_match_across_ra_wrap() {
        let index = gaia_index(vec![entry(
            5_000_000_001,
            sky(359.99995, 0.0),
            Some(10.0),
            Some(1.0),
        )]);
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        // 0.00010 deg = 0.36 arcsec apart across RA = 0
        assert!(matcher.match_position(&sky(0.00005, 0.0)).is_some());
    }

    #[test]
    fn test_catalog_without_quality_metric() {
        let index = CatalogIndex::build(
            "simbad",
            vec![CatalogEntry {
                native_id: "* alf Cen C".to_string(),
                numeric_id: None,
                sky: north_of(217.4289, -62.6795, 3.0),
                magnitude: Measurement::Unknown,
                quality: Measurement::Unknown,
            }],
            None,
        );
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(5.0, None));
        let m = matcher.match_position(&sky(217.4289, -62.6795)).unwrap();
        assert_eq!(m.native_id, "* alf Cen C");
        assert!(m.low_confidence, "3\" is beyond half of a 5\" tolerance");
    }

    #[test]
    fn test_empty_index() {
        let index = gaia_index(Vec::new());
        assert!(index.is_empty());
        let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
        assert!(matcher.match_position(&sky(0.0, 0.0)).is_none());
    }
}
