#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::core::domain::{ObjectKind, QualityFlag, SourceCatalog, StellarClass};
    use crate::parsing::sources::{ExoplanetRow, GaiaRow, RawSourceRecord, SimbadRow};
    use crate::preprocessing::fallback::FallbackTable;
    use crate::preprocessing::merger::*;
    use approx::assert_relative_eq;

    const TRAPPIST_GAIA: &str = "2305944521456675456";

    fn trappist_planet(name: &str) -> ExoplanetRow {
        ExoplanetRow {
            pl_name: Some(name.to_string()),
            hostname: Some("TRAPPIST-1".to_string()),
            ra: Some(346.6223),
            dec: Some(-5.0414),
            sy_plx: Some(80.4512),
            pl_rade: Some(0.92),
            pl_bmasse: Some(0.692),
            pl_orbsmax: Some(0.02925),
            st_teff: Some(2559.0),
            st_rad: Some(0.1192),
            gaia_id: Some(format!("Gaia DR3 {}", TRAPPIST_GAIA)),
            ..Default::default()
        }
    }

    fn gaia_row(id: &str, ra: f64, dec: f64, parallax: f64, ruwe: f64) -> GaiaRow {
        GaiaRow {
            source_id: Some(id.to_string()),
            ra: Some(ra),
            dec: Some(dec),
            parallax: Some(parallax),
            phot_g_mean_mag: Some(12.0),
            ruwe: Some(ruwe),
            teff_gspphot: Some(5000.0),
            ..Default::default()
        }
    }

    fn exoplanets(rows: Vec<ExoplanetRow>) -> SourceInput {
        SourceInput::loaded(
            SourceCatalog::Exoplanets,
            rows.into_iter().map(RawSourceRecord::Exoplanet).collect(),
        )
    }

    fn gaia(rows: Vec<GaiaRow>) -> SourceInput {
        SourceInput::loaded(SourceCatalog::Gaia, rows.into_iter().map(RawSourceRecord::Gaia).collect())
    }

    fn finalized(outcome: MergeOutcome) -> FinalizedDataset {
        match outcome {
            MergeOutcome::Finalized(dataset) => dataset,
            MergeOutcome::Failed(failed) => panic!("run failed: {:?}", failed.report.stage_errors),
        }
    }

    fn run(inputs: Vec<SourceInput>) -> MergeOutcome {
        CatalogMerger::new(MergeSettings::default(), FallbackTable::builtin()).run(inputs)
    }

    #[test]
    fn test_gaia_match_absorbs_candidate_and_sets_distance() {
        let mut host_row = trappist_planet("TRAPPIST-1 e");
        host_row.sy_plx = None;
        let inputs = vec![
            exoplanets(vec![host_row]),
            gaia(vec![
                gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414, 80.4512, 1.1),
                gaia_row("4000000000000000001", 10.0, 10.0, 100.0, 1.0),
            ]),
        ];

        let dataset = finalized(run(inputs));
        assert_eq!(dataset.report().state, RunState::Finalized);

        let host = dataset.get("star:TRAPPIST-1").unwrap();
        assert_eq!(host.cross_refs.get("gaia").map(String::as_str), Some(TRAPPIST_GAIA));
        assert!(!host.has_flag(QualityFlag::MissingDistance));
        assert_relative_eq!(host.distance_ly().value().unwrap(), 40.54, epsilon = 0.01);
        // Catalog temperature is kept over the Gaia estimate
        assert_eq!(host.physical.temperature_k.value(), Some(2559.0));

        // The planet had no distance of its own and inherits the host's
        let planet = dataset.get("exoplanet:TRAPPIST-1 e").unwrap();
        assert_eq!(planet.distance_ly(), host.distance_ly());
        assert!(planet.cartesian().is_some());
        assert_eq!(planet.derived.stellar_class, StellarClass::M);

        assert!(dataset.get(&format!("gaia:{}", TRAPPIST_GAIA)).is_none());
        assert!(dataset.get("gaia:4000000000000000001").is_some());
        assert_eq!(dataset.report().cross_matches.get("gaia"), Some(&1));
    }

    #[test]
    fn test_unmatched_gaia_stars_are_kept_and_audited() {
        let inputs = vec![gaia(vec![
            gaia_row("4000000000000000001", 10.0, 10.0, 100.0, 1.0),
            gaia_row("4000000000000000002", 20.0, 10.0, 100.0, 2.5),
        ])];

        let dataset = finalized(run(inputs));
        assert_eq!(dataset.objects().len(), 2);
        assert!(!dataset.objects()[0].has_flag(QualityFlag::PoorAstrometry));
        assert!(dataset.objects()[1].has_flag(QualityFlag::PoorAstrometry));
        assert_eq!(dataset.objects()[0].name, "Gaia 4000000000000000001");
    }

    #[test]
    fn test_wide_separation_is_low_confidence() {
        let offset = 0.8 / 3600.0;
        let inputs = vec![
            exoplanets(vec![trappist_planet("TRAPPIST-1 b")]),
            gaia(vec![gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414 + offset, 80.4512, 1.1)]),
        ];

        let dataset = finalized(run(inputs));
        let host = dataset.get("star:TRAPPIST-1").unwrap();
        assert!(host.cross_refs.contains_key("gaia"));
        assert!(host.has_flag(QualityFlag::LowConfidenceMatch));
    }

    #[test]
    fn test_poor_astrometry_candidate_is_not_matched() {
        let inputs = vec![
            exoplanets(vec![trappist_planet("TRAPPIST-1 b")]),
            gaia(vec![
                gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414, 80.4512, 3.0),
                gaia_row("4000000000000000001", 10.0, 10.0, 100.0, 1.0),
            ]),
        ];

        let dataset = finalized(run(inputs));
        let host = dataset.get("star:TRAPPIST-1").unwrap();
        assert!(!host.cross_refs.contains_key("gaia"));
        assert!(!host.has_flag(QualityFlag::FallbackUsed));
        let star = dataset.get(&format!("gaia:{}", TRAPPIST_GAIA)).unwrap();
        assert!(star.has_flag(QualityFlag::PoorAstrometry));
    }

    #[test]
    fn test_gaia_without_usable_rows_uses_fallback_table() {
        let mut row = trappist_planet("TRAPPIST-1 e");
        row.sy_plx = None;
        row.gaia_id = None;
        let mut unknown_host = trappist_planet("Nowhere b");
        unknown_host.hostname = Some("Nowhere".to_string());
        unknown_host.gaia_id = None;
        unknown_host.ra = Some(50.0);
        unknown_host.dec = Some(20.0);
        let inputs = vec![
            exoplanets(vec![row, unknown_host]),
            gaia(vec![
                gaia_row("1", 346.6223, -5.0414, 80.45, 1.0),
                gaia_row("2", 346.6223, -5.0414, 80.45, 1.0),
            ]),
        ];

        let dataset = finalized(run(inputs));
        let host = dataset.get("star:TRAPPIST-1").unwrap();
        assert!(host.has_flag(QualityFlag::FallbackUsed));
        assert_relative_eq!(host.distance_ly().value().unwrap(), 40.54, epsilon = 0.01);
        assert_eq!(host.cross_refs.get("gaia").map(String::as_str), Some(TRAPPIST_GAIA));
        assert!(dataset.get("star:Nowhere").unwrap().has_flag(QualityFlag::GaiaUnavailable));
        assert_eq!(dataset.report().cross_matches.get("gaia"), Some(&0));
    }

    #[test]
    fn test_gaia_with_only_poor_astrometry_uses_fallback_table() {
        let inputs = vec![
            exoplanets(vec![trappist_planet("TRAPPIST-1 b")]),
            gaia(vec![gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414, 80.4512, 3.0)]),
        ];

        let dataset = finalized(run(inputs));
        let host = dataset.get("star:TRAPPIST-1").unwrap();
        assert!(host.has_flag(QualityFlag::FallbackUsed));
        let star = dataset.get(&format!("gaia:{}", TRAPPIST_GAIA)).unwrap();
        assert!(star.has_flag(QualityFlag::PoorAstrometry));
    }

    #[test]
    fn test_shared_gaia_row_marks_second_host_low_confidence() {
        let mut twin = trappist_planet("TRAPPIST-1 twin b");
        twin.hostname = Some("TRAPPIST-1 twin".to_string());
        twin.gaia_id = None;
        let mut first = trappist_planet("TRAPPIST-1 b");
        first.gaia_id = None;
        let inputs = vec![
            exoplanets(vec![first, twin]),
            gaia(vec![gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414, 80.4512, 1.1)]),
        ];

        let dataset = finalized(run(inputs));
        let first = dataset.get("star:TRAPPIST-1").unwrap();
        let second = dataset.get("star:TRAPPIST-1 twin").unwrap();
        assert_eq!(first.cross_refs.get("gaia"), second.cross_refs.get("gaia"));
        assert!(!first.has_flag(QualityFlag::LowConfidenceMatch));
        assert!(second.has_flag(QualityFlag::LowConfidenceMatch));
    }

    #[test]
    fn test_gaia_unavailable_uses_fallback_table() {
        let mut kepler = trappist_planet("Kepler-452 b");
        kepler.hostname = Some("Kepler-452".to_string());
        kepler.ra = Some(294.4639);
        kepler.dec = Some(44.7489);
        kepler.sy_plx = None;
        kepler.st_teff = None;
        kepler.gaia_id = None;
        let mut unknown = trappist_planet("Nowhere b");
        unknown.hostname = Some("Nowhere".to_string());
        unknown.gaia_id = None;

        let inputs = vec![
            exoplanets(vec![trappist_planet("TRAPPIST-1 b"), kepler, unknown]),
            SourceInput::unavailable(SourceCatalog::Gaia, "archive timeout"),
        ];
        let dataset = finalized(run(inputs));

        let trappist = dataset.get("star:TRAPPIST-1").unwrap();
        assert!(trappist.has_flag(QualityFlag::FallbackUsed));
        assert_eq!(trappist.cross_refs.get("gaia").map(String::as_str), Some(TRAPPIST_GAIA));

        let kepler = dataset.get("star:Kepler-452").unwrap();
        assert!(kepler.has_flag(QualityFlag::FallbackUsed));
        assert!(!kepler.cross_refs.contains_key("gaia"));
        assert!(kepler.distance_ly().is_known());
        assert_eq!(kepler.physical.temperature_k.value(), Some(5757.0));
        assert_eq!(kepler.derived.stellar_class, StellarClass::G);

        let planet = dataset.get("exoplanet:Kepler-452 b").unwrap();
        assert_eq!(planet.distance_ly(), kepler.distance_ly());
        assert_eq!(planet.derived.stellar_class, StellarClass::G);

        let nowhere = dataset.get("star:Nowhere").unwrap();
        assert!(nowhere.has_flag(QualityFlag::GaiaUnavailable));
        assert!(!nowhere.has_flag(QualityFlag::FallbackUsed));

        let report = dataset.report();
        let gaia = report.sources.iter().find(|s| s.catalog == SourceCatalog::Gaia).unwrap();
        assert!(!gaia.available);
        assert_eq!(gaia.note.as_deref(), Some("archive timeout"));
    }

    #[test]
    fn test_simbad_names_gaia_stars() {
        let simbad = SimbadRow {
            gaia_id: Some("4000000000000000001".to_string()),
            main_id: Some("HD 1234".to_string()),
            ids: Some("HD 1234|NAME Example Star|Gaia DR3 4000000000000000001".to_string()),
            // About 3 arcsec from the star, past half the 5 arcsec tolerance
            ra: Some(10.0 + 3.0 / 3600.0),
            dec: Some(10.0),
            ..Default::default()
        };
        let inputs = vec![
            gaia(vec![gaia_row("4000000000000000001", 10.0, 10.0, 100.0, 1.0)]),
            SourceInput::loaded(SourceCatalog::Simbad, vec![RawSourceRecord::Simbad(simbad)]),
        ];

        let dataset = finalized(run(inputs));
        assert_eq!(dataset.objects().len(), 1);
        let star = &dataset.objects()[0];
        assert_eq!(star.name, "Example Star");
        assert_eq!(star.cross_refs.get("simbad").map(String::as_str), Some("HD 1234"));
        assert!(star.has_flag(QualityFlag::LowConfidenceMatch));
        assert!(dataset.objects().iter().all(|o| o.source != SourceCatalog::Simbad));
    }

    #[test]
    fn test_no_usable_input_fails_in_normalizing() {
        let outcome = run(vec![SourceInput::unavailable(SourceCatalog::Exoplanets, "missing file")]);
        let MergeOutcome::Failed(failed) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failed.report.state, RunState::Failed);
        assert_eq!(failed.report.stage_errors.len(), 1);
        assert_eq!(failed.report.stage_errors[0].stage, RunState::Normalizing);
        assert!(failed.partial.is_empty());
    }

    #[test]
    fn test_rejection_threshold_fails_and_keeps_partial_results() {
        let mut config = PipelineConfig::default();
        config.run.max_rejected_fraction = 0.4;
        let mut bad = trappist_planet("TRAPPIST-1 c");
        bad.ra = None;

        let merger = CatalogMerger::new(MergeSettings::from_config(&config), FallbackTable::builtin());
        let outcome = merger.run(vec![exoplanets(vec![trappist_planet("TRAPPIST-1 b"), bad])]);

        assert!(!outcome.is_finalized());
        let MergeOutcome::Failed(failed) = outcome else {
            unreachable!()
        };
        assert_eq!(failed.partial.len(), 2);
        assert_eq!(failed.report.rejections.len(), 1);
        assert_eq!(failed.report.stage(RunState::Normalizing).rejected, 1);
    }

    #[test]
    fn test_stages_only_advance_in_order() {
        let mut merger = CatalogMerger::new(MergeSettings::default(), FallbackTable::builtin());
        assert!(merger.match_catalogs().is_err());
        assert!(merger.enrich().is_err());
        assert_eq!(merger.state(), RunState::Idle);

        merger
            .normalize(vec![exoplanets(vec![trappist_planet("TRAPPIST-1 b")])])
            .unwrap();
        assert_eq!(merger.state(), RunState::Normalizing);
        assert!(merger.normalize(Vec::new()).is_err());
        merger.match_catalogs().unwrap();
        merger.enrich().unwrap();
        assert_eq!(merger.state(), RunState::Enriching);

        let outcome = merger.finish();
        assert!(outcome.is_finalized());
        assert_eq!(outcome.report().stage(RunState::Enriching).accepted, 2);
    }

    #[test]
    fn test_finish_before_enrichment_is_a_failure() {
        let mut merger = CatalogMerger::new(MergeSettings::default(), FallbackTable::builtin());
        merger
            .normalize(vec![exoplanets(vec![trappist_planet("TRAPPIST-1 b")])])
            .unwrap();
        let MergeOutcome::Failed(failed) = merger.finish() else {
            panic!("expected failure");
        };
        assert_eq!(failed.partial.len(), 2);
        assert_eq!(failed.report.stage_errors[0].stage, RunState::Normalizing);
    }

    #[test]
    fn test_output_does_not_depend_on_input_order() {
        let rows = vec![
            trappist_planet("TRAPPIST-1 b"),
            trappist_planet("TRAPPIST-1 c"),
            trappist_planet("TRAPPIST-1 d"),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        let stars = vec![
            gaia_row(TRAPPIST_GAIA, 346.6223, -5.0414, 80.4512, 1.1),
            gaia_row("4000000000000000001", 10.0, 10.0, 100.0, 1.0),
        ];
        let mut reversed_stars = stars.clone();
        reversed_stars.reverse();

        let a = finalized(run(vec![exoplanets(rows), gaia(stars)]));
        let b = finalized(run(vec![gaia(reversed_stars), exoplanets(reversed)]));
        assert_eq!(a.objects(), b.objects());
        assert!(a.objects().windows(2).all(|w| w[0].object_id < w[1].object_id));
        assert_eq!(
            a.objects().iter().filter(|o| o.kind == ObjectKind::Exoplanet).count(),
            3
        );
    }
}
