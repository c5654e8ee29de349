//! Flood events: mass balance, hydrogram forcing and the project runner.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use evofond::constants::POROSITY;
use evofond::io::{DataTable, TABLE_DIR, write_results};
use evofond::sediment::{Lefort2015, Meunier1989};
use evofond::{
    EventConfig, FrictionLaw, Granulometry, Hydrogram, LavabreParams, Profile, Project, Section,
    TransportLawKind, compute_event,
};

fn granulometry() -> Arc<Granulometry> {
    Arc::new(Granulometry::new(0.06, 0.025, 0.05, 0.18, 0.11, 0.22, 2.7).unwrap())
}

/// Mixed rectangular and irregular reach.
fn mixed_reach() -> Profile {
    let g = granulometry();
    let sections = (0..9)
        .map(|i| {
            let x = i as f64 * 12.5;
            let z = 80.0 - 0.06 * x;
            let section = if i % 2 == 0 {
                Section::rectangular(x, z, 5.0, g.clone()).unwrap()
            } else {
                Section::irregular(
                    x,
                    z,
                    vec![(0.0, 4.0), (1.0, 0.0), (5.0, 0.0), (6.0, 4.0)],
                    g.clone(),
                )
                .unwrap()
            };
            section.with_z_min(z - 1.5).unwrap()
        })
        .collect();
    Profile::new("mixed", sections).unwrap()
}

#[test]
fn test_solid_mass_is_conserved() {
    let mut profile = mixed_reach();
    let hydrogram = Hydrogram::lavabre(&LavabreParams {
        duration: 600.0,
        tm: 200.0,
        qm: 12.0,
        qb: 0.5,
        alpha: 3.0,
        dt: 50.0,
    })
    .unwrap();
    let supply = Granulometry::uniform(0.05).unwrap();
    let sedimentogram = hydrogram.sedimentogram(&Lefort2015, 5.0, &supply, 0.08);

    let config = EventConfig {
        friction: FrictionLaw::Ferguson,
        speed_coef: 0.9,
        ..Default::default()
    };
    let result = compute_event(
        &mut profile,
        hydrogram.time(),
        hydrogram.discharge(),
        &sedimentogram,
        &Lefort2015,
        &config,
        None,
    )
    .unwrap();

    let stored = profile.stored_volume().unwrap();
    let balance = result.volume_in - result.volume_out;
    assert!(
        (stored * (1.0 - POROSITY) - balance).abs() <= 1e-9 * (1.0 + balance.abs()),
        "stored {} balance {}",
        stored,
        balance
    );
    for s in profile.sections() {
        assert!(s.z() >= s.z_min() - 1e-12);
    }
    assert_eq!(result.time, hydrogram.time().to_vec());
}

#[test]
fn test_clear_water_erodes_and_deposit_fills() {
    let time = [0.0, 300.0];
    let q = [6.0, 6.0];
    let config = EventConfig {
        speed_coef: 0.9,
        ..Default::default()
    };

    let mut clear = mixed_reach();
    let r = compute_event(&mut clear, &time, &q, &[0.0, 0.0], &Meunier1989, &config, None).unwrap();
    assert!(clear.stored_volume().unwrap() < 0.0);
    assert_eq!(r.volume_in, 0.0);

    let mut loaded = mixed_reach();
    compute_event(&mut loaded, &time, &q, &[0.5, 0.5], &Meunier1989, &config, None).unwrap();
    assert!(loaded.stored_volume().unwrap() > 0.0);
}

#[test]
fn test_lavabre_shape() {
    for alpha in [1.0, 2.0, 4.0, 8.0] {
        let params = LavabreParams {
            duration: 40_000.0,
            tm: 1000.0,
            qm: 50.0,
            qb: 2.0,
            alpha,
            dt: 100.0,
        };
        let h = Hydrogram::lavabre(&params).unwrap();
        assert_eq!(h.discharge()[0], 2.0);
        assert!((params.discharge(1000.0) - 50.0).abs() < 1e-12);
        assert!((h.discharge_at(1000.0) - 50.0).abs() < 1e-12);
        let end = h.discharge()[h.len() - 1];
        assert!(end - 2.0 < 0.1 * (50.0 - 2.0), "alpha = {}: Q(end) = {}", alpha, end);
        assert!(h.discharge().iter().all(|&q| (2.0..=50.0 + 1e-9).contains(&q)));
    }
}

fn write_project(dir: &Path, lavabre: bool) -> std::path::PathBuf {
    let mut profile = String::from("x z b zmin manning\n");
    for i in 0..6 {
        let x = i as f64 * 20.0;
        let z = 50.0 - 0.04 * x;
        profile.push_str(&format!("{} {} 4.0 {} 0.05\n", x, z, z - 1.0));
    }
    fs::write(dir.join("profile.txt"), profile).unwrap();
    fs::write(
        dir.join("granulometry.json"),
        r#"{"dm": 0.05, "d30": 0.02, "d50": 0.04, "d90": 0.15, "d84tb": 0.09, "d84bs": 0.2, "Gr": 2.5}"#,
    )
    .unwrap();
    fs::write(dir.join("hydrogram.txt"), "t Q\n0 1\n300 8\n600 3\n900 1\n").unwrap();

    let config = serde_json::json!({
        "NAME": "test-reach",
        "PROFILE_PATH": "profile.txt",
        "SECTION": "rectangular",
        "LAVABRE": lavabre,
        "DURATION": 900, "TM": 300, "QM": 8, "QB": 1, "ALPHA": 2, "DT": 300,
        "HYDROGRAM_PATH": "hydrogram.txt",
        "TRANSPORT_LAW": "Rickenmann1991",
        "UPSTREAM_SLOPE": 4.0,
        "UPSTREAM_WIDTH": 4.0,
        "GRANULOMETRY_FILES": ["granulometry.json"],
        "INTERPOLATION": true,
        "DX": 10.0,
        "CRITICAL": false,
        "FRICTION_LAW": "Manning-Strickler",
        "UPSTREAM_CONDITION": "critical_depth",
        "DOWNSTREAM_CONDITION": "normal_depth",
        "SPEED_COEF": 0.8,
        "BACKUP_TIME_STEP": 300,
        "PERF": true
    });
    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn test_project_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), false);

    let mut project = Project::load(&config).unwrap();
    assert_eq!(project.profile.len(), 11);
    assert_eq!(project.hydrogram.len(), 4);
    assert_eq!(project.sedimentogram.len(), 4);
    assert_eq!(
        project.config.transport_law_kind().unwrap(),
        TransportLawKind::Rickenmann1991
    );

    let result = project.run().unwrap();
    assert_eq!(result.time, vec![0.0, 300.0, 600.0, 900.0]);
    let perf = project.performance.as_ref().unwrap();
    assert_eq!(perf.n_internal_steps, result.n_internal_steps);

    let out = dir.path().join("results");
    let snapshots = write_results(&out, &result, project.config.backup_time_step).unwrap();
    assert_eq!(snapshots.len(), 4);
    let head = DataTable::read(out.join(TABLE_DIR).join("head_max.txt")).unwrap();
    assert_eq!(head.n_rows(), 11);
}

#[test]
fn test_project_lavabre_and_hydraulics() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), true);
    let project = Project::load(&config).unwrap();
    assert_eq!(project.hydrogram.time(), &[0.0, 300.0, 600.0, 900.0]);
    assert!((project.hydrogram.discharge()[1] - 8.0).abs() < 1e-12);

    let line = project.hydraulics(5.0).unwrap();
    assert_eq!(line.len(), 11);
    assert!(line.depth.iter().all(|&y| y > 0.0 && y.is_finite()));
}

#[test]
fn test_project_missing_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), true);
    fs::remove_file(dir.path().join("profile.txt")).unwrap();
    assert!(Project::load(&config).is_err());
}
