use claims_core::{
    config::EngineConfig,
    drivers::{CorrelationStrength, VarianceDriverRow},
    engine::{run_file, RunMode},
    error::AggError,
    output::{to_csv_string, SummaryWriter},
    reader::ClaimReader,
    year_severity::YEAR_SEVERITY_FILE,
};
use std::fs;
use std::path::Path;

// ── Helpers ──────────────────────────────────────────────────────────────────

const DATASET: &str = "\
CLAIMID,INCIDENTDATE,INJURY_SEVERITY_CATEGORY,COUNTNAME,VENUESTATE,VENUERATING,PRIMARY_INJURYGROUP_CODE,BODY_REGION,ADJUSTERNAME,DOLLARAMOUNTHIGH,CAUSATION_HIGH_RECOMMENDATION,SETTLEMENT_DAYS,Injury_Extent
C1,2023-01-05,Low,Kings,NY,Neutral,SPINE,\"Cervical, Lumbar\",Ann,1000,800,40,Mild
C2,2023-02-05,Low,Kings,NY,Neutral,SPINE,\"Cervical, Lumbar\",Ann,1000,1200,50,Mild
C3,2024-03-05,High,Erie,NY,Liberal,HEAD,Skull,Bo,9000,4000,300,Severe
C4,2024-04-05,High,Erie,NY,Liberal,HEAD,Skull,Bo,3000,6000,200,Severe
C5,2024-05-05,Low,Kings,NY,Neutral,SPINE,\"Cervical, Lumbar\",Ann,700,700,10,Mild
C6,2024-06-05,Low,Kings,NY,Neutral,SPINE,\"Cervical, Lumbar\",Cy,650,700,15,Mild
C7,2024-07-05,Low,Kings,NY,Neutral,SPINE,\"Cervical, Lumbar\",Cy,900,700,20,Mild
";

const OUTPUT_FILES: &[&str] = &[
    "year_severity_summary.csv",
    "county_year_summary.csv",
    "injury_group_summary.csv",
    "adjuster_performance_summary.csv",
    "venue_analysis_summary.csv",
    "variance_drivers_analysis.csv",
    "model_performance_summary.csv",
];

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_input(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("dat.csv");
    fs::write(&path, body).unwrap();
    path
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A factor value with a comma is quoted and reads back unchanged.
#[test]
fn csv_round_trip_preserves_commas_and_quotes() {
    let rows = vec![VarianceDriverRow {
        factor_name: "Body Region".into(),
        factor_value: "Cervical, Lumbar \"upper\"".into(),
        claim_count: 5,
        avg_variance_pct: 12.5,
        contribution_score: 3.25,
        correlation_strength: CorrelationStrength::Low,
    }];
    let text = to_csv_string(&rows).unwrap();
    assert!(text.starts_with(
        "factor_name,factor_value,claim_count,avg_variance_pct,contribution_score,correlation_strength\n"
    ));
    assert!(text.contains("\"Cervical, Lumbar \"\"upper\"\"\""));

    let back: Vec<_> = ClaimReader::from_reader(text.as_bytes())
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].get("factor_value"), Some("Cervical, Lumbar \"upper\""));
    assert_eq!(back[0].get("correlation_strength"), Some("Low"));
}

/// A full run writes every summary and leaves no temp files behind.
#[test]
fn run_writes_all_summaries() {
    init_logs();
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), DATASET);
    let out = dir.path().join("public");

    let stats = run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).unwrap();
    assert_eq!(stats.claims, 7);
    assert_eq!(stats.outputs.len(), OUTPUT_FILES.len());

    for name in OUTPUT_FILES {
        assert!(out.join(name).exists(), "{name} missing");
        assert!(!out.join(format!("{name}.tmp")).exists(), "{name}.tmp left behind");
    }

    let year_severity = fs::read_to_string(out.join(YEAR_SEVERITY_FILE)).unwrap();
    let mut lines = year_severity.lines();
    assert_eq!(
        lines.next(),
        Some("year,severity_category,claim_count,total_actual_settlement,total_predicted_settlement,avg_actual_settlement,avg_predicted_settlement,avg_variance_pct,avg_settlement_days,overprediction_count,underprediction_count,high_variance_count")
    );
    assert_eq!(lines.next().map(|l| l.starts_with("2023,Low,2,2000,2000,")), Some(true));

    let drivers = fs::read_to_string(out.join("variance_drivers_analysis.csv")).unwrap();
    assert!(drivers.contains("Body Region,\"Cervical, Lumbar\",5,"));
    assert!(!drivers.contains("Skull"), "2-claim group is below minimum support");

    let perf = fs::read_to_string(out.join("model_performance_summary.csv")).unwrap();
    assert!(perf.lines().nth(1).unwrap().starts_with("7,"));
}

/// Streaming and in-memory modes share one aggregation core.
#[test]
fn run_modes_agree() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), DATASET);
    let streamed = dir.path().join("streamed");
    let loaded = dir.path().join("loaded");

    run_file(&input, &streamed, RunMode::Streaming, EngineConfig::default_test()).unwrap();
    run_file(&input, &loaded, RunMode::InMemory, EngineConfig::default_test()).unwrap();

    for name in OUTPUT_FILES {
        assert_eq!(
            fs::read(streamed.join(name)).unwrap(),
            fs::read(loaded.join(name)).unwrap(),
            "{name} differs between modes"
        );
    }
}

/// A parse failure aborts the run before any summary is replaced.
#[test]
fn failed_run_keeps_previous_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), DATASET);
    let out = dir.path().join("public");
    run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).unwrap();
    let before = fs::read(out.join(YEAR_SEVERITY_FILE)).unwrap();

    let mut corrupt = DATASET.to_string();
    corrupt.push_str("C8,2025-01-01,Low\n");
    write_input(dir.path(), &corrupt);

    let err = run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).unwrap_err();
    assert!(matches!(err, AggError::MalformedRow { line: 9, .. }), "got {err}");
    assert_eq!(fs::read(out.join(YEAR_SEVERITY_FILE)).unwrap(), before);
}

/// A missing input is reported before the output directory is touched.
#[test]
fn missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("public");
    let err = run_file(
        &dir.path().join("dat.csv"),
        &out,
        RunMode::Streaming,
        EngineConfig::default_test(),
    )
    .unwrap_err();
    assert!(matches!(err, AggError::InputNotFound { .. }));
    assert!(!out.exists());
}

/// A header-only input produces empty summary files.
#[test]
fn empty_input_writes_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let header = DATASET.lines().next().unwrap();
    let input = write_input(dir.path(), &format!("{header}\n"));
    let out = dir.path().join("public");

    let stats = run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).unwrap();
    assert_eq!(stats.claims, 0);
    assert!(stats.outputs.iter().all(|o| o.rows == 0));
    for name in OUTPUT_FILES {
        assert_eq!(fs::read(out.join(name)).unwrap().len(), 0, "{name} not empty");
    }
}

/// Rewriting a summary replaces it wholesale.
#[test]
fn writer_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = SummaryWriter::new(dir.path()).unwrap();
    fs::write(writer.path_for("x.csv"), "stale,data\n1,2\n3,4\n").unwrap();

    let rows = vec![VarianceDriverRow {
        factor_name: "Injury Extent".into(),
        factor_value: "Mild".into(),
        claim_count: 9,
        avg_variance_pct: 30.0,
        contribution_score: 4.5,
        correlation_strength: CorrelationStrength::Medium,
    }];
    writer.write_rows("x.csv", &rows).unwrap();
    assert!(fs::read_to_string(writer.path_for("x.csv")).unwrap().contains("stale"));
    writer.commit().unwrap();

    let text = fs::read_to_string(writer.path_for("x.csv")).unwrap();
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), 2);
    assert!(!writer.path_for("x.csv.tmp").exists());
}

/// A summary that cannot be put in place leaves every previous output
/// untouched and no temp files behind.
#[test]
fn failed_write_keeps_every_previous_output() {
    init_logs();
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), DATASET);
    let out = dir.path().join("public");
    fs::create_dir_all(&out).unwrap();

    let blocked = "adjuster_performance_summary.csv";
    for name in OUTPUT_FILES {
        if *name == blocked {
            fs::create_dir_all(out.join(name).join("keep")).unwrap();
        } else {
            fs::write(out.join(name), "STALE\n").unwrap();
        }
    }

    assert!(run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).is_err());

    for name in OUTPUT_FILES {
        if *name != blocked {
            assert_eq!(fs::read_to_string(out.join(name)).unwrap(), "STALE\n", "{name} replaced");
        }
        assert!(!out.join(format!("{name}.tmp")).exists(), "{name}.tmp left behind");
    }
    assert!(out.join(blocked).is_dir());
}

/// Staged files that are never committed are removed.
#[test]
fn uncommitted_writes_are_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<VarianceDriverRow> = Vec::new();
    {
        let mut writer = SummaryWriter::new(dir.path()).unwrap();
        writer.write_rows("a.csv", &rows).unwrap();
        writer.write_rows("b.csv", &rows).unwrap();
        assert_eq!(writer.staged_count(), 2);
        assert!(writer.path_for("a.csv.tmp").exists());
    }
    let left: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(left.is_empty(), "{} files left", left.len());
}

/// All-empty rows with a full column count are counted as claims.
#[test]
fn empty_cell_rows_are_aggregated() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "INCIDENTDATE,INJURY_SEVERITY_CATEGORY,DOLLARAMOUNTHIGH\n2024-01-01,Low,100\n,,\n",
    );
    let out = dir.path().join("public");
    let stats = run_file(&input, &out, RunMode::Streaming, EngineConfig::default_test()).unwrap();
    assert_eq!(stats.claims, 2);

    let year_severity = fs::read_to_string(out.join(YEAR_SEVERITY_FILE)).unwrap();
    assert!(year_severity.contains("2000,Unknown,1,"), "{year_severity}");
}
