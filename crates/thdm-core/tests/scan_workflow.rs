//! End-to-end scans against stub tool binaries.
//!
//! The stubs are small shell scripts with the real argument and file
//! contracts: the CalcHybrid stand-in echoes the requested masses into an
//! SLHA spectrum, the SusHi stand-in reads its deck back and reports the
//! mass of whichever state the deck selects.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use thdm_core::driver::run_point;
use thdm_core::{
    CancelToken, DuplicatePolicy, PointContext, PointFailure, ScanConfig, ScanDriver, ScanError,
    Scenario, ToolPaths,
};

const CALC_HYBRID_STUB: &str = r#"#!/bin/sh
mh="$1"
mH="$2"
cat > "$9" <<EOF
# CalcHybrid stub spectrum
Block THDM # consistency checks
 1 1.00000000E+00 # potential stability
 2 1.00000000E+00 # perturbativity
 3 1.00000000E+00 # unitarity
 4 1.00000000E+00 # EW precision
Block MASS # mass spectrum
 25 $mh # h
 35 $mH # H
 36 $mH # A
 37 $mH # H+
DECAY 25 4.10000000E-03 # h width
 6.25000000E-02 2 15 -15 # tau tau
DECAY 35 1.50000000E+00 # H width
 9.00000000E-02 2 15 -15 # tau tau
DECAY 36 2.00000000E+00 # A width
 1.10000000E-01 2 15 -15 # tau tau
EOF
"#;

const SUSHI_STUB: &str = r#"#!/bin/sh
deck="$1"
code=$(awk '$1 == "2" { print $2; exit }' "$deck")
m_light=$(awk '$1 == "21" { print $2; exit }' "$deck")
m_heavy=$(awk '$1 == "22" { print $2; exit }' "$deck")
if [ "$code" = "11" ]; then
  mass="$m_light"
else
  mass="$m_heavy"
fi
cat > "$2" <<EOF
Block MASSOUT # mass of the selected state
 1 $mass
Block SUSHIggh # gluon fusion cross sections in pb
 1 1.23450000E-01
 102 1.10000000E-01
 103 1.34000000E-01
Block SUSHIbbh # bbh cross sections in pb
 1 4.56000000E-02
EOF
"#;

const SCENARIO_2X2: &str = "
name: stub_scan
scan:
  mH:
    min: 200.0
    max: 300.0
    steps: 2
  tanb:
    min: 5.0
    max: 10.0
    steps: 2
fixed:
  mh: 125.0
  cos_betal: 0.1
  Z4: 0.1
  Z5: 0.1
  Z7: 0.0
  thdm_type: 2
";

const SCENARIO_1X1: &str = "
name: stub_point
scan:
  mH:
    min: 300.0
    max: 300.0
    steps: 1
  tanb:
    min: 8.5
    max: 8.5
    steps: 1
fixed:
  mh: 125.0
  cos_betal: 0.1
  Z4: 0.1
  Z5: 0.1
  Z7: 0.0
  thdm_type: 2
";

fn write_executable(path: &Path, body: &str) {
    fs::write(path, body).expect("stub script should be writable");
    let mut permissions = fs::metadata(path)
        .expect("stub metadata should be readable")
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("stub script should become executable");
}

fn stub_tools(dir: &Path) -> ToolPaths {
    stub_tools_with(dir, CALC_HYBRID_STUB, SUSHI_STUB)
}

fn stub_tools_with(dir: &Path, calc_hybrid: &str, sushi: &str) -> ToolPaths {
    let calc_hybrid_path = dir.join("calc_hybrid_stub");
    let sushi_path = dir.join("sushi_stub");
    write_executable(&calc_hybrid_path, calc_hybrid);
    write_executable(&sushi_path, sushi);
    ToolPaths {
        calc_hybrid: calc_hybrid_path,
        sushi: sushi_path,
    }
}

fn config(tools: ToolPaths, output_root: PathBuf) -> ScanConfig {
    ScanConfig {
        version: "v1".to_string(),
        output_root,
        tools,
        jobs: 2,
        timeout: Duration::from_secs(30),
        pdf_uncertainties: false,
        duplicate_policy: DuplicatePolicy::Overwrite,
    }
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("JSON file should be readable");
    serde_json::from_str(&text).expect("JSON file should parse")
}

fn layer(artifact: &Value, name: &str) -> Value {
    artifact["histograms"][name].clone()
}

#[test]
fn full_scan_writes_artifact_and_report() {
    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools(temp.path());
    let mut driver = ScanDriver::new(scenario, config(tools, temp.path().join("data")));

    let report = driver.run(&CancelToken::new()).expect("scan should succeed");
    assert_eq!(report.total_points, 4);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 0);

    let out_dir = temp.path().join("data/stub_scan/v1");
    let artifact = read_json(&out_dir.join("stub_scan.json"));
    assert_eq!(artifact["scenario"], "stub_scan");
    assert_eq!(artifact["version"], "v1");
    assert_eq!(artifact["x_axis"]["name"], "mH");
    assert_eq!(artifact["y_axis"]["name"], "tanb");

    // x-major layers, y fastest: [ix][iy] with mH on x and tanb on y.
    assert_eq!(layer(&artifact, "m_H")[0][0], 200.0);
    assert_eq!(layer(&artifact, "m_H")[1][1], 300.0);
    assert_eq!(layer(&artifact, "m_h")[1][0], 125.0);
    assert_eq!(layer(&artifact, "m_A")[1][0], 300.0);
    assert_eq!(layer(&artifact, "xs_ggH")[0][1], 0.12345);
    assert_eq!(layer(&artifact, "xs_ggH_scale_down")[0][1], 0.11);
    assert_eq!(layer(&artifact, "xs_ggH_scale_up")[0][1], 0.134);
    assert_eq!(layer(&artifact, "xs_bbA")[1][1], 0.0456);
    assert_eq!(layer(&artifact, "br_htautau")[0][0], 0.0625);
    assert_eq!(layer(&artifact, "model_validity")[0][0], 1.0);
    assert!(layer(&artifact, "xs_ggh_pdfas_up").is_null());

    let report_json = read_json(&out_dir.join("scan-report.json"));
    assert_eq!(report_json["succeeded"], 4);
    assert_eq!(report_json["failures"], Value::Array(Vec::new()));

    // Every per-point file carries the point tag.
    assert!(out_dir.join("2HDMC_output.mH.200.0.tanb.5.0.out").is_file());
    assert!(out_dir.join("SusHi_input.mH.300.0.tanb.10.0.H21.in").is_file());
    assert!(out_dir.join("SusHi_output.mH.300.0.tanb.10.0.H12.out").is_file());
}

#[test]
fn failing_points_are_recorded_and_the_rest_survive() {
    let failing_calc_hybrid = r#"#!/bin/sh
if [ "$2" = "300.0" ]; then
  echo "CalcHybrid: no solution for mH=300" >&2
  exit 3
fi
"#
    .to_string()
        + CALC_HYBRID_STUB.trim_start_matches("#!/bin/sh\n");

    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools_with(temp.path(), &failing_calc_hybrid, SUSHI_STUB);
    let mut driver = ScanDriver::new(scenario, config(tools, temp.path().join("data")));

    let report = driver.run(&CancelToken::new()).expect("scan should succeed");
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.failures.len(), 2);
    for failure in &report.failures {
        assert_eq!(failure.x, 300.0);
        assert_eq!(failure.kind, "execution");
        assert!(failure.message.contains("exit code 3"), "{}", failure.message);
        assert!(failure.message.contains("no solution"), "{}", failure.message);
    }

    let artifact = read_json(&temp.path().join("data/stub_scan/v1/stub_scan.json"));
    assert_eq!(layer(&artifact, "m_H")[0][0], 200.0);
    assert!(layer(&artifact, "m_H")[1][0].is_null());
    assert_eq!(artifact["status"][0][0], "ok");
    assert_eq!(artifact["status"][1][1], "failed");
}

#[test]
fn fully_failed_scan_aborts_without_artifact() {
    let broken_calc_hybrid = "#!/bin/sh\nexit 2\n";

    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools_with(temp.path(), broken_calc_hybrid, SUSHI_STUB);
    let mut driver = ScanDriver::new(scenario, config(tools, temp.path().join("data")));

    let error = driver.run(&CancelToken::new()).unwrap_err();
    assert!(matches!(
        error,
        ScanError::IncompleteScan {
            failed: 4,
            total: 4
        }
    ));
    assert!(!temp.path().join("data/stub_scan/v1/stub_scan.json").exists());
}

#[test]
fn hanging_tool_times_out() {
    let hanging_sushi = "#!/bin/sh\nsleep 30\n";

    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_1X1).expect("scenario should parse");
    let tools = stub_tools_with(temp.path(), CALC_HYBRID_STUB, hanging_sushi);
    let out_dir = temp.path().join("out");
    fs::create_dir_all(&out_dir).expect("output dir should be created");
    let mut config = config(tools, temp.path().join("data"));
    config.timeout = Duration::from_millis(300);
    let cancel = CancelToken::new();
    let ctx = PointContext {
        scenario: &scenario,
        config: &config,
        out_dir: &out_dir,
        cancel: &cancel,
    };
    let point = scenario
        .grid()
        .expect("grid should build")
        .point_at(0)
        .expect("grid should have a first point");

    let failure = run_point(&ctx, point).unwrap_err();
    assert!(matches!(failure, PointFailure::Timeout { .. }), "{failure}");
}

#[test]
fn collect_rebuilds_the_artifact_from_disk() {
    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools(temp.path());
    let mut driver = ScanDriver::new(scenario, config(tools, temp.path().join("data")));
    driver.run(&CancelToken::new()).expect("scan should succeed");

    let out_dir = temp.path().join("data/stub_scan/v1");
    fs::remove_file(out_dir.join("stub_scan.json")).expect("artifact should be removable");

    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools(temp.path());
    let mut collector = ScanDriver::new(scenario, config(tools, temp.path().join("data")));
    let report = collector.collect().expect("collect should succeed");
    assert_eq!(report.succeeded, 4);
    assert!(out_dir.join("stub_scan.json").is_file());

    // A missing per-point output turns into a recorded failure, not an abort.
    fs::remove_file(out_dir.join("2HDMC_output.mH.200.0.tanb.5.0.out"))
        .expect("spectrum file should be removable");
    let report = collector.collect().expect("collect should succeed");
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].kind, "execution");

    let artifact = read_json(&out_dir.join("stub_scan.json"));
    assert!(layer(&artifact, "m_H")[0][0].is_null());
    assert_eq!(artifact["status"][0][0], "failed");
    assert_eq!(artifact["status"][0][1], "ok");
}

#[test]
fn collect_without_outputs_is_a_configuration_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_2X2).expect("scenario should parse");
    let tools = stub_tools(temp.path());
    let mut driver = ScanDriver::new(scenario, config(tools, temp.path().join("data")));

    let error = driver.collect().unwrap_err();
    assert!(matches!(error, ScanError::Configuration(_)), "{error}");
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn pdf_uncertainty_scan_adds_member_runs_and_band_layers() {
    let temp = TempDir::new().expect("tempdir should be created");
    let scenario = Scenario::from_yaml(SCENARIO_1X1).expect("scenario should parse");
    let tools = stub_tools(temp.path());
    let mut config = config(tools, temp.path().join("data"));
    config.pdf_uncertainties = true;
    let mut driver = ScanDriver::new(scenario, config);

    let report = driver.run(&CancelToken::new()).expect("scan should succeed");
    assert_eq!(report.succeeded, 1);

    let out_dir = temp.path().join("data/stub_point/v1");
    assert!(out_dir.join("SusHi_output.mH.300.0.tanb.8.5.H11.out").is_file());
    assert!(
        out_dir
            .join("SusHi_output.mH.300.0.tanb.8.5.H11.pdf1.out")
            .is_file()
    );
    assert!(
        out_dir
            .join("SusHi_output.mH.300.0.tanb.8.5.H21.pdf102.out")
            .is_file()
    );

    // Identical member cross sections collapse the band to zero width.
    let artifact = read_json(&out_dir.join("stub_point.json"));
    assert_eq!(layer(&artifact, "xs_ggh_pdfas_down")[0][0], 0.0);
    assert_eq!(layer(&artifact, "xs_ggh_pdfas_up")[0][0], 0.0);
    assert_eq!(layer(&artifact, "xs_bbH_pdfas_up")[0][0], 0.0);
    assert_eq!(layer(&artifact, "xs_ggA")[0][0], 0.12345);
}
