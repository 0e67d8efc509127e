//! End-to-end runs of the pole/zero pipeline through the public API.

use std::f64::consts::TAU;

use modal_fit::app::pipeline::{extract_pole_zeros, fit_batch};
use modal_fit::data::{SynthSpec, generate_response};
use modal_fit::domain::{
    FitConfig, FitStatus, FitStrategy, PoleZeroRequest, ResponseKind, SampledResponse, TrialRecord,
};
use modal_fit::io::{load_waveform, write_result_json, write_waveform_csv};
use modal_fit::pz::NO_ROOT;

fn assert_rel(got: f64, want: f64, tol: f64) {
    assert!(
        ((got - want) / want).abs() < tol,
        "expected {want}, got {got} (rel tol {tol})"
    );
}

fn two_pole_step() -> SampledResponse {
    // H(s) = 2 / ((s + 1)(s + 2)), t = 0, 0.05, ..., 10
    generate_response(&SynthSpec {
        num: vec![2.0],
        den: vec![1.0, 3.0, 2.0],
        kind: ResponseKind::Step,
        t_end: 10.0,
        samples: 201,
        noise_sigma: 0.0,
        seed: 0,
    })
    .unwrap()
}

#[test]
fn step_response_poles_in_hz() {
    let mut config = FitConfig::default();
    config.search.rho_threshold = 1.0;
    let request = PoleZeroRequest::new(2, 1).with_max_order(2);

    let mut trials: Vec<TrialRecord> = Vec::new();
    let result = extract_pole_zeros(
        &two_pole_step(),
        ResponseKind::Step,
        &request,
        &config,
        &mut trials,
    )
    .unwrap();

    assert_eq!(result.status, FitStatus::Exhausted { max_order: 2 });
    assert_eq!(result.order, 2);
    assert_eq!(trials, result.trials);
    assert_eq!(result.poles_hz.len(), 2);
    assert_rel(result.poles_hz[0], 1.0 / TAU, 1e-3);
    assert_rel(result.poles_hz[1], 2.0 / TAU, 1e-3);
    // Midpoint differencing scales each mode slightly differently, which
    // leaves one zero far above the poles.
    assert_eq!(result.zeros_hz.len(), 1);
    assert!(result.zeros_hz[0] > 100.0 * result.poles_hz[1]);
}

#[test]
fn default_threshold_stops_early() {
    let result = extract_pole_zeros(
        &two_pole_step(),
        ResponseKind::Step,
        &PoleZeroRequest::new(4, 0),
        &FitConfig::default(),
        &mut (),
    )
    .unwrap();

    let FitStatus::Succeeded { order, rho } = result.status else {
        panic!("expected success, got {:?}", result.status);
    };
    assert!(order <= 2);
    assert!(rho > 0.999);
    // Unused slots are padded; real values come first.
    assert!(result.poles_hz[..order].iter().all(|p| p.is_finite()));
    assert!(result.poles_hz[order..].iter().all(|p| *p == NO_ROOT));
}

#[test]
fn impulse_round_trip_recovers_zero() {
    // H(s) = (s + 1) / ((s + 2)(s + 3))
    let response = generate_response(&SynthSpec {
        num: vec![1.0, 1.0],
        den: vec![1.0, 5.0, 6.0],
        kind: ResponseKind::Impulse,
        t_end: 5.0,
        samples: 501,
        ..SynthSpec::default()
    })
    .unwrap();

    let mut config = FitConfig::default();
    config.search.rho_threshold = 1.0;
    let request = PoleZeroRequest::new(2, 1).with_max_order(2);
    let result =
        extract_pole_zeros(&response, ResponseKind::Impulse, &request, &config, &mut ()).unwrap();

    assert!(!result.failed);
    assert_rel(result.poles_hz[0], 2.0 / TAU, 1e-3);
    assert_rel(result.poles_hz[1], 3.0 / TAU, 1e-3);
    assert_rel(result.zeros_hz[0], 1.0 / TAU, 1e-3);
}

#[test]
fn step_constrained_keeps_dynamic_poles_only() {
    let mut config = FitConfig::default();
    config.search.strategy = FitStrategy::StepConstrained;
    config.search.rho_threshold = 1.0;
    let request = PoleZeroRequest::new(3, 0).with_max_order(3);

    let result =
        extract_pole_zeros(&two_pole_step(), ResponseKind::Step, &request, &config, &mut ()).unwrap();

    assert_eq!(result.strategy, FitStrategy::StepConstrained);
    assert!(!result.failed);
    assert_rel(result.poles_hz[0], 1.0 / TAU, 1e-3);
    assert_rel(result.poles_hz[1], 2.0 / TAU, 1e-3);
    // The DC pole of the step is not part of H(s).
    assert_eq!(result.poles_hz[2], NO_ROOT);
}

#[test]
fn step_constrained_rejects_impulse_input() {
    let mut config = FitConfig::default();
    config.search.strategy = FitStrategy::StepConstrained;
    let err = extract_pole_zeros(
        &two_pole_step(),
        ResponseKind::Impulse,
        &PoleZeroRequest::new(2, 0),
        &config,
        &mut (),
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn constant_waveform_is_degenerate() {
    let flat = SampledResponse::new((0..50).map(|i| i as f64 * 0.1).collect(), vec![0.7; 50]).unwrap();
    let result = extract_pole_zeros(
        &flat,
        ResponseKind::Step,
        &PoleZeroRequest::new(2, 3),
        &FitConfig::default(),
        &mut (),
    )
    .unwrap();
    assert_eq!(result.status, FitStatus::Degenerate);
    assert_eq!(result.poles_hz, vec![NO_ROOT; 2]);
    assert_eq!(result.zeros_hz, vec![NO_ROOT; 3]);
    assert!(result.trials.is_empty());
}

#[test]
fn batch_results_follow_input_order() {
    let fast = generate_response(&SynthSpec {
        den: vec![1.0, 4.0],
        num: vec![4.0],
        t_end: 3.0,
        ..SynthSpec::default()
    })
    .unwrap();
    let slow = generate_response(&SynthSpec {
        den: vec![1.0, 0.5],
        num: vec![0.5],
        t_end: 20.0,
        ..SynthSpec::default()
    })
    .unwrap();

    let results = fit_batch(
        &[slow, fast],
        ResponseKind::Step,
        &PoleZeroRequest::new(1, 0),
        &FitConfig::default(),
    );
    assert_eq!(results.len(), 2);
    assert_rel(results[0].as_ref().unwrap().poles_hz[0], 0.5 / TAU, 1e-3);
    assert_rel(results[1].as_ref().unwrap().poles_hz[0], 4.0 / TAU, 1e-3);
}

#[test]
fn csv_file_pipeline_and_json_export() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("step.csv");
    write_waveform_csv(&csv, &two_pole_step()).unwrap();

    let ingest = load_waveform(&csv).unwrap();
    assert_eq!(ingest.rows_used, 201);

    let config = FitConfig::default();
    let result = extract_pole_zeros(
        &ingest.response,
        ResponseKind::Step,
        &PoleZeroRequest::new(2, 0),
        &config,
        &mut (),
    )
    .unwrap();
    assert!(result.status.is_success());

    let json = dir.path().join("result.json");
    write_result_json(&json, &result, &config, Some(&csv)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(v["result"]["status"]["status"], "succeeded");
    assert_eq!(v["result"]["kind"], "step");
    assert_eq!(v["config"]["search"]["strategy"], "general");
}
