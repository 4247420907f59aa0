//! Integration tests for greedy clustering over an in-memory backend

use crate::integration::test_utils::{
    file_name, run_store, run_store_with, save_runs, voltage_config, TEMPERATURE, VOLTAGE,
};
use condmerge::cluster::{MergeReport, Orchestrator, Provenance};
use condmerge::config::{MergeConfig, ParameterSpec};
use condmerge::error::MergeError;
use condmerge::store::{MemoryStoreBackend, StoreBackend};
use std::path::{Path, PathBuf};

fn run_memory(config: MergeConfig, runs: &[(f64, usize)]) -> (MemoryStoreBackend, MergeReport) {
    let backend = MemoryStoreBackend::new();
    let inputs = save_runs(&backend, Path::new("/mem"), runs);
    let report = Orchestrator::new(config, &backend, "/mem").run(&inputs).unwrap();
    (backend, report)
}

fn output_names(report: &MergeReport) -> Vec<String> {
    report.outputs.iter().map(|o| file_name(&o.path)).collect()
}

#[test]
fn test_two_condition_groups() {
    let (backend, report) = run_memory(
        voltage_config(0.01),
        &[(1000.0, 4), (1001.0, 4), (2000.0, 4), (2001.0, 4)],
    );

    assert_eq!(report.total_inputs, 4);
    assert_eq!(report.merges, 2);
    assert_eq!(report.passes, 3);
    assert_eq!(output_names(&report), vec!["out1_x2.h5s", "out2_x2.h5s"]);
    assert_eq!(report.outputs[0].inputfiles, vec!["run1.h5s", "run2.h5s"]);
    assert_eq!(report.outputs[1].inputfiles, vec!["run3.h5s", "run4.h5s"]);

    let out1 = backend.load(Path::new("/mem/out1_x2.h5s")).unwrap();
    let provenance = Provenance::read(&out1).unwrap().unwrap();
    assert_eq!(provenance.filecount, 2);
    assert!(!backend.exists(Path::new("/mem/out1.h5s")));
    // Raw inputs are never modified or removed
    assert!(backend.exists(Path::new("/mem/run1.h5s")));
    assert!(Provenance::read(&backend.load(Path::new("/mem/run1.h5s")).unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn test_nothing_close_yields_singletons_in_one_pass() {
    let (backend, report) = run_memory(
        voltage_config(0.01),
        &[(1000.0, 3), (2000.0, 3), (3000.0, 3)],
    );

    assert_eq!(report.merges, 0);
    assert_eq!(report.passes, 1);
    assert_eq!(
        output_names(&report),
        vec!["out1_x1.h5s", "out2_x1.h5s", "out3_x1.h5s"]
    );
    for (output, raw) in report.outputs.iter().zip(["run1.h5s", "run2.h5s", "run3.h5s"]) {
        assert_eq!(output.filecount, 1);
        assert_eq!(output.inputfiles, vec![raw]);
    }

    // A singleton carries the raw file's data unchanged
    let single = backend.load(Path::new("/mem/out2_x1.h5s")).unwrap();
    assert_eq!(single.dataset(VOLTAGE).unwrap().scalar_value(), Some(2000.0));
    assert_eq!(single.dataset("RunSummary/Counts").unwrap().rows(), 3);
}

#[test]
fn test_output_absorbs_raw_in_place() {
    let (backend, report) = run_memory(
        voltage_config(0.01),
        &[(1000.0, 2), (1001.0, 2), (1002.0, 2)],
    );

    assert_eq!(report.merges, 2);
    assert_eq!(report.passes, 3);
    assert_eq!(output_names(&report), vec!["out1_x3.h5s"]);
    assert_eq!(
        report.outputs[0].inputfiles,
        vec!["run1.h5s", "run2.h5s", "run3.h5s"]
    );

    let merged = backend.load(Path::new("/mem/out1_x3.h5s")).unwrap();
    assert_eq!(merged.dataset("RunSummary/Counts").unwrap().rows(), 6);
    assert_eq!(merged.dataset("Waveforms/Samples").unwrap().rows(), 6);
    let voltage = merged.dataset(VOLTAGE).unwrap().scalar_value().unwrap();
    assert!((voltage - 1001.0).abs() < 1e-9);
    // Rooted after every pairwise merge: sqrt(sqrt(0.3² + 0.3²)² + 0.3²)
    let error = merged.dataset(VOLTAGE).unwrap().attrs["Error"]
        .as_f64s()
        .unwrap();
    assert_eq!(error.len(), 1);
    assert!((error[0] - 0.27f64.sqrt()).abs() < 1e-12);
    assert!((error[0] - 0.5196).abs() < 1e-4);
}

#[test]
fn test_outputs_merge_and_absorbed_file_is_removed() {
    // Each of run3/run4 misses run1+run2's output on a different parameter, but their
    // own output lands close to it.
    let backend = MemoryStoreBackend::new();
    let runs = [
        (100.0, 100.0),
        (100.0, 100.0),
        (112.0, 105.0),
        (105.0, 112.0),
    ];
    let inputs: Vec<PathBuf> = runs
        .iter()
        .enumerate()
        .map(|(i, (voltage, temperature))| {
            let path = PathBuf::from(format!("/mem/run{}.h5s", i + 1));
            backend
                .save(&path, &run_store_with(*voltage, *temperature, 2, 0.1))
                .unwrap();
            path
        })
        .collect();
    let config = MergeConfig::new(vec![
        ParameterSpec {
            name: VOLTAGE.to_string(),
            spread: 0.1,
        },
        ParameterSpec {
            name: TEMPERATURE.to_string(),
            spread: 0.1,
        },
    ]);

    let report = Orchestrator::new(config, &backend, "/mem").run(&inputs).unwrap();

    assert_eq!(report.merges, 3);
    assert_eq!(report.passes, 4);
    assert_eq!(output_names(&report), vec!["out1_x4.h5s"]);
    assert_eq!(
        report.outputs[0].inputfiles,
        vec!["run1.h5s", "run2.h5s", "run3.h5s", "run4.h5s"]
    );
    assert!(!backend.exists(Path::new("/mem/out2.h5s")));
    assert!(!backend.exists(Path::new("/mem/out1.h5s")));

    let merged = backend.load(Path::new("/mem/out1_x4.h5s")).unwrap();
    assert_eq!(merged.dataset("RunSummary/Counts").unwrap().rows(), 8);
    let voltage = merged.dataset(VOLTAGE).unwrap().scalar_value().unwrap();
    assert!((voltage - 104.25).abs() < 1e-9);
}

#[test]
fn test_conservation_holds_for_mixed_campaign() {
    let (_, report) = run_memory(
        voltage_config(0.02),
        &[
            (500.0, 2),
            (1000.0, 2),
            (505.0, 2),
            (2000.0, 2),
            (1010.0, 2),
            (4000.0, 2),
        ],
    );
    let total: u64 = report.outputs.iter().map(|o| o.filecount).sum();
    assert_eq!(total, 6);
    let mut names: Vec<String> = report
        .outputs
        .iter()
        .flat_map(|o| o.inputfiles.clone())
        .collect();
    names.sort();
    assert_eq!(
        names,
        (1..=6).map(|i| format!("run{}.h5s", i)).collect::<Vec<_>>()
    );
}

#[test]
fn test_no_parameters_refuses_to_merge() {
    let backend = MemoryStoreBackend::new();
    let inputs = save_runs(&backend, Path::new("/mem"), &[(1.0, 2), (1.0, 2)]);
    let result = Orchestrator::new(MergeConfig::new(vec![]), &backend, "/mem").run(&inputs);
    assert!(matches!(result, Err(MergeError::NoParameters)));
    assert_eq!(backend.paths().len(), 2);
}

#[test]
fn test_no_inputs() {
    let backend = MemoryStoreBackend::new();
    let result = Orchestrator::new(voltage_config(0.1), &backend, "/mem").run(&[]);
    assert!(matches!(result, Err(MergeError::NoInputs)));
}

#[test]
fn test_missing_weight_path_is_fatal() {
    let backend = MemoryStoreBackend::new();
    let inputs = save_runs(&backend, Path::new("/mem"), &[(1.0, 2), (1.0, 2)]);
    let config = voltage_config(0.1).with_weight_path("RunSummary/Records");
    let result = Orchestrator::new(config, &backend, "/mem").run(&inputs);
    match result {
        Err(MergeError::MissingWeightPath { unit, path }) => {
            assert_eq!(unit, "run1.h5s");
            assert_eq!(path, "RunSummary/Records");
        }
        other => panic!("expected MissingWeightPath, got {:?}", other),
    }
}

#[test]
fn test_missing_parameter_is_fatal() {
    let backend = MemoryStoreBackend::new();
    let inputs = save_runs(&backend, Path::new("/mem"), &[(1.0, 2), (1.0, 2)]);
    let config = MergeConfig::new(vec![ParameterSpec {
        name: "RunSummary/Pressure".to_string(),
        spread: 0.1,
    }]);
    let result = Orchestrator::new(config, &backend, "/mem").run(&inputs);
    assert!(matches!(
        result,
        Err(MergeError::MissingParameter { ref name, .. }) if name == "RunSummary/Pressure"
    ));
}

#[test]
fn test_input_with_provenance_counts_as_one_raw_file() {
    let backend = MemoryStoreBackend::new();
    let mut previous = run_store(1000.0, 2);
    Provenance::founding(&["a.h5s", "b.h5s"]).write(&mut previous);
    backend.save(Path::new("/mem/old.h5s"), &previous).unwrap();
    backend
        .save(Path::new("/mem/run1.h5s"), &run_store(1000.0, 2))
        .unwrap();

    let inputs = vec![PathBuf::from("/mem/old.h5s"), PathBuf::from("/mem/run1.h5s")];
    let report = Orchestrator::new(voltage_config(0.01), &backend, "/mem")
        .run(&inputs)
        .unwrap();
    assert_eq!(report.total_inputs, 2);
    assert_eq!(report.outputs[0].inputfiles, vec!["old.h5s", "run1.h5s"]);
}

#[test]
fn test_output_names_skip_input_names() {
    let backend = MemoryStoreBackend::new();
    backend
        .save(Path::new("/mem/out1.h5s"), &run_store(1000.0, 2))
        .unwrap();
    let inputs = vec![PathBuf::from("/mem/out1.h5s")];
    let report = Orchestrator::new(voltage_config(0.01), &backend, "/mem")
        .run(&inputs)
        .unwrap();
    assert_eq!(output_names(&report), vec!["out2_x1.h5s"]);
    assert!(backend.exists(Path::new("/mem/out1.h5s")));
}

#[test]
fn test_final_rename_never_overwrites_input() {
    let backend = MemoryStoreBackend::new();
    backend
        .save(Path::new("/mem/runA.h5s"), &run_store(5000.0, 2))
        .unwrap();
    backend
        .save(Path::new("/mem/out1_x1.h5s"), &run_store(1000.0, 2))
        .unwrap();
    let inputs = vec![
        PathBuf::from("/mem/runA.h5s"),
        PathBuf::from("/mem/out1_x1.h5s"),
    ];

    let report = Orchestrator::new(voltage_config(0.01), &backend, "/mem")
        .run(&inputs)
        .unwrap();

    // runA's singleton would have been out1_x1 and takes the next number instead
    assert_eq!(output_names(&report), vec!["out3_x1.h5s", "out2_x1.h5s"]);
    assert_eq!(report.outputs[0].inputfiles, vec!["runA.h5s"]);
    let raw = backend.load(Path::new("/mem/out1_x1.h5s")).unwrap();
    assert_eq!(raw.dataset(VOLTAGE).unwrap().scalar_value(), Some(1000.0));
    assert!(Provenance::read(&raw).unwrap().is_none());
}

#[test]
fn test_relative_output_dir_skips_input_spelled_differently() {
    let backend = MemoryStoreBackend::new();
    backend
        .save(Path::new("out1.h5s"), &run_store(1000.0, 2))
        .unwrap();
    backend
        .save(Path::new("run2.h5s"), &run_store(1000.0, 2))
        .unwrap();
    let inputs = vec![PathBuf::from("out1.h5s"), PathBuf::from("run2.h5s")];

    let report = Orchestrator::new(voltage_config(0.01), &backend, ".")
        .run(&inputs)
        .unwrap();

    assert_eq!(output_names(&report), vec!["out2_x2.h5s"]);
    let raw = backend.load(Path::new("out1.h5s")).unwrap();
    assert!(Provenance::read(&raw).unwrap().is_none());
    assert_eq!(raw.dataset("RunSummary/Counts").unwrap().rows(), 2);
    assert!(!backend.exists(Path::new("./out1.h5s")));
}
