//! Integration tests for campaigns over store files on disk

use crate::integration::test_utils::{file_name, run_store, save_runs, voltage_config};
use condmerge::cluster::{Orchestrator, Provenance};
use condmerge::discovery::discover_inputs;
use condmerge::store::{FsStoreBackend, MemoryStoreBackend, StoreBackend};
use std::fs;
use tempfile::TempDir;

fn dir_listing(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_campaign_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsStoreBackend::new();
    save_runs(
        &backend,
        temp_dir.path(),
        &[(1000.0, 3), (3000.0, 3), (1001.0, 3)],
    );

    let inputs = discover_inputs(temp_dir.path(), "h5s", "out").unwrap();
    assert_eq!(inputs.len(), 3);
    let report = Orchestrator::new(voltage_config(0.01), &backend, temp_dir.path())
        .run(&inputs)
        .unwrap();

    assert_eq!(
        dir_listing(temp_dir.path()),
        vec![
            "out1_x2.h5s",
            "out2_x1.h5s",
            "run1.h5s",
            "run2.h5s",
            "run3.h5s"
        ]
    );
    assert_eq!(report.outputs[0].inputfiles, vec!["run1.h5s", "run3.h5s"]);

    let merged = backend.load(&report.outputs[0].path).unwrap();
    let provenance = Provenance::read(&merged).unwrap().unwrap();
    assert_eq!(provenance.filecount, 2);
    assert_eq!(merged.dataset("RunSummary/Counts").unwrap().rows(), 6);
}

#[test]
fn test_rerun_ignores_previous_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsStoreBackend::new();
    save_runs(&backend, temp_dir.path(), &[(1000.0, 2), (1000.0, 2)]);

    let inputs = discover_inputs(temp_dir.path(), "h5s", "out").unwrap();
    Orchestrator::new(voltage_config(0.01), &backend, temp_dir.path())
        .run(&inputs)
        .unwrap();

    let rediscovered = discover_inputs(temp_dir.path(), "h5s", "out").unwrap();
    let names: Vec<String> = rediscovered.iter().map(|p| file_name(p)).collect();
    assert_eq!(names, vec!["run1.h5s", "run2.h5s"]);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsStoreBackend::new();
    save_runs(&backend, temp_dir.path(), &[(1000.0, 2), (1000.0, 2), (5.0, 2)]);
    let before = dir_listing(temp_dir.path());

    let inputs = discover_inputs(temp_dir.path(), "h5s", "out").unwrap();
    let memory = MemoryStoreBackend::preload(&backend, &inputs).unwrap();
    let report = Orchestrator::new(voltage_config(0.01), &memory, temp_dir.path())
        .run(&inputs)
        .unwrap();

    assert_eq!(report.outputs.len(), 2);
    assert_eq!(report.outputs[0].filecount, 2);
    assert_eq!(dir_listing(temp_dir.path()), before);
    assert!(memory.exists(&report.outputs[0].path));
}

#[test]
fn test_corrupt_input_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("run1.h5s");
    fs::write(&path, b"not a store").unwrap();
    let backend = FsStoreBackend::new();
    let result = Orchestrator::new(voltage_config(0.01), &backend, temp_dir.path()).run(&[path]);
    assert!(matches!(
        result,
        Err(condmerge::error::MergeError::Storage(_))
    ));
}

#[test]
fn test_outputs_never_overwrite_inputs_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FsStoreBackend::new();
    fs::create_dir(temp_dir.path().join("sub")).unwrap();
    let out1 = temp_dir.path().join("out1.h5s");
    let run2 = temp_dir.path().join("run2.h5s");
    backend.save(&out1, &run_store(1000.0, 2)).unwrap();
    backend.save(&run2, &run_store(1000.0, 2)).unwrap();

    // Same directory, spelled through a subdirectory
    let output_dir = temp_dir.path().join("sub").join("..");
    let report = Orchestrator::new(voltage_config(0.01), &backend, output_dir)
        .run(&[out1.clone(), run2])
        .unwrap();

    assert_eq!(report.outputs.len(), 1);
    assert_eq!(file_name(&report.outputs[0].path), "out2_x2.h5s");
    assert_eq!(
        dir_listing(temp_dir.path()),
        vec!["out1.h5s", "out2_x2.h5s", "run2.h5s", "sub"]
    );
    let raw = backend.load(&out1).unwrap();
    assert!(Provenance::read(&raw).unwrap().is_none());
}
