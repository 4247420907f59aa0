//! Integration tests for what a merged output contains

use crate::integration::test_utils::{run_store, run_store_with, voltage_config, VOLTAGE};
use condmerge::cluster::Orchestrator;
use condmerge::error::MergeError;
use condmerge::store::{ArrayData, AttrValue, Dataset, Group, MemoryStoreBackend, Store, StoreBackend};
use condmerge::tree;
use std::path::{Path, PathBuf};

fn founded_output(first: Store, second: Store) -> Store {
    let backend = MemoryStoreBackend::new();
    backend.save(Path::new("/mem/run1.h5s"), &first).unwrap();
    backend.save(Path::new("/mem/run2.h5s"), &second).unwrap();
    let inputs = vec![PathBuf::from("/mem/run1.h5s"), PathBuf::from("/mem/run2.h5s")];
    let report = Orchestrator::new(voltage_config(0.01), &backend, "/mem")
        .run(&inputs)
        .unwrap();
    assert_eq!(report.outputs.len(), 1);
    backend.load(&report.outputs[0].path).unwrap()
}

#[test]
fn test_summary_is_weighted_by_record_count() {
    let merged = founded_output(run_store(1000.0, 6), run_store(1002.0, 2));
    let voltage = merged.dataset(VOLTAGE).unwrap().scalar_value().unwrap();
    assert!((voltage - 1000.5).abs() < 1e-9);
    assert_eq!(merged.dataset("RunSummary/Counts").unwrap().rows(), 8);
}

#[test]
fn test_error_combined_in_quadrature() {
    let merged = founded_output(
        run_store_with(1000.0, 20.0, 2, 0.3),
        run_store_with(1000.0, 20.0, 2, 0.4),
    );
    let error = merged.dataset(VOLTAGE).unwrap().attrs["Error"]
        .as_f64s()
        .unwrap();
    assert_eq!(error.len(), 1);
    assert!((error[0] - 0.5).abs() < 1e-12);
    // Other summary attributes keep the destination's value
    assert_eq!(
        merged.dataset(VOLTAGE).unwrap().attrs["Units"],
        AttrValue::text("V")
    );
}

#[test]
fn test_rows_appended_in_merge_order() {
    let merged = founded_output(run_store(1000.0, 5), run_store(1001.0, 3));
    let samples = merged.dataset("Waveforms/Samples").unwrap();
    assert_eq!(samples.shape(), &[8, 4]);
    assert!(samples.is_growable());
    // Rows 0..5 come from the first run, rows 5..8 from the second
    assert_eq!(samples.data().get_f64(0), Some(1000.0));
    assert_eq!(samples.data().get_f64(19), Some(1019.0));
    assert_eq!(samples.data().get_f64(20), Some(1001.0));
    let counts = merged.dataset("RunSummary/Counts").unwrap();
    assert_eq!(
        counts.data(),
        &ArrayData::I64(vec![100, 101, 102, 103, 104, 100, 101, 102])
    );
}

#[test]
fn test_root_attributes_copied_and_provenance_written() {
    let merged = founded_output(run_store(1000.0, 2), run_store(1000.0, 2));
    assert_eq!(merged.attr("Detector"), Some(&AttrValue::text("LAr-1")));
    assert_eq!(merged.attr("Filecount"), Some(&AttrValue::int(2)));
    assert_eq!(
        merged.attr("Inputfiles").unwrap().to_strings().unwrap(),
        vec!["run1.h5s", "run2.h5s"]
    );
}

#[test]
fn test_vector_attributes_append() {
    let tagged = |tag: i64| {
        Store::from_root(Group::new().with_dataset(
            "Hits",
            Dataset::vector(ArrayData::F64(vec![1.0, 2.0])).with_attr("Run", AttrValue::int(tag)),
        ))
    };
    let mut dest = Store::new();
    tree::merge(&tagged(7), 2, &mut dest, 0).unwrap();
    tree::merge(&tagged(8), 2, &mut dest, 2).unwrap();
    let hits = dest.dataset("Hits").unwrap();
    assert_eq!(hits.rows(), 4);
    assert_eq!(hits.attrs["Run"], AttrValue::Int(vec![7, 8]));
}

#[test]
fn test_integer_summary_truncates() {
    let store = |value: i64| {
        Store::from_root(
            Group::new().with_dataset("Gain", Dataset::new(vec![1], ArrayData::I64(vec![value])).unwrap()),
        )
    };
    let mut dest = Store::new();
    tree::merge(&store(10), 1, &mut dest, 0).unwrap();
    tree::merge(&store(13), 1, &mut dest, 1).unwrap();
    assert_eq!(
        dest.dataset("Gain").unwrap().data(),
        &ArrayData::I64(vec![11])
    );
}

#[test]
fn test_mismatched_matrix_width_is_schema_error() {
    let narrow = Store::from_root(Group::new().with_dataset(
        "Samples",
        Dataset::matrix(2, ArrayData::F64(vec![0.0; 4])).unwrap(),
    ));
    let wide = Store::from_root(Group::new().with_dataset(
        "Samples",
        Dataset::matrix(3, ArrayData::F64(vec![0.0; 6])).unwrap(),
    ));
    let mut dest = Store::new();
    tree::merge(&narrow, 2, &mut dest, 0).unwrap();
    let err = tree::merge(&wide, 2, &mut dest, 2).unwrap_err();
    assert!(matches!(err, MergeError::SchemaMismatch { ref path, .. } if path == "/Samples"));
}

#[test]
fn test_dtype_mismatch_is_schema_error() {
    let floats = Store::from_root(
        Group::new().with_dataset("Counts", Dataset::vector(ArrayData::F64(vec![1.0, 2.0]))),
    );
    let ints = Store::from_root(
        Group::new().with_dataset("Counts", Dataset::vector(ArrayData::I64(vec![1, 2]))),
    );
    let mut dest = Store::new();
    tree::merge(&floats, 2, &mut dest, 0).unwrap();
    assert!(matches!(
        tree::merge(&ints, 2, &mut dest, 2),
        Err(MergeError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_group_dataset_collision_is_schema_error() {
    let as_group = Store::from_root(Group::new().with_group("Node", Group::new()));
    let as_dataset = Store::from_root(Group::new().with_dataset("Node", Dataset::scalar(1.0)));
    let mut dest = Store::new();
    tree::merge(&as_group, 1, &mut dest, 0).unwrap();
    assert!(matches!(
        tree::merge(&as_dataset, 1, &mut dest, 1),
        Err(MergeError::SchemaMismatch { .. })
    ));
}
