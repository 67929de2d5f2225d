// Tests for the feature schema and vector assembly

use phishlens_core::error::AnalysisError;
use phishlens_core::features::{FeatureMap, FeatureVectorAssembler, URL_FEATURES};
use std::collections::HashSet;

fn map(entries: &[(&str, f64)]) -> FeatureMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

#[test]
fn test_url_schema_is_complete_and_unique() {
    let unique: HashSet<_> = URL_FEATURES.iter().collect();
    assert_eq!(URL_FEATURES.len(), 23);
    assert_eq!(unique.len(), 23);
    assert_eq!(URL_FEATURES[0], "length_url");
    assert_eq!(URL_FEATURES[17], "ratio_intHyperlinks");
    assert_eq!(URL_FEATURES[22], "page_rank");
}

#[test]
fn test_assemble_follows_schema_order() {
    let assembler = FeatureVectorAssembler::new(&["b", "a", "c"]);
    let vector = assembler
        .assemble(&map(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("extra", 9.0)]))
        .unwrap();

    assert_eq!(vector.names(), &["b", "a", "c"]);
    assert_eq!(vector.values(), &[2.0, 1.0, 3.0]);
    assert_eq!(vector.get("a"), Some(1.0));
    assert_eq!(vector.get("extra"), None);
    assert_eq!(vector.len(), 3);
}

#[test]
fn test_assemble_reports_missing_feature() {
    let assembler = FeatureVectorAssembler::new(&["a", "missing"]);
    let result = assembler.assemble(&map(&[("a", 1.0)]));

    match result {
        Err(AnalysisError::SchemaMismatch(name)) => assert_eq!(name, "missing"),
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_vector_iterates_pairs() {
    let assembler = FeatureVectorAssembler::new(&["x", "y"]);
    let vector = assembler.assemble(&map(&[("x", 0.5), ("y", -1.0)])).unwrap();
    let pairs: Vec<_> = vector.iter().collect();

    assert_eq!(pairs, vec![("x", 0.5), ("y", -1.0)]);
}
