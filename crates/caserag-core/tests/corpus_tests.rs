use std::path::PathBuf;

use caserag_core::corpus::{parse_corpus, JsonCorpusLoader};
use caserag_core::traits::CorpusLoader;
use caserag_core::Error;

fn fixture_path() -> PathBuf {
    // crates/caserag-core -> crates -> repo root
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap().to_path_buf();
    root.join("test_data/cases.json")
}

#[test]
fn loads_fixture_corpus_with_summary() {
    let corpus = JsonCorpusLoader::new(fixture_path()).load().expect("load");
    assert_eq!(corpus.summary.total_records, 6);
    assert_eq!(corpus.summary.categories, vec!["infectious_disease", "respiratory", "cardiovascular", "obstetrics"]);
    let pneumonia = &corpus.records[1];
    assert_eq!(pneumonia.id, "CASE-002");
    assert_eq!(pneumonia.procedure, None);
    // blank optional text collapses to None
    assert_eq!(corpus.records[2].procedure, None);
    assert_eq!(corpus.records[3].caveats, None);
}

#[test]
fn legacy_field_names_are_accepted() {
    let json = r#"{
        "metadata": { "total_cases": 1, "categories": ["penyakit_infeksi"] },
        "cases": [{
            "id": 17,
            "kategori": "penyakit_infeksi",
            "diagnosa": "Demam tifoid",
            "kode_diagnosa": [" A01.0 "],
            "prosedur": "",
            "aspek_koding": "Kode A01.0 untuk demam tifoid.",
            "perhatian_khusus": null,
            "keywords": ["tifoid"]
        }]
    }"#;
    let corpus = parse_corpus(json).expect("parse");
    let r = &corpus.records[0];
    assert_eq!(r.id, "17");
    assert_eq!(r.category, "penyakit_infeksi");
    assert_eq!(r.codes, vec!["A01.0"]);
    assert_eq!(r.procedure, None);
    assert!(r.has_code("a01.0"));
}

#[test]
fn missing_required_field_fails_load() {
    let json = r#"{ "cases": [ { "id": "X1", "category": "c", "rationale": "r" } ] }"#;
    let err = parse_corpus(json).expect_err("description is required");
    assert!(matches!(err, Error::Data(ref m) if m.contains("description")), "{err}");
}

#[test]
fn missing_cases_array_fails_load() {
    assert!(matches!(parse_corpus(r#"{ "metadata": {} }"#), Err(Error::Data(_))));
}

#[test]
fn missing_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let loader = JsonCorpusLoader::new(tmp.path().join("absent.json"));
    assert!(matches!(loader.load(), Err(Error::NotFound(_))));
}

#[test]
fn loader_reads_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("cases.json");
    std::fs::write(&path, r#"{ "cases": [ { "id": "A", "category": "c", "description": "d", "rationale": "r" } ] }"#).unwrap();
    let corpus = JsonCorpusLoader::new(&path).load().expect("load");
    assert_eq!(corpus.summary.total_records, 1);
    assert!(corpus.records[0].codes.is_empty());
    assert!(corpus.records[0].keywords.is_empty());
}
