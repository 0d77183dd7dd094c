//! Data folder persistence: strict and tolerant loads, atomic sorted writes

mod helpers;

use fork_enrich::store::{ALBUMS_FILE, ARTIST_CACHE_FILE, EVIDENCE_FILE};
use fork_enrich::types::AlbumRecord;
use helpers::{album, artist_cache, artist_entry, evidence, evidence_cache, temp_store};
use std::fs;

#[test]
fn test_missing_album_file_is_an_error() {
    let (_dir, store) = temp_store();
    let err = store.load_albums().unwrap_err();
    assert!(matches!(err, fork_common::Error::NotFound(_)));
}

#[test]
fn test_missing_caches_load_empty() {
    let (_dir, store) = temp_store();
    assert!(store.load_evidence().unwrap().is_empty());
    assert!(store.load_artist_cache().unwrap().is_empty());
}

#[test]
fn test_corrupt_cache_strict_vs_tolerant() {
    let (dir, store) = temp_store();
    fs::write(dir.path().join(EVIDENCE_FILE), "{ not json").unwrap();
    fs::write(dir.path().join(ARTIST_CACHE_FILE), "[1, 2, 3]").unwrap();

    assert!(store.load_evidence().is_err());
    assert!(store.load_artist_cache().is_err());
    assert!(store.load_evidence_or_empty().is_empty());
}

#[test]
fn test_cache_written_with_sorted_keys() {
    let (dir, store) = temp_store();
    let cache = evidence_cache(&[
        ("/reviews/zz", evidence(Some("US"), Some("eng"))),
        ("/reviews/aa", evidence(Some("FR"), None)),
        ("/reviews/mm", evidence(Some("Unknown"), Some("Unknown"))),
    ]);
    store.save_evidence(&cache).unwrap();

    let text = fs::read_to_string(dir.path().join(EVIDENCE_FILE)).unwrap();
    let aa = text.find("/reviews/aa").unwrap();
    let mm = text.find("/reviews/mm").unwrap();
    let zz = text.find("/reviews/zz").unwrap();
    assert!(aa < mm && mm < zz);
    assert!(!dir.path().join(format!("{EVIDENCE_FILE}.tmp")).exists());

    assert_eq!(store.load_evidence().unwrap(), cache);
}

#[test]
fn test_unknown_fields_survive_round_trip() {
    let (dir, store) = temp_store();
    let raw = r#"[
        {
            "id": "r1",
            "artist": "Low",
            "title": "Double Negative",
            "score": 9.0,
            "genres": ["Rock"],
            "url": "/reviews/low",
            "description": "",
            "image": "https://example.org/cover.jpg",
            "bnm": true
        }
    ]"#;
    fs::write(dir.path().join(ALBUMS_FILE), raw).unwrap();

    let albums = store.load_albums().unwrap();
    assert_eq!(albums[0].extra.get("bnm"), Some(&serde_json::json!(true)));
    store.save_albums(&albums, None).unwrap();

    let reloaded: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(dir.path().join(ALBUMS_FILE)).unwrap()).unwrap();
    assert_eq!(reloaded[0]["image"], "https://example.org/cover.jpg");
    assert_eq!(reloaded[0]["bnm"], true);
    assert!(reloaded[0].get("country").is_none());
}

#[test]
fn test_save_albums_to_explicit_output() {
    let (dir, store) = temp_store();
    let albums: Vec<AlbumRecord> = vec![album("Low", "Things We Lost in the Fire", "/low")];
    store.save_albums(&albums, None).unwrap();

    let out = dir.path().join("out").join("resolved.json");
    let written = store.save_albums(&albums, Some(&out)).unwrap();
    assert_eq!(written, out);
    assert!(out.exists());
    assert_eq!(store.load_albums().unwrap(), albums);
}

#[test]
fn test_artist_cache_round_trip_keeps_names_verbatim() {
    let (_dir, store) = temp_store();
    let cache = artist_cache(&[
        ("Sigur Rós", artist_entry(Some("IS"), Some("Reykjavík"), Some("isl"))),
        ("MF DOOM", artist_entry(None, Some("London"), None)),
    ]);
    store.save_artist_cache(&cache).unwrap();
    let loaded = store.load_artist_cache().unwrap();
    assert_eq!(loaded, cache);
    assert!(loaded.contains_key("Sigur Rós"));
}
