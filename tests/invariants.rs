//! Contract Invariant Tests
//!
//! These tests verify the guarantees operators rely on.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use idcard_core::{
    card::{CARD_FILE, PHOTO_FILE},
    collect_details, is_valid_date, is_valid_email,
    render::encode_jpeg,
    CardError, CardKind, CardRenderer, CardStore, IdCard, PersonRecord, RecordError,
    ScriptedOperator, StoreError,
};
use tempfile::tempdir;

fn student_answers() -> Vec<&'static str> {
    vec![
        "Ada Lovelace",
        "42",
        "BSc Computing",
        "Science",
        "George Byron",
        "9800000000",
        "ada@uni.edu",
        "01/01/2024",
        "29/02/2028",
    ]
}

fn business_values(name: &str) -> HashMap<String, String> {
    [
        ("name", name),
        ("position", "Engineer"),
        ("company", "Acme"),
        ("email", "eng@acme.io"),
        ("phone", "5551234567"),
        ("address", "12 Main Street"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn business_card(store: &CardStore, name: &str) -> IdCard {
    let record = PersonRecord::from_values(CardKind::Business, &business_values(name)).unwrap();
    IdCard::create_folder(store, record).unwrap()
}

#[test]
fn invariant_date_examples() {
    assert!(is_valid_date("29/02/2000"));
    assert!(!is_valid_date("29/02/1900"));
    assert!(!is_valid_date("31/04/2021"));
    assert!(!is_valid_date("15/13/2021"));
}

#[test]
fn invariant_email_examples() {
    assert!(is_valid_email("a.b-c@sub.domain.com"));
    assert!(!is_valid_email("no-at-sign.com"));
}

#[test]
fn invariant_student_end_to_end() {
    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());

    let mut operator = ScriptedOperator::new(student_answers());
    let record = collect_details(CardKind::Student, &mut operator).unwrap();
    let card = IdCard::create_folder(&store, record).unwrap();
    card.generate(&CardRenderer::default()).unwrap();

    let card_path = dir.path().join("StudentIDCard").join("Ada Lovelace").join(CARD_FILE);
    assert_eq!(card.card_path(), card_path);
    assert!(fs::metadata(&card_path).unwrap().len() > 0);
    assert_eq!(image::open(&card_path).unwrap().width(), 380);

    let removed = store
        .delete_person_folder(CardKind::Student, |names| {
            let index = names.iter().position(|n| n == "Ada Lovelace").unwrap();
            Ok((index + 1).to_string())
        })
        .unwrap();
    assert_eq!(removed, dir.path().join("StudentIDCard").join("Ada Lovelace"));
    assert!(!removed.exists());
}

#[test]
fn invariant_invalid_answers_never_reach_the_record() {
    let mut answers = student_answers();
    answers.insert(5, "98000");
    answers.insert(8, "30/02/2024");
    let mut operator = ScriptedOperator::new(answers);

    let record = collect_details(CardKind::Student, &mut operator).unwrap();

    assert_eq!(record.get("phone"), Some("9800000000"));
    assert_eq!(record.get("validDate"), Some("01/01/2024"));
    assert_eq!(operator.warnings().len(), 2);
}

#[test]
fn invariant_scripted_record_is_all_or_nothing() {
    let mut values = business_values("Bo Chen");
    values.insert("email".into(), "not-an-email".into());
    let err = PersonRecord::from_values(CardKind::Business, &values).unwrap_err();
    match err {
        RecordError::Invalid(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "email");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn invariant_create_folder_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());

    let first = business_card(&store, "Bo Chen");
    first.generate(&CardRenderer::default()).unwrap();
    let before = fs::read(first.card_path()).unwrap();

    let second = business_card(&store, "Bo Chen");

    assert_eq!(first.folder(), second.folder());
    assert_eq!(fs::read(second.card_path()).unwrap(), before);
}

#[test]
fn invariant_out_of_range_delete_changes_nothing() {
    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());
    let a = business_card(&store, "Bo Chen");
    let b = business_card(&store, "Di Park");

    let err = store
        .delete_person_folder(CardKind::Business, |_| Ok("99".to_string()))
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidSelection(_)));
    assert!(a.folder().is_dir());
    assert!(b.folder().is_dir());
    assert_eq!(store.list_people(CardKind::Business).unwrap().len(), 2);
}

#[test]
fn invariant_rendering_is_deterministic() {
    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());
    let photo = dir.path().join("face.png");
    image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8 * 3, y as u8 * 5, 90]))
        .save(&photo)
        .unwrap();

    let mut card = business_card(&store, "Bo Chen");
    card.import_photo(&photo).unwrap();
    let renderer = CardRenderer::default();

    let a = renderer.render(card.record(), card.photo());
    let b = renderer.render(card.record(), card.photo());
    assert_eq!(a, b);
    assert_eq!(encode_jpeg(&a).unwrap(), encode_jpeg(&b).unwrap());

    let first = card.generate(&renderer).unwrap();
    let second = card.generate(&renderer).unwrap();
    assert_eq!(first.image_sha256, second.image_sha256);
}

#[test]
fn invariant_missing_photo_is_tolerated() {
    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());
    let photo = dir.path().join("face.png");
    image::RgbImage::from_pixel(30, 30, image::Rgb([250, 0, 0]))
        .save(&photo)
        .unwrap();

    let mut card = business_card(&store, "Bo Chen");
    card.import_photo(&photo).unwrap();
    fs::remove_file(card.folder().join(PHOTO_FILE)).unwrap();

    let manifest = card.generate(&CardRenderer::default()).unwrap();
    assert!(manifest.photo.is_none());

    let renderer = CardRenderer::default();
    let without = renderer.render(card.record(), None);
    let with_missing = renderer.render(card.record(), card.photo());
    assert_eq!(without, with_missing);
}

#[test]
fn invariant_show_requires_generated_card() {
    struct Viewer(usize);

    impl idcard_core::CardViewer for Viewer {
        fn view(&mut self, _: &str, _: &Path, _: &image::RgbImage) -> std::io::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    let dir = tempdir().unwrap();
    let store = CardStore::new(dir.path());
    let card = business_card(&store, "Bo Chen");
    let mut viewer = Viewer(0);

    assert!(matches!(card.show(&mut viewer), Err(CardError::CardNotFound(_))));
    card.generate(&CardRenderer::default()).unwrap();
    card.show(&mut viewer).unwrap();
    assert_eq!(viewer.0, 1);
}
