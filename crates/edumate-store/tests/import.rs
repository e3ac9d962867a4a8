//! Bulk question upload against a live store.

use edumate_core::curriculum;
use edumate_core::importer::import_questions;
use edumate_core::model::{Difficulty, BULK_UPLOAD_TAG};
use edumate_core::traits::Store;
use edumate_store::LocalStore;

const HEADER: &str = "subject,topic,question,option_a,option_b,option_c,option_d,correct,difficulty,explanation";

async fn store_with_curriculum() -> LocalStore {
    let store = LocalStore::in_memory();
    let math = curriculum::add_subject(&store, "Mathematics", Difficulty::Medium)
        .await
        .unwrap();
    curriculum::add_topic(&store, math.id, "Fractions", Difficulty::Easy, "")
        .await
        .unwrap();
    curriculum::add_topic(&store, math.id, "Decimals", Difficulty::Medium, "")
        .await
        .unwrap();
    store
}

fn csv(rows: &[&str]) -> String {
    let mut doc = String::from(HEADER);
    for row in rows {
        doc.push('\n');
        doc.push_str(row);
    }
    doc
}

#[tokio::test]
async fn all_valid_rows_are_imported() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,What is 1/2 + 1/4?,1/4,2/4,3/4,1,C,easy,Common denominators",
        "Mathematics,Fractions,What is 1/3 of 9?,1,2,3,4,3,,",
        "mathematics,decimals,What is 0.1 + 0.2?,0.3,0.12,0.21,3,A,HARD,",
    ]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 3);
    assert_eq!(summary.failed, 0);
    assert!(summary.errors.is_empty());

    let bank = store.list_question_bank().await.unwrap();
    assert_eq!(bank.len(), 3);
    assert!(bank.iter().all(|q| q.tags == vec![BULK_UPLOAD_TAG.to_string()]));
    let first = bank.iter().find(|q| q.question.starts_with("What is 1/2")).unwrap();
    assert_eq!(first.correct_index, 2);
    assert_eq!(first.explanation.as_deref(), Some("Common denominators"));
    let decimal = bank.iter().find(|q| q.question.contains("0.1")).unwrap();
    assert_eq!(decimal.difficulty, Difficulty::Hard);
    assert_eq!(decimal.correct_index, 0);
}

#[tokio::test]
async fn uploading_the_same_file_twice_imports_nothing_new() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,Q one,a,b,c,d,A",
        "Mathematics,Fractions,Q two,a,b,c,d,B",
    ]);

    let first = import_questions(&store, &doc).await.unwrap();
    assert_eq!((first.success, first.failed), (2, 0));

    let second = import_questions(&store, &doc).await.unwrap();
    assert_eq!((second.success, second.failed), (0, 2));
    assert!(second
        .errors
        .iter()
        .all(|e| e.contains("already exists in the question bank")));
    assert_eq!(store.list_question_bank().await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_subject_is_reported_with_row_and_name() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,Q one,a,b,c,d,A",
        "Astrology,Stars,Q two,a,b,c,d,A",
    ]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("Row 3"));
    assert!(summary.errors[0].contains("Astrology"));
}

#[tokio::test]
async fn duplicate_within_one_batch_fails_the_second_copy() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,What is half of 8?,2,4,6,8,B",
        "Mathematics,Fractions,  what is HALF of 8?  ,2,4,6,8,B",
    ]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.errors[0].starts_with("Row 3:"));
    assert!(summary.errors[0].contains("duplicate question in this batch"));
}

#[tokio::test]
async fn same_question_under_another_topic_is_not_a_duplicate() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,Which is larger?,a,b,c,d,A",
        "Mathematics,Decimals,Which is larger?,a,b,c,d,A",
    ]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 2);
}

#[tokio::test]
async fn short_row_does_not_break_the_rest_of_the_batch() {
    let store = store_with_curriculum().await;
    let doc = csv(&[
        "Mathematics,Fractions,Q one,a,b,c,d,A",
        "Mathematics,Fractions,Q two",
        "",
        "Mathematics,Fractions,Q three,a,b,c,d,D",
    ]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors, vec!["Row 3: expected at least 8 columns, found 3".to_string()]);
}

#[tokio::test]
async fn quoted_fields_keep_their_commas() {
    let store = store_with_curriculum().await;
    let doc = csv(&[r#"Mathematics,Fractions,"Order 1/2, 1/3, 1/4",asc,desc,"1/3, 1/2",none,2"#]);

    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 1, "{:?}", summary.errors);
    let bank = store.list_question_bank().await.unwrap();
    assert_eq!(bank[0].question, "Order 1/2, 1/3, 1/4");
    assert_eq!(bank[0].options[2], "1/3, 1/2");
    assert_eq!(bank[0].correct_index, 1);
}

#[tokio::test]
async fn header_only_file_is_an_empty_summary() {
    let store = store_with_curriculum().await;
    let summary = import_questions(&store, HEADER).await.unwrap();
    assert_eq!(summary.success, 0);
    assert_eq!(summary.failed, 0);
    assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn non_ascii_subject_names_are_unique_and_resolve_in_any_case() {
    let store = LocalStore::in_memory();
    let french = curriculum::add_subject(&store, "Français", Difficulty::Medium)
        .await
        .unwrap();
    curriculum::add_topic(&store, french.id, "Épellation", Difficulty::Easy, "")
        .await
        .unwrap();
    assert!(curriculum::add_subject(&store, "français", Difficulty::Easy)
        .await
        .is_err());

    let doc = csv(&["FRANÇAIS,épellation,Comment écrit-on 'chat'?,chat,shat,cha,chatt,A"]);
    let summary = import_questions(&store, &doc).await.unwrap();
    assert_eq!(summary.success, 1, "{:?}", summary.errors);
    assert_eq!(store.list_subjects().await.unwrap().len(), 1);
}
