//! Bulk CSV question importer.
//!
//! Column order (header line is skipped):
//!
//! ```text
//! Subject Name, Topic Name, Question, Option A, Option B, Option C, Option D,
//! Correct Answer, Difficulty, Explanation
//! ```
//!
//! The first eight columns are required. Each row is validated on its own; a
//! bad row is reported and the import moves on. Rows already inserted stay
//! inserted.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::curriculum::name_key;
use crate::model::{
    normalize_question, Difficulty, QuestionBankItem, Subject, Topic, BULK_UPLOAD_TAG,
};
use crate::traits::Store;

/// Columns a row must have: subject, topic, question, four options, answer.
pub const REQUIRED_COLUMNS: usize = 8;

/// Outcome of one upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub success: usize,
    pub failed: usize,
    /// One message per failed row, in file order.
    pub errors: Vec<String>,
}

/// Why a row was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("expected at least 8 columns, found {0}")]
    TooFewColumns(usize),

    #[error("subject '{0}' not found")]
    UnknownSubject(String),

    #[error("topic '{topic}' not found in subject '{subject}'")]
    UnknownTopic { subject: String, topic: String },

    #[error("{0} is empty")]
    EmptyField(&'static str),

    #[error("duplicate question in this batch")]
    DuplicateInBatch,

    #[error("question already exists in the question bank")]
    AlreadyExists,

    #[error("invalid correct answer '{0}' (expected 1-4 or A-D)")]
    InvalidAnswer(String),

    #[error("failed to save question: {0}")]
    Store(String),
}

/// Split one CSV line into trimmed fields.
///
/// Double quotes toggle quoting so commas inside a quoted field are kept.
/// Quote characters themselves are dropped; `""` is not treated as an escape.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parse `1`–`4` or `A`–`D` (any case) into a 0-based option index.
pub fn parse_correct_answer(value: &str) -> Option<u8> {
    match value.trim().to_uppercase().as_str() {
        "1" | "A" => Some(0),
        "2" | "B" => Some(1),
        "3" | "C" => Some(2),
        "4" | "D" => Some(3),
        _ => None,
    }
}

/// Row validation against a snapshot of the curriculum and question bank.
///
/// Keeps the duplicate keys of rows accepted so far in this batch.
pub struct QuestionImporter {
    subjects: HashMap<String, Subject>,
    topics: HashMap<(Uuid, String), Topic>,
    existing: HashSet<(Uuid, String)>,
    batch: HashSet<(Uuid, String)>,
}

impl QuestionImporter {
    pub fn new(subjects: Vec<Subject>, topics: Vec<Topic>, bank: &[QuestionBankItem]) -> Self {
        let subjects = subjects
            .into_iter()
            .map(|s| (name_key(&s.name), s))
            .collect();
        let topics = topics
            .into_iter()
            .map(|t| ((t.subject_id, name_key(&t.name)), t))
            .collect();
        let existing = bank.iter().map(QuestionBankItem::dedup_key).collect();

        Self {
            subjects,
            topics,
            existing,
            batch: HashSet::new(),
        }
    }

    /// Validate one row's fields and build the record it would insert.
    pub fn prepare(&self, fields: &[String]) -> Result<QuestionBankItem, RowError> {
        if fields.len() < REQUIRED_COLUMNS {
            return Err(RowError::TooFewColumns(fields.len()));
        }

        let subject_name = &fields[0];
        let topic_name = &fields[1];

        let subject = self
            .subjects
            .get(&name_key(subject_name))
            .ok_or_else(|| RowError::UnknownSubject(subject_name.clone()))?;
        let topic = self
            .topics
            .get(&(subject.id, name_key(topic_name)))
            .ok_or_else(|| RowError::UnknownTopic {
                subject: subject_name.clone(),
                topic: topic_name.clone(),
            })?;

        const LABELS: [&str; 5] = ["question", "option A", "option B", "option C", "option D"];
        for (label, value) in LABELS.iter().zip(&fields[2..7]) {
            if value.is_empty() {
                return Err(RowError::EmptyField(*label));
            }
        }

        let key = (topic.id, normalize_question(&fields[2]));
        if self.batch.contains(&key) {
            return Err(RowError::DuplicateInBatch);
        }
        if self.existing.contains(&key) {
            return Err(RowError::AlreadyExists);
        }

        let correct_index = parse_correct_answer(&fields[7])
            .ok_or_else(|| RowError::InvalidAnswer(fields[7].clone()))?;

        let difficulty = fields
            .get(8)
            .map(|d| Difficulty::normalize(d.as_str()))
            .unwrap_or_default();
        let explanation = fields.get(9).filter(|e| !e.is_empty()).cloned();

        Ok(QuestionBankItem {
            id: Uuid::new_v4(),
            topic_id: topic.id,
            question: fields[2].clone(),
            options: [
                fields[3].clone(),
                fields[4].clone(),
                fields[5].clone(),
                fields[6].clone(),
            ],
            correct_index,
            difficulty,
            explanation,
            tags: vec![BULK_UPLOAD_TAG.to_string()],
            created_at: Utc::now(),
        })
    }

    /// Record an accepted item so later rows in the batch see it as a duplicate.
    pub fn accept(&mut self, item: &QuestionBankItem) {
        self.batch.insert(item.dedup_key());
    }
}

/// Import a CSV document into the question bank.
///
/// Fails as a whole only when the curriculum or bank cannot be read up front.
/// Row numbers in messages are 1-based file lines, so the header is row 1.
///
/// Valid rows are inserted in one batch. If the batch write fails they are
/// retried one at a time, so a store failure still rejects only its own row.
pub async fn import_questions(store: &dyn Store, csv: &str) -> Result<ImportSummary> {
    let subjects = store.list_subjects().await?;
    let topics = store.list_topics().await?;
    let bank = store.list_question_bank().await?;
    let mut importer = QuestionImporter::new(subjects, topics, &bank);

    let mut outcomes: Vec<(usize, Result<(), RowError>)> = Vec::new();
    let mut ready: Vec<(usize, QuestionBankItem)> = Vec::new();

    for (index, line) in csv.lines().enumerate().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let row = index + 1;
        match importer.prepare(&parse_csv_line(line)) {
            Ok(item) => {
                importer.accept(&item);
                ready.push((outcomes.len(), item));
                outcomes.push((row, Ok(())));
            }
            Err(e) => outcomes.push((row, Err(e))),
        }
    }

    let items: Vec<QuestionBankItem> = ready.iter().map(|(_, item)| item.clone()).collect();
    if let Err(e) = store.insert_questions(&items).await {
        tracing::warn!("batch insert of {} questions failed, retrying per row: {e:#}", items.len());
        for (slot, item) in &ready {
            if let Err(e) = store.insert_question(item).await {
                outcomes[*slot].1 = Err(RowError::Store(format!("{e:#}")));
            }
        }
    }

    let mut summary = ImportSummary::default();
    for (row, outcome) in outcomes {
        match outcome {
            Ok(()) => summary.success += 1,
            Err(e) => {
                tracing::debug!("row {row} rejected: {e}");
                summary.failed += 1;
                summary.errors.push(format!("Row {row}: {e}"));
            }
        }
    }

    tracing::info!(
        "question import finished: {} imported, {} failed",
        summary.success,
        summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        parse_csv_line(line)
    }

    fn curriculum() -> (Vec<Subject>, Vec<Topic>) {
        let math = Subject {
            id: Uuid::new_v4(),
            name: "Mathematics".into(),
            order: 1,
            difficulty: Difficulty::Medium,
        };
        let fractions = Topic {
            id: Uuid::new_v4(),
            subject_id: math.id,
            name: "Fractions".into(),
            order: 1,
            difficulty: Difficulty::Easy,
            description: String::new(),
        };
        (vec![math], vec![fractions])
    }

    #[test]
    fn parse_plain_line() {
        assert_eq!(fields("a, b ,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_quoted_commas() {
        assert_eq!(
            fields(r#"Math,"Fractions, part 1","What is 1/2, as a decimal?",0.5"#),
            vec!["Math", "Fractions, part 1", "What is 1/2, as a decimal?", "0.5"]
        );
    }

    #[test]
    fn parse_keeps_empty_fields() {
        assert_eq!(fields("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn correct_answer_letters_and_numbers() {
        assert_eq!(parse_correct_answer("C"), Some(2));
        assert_eq!(parse_correct_answer("3"), Some(2));
        assert_eq!(parse_correct_answer(" a "), Some(0));
        assert_eq!(parse_correct_answer("d"), Some(3));
        assert_eq!(parse_correct_answer("5"), None);
        assert_eq!(parse_correct_answer("E"), None);
        assert_eq!(parse_correct_answer(""), None);
    }

    #[test]
    fn prepare_valid_row() {
        let (subjects, topics) = curriculum();
        let topic_id = topics[0].id;
        let importer = QuestionImporter::new(subjects, topics, &[]);
        let item = importer
            .prepare(&fields(
                "mathematics,FRACTIONS,What is 1/2 + 1/2?,1,2,0,1/4,A,hard,Add the halves",
            ))
            .unwrap();
        assert_eq!(item.topic_id, topic_id);
        assert_eq!(item.correct_index, 0);
        assert_eq!(item.difficulty, Difficulty::Hard);
        assert_eq!(item.explanation.as_deref(), Some("Add the halves"));
        assert_eq!(item.tags, vec![BULK_UPLOAD_TAG]);
    }

    #[test]
    fn prepare_defaults_difficulty_and_explanation() {
        let (subjects, topics) = curriculum();
        let importer = QuestionImporter::new(subjects, topics, &[]);
        let item = importer
            .prepare(&fields("Mathematics,Fractions,Q?,a,b,c,d,2"))
            .unwrap();
        assert_eq!(item.difficulty, Difficulty::Medium);
        assert!(item.explanation.is_none());

        let item = importer
            .prepare(&fields("Mathematics,Fractions,Q2?,a,b,c,d,2,impossible,"))
            .unwrap();
        assert_eq!(item.difficulty, Difficulty::Medium);
        assert!(item.explanation.is_none());
    }

    #[test]
    fn prepare_rejections() {
        let (subjects, topics) = curriculum();
        let importer = QuestionImporter::new(subjects, topics, &[]);

        assert_eq!(
            importer.prepare(&fields("a,b,c")),
            Err(RowError::TooFewColumns(3))
        );
        assert_eq!(
            importer.prepare(&fields("Physics,Fractions,Q,a,b,c,d,A")),
            Err(RowError::UnknownSubject("Physics".into()))
        );
        assert!(matches!(
            importer.prepare(&fields("Mathematics,Algebra,Q,a,b,c,d,A")),
            Err(RowError::UnknownTopic { .. })
        ));
        assert_eq!(
            importer.prepare(&fields("Mathematics,Fractions,,a,b,c,d,A")),
            Err(RowError::EmptyField("question"))
        );
        assert_eq!(
            importer.prepare(&fields("Mathematics,Fractions,Q,a,b,,d,A")),
            Err(RowError::EmptyField("option C"))
        );
        assert_eq!(
            importer.prepare(&fields("Mathematics,Fractions,Q,a,b,c,d,Z")),
            Err(RowError::InvalidAnswer("Z".into()))
        );
    }

    #[test]
    fn accepted_rows_block_batch_duplicates() {
        let (subjects, topics) = curriculum();
        let mut importer = QuestionImporter::new(subjects, topics, &[]);
        let row = fields("Mathematics,Fractions,What is half of 4?,1,2,3,4,B");

        let item = importer.prepare(&row).unwrap();
        importer.accept(&item);

        let again = fields("Mathematics,Fractions,  WHAT IS HALF OF 4?  ,1,2,3,4,B");
        assert_eq!(importer.prepare(&again), Err(RowError::DuplicateInBatch));
    }

    #[test]
    fn existing_bank_items_are_duplicates() {
        let (subjects, topics) = curriculum();
        let existing = QuestionBankItem {
            id: Uuid::new_v4(),
            topic_id: topics[0].id,
            question: "What is half of 4?".into(),
            options: ["1".into(), "2".into(), "3".into(), "4".into()],
            correct_index: 1,
            difficulty: Difficulty::Easy,
            explanation: None,
            tags: vec![],
            created_at: Utc::now(),
        };
        let importer = QuestionImporter::new(subjects, topics, &[existing]);
        assert_eq!(
            importer.prepare(&fields("Mathematics,Fractions,what is half of 4?,1,2,3,4,B")),
            Err(RowError::AlreadyExists)
        );
    }
}
