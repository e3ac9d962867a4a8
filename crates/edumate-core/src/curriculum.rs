//! Subject → topic → sub-topic hierarchy maintenance.
//!
//! Names are unique case-insensitively within their parent, which is what
//! lets the CSV importer resolve rows by name.

use anyhow::Result;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Difficulty, SubTopic, Subject, Topic};
use crate::traits::Store;

/// Key that subject and topic names are compared by: trimmed, Unicode-lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn same_name(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

/// Add a subject at the end of the ordering.
pub async fn add_subject(store: &dyn Store, name: &str, difficulty: Difficulty) -> Result<Subject> {
    anyhow::ensure!(!name.trim().is_empty(), "subject name must not be empty");
    let subjects = store.list_subjects().await?;
    if subjects.iter().any(|s| same_name(&s.name, name)) {
        return Err(StoreError::Conflict(format!("subject '{}' already exists", name.trim())).into());
    }

    let subject = Subject {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        order: subjects.iter().map(|s| s.order).max().unwrap_or(0) + 1,
        difficulty,
    };
    store.insert_subject(&subject).await?;
    tracing::info!("added subject '{}'", subject.name);
    Ok(subject)
}

/// Add a topic under a subject, at the end of that subject's ordering.
pub async fn add_topic(
    store: &dyn Store,
    subject_id: Uuid,
    name: &str,
    difficulty: Difficulty,
    description: &str,
) -> Result<Topic> {
    anyhow::ensure!(!name.trim().is_empty(), "topic name must not be empty");
    let subjects = store.list_subjects().await?;
    if !subjects.iter().any(|s| s.id == subject_id) {
        return Err(StoreError::not_found("subject", subject_id).into());
    }

    let siblings: Vec<Topic> = store
        .list_topics()
        .await?
        .into_iter()
        .filter(|t| t.subject_id == subject_id)
        .collect();
    if siblings.iter().any(|t| same_name(&t.name, name)) {
        return Err(StoreError::Conflict(format!("topic '{}' already exists", name.trim())).into());
    }

    let topic = Topic {
        id: Uuid::new_v4(),
        subject_id,
        name: name.trim().to_string(),
        order: siblings.iter().map(|t| t.order).max().unwrap_or(0) + 1,
        difficulty,
        description: description.to_string(),
    };
    store.insert_topic(&topic).await?;
    tracing::info!("added topic '{}'", topic.name);
    Ok(topic)
}

/// Add a sub-topic under a topic.
pub async fn add_sub_topic(store: &dyn Store, topic_id: Uuid, name: &str) -> Result<SubTopic> {
    anyhow::ensure!(!name.trim().is_empty(), "sub-topic name must not be empty");
    let siblings = store.list_sub_topics(topic_id).await?;
    if siblings.iter().any(|t| same_name(&t.name, name)) {
        return Err(
            StoreError::Conflict(format!("sub-topic '{}' already exists", name.trim())).into(),
        );
    }

    let sub_topic = SubTopic {
        id: Uuid::new_v4(),
        topic_id,
        name: name.trim().to_string(),
        order: siblings.iter().map(|t| t.order).max().unwrap_or(0) + 1,
    };
    store.insert_sub_topic(&sub_topic).await?;
    Ok(sub_topic)
}

/// Find a subject by case-insensitive name.
pub fn find_subject<'a>(subjects: &'a [Subject], name: &str) -> Option<&'a Subject> {
    subjects.iter().find(|s| same_name(&s.name, name))
}

/// Find a topic by case-insensitive name within a subject.
pub fn find_topic<'a>(topics: &'a [Topic], subject_id: Uuid, name: &str) -> Option<&'a Topic> {
    topics
        .iter()
        .find(|t| t.subject_id == subject_id && same_name(&t.name, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_and_padding() {
        let subject = Subject {
            id: Uuid::new_v4(),
            name: "Mathematics".into(),
            order: 1,
            difficulty: Difficulty::Medium,
        };
        let topic = Topic {
            id: Uuid::new_v4(),
            subject_id: subject.id,
            name: "Fractions".into(),
            order: 1,
            difficulty: Difficulty::Easy,
            description: String::new(),
        };
        let subjects = vec![subject.clone()];
        let topics = vec![topic.clone()];

        assert_eq!(find_subject(&subjects, " mathematics ").map(|s| s.id), Some(subject.id));
        assert!(find_subject(&subjects, "Math").is_none());
        assert_eq!(
            find_topic(&topics, subject.id, "FRACTIONS").map(|t| t.id),
            Some(topic.id)
        );
        assert!(find_topic(&topics, Uuid::new_v4(), "Fractions").is_none());
    }

    #[test]
    fn non_ascii_names_match_regardless_of_case() {
        let subject = Subject {
            id: Uuid::new_v4(),
            name: "Français".into(),
            order: 1,
            difficulty: Difficulty::Medium,
        };
        let subjects = vec![subject.clone()];

        assert_eq!(name_key(" ÉTUDES "), "études");
        assert_eq!(find_subject(&subjects, "FRANÇAIS").map(|s| s.id), Some(subject.id));
        assert!(same_name("Ökologie", "ökologie"));
    }
}
