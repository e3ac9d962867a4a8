//! Topic mastery derived from a student's test history.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Test, Topic};

/// Average percentage at or above which a topic counts as mastered.
pub const MASTERY_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryStatus {
    Locked,
    Ready,
    InProgress,
    Mastered,
}

impl fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasteryStatus::Locked => write!(f, "locked"),
            MasteryStatus::Ready => write!(f, "ready"),
            MasteryStatus::InProgress => write!(f, "in progress"),
            MasteryStatus::Mastered => write!(f, "mastered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMastery {
    pub topic_id: Uuid,
    pub topic_name: String,
    pub status: MasteryStatus,
    /// Mean score over completed tests covering the topic.
    pub average: Option<f64>,
    pub attempts: usize,
}

/// Mastery per topic for one student, in subject then topic order.
///
/// A test covers a topic when the topic is in its `topic_ids` or one of its
/// questions belongs to it. Unattempted topics are `Ready` if they open their
/// subject or follow a mastered topic, `Locked` otherwise.
pub fn topic_mastery(topics: &[Topic], tests: &[Test], student_id: Uuid) -> Vec<TopicMastery> {
    let mut scores: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for test in tests
        .iter()
        .filter(|t| t.student_id == student_id && t.completed)
    {
        let Some(score) = test.score_percentage else {
            continue;
        };
        let mut covered: Vec<Uuid> = test.topic_ids.clone();
        covered.extend(test.questions.iter().map(|q| q.topic_id));
        covered.sort();
        covered.dedup();
        for topic_id in covered {
            scores.entry(topic_id).or_default().push(score);
        }
    }

    let mut ordered: Vec<&Topic> = topics.iter().collect();
    ordered.sort_by_key(|t| (t.subject_id, t.order));

    let mut result = Vec::with_capacity(ordered.len());
    let mut previous: Option<(Uuid, MasteryStatus)> = None;

    for topic in ordered {
        let history = scores.get(&topic.id);
        let attempts = history.map_or(0, Vec::len);
        let average = history
            .filter(|s| !s.is_empty())
            .map(|s| s.iter().sum::<f64>() / s.len() as f64);

        let status = match average {
            Some(avg) if avg >= MASTERY_THRESHOLD => MasteryStatus::Mastered,
            Some(_) => MasteryStatus::InProgress,
            None => match previous {
                Some((subject, status)) if subject == topic.subject_id => {
                    if status == MasteryStatus::Mastered {
                        MasteryStatus::Ready
                    } else {
                        MasteryStatus::Locked
                    }
                }
                _ => MasteryStatus::Ready,
            },
        };

        previous = Some((topic.subject_id, status));
        result.push(TopicMastery {
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            status,
            average,
            attempts,
        });
    }

    result
}
