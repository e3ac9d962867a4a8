//! Application-state cache mirrored from the store, and role dashboards.
//!
//! Collections are loaded by [`AppState::refresh`] and read from memory
//! afterwards. Writes elsewhere do not update the cache; callers mark the
//! affected collection stale with [`AppState::invalidate`] and reload it with
//! [`AppState::refresh_stale`].

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{QuestionBankItem, Role, Subject, Test, Topic, User};
use crate::traits::Store;

/// A cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Subjects,
    Topics,
    Tests,
    QuestionBank,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Subjects,
        Collection::Topics,
        Collection::Tests,
        Collection::QuestionBank,
    ];
}

pub struct AppState {
    store: Arc<dyn Store>,
    users: Vec<User>,
    subjects: Vec<Subject>,
    topics: Vec<Topic>,
    tests: Vec<Test>,
    question_bank: Vec<QuestionBankItem>,
    stale: HashSet<Collection>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl AppState {
    /// An empty cache with every collection stale.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            users: Vec::new(),
            subjects: Vec::new(),
            topics: Vec::new(),
            tests: Vec::new(),
            question_bank: Vec::new(),
            stale: Collection::ALL.into_iter().collect(),
            refreshed_at: None,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Reload every collection concurrently.
    pub async fn refresh(&mut self) -> Result<()> {
        let store = self.store.as_ref();
        let (users, subjects, topics, tests, question_bank) = futures::try_join!(
            store.list_users(),
            store.list_subjects(),
            store.list_topics(),
            store.list_tests(None),
            store.list_question_bank(),
        )?;

        self.users = users;
        self.subjects = subjects;
        self.topics = topics;
        self.tests = tests;
        self.question_bank = question_bank;
        self.stale.clear();
        self.refreshed_at = Some(Utc::now());
        tracing::debug!(
            "state refreshed: {} users, {} subjects, {} topics, {} tests, {} questions",
            self.users.len(),
            self.subjects.len(),
            self.topics.len(),
            self.tests.len(),
            self.question_bank.len()
        );
        Ok(())
    }

    /// Reload only the collections marked stale.
    pub async fn refresh_stale(&mut self) -> Result<()> {
        let stale: Vec<Collection> = self.stale.iter().copied().collect();
        for collection in stale {
            match collection {
                Collection::Users => self.users = self.store.list_users().await?,
                Collection::Subjects => self.subjects = self.store.list_subjects().await?,
                Collection::Topics => self.topics = self.store.list_topics().await?,
                Collection::Tests => self.tests = self.store.list_tests(None).await?,
                Collection::QuestionBank => {
                    self.question_bank = self.store.list_question_bank().await?
                }
            }
            self.stale.remove(&collection);
        }
        self.refreshed_at = Some(Utc::now());
        Ok(())
    }

    pub fn invalidate(&mut self, collection: Collection) {
        self.stale.insert(collection);
    }

    pub fn is_stale(&self, collection: Collection) -> bool {
        self.stale.contains(&collection)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn question_bank(&self) -> &[QuestionBankItem] {
        &self.question_bank
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn topics_for(&self, subject_id: Uuid) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = self
            .topics
            .iter()
            .filter(|t| t.subject_id == subject_id)
            .collect();
        topics.sort_by_key(|t| t.order);
        topics
    }

    /// Build the dashboard for a user from the cached data.
    pub fn dashboard(&self, user_id: Uuid) -> Result<Dashboard> {
        let user = self
            .user(user_id)
            .ok_or_else(|| StoreError::not_found("user", user_id))?;
        Ok(Dashboard::for_user(user, self))
    }
}

/// Per-student line on a parent or teacher dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub coins: i64,
    pub completed_tests: usize,
    pub pending_tests: usize,
    pub average_score: Option<f64>,
}

/// What each role sees after signing in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Admin {
        users: usize,
        students: usize,
        subjects: usize,
        topics: usize,
        questions: usize,
    },
    Parent {
        name: String,
        children: Vec<StudentSummary>,
    },
    Teacher {
        name: String,
        students: Vec<StudentSummary>,
    },
    Student {
        name: String,
        summary: StudentSummary,
    },
}

impl Dashboard {
    pub fn for_user(user: &User, state: &AppState) -> Self {
        match user.role {
            Role::Admin => Dashboard::Admin {
                users: state.users.len(),
                students: state
                    .users
                    .iter()
                    .filter(|u| u.role == Role::Student)
                    .count(),
                subjects: state.subjects.len(),
                topics: state.topics.len(),
                questions: state.question_bank.len(),
            },
            Role::Parent => Dashboard::Parent {
                name: user.name.clone(),
                children: linked_students(user, state),
            },
            Role::Teacher => Dashboard::Teacher {
                name: user.name.clone(),
                students: linked_students(user, state),
            },
            Role::Student => Dashboard::Student {
                name: user.name.clone(),
                summary: summarize(user, &state.tests),
            },
        }
    }
}

fn linked_students(user: &User, state: &AppState) -> Vec<StudentSummary> {
    user.linked_ids
        .iter()
        .filter_map(|id| state.user(*id))
        .filter(|u| u.role == Role::Student)
        .map(|student| summarize(student, &state.tests))
        .collect()
}

fn summarize(student: &User, tests: &[Test]) -> StudentSummary {
    let own: Vec<&Test> = tests.iter().filter(|t| t.student_id == student.id).collect();
    let scores: Vec<f64> = own.iter().filter_map(|t| t.score_percentage).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    StudentSummary {
        id: student.id,
        name: student.name.clone(),
        coins: student.coins,
        completed_tests: own.iter().filter(|t| t.completed).count(),
        pending_tests: own.iter().filter(|t| !t.completed).count(),
        average_score,
    }
}
