//! edumate-store: Local record store.
//!
//! [`LocalStore`] keeps every collection in memory and, when opened on a
//! path, rewrites a JSON snapshot after each successful write. Each write
//! clones and serializes the whole dataset, so bulk callers should use the
//! batch operations (`save_users`, `insert_questions`, `commit_ledger`).

pub mod dataset;
pub mod seed;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use edumate_core::error::StoreError;
use edumate_core::model::{
    PointRule, PointTransaction, QuestionBankItem, Reward, RewardRequest, StudyPlan, SubTopic,
    Subject, Test, Topic, User,
};
use edumate_core::traits::{LedgerRecord, LedgerWrite, Store};

pub use dataset::Dataset;

/// In-memory store with an optional JSON snapshot on disk.
pub struct LocalStore {
    data: Mutex<Dataset>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::from_dataset(Dataset::empty())
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            data: Mutex::new(dataset),
            path: None,
        }
    }

    /// Open a snapshot file. A missing file starts an empty dataset that is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let dataset = if path.exists() {
            Dataset::load_json(&path)?
        } else {
            tracing::debug!("data file {} does not exist yet", path.display());
            Dataset::empty()
        };
        Ok(Self {
            data: Mutex::new(dataset),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current dataset.
    pub fn snapshot(&self) -> Result<Dataset> {
        self.read(|data| data.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T> {
        let data = self
            .data
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        Ok(f(&data))
    }

    /// Apply `f` to a working copy and commit it only if `f` and the snapshot
    /// write both succeed.
    fn write<T>(&self, f: impl FnOnce(&mut Dataset) -> Result<T>) -> Result<T> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?;
        let mut working = data.clone();
        let value = f(&mut working)?;
        if let Some(path) = &self.path {
            working
                .save_json(path)
                .map_err(|e| StoreError::Backend(format!("{e:#}")))?;
        }
        *data = working;
        Ok(value)
    }
}

fn find<'a, T>(
    items: &'a [T],
    entity: &'static str,
    id: Uuid,
    key: impl Fn(&T) -> Uuid,
) -> Result<&'a T> {
    items
        .iter()
        .find(|item| key(item) == id)
        .ok_or_else(|| StoreError::not_found(entity, id).into())
}

fn insert_new<T>(
    items: &mut Vec<T>,
    item: T,
    entity: &'static str,
    key: impl Fn(&T) -> Uuid,
) -> Result<()> {
    let id = key(&item);
    if items.iter().any(|existing| key(existing) == id) {
        return Err(StoreError::Conflict(format!("{entity} {id} already exists")).into());
    }
    items.push(item);
    Ok(())
}

#[async_trait]
impl Store for LocalStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.read(|d| d.users.clone())
    }

    async fn get_user(&self, id: Uuid) -> Result<User> {
        self.read(|d| find(&d.users, "user", id, |u| u.id).cloned())?
    }

    async fn save_users(&self, users: &[User]) -> Result<()> {
        self.write(|d| {
            for user in users {
                dataset::upsert(&mut d.users, user.clone(), |u| u.id);
            }
            Ok(())
        })?;
        tracing::debug!("saved {} users", users.len());
        Ok(())
    }

    async fn update_coins(&self, user_id: Uuid, coins: i64) -> Result<()> {
        self.write(|d| {
            let user = d
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or_else(|| StoreError::not_found("user", user_id))?;
            user.coins = coins;
            Ok(())
        })
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects = self.read(|d| d.subjects.clone())?;
        subjects.sort_by_key(|s| s.order);
        Ok(subjects)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        let mut topics = self.read(|d| d.topics.clone())?;
        topics.sort_by_key(|t| t.order);
        Ok(topics)
    }

    async fn list_sub_topics(&self, topic_id: Uuid) -> Result<Vec<SubTopic>> {
        let mut sub_topics: Vec<SubTopic> = self.read(|d| {
            d.sub_topics
                .iter()
                .filter(|s| s.topic_id == topic_id)
                .cloned()
                .collect()
        })?;
        sub_topics.sort_by_key(|s| s.order);
        Ok(sub_topics)
    }

    async fn insert_subject(&self, subject: &Subject) -> Result<()> {
        self.write(|d| insert_new(&mut d.subjects, subject.clone(), "subject", |s| s.id))
    }

    async fn insert_topic(&self, topic: &Topic) -> Result<()> {
        self.write(|d| {
            find(&d.subjects, "subject", topic.subject_id, |s| s.id)?;
            insert_new(&mut d.topics, topic.clone(), "topic", |t| t.id)
        })
    }

    async fn insert_sub_topic(&self, sub_topic: &SubTopic) -> Result<()> {
        self.write(|d| {
            find(&d.topics, "topic", sub_topic.topic_id, |t| t.id)?;
            insert_new(&mut d.sub_topics, sub_topic.clone(), "sub-topic", |s| s.id)
        })
    }

    async fn list_question_bank(&self) -> Result<Vec<QuestionBankItem>> {
        self.read(|d| d.question_bank.clone())
    }

    async fn insert_question(&self, item: &QuestionBankItem) -> Result<()> {
        self.write(|d| {
            find(&d.topics, "topic", item.topic_id, |t| t.id)?;
            insert_new(&mut d.question_bank, item.clone(), "question", |q| q.id)
        })
    }

    async fn insert_questions(&self, items: &[QuestionBankItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.write(|d| {
            for item in items {
                find(&d.topics, "topic", item.topic_id, |t| t.id)?;
                insert_new(&mut d.question_bank, item.clone(), "question", |q| q.id)?;
            }
            Ok(())
        })?;
        tracing::debug!("inserted {} questions", items.len());
        Ok(())
    }

    async fn list_tests(&self, student_id: Option<Uuid>) -> Result<Vec<Test>> {
        self.read(|d| {
            d.tests
                .iter()
                .filter(|t| student_id.map_or(true, |id| t.student_id == id))
                .cloned()
                .collect()
        })
    }

    async fn get_test(&self, id: Uuid) -> Result<Test> {
        self.read(|d| find(&d.tests, "test", id, |t| t.id).cloned())?
    }

    async fn save_test(&self, test: &Test) -> Result<()> {
        self.write(|d| {
            dataset::upsert(&mut d.tests, test.clone(), |t| t.id);
            Ok(())
        })
    }

    async fn list_study_plans(&self, student_id: Uuid) -> Result<Vec<StudyPlan>> {
        let mut plans: Vec<StudyPlan> = self.read(|d| {
            d.study_plans
                .iter()
                .filter(|p| p.student_id == student_id)
                .cloned()
                .collect()
        })?;
        plans.sort_by_key(|p| p.scheduled_for);
        Ok(plans)
    }

    async fn get_study_plan(&self, id: Uuid) -> Result<StudyPlan> {
        self.read(|d| find(&d.study_plans, "study plan", id, |p| p.id).cloned())?
    }

    async fn save_study_plan(&self, plan: &StudyPlan) -> Result<()> {
        self.write(|d| {
            dataset::upsert(&mut d.study_plans, plan.clone(), |p| p.id);
            Ok(())
        })
    }

    async fn list_point_rules(&self) -> Result<Vec<PointRule>> {
        self.read(|d| d.point_rules.clone())
    }

    async fn save_point_rule(&self, rule: &PointRule) -> Result<()> {
        self.write(|d| {
            dataset::upsert(&mut d.point_rules, rule.clone(), |r| r.id);
            Ok(())
        })
    }

    async fn list_transactions(&self, student_id: Uuid) -> Result<Vec<PointTransaction>> {
        self.read(|d| {
            d.transactions
                .iter()
                .filter(|t| t.student_id == student_id)
                .cloned()
                .collect()
        })
    }

    async fn insert_transaction(&self, transaction: &PointTransaction) -> Result<()> {
        self.write(|d| {
            find(&d.users, "user", transaction.student_id, |u| u.id)?;
            insert_new(
                &mut d.transactions,
                transaction.clone(),
                "transaction",
                |t| t.id,
            )
        })
    }

    async fn commit_ledger(&self, write: &LedgerWrite) -> Result<()> {
        self.write(|d| {
            if let Some(entry) = &write.entry {
                let student_id = entry.transaction.student_id;
                let user = d
                    .users
                    .iter_mut()
                    .find(|u| u.id == student_id)
                    .ok_or_else(|| StoreError::not_found("user", student_id))?;
                user.coins = entry.new_balance;
                insert_new(
                    &mut d.transactions,
                    entry.transaction.clone(),
                    "transaction",
                    |t| t.id,
                )?;
            }
            match &write.record {
                Some(LedgerRecord::RewardRequest(request)) => {
                    dataset::upsert(&mut d.reward_requests, request.clone(), |r| r.id)
                }
                Some(LedgerRecord::Test(test)) => {
                    dataset::upsert(&mut d.tests, test.clone(), |t| t.id)
                }
                Some(LedgerRecord::StudyPlan(plan)) => {
                    dataset::upsert(&mut d.study_plans, plan.clone(), |p| p.id)
                }
                None => {}
            }
            Ok(())
        })
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>> {
        self.read(|d| d.rewards.clone())
    }

    async fn get_reward(&self, id: Uuid) -> Result<Reward> {
        self.read(|d| find(&d.rewards, "reward", id, |r| r.id).cloned())?
    }

    async fn save_reward(&self, reward: &Reward) -> Result<()> {
        self.write(|d| {
            dataset::upsert(&mut d.rewards, reward.clone(), |r| r.id);
            Ok(())
        })
    }

    async fn list_reward_requests(&self) -> Result<Vec<RewardRequest>> {
        self.read(|d| d.reward_requests.clone())
    }

    async fn get_reward_request(&self, id: Uuid) -> Result<RewardRequest> {
        self.read(|d| find(&d.reward_requests, "reward request", id, |r| r.id).cloned())?
    }

    async fn save_reward_request(&self, request: &RewardRequest) -> Result<()> {
        self.write(|d| {
            dataset::upsert(&mut d.reward_requests, request.clone(), |r| r.id);
            Ok(())
        })
    }
}
