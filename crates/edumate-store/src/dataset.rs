//! The full set of records, persisted as one JSON document.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use edumate_core::model::{
    PointRule, PointTransaction, QuestionBankItem, Reward, RewardRequest, StudyPlan, SubTopic,
    Subject, Test, Topic, User,
};

/// Snapshot format version written to disk.
pub const DATASET_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub sub_topics: Vec<SubTopic>,
    #[serde(default)]
    pub question_bank: Vec<QuestionBankItem>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub study_plans: Vec<StudyPlan>,
    #[serde(default)]
    pub point_rules: Vec<PointRule>,
    #[serde(default)]
    pub transactions: Vec<PointTransaction>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    #[serde(default)]
    pub reward_requests: Vec<RewardRequest>,
}

fn default_version() -> u32 {
    DATASET_VERSION
}

impl Dataset {
    pub fn empty() -> Self {
        Self {
            version: DATASET_VERSION,
            ..Self::default()
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read data file {}", path.display()))?;
        let dataset: Dataset = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse data file {}", path.display()))?;
        anyhow::ensure!(
            dataset.version <= DATASET_VERSION,
            "data file {} has version {}, newest supported is {DATASET_VERSION}",
            path.display(),
            dataset.version
        );
        Ok(dataset)
    }

    /// Write the snapshot, replacing the file only once the new content is complete.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize dataset")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Insert `item`, replacing any existing element with the same key.
pub(crate) fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let k = key(&item);
    match items.iter_mut().find(|existing| key(existing) == k) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}
