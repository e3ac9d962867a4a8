pub mod curriculum;
pub mod dashboard;
pub mod generate;
pub mod import;
pub mod init;
pub mod link;
pub mod mastery;
pub mod points;
pub mod reward;
pub mod user;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use edumate_ai::config::load_config_from;
use edumate_ai::EdumateConfig;
use edumate_core::model::{Subject, Topic, User};
use edumate_core::traits::Store;
use edumate_core::curriculum as tree;
use edumate_store::LocalStore;

/// Loaded configuration plus the store it points at.
pub struct Workspace {
    pub config: EdumateConfig,
    pub store: LocalStore,
}

impl Workspace {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let store = LocalStore::open(&config.data_file)
            .with_context(|| format!("failed to open {}", config.data_file.display()))?;
        tracing::debug!("using data file {}", config.data_file.display());
        Ok(Self { config, store })
    }
}

pub fn open(config_path: Option<PathBuf>) -> Result<Workspace> {
    Workspace::open(config_path.as_deref())
}

pub fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).with_context(|| format!("'{value}' is not a valid id"))
}

/// Find a user by id, email or (unambiguous) name, ignoring case.
pub async fn find_user(store: &dyn Store, reference: &str) -> Result<User> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return store.get_user(id).await;
    }

    let users = store.list_users().await?;
    if let Some(user) = users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(reference))
    {
        return Ok(user.clone());
    }

    let mut by_name = users
        .into_iter()
        .filter(|u| u.name.eq_ignore_ascii_case(reference));
    match (by_name.next(), by_name.next()) {
        (Some(user), None) => Ok(user),
        (Some(_), Some(_)) => anyhow::bail!("more than one user is named '{reference}', use the email or id"),
        (None, _) => anyhow::bail!("no user matches '{reference}'"),
    }
}

pub async fn find_subject(store: &dyn Store, name: &str) -> Result<Subject> {
    let subjects = store.list_subjects().await?;
    tree::find_subject(&subjects, name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("subject '{name}' not found"))
}

pub async fn find_topic(store: &dyn Store, subject: &Subject, name: &str) -> Result<Topic> {
    let topics = store.list_topics().await?;
    tree::find_topic(&topics, subject.id, name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("topic '{name}' not found in subject '{}'", subject.name))
}
