//! Task tracking use cases

use super::auth::AuthService;
use super::cached_fetch::{fetch_list, CachedFetcher};
use super::error::Result;
use crate::domain::models::Task;
use crate::domain::query::{Page, TaskQuery};
use crate::domain::validation::validate_task;
use crate::infrastructure::cache::CacheKey;
use crate::infrastructure::client::{Webhook, WebhookRequest};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct TaskService {
    webhook: Arc<dyn Webhook>,
    fetcher: CachedFetcher,
    auth: Arc<AuthService>,
}

impl TaskService {
    pub fn new(webhook: Arc<dyn Webhook>, fetcher: CachedFetcher, auth: Arc<AuthService>) -> Self {
        Self {
            webhook,
            fetcher,
            auth,
        }
    }

    /// Every task assigned to the logged-in employee
    pub async fn all(&self, force: bool) -> Result<Vec<Task>> {
        let session = self.auth.require()?;
        let key = CacheKey::AllTasks {
            emp_id: session.user.emp_id.clone(),
        };
        let request = WebhookRequest::GetTasks {
            emp_id: session.user.emp_id.clone(),
            lead_id: None,
        };

        self.fetcher
            .get_or_fetch(key, Some(session.owner()), force, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    pub async fn for_lead(&self, lead_id: &str) -> Result<Vec<Task>> {
        let session = self.auth.require()?;
        let key = CacheKey::LeadTasks {
            lead_id: lead_id.to_string(),
        };
        let request = WebhookRequest::GetTasks {
            emp_id: session.user.emp_id.clone(),
            lead_id: Some(lead_id.to_string()),
        };

        self.fetcher
            .get_or_fetch(key, Some(session.owner()), false, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    pub async fn query(&self, query: &TaskQuery, force: bool) -> Result<Page<Task>> {
        let tasks = self.all(force).await?;
        Ok(query.apply(&tasks))
    }

    /// Create a task; unassigned tasks go to the logged-in employee
    pub async fn add(&self, mut task: Task) -> Result<()> {
        let session = self.auth.require()?;
        validate_task(&task)?;

        if task.assigned_to.is_none() {
            task.assigned_to = Some(session.user.emp_id.clone());
        }
        let lead_id = task.lead_id.clone();
        self.webhook.call(&WebhookRequest::AddTask(task)).await?;

        self.invalidate_after_write(&session.user.emp_id, lead_id.as_deref());
        info!("Task added");
        Ok(())
    }

    pub async fn update(&self, task: Task) -> Result<()> {
        let session = self.auth.require()?;
        validate_task(&task)?;

        let task_id = task.id.clone();
        let lead_id = task.lead_id.clone();
        self.webhook.call(&WebhookRequest::UpdateTask(task)).await?;

        self.invalidate_after_write(&session.user.emp_id, lead_id.as_deref());
        info!(task_id = %task_id, "Task updated");
        Ok(())
    }

    fn invalidate_after_write(&self, emp_id: &str, lead_id: Option<&str>) {
        self.fetcher.invalidate(&CacheKey::AllTasks {
            emp_id: emp_id.to_string(),
        });
        match lead_id {
            Some(lead_id) => self.fetcher.invalidate(&CacheKey::LeadTasks {
                lead_id: lead_id.to_string(),
            }),
            None => {
                self.fetcher
                    .invalidate_where(|key| matches!(key, CacheKey::LeadTasks { .. }));
            }
        }
    }
}
