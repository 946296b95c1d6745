use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dto::job_dto::{CreateJobPayload, JobListQuery, JobView, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::{
    job::{Job, JobStatus},
    user::Actor,
};
use crate::services::policy::{Action, Policy};
use crate::services::user_service::users_by_id;
use crate::store::{JobFilter, Page, Paged, Store};

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn Store>,
}

impl JobService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateJobPayload) -> Result<Job> {
        Policy::can(actor, Action::CreateJob)?;
        let job = self.store.insert_job(payload.into_new_job(actor.id)).await?;
        tracing::info!(job_id = %job.id, creator_id = %actor.id, "job created as draft");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        self.find(id).await
    }

    /// The job together with a summary of whoever posted it.
    pub async fn view(&self, id: Uuid) -> Result<JobView> {
        let job = self.find(id).await?;
        let creator = self.store.find_user(job.creator_id).await?;
        Ok(JobView::new(job, creator.as_ref()))
    }

    pub async fn with_creators(&self, jobs: Paged<Job>) -> Result<Paged<JobView>> {
        let creators = users_by_id(self.store.as_ref(), jobs.items.iter().map(|j| j.creator_id).collect::<Vec<_>>()).await?;
        Ok(jobs.map(|job| {
            let creator = creators.get(&job.creator_id);
            JobView::new(job, creator)
        }))
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let job = self.store.find_job(id).await?;
        Policy::can(actor, Action::UpdateJob(job.as_ref()))?;

        let updated = self
            .store
            .update_draft_job(id, payload.into())
            .await?
            .ok_or_else(|| Error::InvalidState("Only draft jobs can be edited".to_string()))?;
        tracing::info!(job_id = %id, "job draft updated");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let job = self.store.find_job(id).await?;
        Policy::can(actor, Action::DeleteJob(job.as_ref()))?;

        if !self.store.delete_job(id).await? {
            return Err(Error::NotFound("Job not found".to_string()));
        }
        tracing::info!(job_id = %id, "job deleted");
        Ok(())
    }

    pub async fn publish(&self, actor: &Actor, id: Uuid) -> Result<Job> {
        let job = self.store.find_job(id).await?;
        Policy::can(actor, Action::PublishJob(job.as_ref()))?;

        match job.as_ref().map(|j| j.status) {
            Some(JobStatus::Published) => return self.find(id).await,
            Some(JobStatus::Closed) => {
                return Err(Error::InvalidState(
                    "Closed jobs cannot be published".to_string(),
                ))
            }
            _ => {}
        }

        let published = self
            .store
            .publish_job(id, Utc::now())
            .await?
            .ok_or_else(|| Error::InvalidState("Job can no longer be published".to_string()))?;
        tracing::info!(job_id = %id, "job published");
        Ok(published)
    }

    pub async fn list(&self, query: &JobListQuery) -> Result<Paged<Job>> {
        let filter = JobFilter {
            status: Some(JobStatus::Published),
            ..query.filter()
        };
        self.store.list_jobs(filter, query.page()).await
    }

    pub async fn search(&self, q: Option<&str>, page: Page) -> Result<Paged<Job>> {
        let q = q.map(str::trim).unwrap_or_default();
        if q.is_empty() {
            return Err(Error::Invalid("Search query is required".to_string()));
        }
        self.store.search_jobs(q, page).await
    }

    pub async fn my_drafts(&self, actor: &Actor, page: Page) -> Result<Paged<Job>> {
        self.list_own(actor, JobStatus::Draft, page).await
    }

    pub async fn my_published(&self, actor: &Actor, page: Page) -> Result<Paged<Job>> {
        self.list_own(actor, JobStatus::Published, page).await
    }

    pub async fn save(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if !self.store.save_job(actor.id, id).await? {
            return Err(Error::Conflict("Job already saved".to_string()));
        }
        tracing::info!(job_id = %id, user_id = %actor.id, "job saved");
        Ok(())
    }

    pub async fn unsave(&self, actor: &Actor, id: Uuid) -> Result<()> {
        self.store.unsave_job(actor.id, id).await
    }

    pub async fn saved(&self, actor: &Actor, page: Page) -> Result<Paged<Job>> {
        self.store.saved_jobs(actor.id, page).await
    }

    async fn find(&self, id: Uuid) -> Result<Job> {
        self.store
            .find_job(id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))
    }

    async fn list_own(&self, actor: &Actor, status: JobStatus, page: Page) -> Result<Paged<Job>> {
        let filter = JobFilter {
            status: Some(status),
            creator_id: Some(actor.id),
            ..Default::default()
        };
        self.store.list_jobs(filter, page).await
    }
}
