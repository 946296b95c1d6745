use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dto::{
    application_dto::{ApplicationView, ApplyPayload},
    job_dto::JobView,
    user_dto::ApplicantSummary,
};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, ApplicationStatus, NewApplication},
    entity_ref::EntityRef,
    notification::{NewNotification, NotificationType},
    user::Actor,
};
use crate::services::notification_service::NotificationService;
use crate::services::policy::{Action, Policy};
use crate::services::user_service::users_by_id;
use crate::store::{ApplicationFilter, Page, Paged, Store};

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn apply(
        &self,
        actor: &Actor,
        job_id: Uuid,
        payload: ApplyPayload,
    ) -> Result<Application> {
        let job = self
            .store
            .find_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        let already_applied = self.store.has_applied(job_id, actor.id).await?;
        Policy::can(
            actor,
            Action::ApplyToJob {
                job: &job,
                already_applied,
                now: Utc::now(),
            },
        )?;

        // The store re-checks uniqueness inside the same unit of work.
        let (application, job) = self
            .store
            .submit_application(NewApplication {
                job_id,
                applicant_id: actor.id,
                resume: payload.resume,
                cover_letter: payload.cover_letter.filter(|c| !c.trim().is_empty()),
            })
            .await?;
        tracing::info!(
            application_id = %application.id,
            job_id = %job.id,
            applicants_count = job.applicants_count,
            "application submitted"
        );

        self.notifications
            .emit(NewNotification {
                recipient_id: job.creator_id,
                notification_type: NotificationType::Application,
                title: "New Job Application".to_string(),
                message: format!(
                    "{} has applied for your job \"{}\"",
                    actor.username, job.title
                ),
                related: EntityRef::Application(application.id),
            })
            .await;

        Ok(application)
    }

    /// Applications for one job, each with the applicant's contact details.
    pub async fn for_job(
        &self,
        actor: &Actor,
        job_id: Uuid,
        page: Page,
    ) -> Result<Paged<ApplicationView>> {
        let job = self.store.find_job(job_id).await?;
        Policy::can(actor, Action::ViewApplications(job.as_ref()))?;
        let applications = self
            .store
            .list_applications(ApplicationFilter::ByJob(job_id), page)
            .await?;

        let applicants = users_by_id(
            self.store.as_ref(),
            applications.items.iter().map(|a| a.applicant_id).collect::<Vec<_>>(),
        )
        .await?;
        Ok(applications.map(|application| ApplicationView {
            applicant: applicants
                .get(&application.applicant_id)
                .map(ApplicantSummary::from),
            job: None,
            application,
        }))
    }

    /// The caller's own applications, each with the job and its creator.
    pub async fn mine(&self, actor: &Actor, page: Page) -> Result<Paged<ApplicationView>> {
        let applications = self
            .store
            .list_applications(ApplicationFilter::ByApplicant(actor.id), page)
            .await?;

        let mut jobs = HashMap::new();
        for application in &applications.items {
            if !jobs.contains_key(&application.job_id) {
                if let Some(job) = self.store.find_job(application.job_id).await? {
                    jobs.insert(application.job_id, job);
                }
            }
        }
        let creators = users_by_id(self.store.as_ref(), jobs.values().map(|j| j.creator_id).collect::<Vec<_>>()).await?;

        Ok(applications.map(|application| ApplicationView {
            job: jobs
                .get(&application.job_id)
                .map(|job| JobView::new(job.clone(), creators.get(&job.creator_id))),
            applicant: None,
            application,
        }))
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ApplicationView> {
        let application = self.store.find_application(id).await?;
        let job = match &application {
            Some(app) => self.store.find_job(app.job_id).await?,
            None => None,
        };
        Policy::can(
            actor,
            Action::ViewApplication {
                application: application.as_ref(),
                job: job.as_ref(),
            },
        )?;
        let application =
            application.ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        let applicant = self.store.find_user(application.applicant_id).await?;
        let job = match job {
            Some(job) => {
                let creator = self.store.find_user(job.creator_id).await?;
                Some(JobView::new(job, creator.as_ref()))
            }
            None => None,
        };
        Ok(ApplicationView {
            applicant: applicant.as_ref().map(ApplicantSummary::from),
            job,
            application,
        })
    }

    /// Any status may be set at any time by the job's creator.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let application = self.store.find_application(id).await?;
        let job = match &application {
            Some(app) => self.store.find_job(app.job_id).await?,
            None => None,
        };
        Policy::can(
            actor,
            Action::UpdateApplicationStatus {
                application: application.as_ref(),
                job: job.as_ref(),
            },
        )?;

        let updated = self.store.set_application_status(id, status).await?;
        tracing::info!(
            application_id = %id,
            status = status.as_str(),
            "application status changed"
        );

        let title = job.map(|j| j.title).unwrap_or_default();
        self.notifications
            .emit(NewNotification {
                recipient_id: updated.applicant_id,
                notification_type: NotificationType::Application,
                title: "Application Status Updated".to_string(),
                message: format!(
                    "Your application for \"{}\" has been updated to {}",
                    title, status
                ),
                related: EntityRef::Application(updated.id),
            })
            .await;

        Ok(updated)
    }
}
