//! Permission decisions for every mutation and ownership-scoped read.
//!
//! Everything here is pure: callers load the resources, call [`Policy::can`],
//! and only touch the store once it returns `Ok(())`.

use chrono::{DateTime, Utc};

use crate::error::ErrorKind;
use crate::models::{
    application::Application,
    job::{Job, JobStatus},
    notification::Notification,
    payment::Payment,
    user::{Actor, Role},
};

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotOwner,
    RoleRequired(Role),
    PaymentRequired,
    JobNotPublished,
    DeadlinePassed,
    DuplicateApplication,
    AlreadyPaid,
}

impl Denial {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Denial::DeadlinePassed => ErrorKind::Expired,
            Denial::DuplicateApplication | Denial::AlreadyPaid => ErrorKind::Conflict,
            Denial::NotOwner
            | Denial::RoleRequired(_)
            | Denial::PaymentRequired
            | Denial::JobNotPublished => ErrorKind::Forbidden,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Denial::NotOwner => "not_owner",
            Denial::RoleRequired(_) => "role_required",
            Denial::PaymentRequired => "payment_required",
            Denial::JobNotPublished => "job_not_published",
            Denial::DeadlinePassed => "deadline_passed",
            Denial::DuplicateApplication => "duplicate_application",
            Denial::AlreadyPaid => "already_paid",
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denial::NotOwner => f.write_str("Not authorized to act on this resource"),
            Denial::RoleRequired(role) => write!(f, "Access denied. {} role required", role),
            Denial::PaymentRequired => {
                f.write_str("Job posting payment is required before publishing")
            }
            Denial::JobNotPublished => f.write_str("Job is not available for applications"),
            Denial::DeadlinePassed => f.write_str("Application deadline has passed"),
            Denial::DuplicateApplication => f.write_str("You have already applied for this job"),
            Denial::AlreadyPaid => f.write_str("Job posting has already been paid for"),
        }
    }
}

/// An action together with the resource it targets. Reading a job needs no
/// decision: anyone may view one.
///
/// Ownership-scoped actions take an `Option`: a resource that does not exist
/// has no owner, so the decision is `NotOwner` for everyone.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreateJob,
    UpdateJob(Option<&'a Job>),
    DeleteJob(Option<&'a Job>),
    PublishJob(Option<&'a Job>),
    ApplyToJob {
        job: &'a Job,
        already_applied: bool,
        now: DateTime<Utc>,
    },
    ViewApplications(Option<&'a Job>),
    /// `job` is the job the application points at, if it still exists.
    ViewApplication {
        application: Option<&'a Application>,
        job: Option<&'a Job>,
    },
    UpdateApplicationStatus {
        application: Option<&'a Application>,
        job: Option<&'a Job>,
    },
    PayForJob(Option<&'a Job>),
    ViewPayment(Option<&'a Payment>),
    ReadNotification(Option<&'a Notification>),
}

impl Action<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateJob => "create_job",
            Action::UpdateJob(_) => "update_job",
            Action::DeleteJob(_) => "delete_job",
            Action::PublishJob(_) => "publish_job",
            Action::ApplyToJob { .. } => "apply_to_job",
            Action::ViewApplications(_) => "view_applications",
            Action::ViewApplication { .. } => "view_application",
            Action::UpdateApplicationStatus { .. } => "update_application_status",
            Action::PayForJob(_) => "pay_for_job",
            Action::ViewPayment(_) => "view_payment",
            Action::ReadNotification(_) => "read_notification",
        }
    }
}

pub struct Policy;

impl Policy {
    pub fn can(actor: &Actor, action: Action<'_>) -> Result<(), Denial> {
        let decision = Self::decide(actor, action);
        if let Err(denial) = decision {
            tracing::debug!(
                actor_id = %actor.id,
                action = action.name(),
                reason = denial.code(),
                "policy denied action"
            );
        }
        decision
    }

    fn decide(actor: &Actor, action: Action<'_>) -> Result<(), Denial> {
        match action {
            Action::CreateJob => require_role(actor, Role::Employer),
            Action::UpdateJob(job) | Action::DeleteJob(job) | Action::ViewApplications(job) => {
                require_job_owner(actor, job)
            }
            Action::PublishJob(job) => {
                require_job_owner(actor, job)?;
                match job {
                    Some(job) if job.is_paid() => Ok(()),
                    _ => Err(Denial::PaymentRequired),
                }
            }
            Action::ApplyToJob {
                job,
                already_applied,
                now,
            } => {
                // Expiry is reported first whatever the caller's role.
                if job.deadline_passed(now) {
                    return Err(Denial::DeadlinePassed);
                }
                require_role(actor, Role::JobSeeker)?;
                if job.status != JobStatus::Published {
                    return Err(Denial::JobNotPublished);
                }
                if already_applied {
                    return Err(Denial::DuplicateApplication);
                }
                Ok(())
            }
            Action::ViewApplication { application, job } => match application {
                Some(app) if app.applicant_id == actor.id => Ok(()),
                Some(_) => require_job_owner(actor, job),
                None => Err(Denial::NotOwner),
            },
            Action::UpdateApplicationStatus { application, job } => match application {
                Some(_) => require_job_owner(actor, job),
                None => Err(Denial::NotOwner),
            },
            Action::PayForJob(job) => {
                require_job_owner(actor, job)?;
                match job {
                    Some(job) if job.is_paid() => Err(Denial::AlreadyPaid),
                    _ => Ok(()),
                }
            }
            Action::ViewPayment(payment) => match payment {
                Some(payment) if payment.payer_id == actor.id => Ok(()),
                _ => Err(Denial::NotOwner),
            },
            Action::ReadNotification(notification) => match notification {
                Some(n) if n.recipient_id == actor.id => Ok(()),
                _ => Err(Denial::NotOwner),
            },
        }
    }
}

fn require_role(actor: &Actor, role: Role) -> Result<(), Denial> {
    if actor.role == role {
        Ok(())
    } else {
        Err(Denial::RoleRequired(role))
    }
}

fn require_job_owner(actor: &Actor, job: Option<&Job>) -> Result<(), Denial> {
    match job {
        Some(job) if job.is_owned_by(actor.id) => Ok(()),
        _ => Err(Denial::NotOwner),
    }
}
