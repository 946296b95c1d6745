use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::payment_dto::{PayForJobPayload, PaymentHistoryEntry};
use crate::error::{Error, Result};
use crate::models::{
    entity_ref::EntityRef,
    notification::{NewNotification, NotificationType},
    payment::{JobPaymentSettlement, Payment, DEFAULT_CURRENCY},
    user::Actor,
};
use crate::services::notification_service::NotificationService;
use crate::services::policy::{Action, Policy};
use crate::store::{Page, Paged, Store};

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Settles a job-posting payment: records it, marks the job paid and
    /// debits the payer's wallet as one unit of work.
    pub async fn pay_for_job(
        &self,
        actor: &Actor,
        job_id: Uuid,
        payload: PayForJobPayload,
    ) -> Result<Payment> {
        if payload.amount <= Decimal::ZERO {
            return Err(Error::Invalid("Amount must be greater than zero".to_string()));
        }
        let transaction_id = payload.transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(Error::Invalid("Transaction id is required".to_string()));
        }

        let job = self.store.find_job(job_id).await?;
        Policy::can(actor, Action::PayForJob(job.as_ref()))?;

        let (payment, job) = self
            .store
            .settle_job_payment(JobPaymentSettlement {
                payer_id: actor.id,
                job_id,
                amount: payload.amount,
                currency: DEFAULT_CURRENCY.to_string(),
                transaction_id: transaction_id.to_string(),
            })
            .await?;
        tracing::info!(
            payment_id = %payment.id,
            job_id = %job.id,
            payer_id = %actor.id,
            amount = %payment.amount,
            "job posting payment settled"
        );

        self.notifications
            .emit(NewNotification {
                recipient_id: actor.id,
                notification_type: NotificationType::Payment,
                title: "Payment Successful".to_string(),
                message: format!(
                    "Your payment of {} {} for job \"{}\" was successful",
                    payment.amount, payment.currency, job.title
                ),
                related: EntityRef::Payment(payment.id),
            })
            .await;

        Ok(payment)
    }

    pub async fn history(&self, actor: &Actor, page: Page) -> Result<Paged<PaymentHistoryEntry>> {
        let payments = self.store.list_payments(actor.id, page).await?;
        let mut items = Vec::with_capacity(payments.items.len());
        for payment in payments.items {
            let title = self.target_title(payment.target).await?;
            items.push(PaymentHistoryEntry::new(payment, title));
        }
        Ok(Paged {
            items,
            total: payments.total,
            page: payments.page,
        })
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Payment> {
        let payment = self.store.find_payment(id).await?;
        Policy::can(actor, Action::ViewPayment(payment.as_ref()))?;
        payment.ok_or_else(|| Error::NotFound("Payment not found".to_string()))
    }

    async fn target_title(&self, target: EntityRef) -> Result<Option<String>> {
        Ok(match target {
            EntityRef::Job(id) => self.store.find_job(id).await?.map(|j| j.title),
            EntityRef::User(id) => self.store.find_user(id).await?.map(|u| u.username),
            EntityRef::Application(id) => match self.store.find_application(id).await? {
                Some(app) => self.store.find_job(app.job_id).await?.map(|j| j.title),
                None => None,
            },
            EntityRef::Payment(_) => None,
        })
    }
}
