//! Notifications sent when a quote request comes in.
//!
//! Delivery is someone else's problem; this crate only needs a place to hand
//! the new record to. Failures are reported back so the caller can log them.

use log::info;

use crate::error::NotifyError;
use crate::model::QuoteRequest;

pub trait Notifier: Send + Sync {
    /// Tell the business owner about a new quote request
    fn notify_owner(&self, quote: &QuoteRequest) -> Result<(), NotifyError>;

    /// Acknowledge the request to the person who sent it
    fn notify_requester(&self, quote: &QuoteRequest) -> Result<(), NotifyError>;
}

pub fn owner_subject(quote: &QuoteRequest) -> String {
    format!(
        "New Quote Request • {} • {} {}",
        quote.service_type.label(),
        quote.first_name,
        quote.last_name
    )
}

pub fn requester_subject() -> &'static str {
    "Thanks for your quote request"
}

/// Notifier that only writes what it would have sent to the log
pub struct LogNotifier {
    owner_address: String,
}

impl LogNotifier {
    pub fn new(owner_address: impl Into<String>) -> Self {
        Self {
            owner_address: owner_address.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify_owner(&self, quote: &QuoteRequest) -> Result<(), NotifyError> {
        info!(
            "Notify owner <{}>: {} (image: {})",
            self.owner_address,
            owner_subject(quote),
            quote.image.as_ref().map(|f| f.file_name()).unwrap_or("-")
        );
        Ok(())
    }

    fn notify_requester(&self, quote: &QuoteRequest) -> Result<(), NotifyError> {
        if quote.email.trim().is_empty() {
            return Err(NotifyError(format!("quote {} has no email address", quote.id)));
        }
        info!("Notify requester <{}>: {}", quote.email, requester_subject());
        Ok(())
    }
}
