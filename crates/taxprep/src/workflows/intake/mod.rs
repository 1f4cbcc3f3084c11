//! Form-intake workflow backing the collection webhook: worksheet append,
//! SMS notification outbox, and inbound auto-replies.

mod notify;
mod router;
mod service;
mod store;

pub use notify::{
    default_auto_replies, match_auto_reply, render_template, AutoReplyRule, DispatchSummary,
    FormFilter, InboundEntry, InboundLog, InboundSms, NotificationRule, OutboxMessage,
    OutboxStatus, SmsError, SmsGateway, SmsOutbox, SmsReceipt,
};
pub use router::{intake_router, IntakeState};
pub use service::{IntakeError, IntakeReceipt, IntakeService};
pub use store::{SheetStore, StoreError};
