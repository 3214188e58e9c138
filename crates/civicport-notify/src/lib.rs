//! Civicport Notify - Outbound notification dispatch and QR confirmations

pub mod channel;
pub mod dispatch;
pub mod email;
pub mod qr;
pub mod sms;
pub mod templates;

pub use channel::{Notification, NotificationChannel, NotificationKind};
pub use dispatch::{ChannelOutcome, DispatchReport, Dispatcher};
pub use email::EmailChannel;
pub use qr::QrPayload;
pub use sms::SmsChannel;
