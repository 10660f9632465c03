mod config;
mod mailer;
mod message;

use std::sync::OnceLock;

pub use config::{ConfigLoader, MailConfig, DEFAULT_CONFIG_PATH};
pub use mailer::{Connector, MailDispatcher, SmtpConnector};
pub use message::{OutboundMessage, SENDER_ADDRESS, SENDER_NAME};

/// Sends an HTML email using the settings in [`DEFAULT_CONFIG_PATH`]
///
/// The settings are read on the first call that finds them and kept for the
/// rest of the process. Nothing is reported back, failures only show up in
/// the log.
pub fn send_mail(recipient: &str, content: &str, subject: &str) {
    static DISPATCHER: OnceLock<MailDispatcher> = OnceLock::new();
    DISPATCHER
        .get_or_init(|| MailDispatcher::new(ConfigLoader::default()))
        .send(recipient, content, subject);
}
