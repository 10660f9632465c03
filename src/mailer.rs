use std::sync::OnceLock;

use anyhow::Context;
use lettre::{transport::smtp::authentication::Credentials, SmtpTransport, Transport};
use log::{debug, error, info};

use crate::{config::ConfigLoader, MailConfig, OutboundMessage};

/// Produces the transport a message is sent over from the loaded settings
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, config: &MailConfig) -> anyhow::Result<Self::Transport>;
}

/// Authenticated SMTP with STARTTLS required before credentials are sent
///
/// Built without connection pooling, each send opens and closes its own session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpConnector;

impl Connector for SmtpConnector {
    type Transport = SmtpTransport;

    fn connect(&self, config: &MailConfig) -> anyhow::Result<SmtpTransport> {
        debug!(
            "Building SMTP transport for {}:{} as {:?}",
            config.hostname, config.port, config.username
        );
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = SmtpTransport::starttls_relay(&config.hostname)
            .with_context(|| format!("Failed to set up STARTTLS for {:?}", config.hostname))?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(transport)
    }
}

pub struct MailDispatcher<C: Connector = SmtpConnector> {
    loader: ConfigLoader,
    connector: C,
    transport: OnceLock<C::Transport>,
}

impl MailDispatcher<SmtpConnector> {
    pub fn new(loader: ConfigLoader) -> Self {
        Self::with_connector(loader, SmtpConnector)
    }
}

impl<C> MailDispatcher<C>
where
    C: Connector,
    <C::Transport as Transport>::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn with_connector(loader: ConfigLoader, connector: C) -> Self {
        Self {
            loader,
            connector,
            transport: OnceLock::new(),
        }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Sends one HTML email. Failures are logged and never reach the caller.
    pub fn send(&self, recipient: &str, content: &str, subject: &str) {
        if let Err(e) = self.try_send(recipient, content, subject) {
            error!("Failed to send {subject:?} to {recipient:?}: {e:?}");
        }
    }

    /// Does the work of [`Self::send`] but reports what went wrong
    ///
    /// No transport is built when the configuration cannot be loaded.
    pub fn try_send(&self, recipient: &str, content: &str, subject: &str) -> anyhow::Result<()> {
        let config = self.loader.load()?;
        let transport = self.transport(config)?;
        let message = OutboundMessage::new(recipient, content, subject)?.build()?;
        transport.send(&message).with_context(|| {
            format!(
                "Failed to deliver message via {}:{}",
                config.hostname, config.port
            )
        })?;
        info!("Sent {subject:?} to {recipient:?}");
        Ok(())
    }

    /// The config never changes once loaded, so neither does the transport built from it
    fn transport(&self, config: &MailConfig) -> anyhow::Result<&C::Transport> {
        if let Some(transport) = self.transport.get() {
            return Ok(transport);
        }
        let transport = self
            .connector
            .connect(config)
            .context("Failed to build mail transport")?;
        Ok(self.transport.get_or_init(|| transport))
    }
}
