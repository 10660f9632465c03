use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox},
    Address, Message,
};

pub const SENDER_ADDRESS: &str = "register@muasica.ly";
pub const SENDER_NAME: &str = "MUAS-i-Caly Team";

/// A single HTML email from the fixed sender to one recipient
///
/// Only [`OutboundMessage::new`] can make one, so the sender cannot be swapped:
///
/// ```compile_fail
/// use lettre::message::Mailbox;
/// use mail_dispatch::OutboundMessage;
///
/// let mut message = OutboundMessage::new("a@b.com", "<p>hi</p>", "Hello").unwrap();
/// message.from = "Someone Else <else@example.org>".parse::<Mailbox>().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    from: Mailbox,
    to: Mailbox,
    subject: String,
    html_body: String,
}

impl OutboundMessage {
    /// Fails if `recipient` cannot be parsed as a mailbox (`a@b.com` or `Name <a@b.com>`)
    pub fn new(recipient: &str, content: &str, subject: &str) -> anyhow::Result<Self> {
        let to = recipient
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address: {recipient:?}"))?;
        Ok(Self {
            from: sender()?,
            to,
            subject: subject.to_string(),
            html_body: content.to_string(),
        })
    }

    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    pub fn to(&self) -> &Mailbox {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    pub fn build(self) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.from)
            .to(self.to)
            .subject(self.subject)
            .header(ContentType::TEXT_HTML)
            .body(self.html_body)
            .context("Failed to build email message")
    }
}

fn sender() -> anyhow::Result<Mailbox> {
    let email = SENDER_ADDRESS
        .parse::<Address>()
        .with_context(|| format!("Invalid sender address: {SENDER_ADDRESS:?}"))?;
    Ok(Mailbox::new(Some(SENDER_NAME.to_string()), email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::address::AddressError;
    use rstest::rstest;

    #[test]
    fn sender_is_fixed() {
        // Act
        let actual = OutboundMessage::new("a@b.com", "<p>hi</p>", "Hello").unwrap();

        // Assert
        assert_eq!(actual.from().name.as_deref(), Some("MUAS-i-Caly Team"));
        assert_eq!(actual.from().email.to_string(), "register@muasica.ly");
        assert_eq!(actual.to().email.to_string(), "a@b.com");
        assert_eq!(actual.subject(), "Hello");
        assert_eq!(actual.html_body(), "<p>hi</p>");
    }

    #[rstest]
    #[case("a@b.com", "a@b.com")]
    #[case("Someone <someone@example.org>", "someone@example.org")]
    fn recipient_forms(#[case] recipient: &str, #[case] expected: &str) {
        let actual = OutboundMessage::new(recipient, "", "").unwrap();
        assert_eq!(actual.to().email.to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("not an address")]
    #[case("missing-domain@")]
    #[case("@missing-user.com")]
    fn bad_recipient_is_address_error(#[case] recipient: &str) {
        let err = OutboundMessage::new(recipient, "<p>hi</p>", "Hello").unwrap_err();
        assert!(err.downcast_ref::<AddressError>().is_some(), "{err:?}");
    }

    #[test]
    fn built_message_is_html_to_single_recipient() {
        // Arrange
        let outbound = OutboundMessage::new("a@b.com", "<p>hi</p>", "Hello").unwrap();

        // Act
        let message = outbound.build().unwrap();

        // Assert
        let envelope = message.envelope();
        assert_eq!(
            envelope.to(),
            ["a@b.com".parse::<Address>().unwrap()].as_slice()
        );
        assert_eq!(
            envelope.from(),
            Some(&"register@muasica.ly".parse::<Address>().unwrap())
        );
        assert_eq!(
            message.headers().get::<ContentType>(),
            Some(ContentType::TEXT_HTML)
        );
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Subject: Hello"), "{formatted}");
        assert!(formatted.contains("<p>hi</p>"), "{formatted}");
        assert!(formatted.contains("register@muasica.ly"), "{formatted}");
    }
}
