use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{bulletin::Email, prelude::*};

/// SMTP connection settings.
#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,

    /// Use STARTTLS instead of the implicit TLS.
    pub starttls: bool,

    /// Defaults to the sender address.
    pub username: Option<String>,

    pub password: String,
    pub from: String,
    pub to: String,
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Mailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address: `{}`", settings.from))?;
        let to: Mailbox = settings
            .to
            .parse()
            .with_context(|| format!("invalid recipient address: `{}`", settings.to))?;
        let credentials = Credentials::new(
            settings.username.clone().unwrap_or_else(|| from.email.to_string()),
            settings.password.clone(),
        );
        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        }
        .with_context(|| format!("failed to create SMTP relay: `{}`", settings.host))?;
        let transport = builder.port(settings.port).credentials(credentials).build();
        Ok(Self { transport, from, to })
    }

    #[instrument(skip_all, fields(subject = %email.subject))]
    pub async fn send(&self, email: &Email) -> Result {
        info!(to = %self.to, "sending…");
        let message = self.build_message(email)?;
        self.transport.send(message).await.context("failed to send the email")?;
        info!("sent");
        Ok(())
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&email.subject);
        let message = if email.attachments.is_empty() {
            builder.header(ContentType::TEXT_PLAIN).body(email.body.clone())
        } else {
            let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(email.body.clone()));
            for attachment in &email.attachments {
                let content_type = ContentType::parse(attachment.content_type)
                    .with_context(|| format!("invalid content type: `{}`", attachment.content_type))?;
                parts = parts.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder.multipart(parts)
        };
        message.context("failed to build the email message")
    }
}
