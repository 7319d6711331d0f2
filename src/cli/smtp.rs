use clap::Parser;

use crate::bulletin::SmtpSettings;

#[derive(Parser)]
pub struct SmtpArgs {
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    host: Option<String>,

    #[clap(long = "smtp-port", env = "SMTP_PORT", default_value = "465")]
    port: u16,

    /// Upgrade a plain connection instead of connecting over TLS.
    #[clap(long = "smtp-starttls", env = "SMTP_STARTTLS")]
    starttls: bool,

    /// Defaults to the sender address.
    #[clap(long = "smtp-username", env = "SMTP_USERNAME")]
    username: Option<String>,

    #[clap(long = "smtp-password", env = "SMTP_PASSWORD")]
    password: Option<String>,

    #[clap(long = "email-from", env = "EMAIL_FROM")]
    from: Option<String>,

    #[clap(long = "email-to", env = "EMAIL_TO")]
    to: Option<String>,
}

impl SmtpArgs {
    /// Settings, or [`None`] when any of the required options is missing.
    pub fn settings(&self) -> Option<SmtpSettings> {
        Some(SmtpSettings {
            host: self.host.clone()?,
            port: self.port,
            starttls: self.starttls,
            username: self.username.clone(),
            password: self.password.clone()?,
            from: self.from.clone()?,
            to: self.to.clone()?,
        })
    }
}
