//! Outbound mail. SMTP delivery lives outside this crate; handlers only
//! build the message and hand it to a [`Mailer`].

use tracing::info;

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub sender: String,
    /// Public URL reset links point at.
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetEmail {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl ResetEmail {
    pub const SUBJECT: &'static str = "[Microblog] Password Reset Request";

    pub fn new(config: &MailConfig, username: &str, email: &str, token: &str) -> Self {
        let link = format!(
            "{}/reset_password?token={}",
            config.base_url.trim_end_matches('/'),
            token
        );

        let text_body = format!(
            "Dear {username},\n\n\
             To reset your password click on the following link:\n\n\
             {link}\n\n\
             If you have not requested a password reset simply ignore this message.\n\n\
             Sincerely,\n\nThe Microblog Team\n"
        );
        let html_body = format!(
            "<p>Dear {username},</p>\
             <p>To reset your password <a href=\"{link}\">click here</a>.</p>\
             <p>Alternatively, you can paste the following link in your browser's address bar:</p>\
             <p>{link}</p>\
             <p>If you have not requested a password reset simply ignore this message.</p>\
             <p>Sincerely,</p><p>The Microblog Team</p>"
        );

        Self {
            sender: config.sender.clone(),
            recipients: vec![email.to_string()],
            subject: Self::SUBJECT.to_string(),
            text_body,
            html_body,
        }
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &ResetEmail) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of delivering it.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &ResetEmail) -> anyhow::Result<()> {
        info!(
            "Mail from {} to {:?}: {}\n{}",
            mail.sender, mail.recipients, mail.subject, mail.text_body
        );
        Ok(())
    }
}
