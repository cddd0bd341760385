use async_trait::async_trait;
use chrono::Utc;
use derive_more::Display;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
#[cfg(test)]
use mockall::automock;
use rand::Rng;

use crate::settings::{MailSettings, RelaySettings};

/// One endpoint of a message. The display name is kept separate from the
/// address so the transport can encode it safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailParty {
    pub name: Option<String>,
    pub address: String,
}

impl MailParty {
    pub fn named(name: impl Into<String>, address: impl Into<String>) -> Self {
        MailParty {
            name: Some(name.into()),
            address: address.into(),
        }
    }

    pub fn bare(address: impl Into<String>) -> Self {
        MailParty {
            name: None,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: MailParty,
    pub to: MailParty,
    pub reply_to: MailParty,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Display)]
pub enum MailerError {
    #[display("mail relay is not configured")]
    NotConfigured,

    #[display("invalid mail address: {_0}")]
    Address(String),

    #[display("message could not be built: {_0}")]
    Build(String),

    #[display("smtp failure: {message}")]
    Smtp {
        message: String,
        code: Option<u16>,
    },
}

impl MailerError {
    /// SMTP status code, when the relay reported one. The diagnostic
    /// endpoint forwards this to the operator.
    pub fn smtp_code(&self) -> Option<u16> {
        match self {
            MailerError::Smtp { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailerError::Smtp {
            code: err.status().and_then(|code| code.to_string().parse().ok()),
            message: err.to_string(),
        }
    }
}

impl From<lettre::error::Error> for MailerError {
    fn from(err: lettre::error::Error) -> Self {
        MailerError::Build(err.to_string())
    }
}

/// The outbound mail capability. The SMTP implementation below is the only
/// production one; tests substitute recording or mockall doubles.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hands one message to the relay. Returns the message id the relay
    /// accepted it under.
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError>;

    /// Checks connectivity and credentials without sending anything.
    async fn verify(&self) -> Result<(), MailerError>;
}

/// Relay-backed mailer. The transport is rebuilt per send from the
/// current settings; the relay may be unconfigured at startup and fixed
/// later without a restart.
pub struct SmtpMailer {
    mail: MailSettings,
}

impl SmtpMailer {
    pub fn new(mail: MailSettings) -> Self {
        SmtpMailer { mail }
    }

    fn transport(
        &self,
    ) -> Result<(AsyncSmtpTransport<Tokio1Executor>, RelaySettings), MailerError> {
        let relay = self.mail.relay().ok_or(MailerError::NotConfigured)?;

        let builder = if relay.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&relay.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&relay.host)?
        };
        let transport = builder
            .port(relay.port)
            .credentials(Credentials::new(
                relay.user.clone(),
                relay.pass.to_string(),
            ))
            .build();

        Ok((transport, relay))
    }

    fn mailbox(party: &MailParty) -> Result<Mailbox, MailerError> {
        let address = party
            .address
            .parse()
            .map_err(|err| MailerError::Address(format!("{}: {}", party.address, err)))?;
        Ok(Mailbox::new(party.name.clone(), address))
    }

    fn message_id(host: &str) -> String {
        let nonce: u64 = rand::thread_rng().r#gen();
        format!("<{}.{:016x}@{}>", Utc::now().timestamp_millis(), nonce, host)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let (transport, relay) = self.transport()?;

        let message_id = Self::message_id(&relay.host);
        let message = Message::builder()
            .from(Self::mailbox(&email.from)?)
            .to(Self::mailbox(&email.to)?)
            .reply_to(Self::mailbox(&email.reply_to)?)
            .subject(email.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        transport.send(message).await?;
        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), MailerError> {
        let (transport, _) = self.transport()?;
        match transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailerError::Smtp {
                message: "relay closed the connection during the handshake".to_string(),
                code: None,
            }),
            Err(err) => Err(err.into()),
        }
    }
}
