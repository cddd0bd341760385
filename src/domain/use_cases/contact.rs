use std::sync::Arc;

use crate::{
    constants::{ACK_SUMMARY_CHARS, TICKET_PREFIX},
    entities::contact::{ContactForm, summarize},
    errors::ContactError,
    limiter::rate_limiter::{Decision, RateLimiterStore},
    mailer::{MailParty, Mailer, OutboundEmail},
    settings::{MailSettings, RelaySettings},
    utils::ticket,
};

const SENDER_NAME: &str = "Geonix Kontaktformular";

/// What the web layer should answer with.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { ticket: String },
    /// Honeypot tripped: pretend success, send nothing.
    Discarded,
}

/// Runs a submission through the whole pipeline: honeypot short-circuit,
/// rate limit, validation, relay configuration, ticket, admin notice,
/// acknowledgement. Every early exit maps to exactly one response.
pub struct ContactHandler {
    mailer: Arc<dyn Mailer>,
    limiter: RateLimiterStore,
    mail: MailSettings,
}

impl ContactHandler {
    pub fn new(mailer: Arc<dyn Mailer>, limiter: RateLimiterStore, mail: MailSettings) -> Self {
        ContactHandler {
            mailer,
            limiter,
            mail,
        }
    }

    pub async fn submit(
        &self,
        form: ContactForm,
        client_key: &str,
    ) -> Result<SubmitOutcome, ContactError> {
        let form = form.normalized();

        if form.is_honeypot() {
            tracing::info!(client = %client_key, "honeypot filled, dropping submission");
            return Ok(SubmitOutcome::Discarded);
        }

        if let Decision::Denied { retry_after } = self.limiter.check(client_key) {
            let secs = retry_after.as_secs_f64().ceil() as u64;
            tracing::debug!(client = %client_key, retry_after_secs = secs, "rate limited");
            return Err(ContactError::RateLimited(secs.max(1)));
        }

        form.validate()?;

        let relay = self.mail.relay().ok_or(ContactError::NotConfigured)?;
        let ticket = ticket::generate(TICKET_PREFIX);

        // Sequential on purpose: a failed admin notice means the
        // acknowledgement is never attempted, and a failed acknowledgement
        // is reported as a full failure even though the admin already has
        // the message.
        self.dispatch(admin_notice(&form, &ticket, &relay)).await?;
        self.dispatch(user_ack(&form, &ticket, &relay)).await?;

        tracing::info!(ticket = %ticket, "contact submission accepted");
        Ok(SubmitOutcome::Accepted { ticket })
    }

    async fn dispatch(&self, email: OutboundEmail) -> Result<(), ContactError> {
        match self.mailer.send(&email).await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(to = %email.to.address, error = %err, "mail dispatch failed");
                Err(err.into())
            }
        }
    }
}

/// Notification to the site owner: ticket first, then every submitted
/// field, then the message. Reply-To points at the submitter so the owner
/// can answer directly.
fn admin_notice(form: &ContactForm, ticket: &str, relay: &RelaySettings) -> OutboundEmail {
    let mut lines = vec![
        format!("Ticket: {ticket}"),
        String::new(),
        format!("Name: {}", form.name),
        format!("E-Mail: {}", form.email),
    ];
    if let Some(company) = &form.company {
        lines.push(format!("Firma: {company}"));
    }
    if let Some(website) = &form.website {
        lines.push(format!("Website: {website}"));
    }
    if let Some(phone) = &form.phone {
        lines.push(format!("Telefon: {phone}"));
    }
    lines.push(String::new());
    lines.push("Nachricht:".to_string());
    lines.push(form.message.clone());

    OutboundEmail {
        from: MailParty::named(SENDER_NAME, relay.user.clone()),
        to: MailParty::bare(relay.to.clone()),
        reply_to: MailParty {
            name: Some(form.header_name()),
            address: form.email.clone(),
        },
        subject: format!(
            "Kontaktanfrage von {} ({})",
            form.header_name(),
            form.header_email()
        ),
        body: lines.join("\n"),
    }
}

/// Acknowledgement to the submitter, German first, English below. Quotes
/// only an excerpt of the message; the full text stays with the admin
/// notice.
fn user_ack(form: &ContactForm, ticket: &str, relay: &RelaySettings) -> OutboundEmail {
    let company = form.company.as_deref().unwrap_or("-");
    let phone = form.phone.as_deref().unwrap_or("-");
    let excerpt = summarize(&form.message, ACK_SUMMARY_CHARS);
    let name = &form.name;

    let body = format!(
        "Guten Tag {name},\n\n\
         vielen Dank für Ihre Nachricht. Wir melden uns so schnell wie möglich bei Ihnen.\n\n\
         Ticket: {ticket}\n\
         Firma: {company}\n\
         Telefon: {phone}\n\n\
         Ihre Nachricht (Auszug):\n{excerpt}\n\n\
         ----------------------------------------\n\n\
         Hello {name},\n\n\
         thank you for your message. We will get back to you as soon as possible.\n\n\
         Ticket: {ticket}\n\
         Company: {company}\n\
         Phone: {phone}\n\n\
         Your message (excerpt):\n{excerpt}\n\n\
         Geonix\n"
    );

    OutboundEmail {
        from: MailParty::named(SENDER_NAME, relay.user.clone()),
        to: MailParty {
            name: Some(form.header_name()),
            address: form.email.clone(),
        },
        reply_to: MailParty::bare(relay.to.clone()),
        subject: format!("Ihre Anfrage bei Geonix ({ticket})"),
        body,
    }
}
