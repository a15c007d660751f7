//! The production transport: one SMTP transaction per delivery attempt.

use std::{future::Future, time::Duration};

use async_trait::async_trait;

use crate::{config::RelayConfig, dispatch::DispatchJob, error::DeliveryError};

use super::{
    ClientError, MessageBuilder, Response, SmtpClient, Transport, client::reject,
    error::Result as ClientResult,
};

/// Domain announced in EHLO.
const EHLO_DOMAIN: &str = "postrider.local";

/// Delivers messages through the configured relay.
///
/// Each attempt is a full transaction: greeting, EHLO, STARTTLS upgrade,
/// EHLO again, AUTH LOGIN, MAIL FROM, RCPT TO per envelope recipient, DATA,
/// QUIT. Every network operation is bounded by the configured timeouts.
#[derive(Debug, Clone)]
pub struct SmtpRelayTransport {
    relay: RelayConfig,
}

impl SmtpRelayTransport {
    #[must_use]
    pub const fn new(relay: RelayConfig) -> Self {
        Self { relay }
    }

    async fn transact(&self, job: &DispatchJob, payload: String) -> ClientResult<()> {
        let timeouts = self.relay.timeouts;

        let mut client = timed(
            timeouts.connect_secs,
            "connect",
            SmtpClient::connect(&self.relay.address(), self.relay.host.clone()),
        )
        .await?
        .accept_invalid_certs(self.relay.accept_invalid_certs);

        expect_success(timed(timeouts.command_secs, "greeting", client.read_greeting()).await?)?;
        expect_success(timed(timeouts.command_secs, "EHLO", client.ehlo(EHLO_DOMAIN)).await?)?;

        if self.relay.starttls {
            expect_success(timed(timeouts.command_secs, "STARTTLS", client.starttls()).await?)?;
            // The session state resets after the TLS upgrade.
            expect_success(timed(timeouts.command_secs, "EHLO", client.ehlo(EHLO_DOMAIN)).await?)?;
        }

        timed(
            timeouts.command_secs,
            "AUTH",
            client.auth_login(&job.sender.email, job.sender.credential.expose()),
        )
        .await?;

        expect_success(
            timed(
                timeouts.command_secs,
                "MAIL FROM",
                client.mail_from(&job.sender.email),
            )
            .await?,
        )?;

        for recipient in job.request.envelope_recipients() {
            expect_success(
                timed(timeouts.command_secs, "RCPT TO", client.rcpt_to(recipient)).await?,
            )?;
        }

        let go_ahead = timed(timeouts.command_secs, "DATA", client.data()).await?;
        if go_ahead.code != 354 {
            return Err(reject(go_ahead));
        }

        expect_success(timed(timeouts.data_secs, "payload", client.send_data(&payload)).await?)?;

        // Best-effort goodbye; the message is already accepted.
        let _ = timed(timeouts.command_secs, "QUIT", client.quit()).await;

        Ok(())
    }
}

#[async_trait]
impl Transport for SmtpRelayTransport {
    async fn deliver(&self, job: &DispatchJob) -> Result<(), DeliveryError> {
        let mut builder = MessageBuilder::new()
            .from(job.sender.from_header())
            .to(job.request.recipient())
            .subject(job.request.subject())
            .html(job.request.is_html())
            .body(job.request.body());

        if let Some(cc) = job.request.cc() {
            builder = builder.cc(cc);
        }

        self.transact(job, builder.build()).await?;
        Ok(())
    }
}

/// Bounds a client operation with a timeout.
async fn timed<T>(
    secs: u64,
    operation: &str,
    future: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    match tokio::time::timeout(Duration::from_secs(secs), future).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(operation.to_string())),
    }
}

/// Requires a 2xx response, converting anything else into an error.
fn expect_success(response: Response) -> ClientResult<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(reject(response))
    }
}
