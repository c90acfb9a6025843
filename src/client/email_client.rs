use std::time::Duration;

use anyhow::Context;

use futures::{future, StreamExt};

use reqwest::Client;

use serde::Serialize;

use secrecy::Secret;

use url::Url;

use crate::domain::EmailAddress;

/// REST client for a Resend-compatible transactional email API
#[derive(Debug)]
pub struct EmailClient {
    client: Client,
    sender: String,

    api_send_email_url: Url,
    api_auth_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        sender: EmailAddress,
        sender_name: Option<&str>,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_send_email_url = api_base_url
            .join("emails")
            .context("Failed to create send email endpoint URL")?;

        let sender = match sender_name {
            Some(name) => format!("{} <{}>", name, sender),
            None => sender.to_string(),
        };

        Ok(Self {
            client,
            sender,
            api_send_email_url,
            api_auth_token,
        })
    }

    #[tracing::instrument(name = "Send an email via API", skip(self, email), fields(subject = %email.subject))]
    pub async fn send(&self, recipient: &EmailAddress, email: &Email) -> reqwest::Result<()> {
        use secrecy::ExposeSecret;

        let body = email.as_request(&self.sender, recipient);

        self.client
            .post(self.api_send_email_url.clone())
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Send the same email to every recipient, one request each, with at most
    /// `max_in_flight` requests outstanding. A failed send is logged and does
    /// not stop the others. Returns how many sends succeeded.
    #[tracing::instrument(name = "Broadcast an email", skip(self, recipients, email), fields(subject = %email.subject))]
    pub async fn broadcast(
        &self,
        recipients: &[EmailAddress],
        email: &Email,
        max_in_flight: usize,
    ) -> usize {
        futures::stream::iter(recipients)
            .map(|recipient| async move {
                let result = self.send(recipient, email).await;
                if let Err(error) = &result {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Failed to deliver email to {}",
                        recipient
                    );
                }
                result
            })
            .buffer_unordered(max_in_flight.max(1))
            .filter(|result| future::ready(result.is_ok()))
            .count()
            .await
    }
}

/// Rendered email content, independent of the recipient
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Email {
    fn as_request<'e>(&'e self, sender: &'e str, recipient: &'e EmailAddress) -> SendEmailRequest<'e> {
        SendEmailRequest {
            from: sender,
            to: [recipient.as_ref()],
            subject: &self.subject,
            html: &self.html_body,
            text: &self.text_body,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}
