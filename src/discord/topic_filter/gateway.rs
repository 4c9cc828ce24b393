// Serenity implementation of the ModerationGateway port.
//
// One gateway is built per inbound message, so `delete_original` always
// refers to that message and warnings are replies to it.

use crate::core::topic_filter::{
    DeleteOutcome, EditOutcome, ModerationGateway, TopicFilterError,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

pub struct DiscordModerationGateway<'a> {
    ctx: &'a serenity::Context,
    message: &'a serenity::Message,
}

impl<'a> DiscordModerationGateway<'a> {
    pub fn new(ctx: &'a serenity::Context, message: &'a serenity::Message) -> Self {
        Self { ctx, message }
    }
}

#[async_trait]
impl ModerationGateway for DiscordModerationGateway<'_> {
    // The warning always lives in the same channel as the original
    type Warning = serenity::MessageId;

    async fn send_warning(&self, content: &str) -> Result<Self::Warning, TopicFilterError> {
        let reply = self
            .message
            .reply(self.ctx, content)
            .await
            .map_err(gateway_error)?;
        Ok(reply.id)
    }

    async fn edit_warning(
        &self,
        warning: &Self::Warning,
        content: &str,
    ) -> Result<EditOutcome, TopicFilterError> {
        let edited = self
            .message
            .channel_id
            .edit_message(
                self.ctx,
                *warning,
                serenity::EditMessage::new().content(content),
            )
            .await;

        match edited {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(e) if is_not_found(&e) => Ok(EditOutcome::WarningGone),
            Err(e) => Err(gateway_error(e)),
        }
    }

    async fn delete_original(&self) -> Result<DeleteOutcome, TopicFilterError> {
        match self.message.delete(self.ctx).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(e) if is_not_found(&e) => Ok(DeleteOutcome::AlreadyGone),
            Err(e) => Err(gateway_error(e)),
        }
    }
}

fn gateway_error(err: ::serenity::Error) -> TopicFilterError {
    TopicFilterError::Gateway(err.to_string())
}

/// Discord answers 404 (Unknown Message) when someone else deleted the
/// message first. Applies to the original and to our own warning.
fn is_not_found(err: &::serenity::Error) -> bool {
    match err {
        ::serenity::Error::Http(http_err) => {
            http_err.status_code().map(|status| status.as_u16()) == Some(404)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::serenity::http::{ErrorResponse, HttpError};

    async fn http_failure(status: u16, body: &'static str) -> ::serenity::Error {
        let response = http::Response::builder().status(status).body(body).unwrap();
        let response =
            ErrorResponse::from_response(reqwest::Response::from(response), reqwest::Method::DELETE)
                .await;
        ::serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
    }

    #[tokio::test]
    async fn test_unknown_message_is_not_found() {
        let err = http_failure(404, r#"{"code":10008,"message":"Unknown Message"}"#).await;
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_other_failures_are_real_errors() {
        let server_error = http_failure(500, r#"{"code":0,"message":"Internal"}"#).await;
        assert!(!is_not_found(&server_error));

        let missing_access = http_failure(403, r#"{"code":50001,"message":"Missing Access"}"#).await;
        assert!(!is_not_found(&missing_access));

        let no_status = ::serenity::Error::Http(HttpError::InvalidWebhook);
        assert!(!is_not_found(&no_status));
    }

    #[test]
    fn test_gateway_error_keeps_cause() {
        let err = gateway_error(::serenity::Error::Other("socket closed"));
        assert!(err.to_string().contains("socket closed"));
    }
}
