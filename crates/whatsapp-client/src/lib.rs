//! WhatsApp Web gateway REST client.

mod client;
mod error;
mod receiver;
mod types;

pub use client::WhatsAppClient;
pub use error::WhatsAppError;
pub use receiver::MessageReceiver;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_test_client(mock_server: &MockServer) -> WhatsAppClient {
        WhatsAppClient::new(mock_server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_api_token_sent_as_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/session"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "CONNECTED",
                "me": "56900000000@c.us"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server)
            .await
            .with_api_token(SecretString::new("s3cret".into()));
        let status = assert_ok!(client.session_status().await);

        assert!(status.is_connected());
        assert_eq!(status.me.as_deref(), Some("56900000000@c.us"));
    }

    #[tokio::test]
    async fn test_receive_messages() {
        let mock_server = MockServer::start().await;

        let messages = serde_json::json!([
            {
                "id": "false_56912345678@c.us_3EB0AAA",
                "from": "56912345678@c.us",
                "notifyName": "Test User",
                "body": "!menu",
                "timestamp": 1700000000,
                "type": "chat"
            },
            {
                "id": "false_120363@g.us_3EB0BBB",
                "from": "120363@g.us",
                "author": "56987654321@c.us",
                "body": "mira esto",
                "timestamp": 1700000001,
                "isGroup": true,
                "hasMedia": true,
                "type": "image",
                "quotedMsg": {
                    "id": "false_120363@g.us_3EB0CCC",
                    "body": "original",
                    "type": "sticker",
                    "hasMedia": true,
                    "isAnimated": true
                }
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&messages))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let msgs = assert_ok!(client.receive().await);

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].from.as_deref(), Some("56912345678@c.us"));
        assert_eq!(msgs[0].notify_name.as_deref(), Some("Test User"));
        assert_eq!(msgs[0].message_type, "chat");
        assert!(!msgs[0].from_me);
        assert!(msgs[0].mentioned_ids.is_empty());

        assert!(msgs[1].is_group);
        assert_eq!(msgs[1].author.as_deref(), Some("56987654321@c.us"));
        let quoted = msgs[1].quoted_msg.as_ref().unwrap();
        assert_eq!(quoted.message_type, "sticker");
        assert!(quoted.is_animated);
    }

    #[tokio::test]
    async fn test_receive_not_connected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(409).set_body_string("pairing required"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let result = client.receive().await;

        assert!(matches!(result, Err(WhatsAppError::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_text_with_quote() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages/text"))
            .and(body_json(serde_json::json!({
                "chatId": "56912345678@c.us",
                "text": "Hola!",
                "quotedMessageId": "msg-1"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "sent-1" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let request = SendTextRequest {
            chat_id: "56912345678@c.us".into(),
            text: "Hola!".into(),
            quoted_message_id: Some("msg-1".into()),
            mentions: vec![],
        };
        let response = assert_ok!(client.send_text(&request).await);

        assert_eq!(response.id.as_deref(), Some("sent-1"));
    }

    #[tokio::test]
    async fn test_send_text_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages/text"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid chat"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let request = SendTextRequest {
            chat_id: "nope".into(),
            text: "Hola!".into(),
            quoted_message_id: None,
            mentions: vec![],
        };
        let result = client.send_text(&request).await;

        assert!(matches!(result, Err(WhatsAppError::SendFailed(ref msg)) if msg == "Invalid chat"));
    }

    #[tokio::test]
    async fn test_send_sticker() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages/media"))
            .and(body_json(serde_json::json!({
                "chatId": "120363@g.us",
                "media": { "mimetype": "image/webp", "data": "AAAA" },
                "sendMediaAsSticker": true,
                "stickerAuthor": "Botillero",
                "stickerName": "Creado por Botillero"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let request = SendMediaRequest {
            chat_id: "120363@g.us".into(),
            media: MediaPayload {
                mimetype: "image/webp".into(),
                data: "AAAA".into(),
                filename: None,
            },
            caption: None,
            quoted_message_id: None,
            mentions: vec![],
            send_media_as_sticker: true,
            sticker_author: Some("Botillero".into()),
            sticker_name: Some("Creado por Botillero".into()),
        };

        // Empty body still counts as a successful send
        let response = assert_ok!(client.send_media(&request).await);
        assert!(response.id.is_none());
    }

    #[tokio::test]
    async fn test_react_failure_is_reaction_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages/msg-1/reaction"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let result = client.react("msg-1", "⏳").await;

        assert!(matches!(result, Err(WhatsAppError::ReactionFailed(_))));
        assert!(result.unwrap_err().to_string().starts_with("Reaction send error"));
    }

    #[tokio::test]
    async fn test_download_media_missing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/msg-9/media"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let media = assert_ok!(client.download_media("msg-9").await);

        assert!(media.is_none());
    }

    #[tokio::test]
    async fn test_download_media() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/messages/msg-2/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mimetype": "image/jpeg",
                "data": "/9j/4AAQ",
                "filename": "foto.jpg"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let media = assert_ok!(client.download_media("msg-2").await).unwrap();

        assert_eq!(media.mimetype, "image/jpeg");
        assert_eq!(media.filename.as_deref(), Some("foto.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_media_from_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img/gato.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png; charset=binary")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let media = assert_ok!(
            client
                .fetch_media(&format!("{}/img/gato.png?size=big", mock_server.uri()))
                .await
        );

        assert_eq!(media.mimetype, "image/png");
        assert_eq!(media.data, "AQID");
        assert_eq!(media.filename.as_deref(), Some("gato.png"));
    }

    #[tokio::test]
    async fn test_fetch_media_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let result = client
            .fetch_media(&format!("{}/missing.png", mock_server.uri()))
            .await;

        assert_err!(&result);
        assert!(matches!(result, Err(WhatsAppError::MediaUnavailable(_))));
    }
}
