//! Chat Completions request/response shapes shared by OpenAI-compatible providers

use idea_validator_domain::{AnalyzeError, BinaryAttachment, CanonicalRequest, ResponseFormat};
use serde::Serialize;
use serde_json::Value;

use super::{GenerationSettings, to_payload};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonObjectFormat>,
}

#[derive(Serialize)]
struct JsonObjectFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

/// Build a `/chat/completions` body
///
/// `json_mode` controls whether `Json` requests carry `response_format`.
pub fn chat_completions_payload(
    request: &CanonicalRequest,
    user_text: &str,
    image: Option<BinaryAttachment<'_>>,
    settings: &GenerationSettings,
    json_mode: bool,
) -> Result<Value, AnalyzeError> {
    let user_content = match image {
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text { text: user_text },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", image.mime_type, image.data),
                },
            },
        ]),
        None => MessageContent::Text(user_text),
    };

    let body = ChatCompletionRequest {
        model: &request.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(&request.system_prompt),
            },
            ChatMessage {
                role: "user",
                content: user_content,
            },
        ],
        temperature: settings.temperature,
        max_tokens: settings.max_output_tokens,
        response_format: (json_mode && request.response_format == ResponseFormat::Json)
            .then_some(JsonObjectFormat {
                kind: "json_object",
            }),
    };

    to_payload(&body)
}

/// First choice's message content; array content is joined from its text parts
pub fn extract_choice_text(body: &Value) -> String {
    match body.pointer("/choices/0/message/content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idea_validator_domain::{AttachmentKind, Provider};
    use secrecy::SecretString;
    use serde_json::json;

    fn request(format: ResponseFormat) -> CanonicalRequest {
        CanonicalRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            attachment: None,
            provider: Provider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: SecretString::new("sk".into()),
            response_format: format,
        }
    }

    #[test]
    fn test_text_only_message() {
        let payload = chat_completions_payload(
            &request(ResponseFormat::Text),
            "user",
            None,
            &GenerationSettings::default(),
            true,
        )
        .unwrap();

        assert_eq!(
            payload["messages"],
            json!([
                {"role": "system", "content": "system"},
                {"role": "user", "content": "user"}
            ])
        );
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_image_becomes_data_url() {
        let image = BinaryAttachment {
            kind: AttachmentKind::Image,
            mime_type: "image/jpeg",
            data: "/9j/4AAQ",
        };
        let payload = chat_completions_payload(
            &request(ResponseFormat::Json),
            "user",
            Some(image),
            &GenerationSettings::default(),
            true,
        )
        .unwrap();

        let content = &payload["messages"][1]["content"];
        assert_eq!(content[0], json!({"type": "text", "text": "user"}));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/4AAQ");
        assert_eq!(payload["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_extract_choice_text() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(extract_choice_text(&body), "hi");

        let parts = json!({"choices": [{"message": {"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]}}]});
        assert_eq!(extract_choice_text(&parts), "ab");

        let refusal = json!({"choices": [{"message": {"content": null, "refusal": "no"}}]});
        assert_eq!(extract_choice_text(&refusal), "");
    }
}
