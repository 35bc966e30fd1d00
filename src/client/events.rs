//! Wire event types for the upstream realtime protocol.
//!
//! All events are JSON objects with a `type` discriminant, sent as WebSocket
//! text frames. The server vocabulary is open-ended: tags this module does
//! not enumerate deserialize into [`ServerEvent::Unknown`] and are never
//! fatal.
//!
//! Client events (sent upstream):
//! - conversation.item.create - add a user message to the conversation
//! - response.create - ask the model to generate a response
//!
//! Server events (received):
//! - session.created / session.updated - session lifecycle, informational
//! - response.created / rate_limits.updated / conversation.item.created /
//!   response.output_item.added / response.output_item.done /
//!   response.content_part.added / response.content_part.done - informational
//! - response.text.delta / response.text.done - incremental text
//! - response.audio_transcript.delta / response.audio_transcript.done -
//!   incremental transcript of the spoken response
//! - response.audio.delta / response.audio.done - base64 audio fragments
//! - response.done - response complete
//! - error - upstream error report

use serde::{Deserialize, Serialize};

// =============================================================================
// Server Events (received from upstream)
// =============================================================================

/// Server events received over the upstream event stream.
///
/// Fields beyond the discriminant and the deltas this crate consumes are
/// carried opaquely or omitted; deserialization tolerates their absence.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Opaque session payload
        #[serde(default)]
        session: serde_json::Value,
    },

    /// Session configuration updated
    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: serde_json::Value,
    },

    /// Response generation started
    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: serde_json::Value,
    },

    /// Rate limit information
    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated {
        #[serde(default)]
        rate_limits: serde_json::Value,
    },

    /// Item added to the conversation
    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated {
        #[serde(default)]
        item: serde_json::Value,
    },

    /// Output item added to the response
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        #[serde(default)]
        item: serde_json::Value,
    },

    /// Output item complete
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        #[serde(default)]
        item: serde_json::Value,
    },

    /// Content part added
    #[serde(rename = "response.content_part.added")]
    ContentPartAdded {
        #[serde(default)]
        part: serde_json::Value,
    },

    /// Content part complete
    #[serde(rename = "response.content_part.done")]
    ContentPartDone {
        #[serde(default)]
        part: serde_json::Value,
    },

    /// Incremental text fragment
    #[serde(rename = "response.text.delta")]
    TextDelta {
        /// Text fragment to append
        #[serde(default)]
        delta: Option<String>,
    },

    /// Text stream complete
    #[serde(rename = "response.text.done")]
    TextDone {
        /// Full text, when the server includes it
        #[serde(default)]
        text: Option<String>,
    },

    /// Incremental audio transcript fragment
    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    /// Audio transcript complete
    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        /// Full transcript, when the server includes it
        #[serde(default)]
        transcript: Option<String>,
    },

    /// Base64-encoded audio fragment
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    /// Audio stream complete
    #[serde(rename = "response.audio.done")]
    AudioDone,

    /// Response complete
    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: serde_json::Value,
    },

    /// Upstream error report
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: serde_json::Value,
    },

    /// Any tag this crate does not recognize; tolerated, never fatal
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Client Events (sent upstream)
// =============================================================================

/// Client events sent to the upstream endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Add an item to the conversation
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ConversationItem,
    },

    /// Ask the model to generate a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },
}

/// A conversation item carried by `conversation.item.create`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationItem {
    /// Item type (always "message" here)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Item role (user, assistant, system)
    pub role: String,
    /// Content parts
    pub content: Vec<ContentPart>,
}

/// One content part of a conversation item.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPart {
    /// Content type (input_text or input_audio)
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded audio content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Configuration carried by `response.create`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseConfig {
    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    /// System instructions for this response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Output audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    /// Tool definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    /// Tool choice strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i64>,
}

impl ClientEvent {
    /// A `conversation.item.create` carrying one user text message.
    pub fn user_text(text: &str) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem {
                item_type: "message".to_string(),
                role: "user".to_string(),
                content: vec![ContentPart {
                    content_type: "input_text".to_string(),
                    text: Some(text.to_string()),
                    audio: None,
                }],
            },
        }
    }

    /// A `conversation.item.create` carrying one user audio message.
    pub fn user_audio(pcm16: &[u8]) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem {
                item_type: "message".to_string(),
                role: "user".to_string(),
                content: vec![ContentPart {
                    content_type: "input_audio".to_string(),
                    text: None,
                    audio: Some(super::codec::encode_base64(pcm16)),
                }],
            },
        }
    }

    /// A `response.create` requesting text and audio output.
    pub fn create_response() -> Self {
        ClientEvent::ResponseCreate {
            response: Some(ResponseConfig {
                modalities: Some(vec!["text".to_string(), "audio".to_string()]),
                ..Default::default()
            }),
        }
    }

    /// A `response.create` with text modality and inline instructions.
    pub fn response_with_instructions(instructions: &str) -> Self {
        ClientEvent::ResponseCreate {
            response: Some(ResponseConfig {
                modalities: Some(vec!["text".to_string()]),
                instructions: Some(instructions.to_string()),
                ..Default::default()
            }),
        }
    }
}
