//! Native payloads of each supported engine
//!
//! These types mirror the shape of the objects each engine hands to its callbacks, reduced
//! to the fields the instrumentation reads. Every field has a default so that payloads with
//! missing data still deserialize; extraction decides what to do with the gaps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four kinds of event an engine reports, over that engine's payload types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent<Req, Resp, Call, Res> {
    ModelRequest(Req),
    ModelResponse(Resp),
    ToolCall(Call),
    ToolResult(Res),
}

/// `prompt_tokens`/`completion_tokens` usage block shared by chat-completion style APIs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// `{role, content}` message shared by several engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMessage {
    pub role: String,
    pub content: Option<String>,
}

impl RoleMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
        }
    }
}

/// Tool arguments of a call that reported none
fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// `{name, arguments}` function reference inside a tool call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionRef {
    pub name: Option<String>,
    pub arguments: Value,
}

pub mod agno {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelRequest {
        pub messages: Vec<Message>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Message {
        pub role: String,
        pub content: Value,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelResponse {
        pub assistant_message: Option<AssistantMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AssistantMessage {
        pub content: Option<String>,
        pub tool_calls: Vec<ToolCallEntry>,
        pub metrics: Option<MessageMetrics>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCallEntry {
        pub function: FunctionRef,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct MessageMetrics {
        pub input_tokens: Option<u64>,
        pub output_tokens: Option<u64>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Function {
        pub name: String,
        pub description: Option<String>,
    }

    /// Agno passes the same function call object before and after execution
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FunctionCall {
        pub function: Function,
        pub arguments: Option<Value>,
        pub call_id: Option<String>,
        pub result: Value,
    }

    pub type Event = EngineEvent<ModelRequest, ModelResponse, FunctionCall, FunctionCall>;
}

pub mod google {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LlmRequest {
        pub model: Option<String>,
        pub config: Option<GenerateContentConfig>,
        pub contents: Vec<Content>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct GenerateContentConfig {
        pub system_instruction: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Content {
        pub role: Option<String>,
        pub parts: Vec<Part>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Part {
        pub text: Option<String>,
        pub function_call: Option<FunctionCall>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FunctionCall {
        pub name: Option<String>,
        pub args: Option<Value>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LlmResponse {
        pub content: Option<Content>,
        pub usage_metadata: Option<UsageMetadata>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct UsageMetadata {
        pub prompt_token_count: Option<u64>,
        pub candidates_token_count: Option<u64>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCall {
        pub name: String,
        pub description: Option<String>,
        pub args: Value,
        pub function_call_id: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolResponse {
        pub tool_response: Value,
    }

    pub type Event = EngineEvent<LlmRequest, LlmResponse, ToolCall, ToolResponse>;
}

pub mod langchain {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChatModelStart {
        pub invocation_params: InvocationParams,
        pub messages: Vec<Vec<BaseMessage>>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct InvocationParams {
        pub model: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct BaseMessage {
        #[serde(rename = "type")]
        pub message_type: String,
        pub content: Value,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LlmResult {
        pub generations: Vec<Vec<Generation>>,
        pub llm_output: Option<LlmOutput>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Generation {
        pub text: String,
        pub message: Option<AiMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AiMessage {
        pub tool_calls: Vec<ToolCall>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCall {
        pub name: Option<String>,
        pub args: Option<Value>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LlmOutput {
        pub token_usage: Option<CompletionUsage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolStart {
        pub serialized: SerializedTool,
        pub inputs: Option<Value>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct SerializedTool {
        pub name: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolEnd {
        pub output: ToolMessage,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolMessage {
        pub content: Value,
    }

    pub type Event = EngineEvent<ChatModelStart, LlmResult, ToolStart, ToolEnd>;
}

pub mod llama_index {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelRequest {
        pub messages: Vec<RoleMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AgentOutput {
        pub response: Option<RoleMessage>,
        pub tool_calls: Vec<ToolSelection>,
        pub raw: Option<RawResponse>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolSelection {
        pub tool_name: Option<String>,
        pub tool_kwargs: Option<Value>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RawResponse {
        pub usage: Option<CompletionUsage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolMetadata {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCall {
        pub metadata: ToolMetadata,
        pub kwargs: Value,
    }

    impl Default for ToolCall {
        fn default() -> Self {
            Self {
                metadata: ToolMetadata::default(),
                kwargs: empty_object(),
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolOutput {
        pub content: Value,
        pub raw_output: Value,
    }

    pub type Event = EngineEvent<ModelRequest, AgentOutput, ToolCall, ToolOutput>;
}

pub mod openai {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelRequest {
        pub system_instructions: Option<String>,
        pub input: Vec<RoleMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelResponse {
        pub output: Vec<OutputItem>,
        pub usage: Option<Usage>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum OutputItem {
        FunctionCall {
            #[serde(default)]
            name: String,
            #[serde(default)]
            arguments: String,
        },
        Message {
            #[serde(default)]
            content: Vec<OutputText>,
        },
        #[serde(other)]
        Other,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct OutputText {
        pub text: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Usage {
        pub input_tokens: u64,
        pub output_tokens: u64,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCall {
        pub name: String,
        pub description: Option<String>,
        /// JSON-encoded arguments, as the model produced them
        pub arguments: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolResult {
        pub output: Value,
    }

    pub type Event = EngineEvent<ModelRequest, ModelResponse, ToolCall, ToolResult>;
}

pub mod smolagents {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelRequest {
        pub messages: Vec<ChatMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChatMessage {
        pub role: String,
        pub content: Vec<ContentPart>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ContentPart {
        #[serde(rename = "type")]
        pub part_type: Option<String>,
        pub text: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelResponse {
        pub content: Option<String>,
        pub tool_calls: Vec<ToolCallEntry>,
        pub raw: Option<RawResponse>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCallEntry {
        pub function: FunctionRef,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RawResponse {
        pub usage: Option<CompletionUsage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCall {
        pub name: String,
        pub description: Option<String>,
        pub arguments: Value,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolResult {
        pub output: Value,
    }

    pub type Event = EngineEvent<ModelRequest, ModelResponse, ToolCall, ToolResult>;
}

pub mod tinyagent {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CompletionRequest {
        pub model: Option<String>,
        pub messages: Vec<RoleMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelResponse {
        pub choices: Vec<Choice>,
        pub usage: Option<CompletionUsage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Choice {
        pub message: Option<ResponseMessage>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ResponseMessage {
        pub content: Option<String>,
        pub tool_calls: Vec<ToolCallEntry>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolCallEntry {
        pub function: Option<FunctionRef>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolRequest {
        pub name: Option<String>,
        pub arguments: Value,
    }

    impl Default for ToolRequest {
        fn default() -> Self {
            Self {
                name: None,
                arguments: empty_object(),
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ToolResult {
        pub output: Value,
    }

    pub type Event = EngineEvent<CompletionRequest, ModelResponse, ToolRequest, ToolResult>;
}
