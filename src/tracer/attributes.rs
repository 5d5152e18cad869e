//! Well-known span attribute keys
//!
//! Span attributes follow OpenTelemetry's semantic conventions for generative AI where a
//! convention exists. Only the keys the crate actually reads or writes are listed here.

/// Keys in the `gen_ai.*` namespace
pub mod gen_ai {
    /// Free-form description of the agent
    pub const AGENT_DESCRIPTION: &str = "gen_ai.agent.description";

    /// Human-readable name of the agent
    pub const AGENT_NAME: &str = "gen_ai.agent.name";

    /// System prompt and user input, encoded as a JSON array of `{role, content}` records
    pub const INPUT_MESSAGES: &str = "gen_ai.input.messages";

    /// `invoke_agent`, `call_llm` or `execute_tool`
    pub const OPERATION_NAME: &str = "gen_ai.operation.name";

    /// Output of an LLM call or a tool execution
    pub const OUTPUT: &str = "gen_ai.output";

    /// `text` or `json`
    pub const OUTPUT_TYPE: &str = "gen_ai.output.type";

    pub const REQUEST_ID: &str = "gen_ai.request.id";

    /// Model a request is being made to
    pub const REQUEST_MODEL: &str = "gen_ai.request.model";

    /// Arguments passed to the executed tool, JSON encoded
    pub const TOOL_ARGS: &str = "gen_ai.tool.args";

    pub const TOOL_CALL_ID: &str = "gen_ai.tool.call.id";

    pub const TOOL_DESCRIPTION: &str = "gen_ai.tool.description";

    pub const TOOL_NAME: &str = "gen_ai.tool.name";

    /// Dollars spent on the input of the LLM call
    pub const USAGE_INPUT_COST: &str = "gen_ai.usage.input_cost";

    pub const USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

    /// Dollars spent on the output of the LLM call
    pub const USAGE_OUTPUT_COST: &str = "gen_ai.usage.output_cost";

    pub const USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
}

/// Identifier of the run that created the span, stamped at span creation
pub const RUN_ID: &str = "agentweave.run_id";

/// Values of [`gen_ai::OPERATION_NAME`]
pub mod operation {
    pub const INVOKE_AGENT: &str = "invoke_agent";
    pub const CALL_LLM: &str = "call_llm";
    pub const EXECUTE_TOOL: &str = "execute_tool";
}

/// Values of [`gen_ai::OUTPUT_TYPE`]
pub mod output_type {
    pub const TEXT: &str = "text";
    pub const JSON: &str = "json";
}
