pub mod formatter;
pub mod generator;
pub mod llm;
pub mod pipeline;

pub use formatter::ResponseFormatter;
pub use generator::OperationGenerator;
pub use llm::{GenerationClient, HttpLlmClient, LlmClient, LlmError, Sleeper, TokioSleeper};
pub use pipeline::{Pipeline, PipelineOutcome, TraceEntry};
