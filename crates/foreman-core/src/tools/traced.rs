//! Tracing decorator for tools

use crate::tools::base::{Tool, ToolError};
use crate::tools::types::{ToolCall, ToolResult, ToolSchema};
use crate::trace::{ExecutionTracer, TraceLevel};
use async_trait::async_trait;
use tracing::instrument;

/// A tool whose every call is recorded by an [`ExecutionTracer`]
///
/// The call opens a scope named after the tool, logs the success or failure
/// response inside it, and records the exit even if validation fails or the
/// caller abandons the future.
pub struct TracedTool<T> {
    inner: T,
    tracer: ExecutionTracer,
}

impl<T: Tool> TracedTool<T> {
    pub fn new(inner: T, tracer: ExecutionTracer) -> Self {
        Self { inner, tracer }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn tracer(&self) -> &ExecutionTracer {
        &self.tracer
    }
}

#[async_trait]
impl<T: Tool> Tool for TracedTool<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn schema(&self) -> ToolSchema {
        self.inner.schema()
    }

    fn unit(&self) -> &str {
        self.inner.unit()
    }

    // Validation runs inside the trace scope in `execute`.
    fn validate(&self, _call: &ToolCall) -> Result<(), ToolError> {
        Ok(())
    }

    #[instrument(skip(self, call), fields(tool = %self.inner.name(), call_id = %call.id))]
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let scope = self.tracer.enter(self.inner.name());

        let result = match self.inner.validate(call) {
            Ok(()) => scope.run(self.inner.execute(call)).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(r) if r.success => {
                scope.log(format!("Success response: {}", r.text()), TraceLevel::Debug)
            }
            Ok(r) => scope.log(format!("Failure response: {}", r.text()), TraceLevel::Error),
            Err(err) => scope.log(format!("Failure response: {}", err), TraceLevel::Error),
        }

        scope.finish(&result);
        result
    }
}
