//! Per-unit call-stack tracer

use super::context::RunContext;
use super::types::{TraceLevel, TraceRecord};
use crate::error::UnifiedError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Longest message persisted for a single record
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy)]
struct Frame {
    tracer_id: Uuid,
    record_id: Uuid,
}

/// Open operations of one logical call chain, innermost last
#[derive(Debug, Clone, Default)]
struct CallChain(Arc<Vec<Frame>>);

impl CallChain {
    fn current() -> Self {
        CALL_CHAIN.try_with(Clone::clone).unwrap_or_default()
    }

    fn innermost(&self, tracer_id: Uuid) -> Option<Uuid> {
        self.0
            .iter()
            .rev()
            .find(|frame| frame.tracer_id == tracer_id)
            .map(|frame| frame.record_id)
    }

    fn push(&self, frame: Frame) -> Self {
        let mut frames = self.0.as_ref().clone();
        frames.push(frame);
        Self(Arc::new(frames))
    }
}

tokio::task_local! {
    static CALL_CHAIN: CallChain;
}

/// Tracer bound to one unit of one run
///
/// The call stack belongs to the future being traced, not to the tracer:
/// work awaited inside [`scope`](Self::scope) or [`TraceScope::run`] sees
/// its own enclosing operations only, so concurrent calls through clones
/// of one tracer never adopt each other as parents. Records are written
/// through the run's [`TraceLog`](super::TraceLog) and mirrored as
/// `tracing` events. A failing sink never fails the traced operation; the
/// write error is logged instead.
#[derive(Clone)]
pub struct ExecutionTracer {
    id: Uuid,
    unit_name: Arc<str>,
    context: RunContext,
    open: Arc<AtomicUsize>,
}

impl fmt::Debug for ExecutionTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionTracer")
            .field("unit_name", &self.unit_name)
            .field("run_id", &self.context.run_id())
            .field("open", &self.depth())
            .finish()
    }
}

impl ExecutionTracer {
    pub fn new(unit_name: impl Into<String>, context: &RunContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            unit_name: Arc::from(unit_name.into()),
            context: context.clone(),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn run_id(&self) -> &str {
        self.context.run_id()
    }

    /// Number of operations currently open across all call chains
    pub fn depth(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Open `operation` under the innermost operation of the current chain
    ///
    /// The returned guard records the exit. Await nested work through
    /// [`TraceScope::run`] or open nested operations with
    /// [`TraceScope::enter_child`] so they attach to this one.
    pub fn enter(&self, operation: &str) -> TraceScope {
        let chain = CallChain::current();
        let parent_id = chain.innermost(self.id);
        self.open_scope(operation, parent_id, &chain)
    }

    /// Freestanding record under the innermost open operation of the
    /// current chain
    pub fn log(&self, message: impl Into<String>, level: TraceLevel) -> Uuid {
        let parent_id = CallChain::current().innermost(self.id);
        let record = self.record(level, message.into(), parent_id);
        self.emit(&record);
        record.record_id
    }

    /// ERROR record carrying the error's message and code
    pub fn log_error<E: UnifiedError + ?Sized>(&self, error: &E) -> Uuid {
        self.log(describe_error(error), TraceLevel::Error)
    }

    /// Run `fut` inside an `operation` scope
    ///
    /// If the returned future is dropped before completion the scope still
    /// closes, with an ERROR exit.
    pub async fn scope<T, E, F>(&self, operation: &str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: UnifiedError,
    {
        let scope = self.enter(operation);
        let result = scope.run(fut).await;
        scope.finish(&result);
        result
    }

    fn open_scope(&self, operation: &str, parent_id: Option<Uuid>, chain: &CallChain) -> TraceScope {
        let record = self.record(
            TraceLevel::Debug,
            format!("Calling method: {}", operation),
            parent_id,
        );
        self.emit(&record);
        self.open.fetch_add(1, Ordering::SeqCst);

        TraceScope {
            tracer: self.clone(),
            operation: operation.to_string(),
            record_id: record.record_id,
            chain: chain.push(Frame {
                tracer_id: self.id,
                record_id: record.record_id,
            }),
            finished: false,
        }
    }

    fn record(&self, level: TraceLevel, message: String, parent_id: Option<Uuid>) -> TraceRecord {
        TraceRecord::new(
            self.context.run_id(),
            self.unit_name.as_ref(),
            level,
            truncate(message),
            parent_id,
        )
    }

    fn write_child(&self, parent_id: Uuid, level: TraceLevel, message: String) {
        let record = self.record(level, message, Some(parent_id));
        self.emit(&record);
    }

    fn close(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }

    fn emit(&self, record: &TraceRecord) {
        mirror(record);
        if let Err(e) = self.context.log().append(record) {
            tracing::warn!(
                unit = %record.unit_name,
                run_id = %record.run_id,
                record_id = %record.record_id,
                "Failed to persist trace record: {}",
                e
            );
        }
    }
}

/// Guard for one open operation
///
/// Call [`finish`](Self::finish) with the operation's result. A guard that is
/// dropped unfinished (early return, panic, cancelled future) records an
/// ERROR exit.
#[must_use = "dropping a TraceScope immediately records the operation as aborted"]
pub struct TraceScope {
    tracer: ExecutionTracer,
    operation: String,
    record_id: Uuid,
    chain: CallChain,
    finished: bool,
}

impl TraceScope {
    /// Id of the enter record; children of this operation point here
    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Record under this operation without closing it
    pub fn log(&self, message: impl Into<String>, level: TraceLevel) {
        self.tracer
            .write_child(self.record_id, level, truncate(message.into()));
    }

    /// Open a nested operation of the same unit under this one
    pub fn enter_child(&self, operation: &str) -> TraceScope {
        self.tracer
            .open_scope(operation, Some(self.record_id), &self.chain)
    }

    /// Await `fut` with this operation as the innermost open call
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        CALL_CHAIN.scope(self.chain.clone(), fut).await
    }

    /// Record the exit of this operation
    pub fn finish<T, E>(mut self, result: &Result<T, E>)
    where
        T: fmt::Debug,
        E: UnifiedError,
    {
        match result {
            Ok(value) => self.tracer.write_child(
                self.record_id,
                TraceLevel::Debug,
                format!("Method {} returned: {:?}", self.operation, value),
            ),
            Err(error) => {
                self.tracer
                    .write_child(self.record_id, TraceLevel::Error, describe_error(error));
                self.tracer.write_child(
                    self.record_id,
                    TraceLevel::Error,
                    format!("Method {} failed", self.operation),
                );
            }
        }
        self.tracer.close();
        self.finished = true;
    }
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.tracer.write_child(
            self.record_id,
            TraceLevel::Error,
            format!("Method {} aborted before returning", self.operation),
        );
        self.tracer.close();
    }
}

fn describe_error<E: UnifiedError + ?Sized>(error: &E) -> String {
    match error.context() {
        Some(context) => format!("Exception [{}]: {} ({})", error.error_code(), error, context),
        None => format!("Exception [{}]: {}", error.error_code(), error),
    }
}

fn truncate(mut message: String) -> String {
    if let Some((idx, _)) = message.char_indices().nth(MAX_MESSAGE_CHARS) {
        message.truncate(idx);
        message.push_str("...");
    }
    message
}

fn mirror(record: &TraceRecord) {
    let parent = record.parent_id.map(|id| id.to_string()).unwrap_or_default();
    macro_rules! event {
        ($macro:ident) => {
            tracing::$macro!(
                unit = %record.unit_name,
                run_id = %record.run_id,
                record_id = %record.record_id,
                parent_id = %parent,
                "{}",
                record.message
            )
        };
    }
    match record.level {
        TraceLevel::Trace => event!(trace),
        TraceLevel::Debug => event!(debug),
        TraceLevel::Info => event!(info),
        TraceLevel::Warn => event!(warn),
        TraceLevel::Error => event!(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForemanError;
    use crate::trace::{SqliteTraceLog, TraceLog};

    fn setup() -> (Arc<dyn TraceLog>, RunContext) {
        let log: Arc<dyn TraceLog> = Arc::new(SqliteTraceLog::in_memory().unwrap());
        let ctx = RunContext::start(log.clone()).unwrap();
        (log, ctx)
    }

    #[test]
    fn test_enter_links_to_enclosing_call() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Planner");

        let outer = tracer.enter("plan");
        let inner = outer.enter_child("split");
        assert_eq!(tracer.depth(), 2);
        inner.finish::<_, ForemanError>(&Ok(3));
        outer.finish::<_, ForemanError>(&Ok("done"));
        assert_eq!(tracer.depth(), 0);

        let records = log.records_for_run(ctx.run_id()).unwrap();
        assert_eq!(records.len(), 4);
        let (outer_enter, inner_enter, inner_exit, outer_exit) =
            (&records[0], &records[1], &records[2], &records[3]);
        assert_eq!(outer_enter.message, "Calling method: plan");
        assert_eq!(outer_enter.parent_id, None);
        assert_eq!(outer_enter.level, TraceLevel::Debug);
        assert_eq!(inner_enter.parent_id, Some(outer_enter.record_id));
        assert_eq!(inner_exit.parent_id, Some(inner_enter.record_id));
        assert_eq!(inner_exit.message, "Method split returned: 3");
        assert_eq!(outer_exit.parent_id, Some(outer_enter.record_id));
        assert!(records.iter().all(|r| r.unit_name == "Planner"));
    }

    #[tokio::test]
    async fn test_log_attaches_to_innermost_call() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        let free = tracer.log("before any call", TraceLevel::Info);
        let scope = tracer.enter("work");
        let nested = scope.run(async { tracer.log("inside", TraceLevel::Warn) }).await;
        let after = tracer.log("outside the chain", TraceLevel::Info);
        scope.finish::<_, ForemanError>(&Ok(()));

        let records = log.records_for_run(ctx.run_id()).unwrap();
        let by_id = |id: Uuid| records.iter().find(|r| r.record_id == id).unwrap();
        assert_eq!(by_id(free).parent_id, None);
        assert_eq!(by_id(nested).parent_id, Some(scope_enter_id(&records, "work")));
        assert_eq!(by_id(after).parent_id, None);
    }

    fn scope_enter_id(records: &[TraceRecord], op: &str) -> Uuid {
        records
            .iter()
            .find(|r| r.message == format!("Calling method: {}", op))
            .unwrap()
            .record_id
    }

    #[test]
    fn test_error_is_recorded_before_exit() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        let scope = tracer.enter("explode");
        scope.finish::<(), _>(&Err(ForemanError::session_not_found("session_4")));

        let records = log.records_for_run(ctx.run_id()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].level, TraceLevel::Error);
        assert!(records[1].message.contains("FOREMAN_SESSION_NOT_FOUND"));
        assert!(records[1].message.contains("session_4"));
        assert_eq!(records[2].message, "Method explode failed");
    }

    #[test]
    fn test_dropped_scope_records_abort_and_closes() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        {
            let _scope = tracer.enter("interrupted");
            assert_eq!(tracer.depth(), 1);
        }
        assert_eq!(tracer.depth(), 0);

        let records = log.records_for_run(ctx.run_id()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].level, TraceLevel::Error);
        assert_eq!(records[1].message, "Method interrupted aborted before returning");
    }

    #[test]
    fn test_panic_still_closes_scope() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        let t = tracer.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _scope = t.enter("boom");
            panic!("kaboom");
        }));
        assert!(outcome.is_err());
        assert_eq!(tracer.depth(), 0);

        let records = log.records_for_run(ctx.run_id()).unwrap();
        assert_eq!(records.last().unwrap().level, TraceLevel::Error);
    }

    #[tokio::test]
    async fn test_scope_helper_and_cancellation() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        let value = tracer
            .scope("compute", async { Ok::<_, ForemanError>(41 + 1) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let slow = tracer.scope("slow", async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok::<_, ForemanError>(())
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), slow).await;
        assert!(timed_out.is_err());
        assert_eq!(tracer.depth(), 0);

        let records = log.records_for_run(ctx.run_id()).unwrap();
        let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
        assert!(messages.contains(&"Method compute returned: 42"));
        assert!(messages.contains(&"Method slow aborted before returning"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_separate_roots() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");
        let (slow, fast) = (tracer.clone(), tracer.clone());

        let waiting = tokio::spawn(async move {
            slow.scope("wait", async {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                slow.log("waited", TraceLevel::Info);
                Ok::<_, ForemanError>(())
            })
            .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        fast.scope("quick", async { Ok::<_, ForemanError>(1) })
            .await
            .unwrap();
        waiting.await.unwrap().unwrap();

        let (a, b) = tokio::join!(
            tracer.scope("left", async {
                tokio::task::yield_now().await;
                Ok::<_, ForemanError>(())
            }),
            tracer.scope("right", async {
                tokio::task::yield_now().await;
                Ok::<_, ForemanError>(())
            }),
        );
        a.unwrap();
        b.unwrap();

        let records = log.records_for_run(ctx.run_id()).unwrap();
        for op in ["wait", "quick", "left", "right"] {
            let enter = records
                .iter()
                .find(|r| r.message == format!("Calling method: {}", op))
                .unwrap();
            assert_eq!(enter.parent_id, None, "{} should be a root", op);
        }
        let waited = records.iter().find(|r| r.message == "waited").unwrap();
        assert_eq!(waited.parent_id, Some(scope_enter_id(&records, "wait")));
        assert_eq!(tracer.depth(), 0);
    }

    #[tokio::test]
    async fn test_nested_scope_inside_run_attaches_to_parent() {
        let (log, ctx) = setup();
        let tracer = ctx.tracer("Unit");

        tracer
            .scope("outer", async {
                tracer.scope("inner", async { Ok::<_, ForemanError>(()) }).await
            })
            .await
            .unwrap();

        let records = log.records_for_run(ctx.run_id()).unwrap();
        let inner = records
            .iter()
            .find(|r| r.message == "Calling method: inner")
            .unwrap();
        assert_eq!(inner.parent_id, Some(scope_enter_id(&records, "outer")));
    }

    #[test]
    fn test_separate_runs_do_not_mix() {
        let log: Arc<dyn TraceLog> = Arc::new(SqliteTraceLog::in_memory().unwrap());
        let run_a = RunContext::start(log.clone()).unwrap();
        let run_b = RunContext::start(log.clone()).unwrap();

        run_a.tracer("Unit").log("a", TraceLevel::Info);
        run_b.tracer("Unit").log("b", TraceLevel::Info);
        run_b.tracer("Other").log("b2", TraceLevel::Info);

        assert_eq!(log.records_for_run(run_a.run_id()).unwrap().len(), 1);
        assert_eq!(log.records_for_run(run_b.run_id()).unwrap().len(), 2);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let message = truncate("x".repeat(MAX_MESSAGE_CHARS + 10));
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS + 3);
        assert!(message.ends_with("..."));
    }
}
