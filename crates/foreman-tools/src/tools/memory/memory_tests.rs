use crate::tools::{
    AddOrUpdateModuleTool, ClearMemoryTool, DeleteModuleTool, ExportMemoryTool, GetModuleTool,
};
use foreman_core::terminal::{CREATED_COUNTER_KEY, SESSIONS_KEY};
use foreman_core::trace::{RunContext, SqliteTraceLog, TraceLog};
use foreman_core::{ModuleStore, ToolCall, ToolRegistry};
use serde_json::json;
use std::sync::Arc;

fn registry() -> (Arc<dyn TraceLog>, RunContext, ToolRegistry) {
    let (log, context, _, registry) = registry_with_store();
    (log, context, registry)
}

fn registry_with_store() -> (Arc<dyn TraceLog>, RunContext, ModuleStore, ToolRegistry) {
    let log: Arc<dyn TraceLog> = Arc::new(SqliteTraceLog::in_memory().unwrap());
    let context = RunContext::start(log.clone()).unwrap();
    let store = ModuleStore::in_memory().unwrap();
    let handle = store.clone();

    let mut registry = ToolRegistry::new(&context);
    registry.register(AddOrUpdateModuleTool::new(store.clone()));
    registry.register(GetModuleTool::new(store.clone()));
    registry.register(DeleteModuleTool::new(store.clone()));
    registry.register(ExportMemoryTool::new(store.clone()));
    registry.register(ClearMemoryTool::new(store));
    (log, context, handle, registry)
}

fn call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::from_json("m-1", name, args)
}

#[tokio::test]
async fn test_add_get_update() {
    let (_, _, registry) = registry();

    let stored = registry
        .execute(&call(
            "add_or_update_module",
            json!({"module_name": "TaskList", "data": [{"task_id": "1"}]}),
        ))
        .await;
    assert!(stored.success);

    registry
        .execute(&call(
            "add_or_update_module",
            json!({"module_name": "TaskList", "data": [{"task_id": "4"}]}),
        ))
        .await;

    let fetched = registry
        .execute(&call("get_module", json!({"module_name": "TaskList"})))
        .await;
    assert_eq!(fetched.metadata["module"], json!([{"task_id": "4"}]));
}

#[tokio::test]
async fn test_get_missing_module_is_null() {
    let (_, _, registry) = registry();
    let fetched = registry
        .execute(&call("get_module", json!({"module_name": "Nope"})))
        .await;
    assert!(fetched.success);
    assert_eq!(fetched.text(), "null");
}

#[tokio::test]
async fn test_data_may_be_any_json() {
    let (_, _, registry) = registry();
    for data in [json!("text"), json!(3), json!(null), json!({"a": {"b": [1, 2]}})] {
        let stored = registry
            .execute(&call(
                "add_or_update_module",
                json!({"module_name": "Any", "data": data.clone()}),
            ))
            .await;
        assert!(stored.success);
        let fetched = registry
            .execute(&call("get_module", json!({"module_name": "Any"})))
            .await;
        assert_eq!(fetched.metadata["module"], data);
    }
}

#[tokio::test]
async fn test_missing_arguments_fail() {
    let (_, _, registry) = registry();
    let result = registry
        .execute(&call("add_or_update_module", json!({"module_name": "X"})))
        .await;
    assert!(!result.success);
    assert!(result.text().contains("'data'"));

    let result = registry
        .execute(&call("get_module", json!({"module_name": "  "})))
        .await;
    assert!(!result.success);
}

#[tokio::test]
async fn test_delete_export_clear() {
    let (_, _, registry) = registry();
    for name in ["A", "B", "C"] {
        registry
            .execute(&call(
                "add_or_update_module",
                json!({"module_name": name, "data": name}),
            ))
            .await;
    }

    let deleted = registry
        .execute(&call("delete_module", json!({"module_name": "B"})))
        .await;
    assert_eq!(deleted.metadata["existed"], json!(true));
    let again = registry
        .execute(&call("delete_module", json!({"module_name": "B"})))
        .await;
    assert!(again.success);
    assert_eq!(again.metadata["existed"], json!(false));

    let exported = registry.execute(&call("export_memory", json!({}))).await;
    let modules: serde_json::Value = serde_json::from_str(exported.text()).unwrap();
    assert_eq!(modules, json!({"A": "A", "C": "C"}));

    let cleared = registry.execute(&call("clear_memory", json!({}))).await;
    assert_eq!(cleared.metadata["removed"], json!(2));
    let exported = registry.execute(&call("export_memory", json!({}))).await;
    assert_eq!(exported.metadata["module_count"], json!(0));
}

#[tokio::test]
async fn test_clear_keeps_session_bookkeeping() {
    let (_, _, store, registry) = registry_with_store();
    store.put(SESSIONS_KEY, &json!([])).unwrap();
    store.put(CREATED_COUNTER_KEY, &json!(3)).unwrap();
    store.put("Plan", &json!(["a"])).unwrap();

    let cleared = registry.execute(&call("clear_memory", json!({}))).await;
    assert!(cleared.success);
    assert_eq!(cleared.metadata["removed"], json!(1));
    assert_eq!(store.get(CREATED_COUNTER_KEY).unwrap(), Some(json!(3)));
    assert_eq!(store.get(SESSIONS_KEY).unwrap(), Some(json!([])));
}

#[tokio::test]
async fn test_memory_tools_trace_under_working_memory() {
    let (log, context, registry) = registry();
    registry
        .execute(&call("get_module", json!({"module_name": "Objective"})))
        .await;

    let records = log.records_for_run(context.run_id()).unwrap();
    assert!(records.iter().all(|r| r.unit_name == "WorkingMemory"));
    assert_eq!(records[0].message, "Calling method: get_module");
    assert_eq!(records[1].message, "Success response: null");
}
