//! Read-only reconstruction of a run's call tree

use super::log::TraceLog;
use super::types::{RunSummary, TraceRecord};
use crate::error::{ForemanError, ForemanResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// A trace record with the records it encloses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceNode {
    #[serde(flatten)]
    pub record: TraceRecord,
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TraceNode::size).sum::<usize>()
    }
}

/// Everything recorded for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    pub run_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<TraceRecord>,
}

/// Query surface over a [`TraceLog`]
#[derive(Clone)]
pub struct TraceQueryService {
    log: Arc<dyn TraceLog>,
}

impl TraceQueryService {
    pub fn new(log: Arc<dyn TraceLog>) -> Self {
        Self { log }
    }

    pub fn list_runs(&self) -> ForemanResult<Vec<RunSummary>> {
        self.log.list_runs()
    }

    /// Records of `run_id` in write order
    #[instrument(skip(self))]
    pub fn records(&self, run_id: &str) -> ForemanResult<Vec<TraceRecord>> {
        let records = self.log.records_for_run(run_id)?;
        if records.is_empty() {
            return Err(ForemanError::run_not_found(run_id));
        }
        Ok(records)
    }

    /// Call forest of `run_id`
    #[instrument(skip(self))]
    pub fn tree(&self, run_id: &str) -> ForemanResult<Vec<TraceNode>> {
        let records = self.records(run_id)?;
        let count = records.len();
        let forest = build_forest(records);
        debug!("Built {} roots from {} records", forest.len(), count);
        Ok(forest)
    }

    pub fn export(&self, run_id: &str) -> ForemanResult<RunExport> {
        let records = self.records(run_id)?;
        let start_time = self.log.get_run(run_id)?.map(|run| run.start_time);
        Ok(RunExport {
            run_id: run_id.to_string(),
            start_time,
            exported_at: Utc::now(),
            records,
        })
    }

    /// Delete all records of `run_id`
    #[instrument(skip(self))]
    pub fn purge(&self, run_id: &str) -> ForemanResult<usize> {
        let removed = self.log.purge_run(run_id)?;
        if removed == 0 {
            return Err(ForemanError::run_not_found(run_id));
        }
        debug!("Purged {} records", removed);
        Ok(removed)
    }
}

/// Build a forest from records given in write order
///
/// A record becomes a child of its `parent_id` when that parent appeared
/// earlier in `records`; otherwise it is a root. Children keep write order.
pub fn build_forest(records: Vec<TraceRecord>) -> Vec<TraceNode> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(records.len());
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();

    for (i, record) in records.iter().enumerate() {
        match record.parent_id.and_then(|parent| index.get(&parent).copied()) {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
        index.insert(record.record_id, i);
    }

    let mut slots: Vec<Option<TraceRecord>> = records.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| assemble(root, &mut slots, &children))
        .collect()
}

fn assemble(
    i: usize,
    slots: &mut [Option<TraceRecord>],
    children: &[Vec<usize>],
) -> Option<TraceNode> {
    let record = slots[i].take()?;
    let children = children[i]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(TraceNode { record, children })
}
