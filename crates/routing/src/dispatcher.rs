//! `PriorityDispatcher`: global cross-provider flow control in front of the
//! `RequestRouter` — priority queue, global token bucket, burst semaphore.

use crate::rate_limit::RateLimitBucket;
use crate::router::{RequestRouter, RoutedRequest, RoutedResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Clone)]
pub struct QueuedItem {
    pub query_id: Uuid,
    pub request: RoutedRequest,
    pub info_type: String,
    pub phase: String,
    pub priority: i32,
    pub submitted_at: DateTime<Utc>,
}

/// Base priority by phase; lower number = higher priority.
pub fn base_priority(phase: &str) -> i32 {
    match phase {
        "FOUNDATION" => 5,
        "RECONCILIATION" => 4,
        "RECORDS" => 3,
        "INTELLIGENCE" => 2,
        "NETWORK" => 2,
        _ => 3,
    }
}

/// Applies modifier tokens to a base priority. Unknown tokens are logged at
/// `warn` and ignored (delta 0) rather than rejected.
pub fn apply_modifiers(mut priority: i32, modifiers: &[String]) -> i32 {
    for token in modifiers {
        let delta = match token.as_str() {
            "+urgent" => -2,
            "+foundation_dependency" => -1,
            "-background" => 2,
            "-bulk" => 1,
            other => {
                tracing::warn!(token = other, "unknown priority modifier token, ignoring");
                0
            }
        };
        priority += delta;
    }
    priority
}

pub struct PriorityDispatcher {
    router: std::sync::Arc<RequestRouter>,
    queue: Mutex<Vec<QueuedItem>>,
    global_bucket: RateLimitBucket,
    burst_semaphore: Semaphore,
    accepting: AtomicBool,
}

impl PriorityDispatcher {
    pub fn new(router: std::sync::Arc<RequestRouter>, global_rpm: u32) -> Self {
        let burst_size = std::cmp::max(1, global_rpm / 10) as usize;
        Self {
            router,
            queue: Mutex::new(Vec::new()),
            global_bucket: RateLimitBucket::from_rpm(global_rpm),
            burst_semaphore: Semaphore::new(burst_size),
            accepting: AtomicBool::new(true),
        }
    }

    /// `submit(query, info_type, phase, modifiers)`.
    pub fn submit(&self, request: RoutedRequest, info_type: &str, phase: &str, modifiers: &[String]) -> Uuid {
        let priority = apply_modifiers(base_priority(phase), modifiers);
        let item = QueuedItem {
            query_id: Uuid::new_v4(),
            request,
            info_type: info_type.to_string(),
            phase: phase.to_string(),
            priority,
            submitted_at: Utc::now(),
        };
        let query_id = item.query_id;
        self.queue.lock().unwrap().push(item);
        query_id
    }

    /// Stops pulling new items; any in-flight request still completes.
    pub fn stop(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    pub fn start(&self) {
        self.accepting.store(true, Ordering::SeqCst);
    }

    fn pop_highest_priority(&self, info_type: Option<&str>) -> Option<QueuedItem> {
        let mut queue = self.queue.lock().unwrap();
        let mut best_index = None;
        for (i, item) in queue.iter().enumerate() {
            if let Some(filter) = info_type {
                if item.info_type != filter {
                    continue;
                }
            }
            let better = match best_index {
                None => true,
                Some(b) => {
                    let current: &QueuedItem = &queue[b];
                    item.priority < current.priority
                        || (item.priority == current.priority && item.submitted_at < current.submitted_at)
                }
            };
            if better {
                best_index = Some(i);
            }
        }
        best_index.map(|i| queue.remove(i))
    }

    async fn acquire_slot(&self) {
        while !self.global_bucket.try_acquire() {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    /// Dequeues and executes every queued item for one information type, in
    /// priority order, until the queue for that type is drained or
    /// dispatching has been stopped.
    pub async fn dispatch_for_type(&self, info_type: &str) -> Vec<RoutedResult> {
        let mut results = Vec::new();
        loop {
            if !self.accepting.load(Ordering::SeqCst) {
                break;
            }
            let Some(item) = self.pop_highest_priority(Some(info_type)) else {
                break;
            };
            self.acquire_slot().await;
            let _permit = self.burst_semaphore.acquire().await.expect("semaphore not closed");
            let result = self.router.route(&item.request).await;
            results.push(result);
        }
        results
    }

    /// Dequeues and executes every queued item across all information
    /// types, grouping results per info-type.
    pub async fn dispatch_all(&self) -> HashMap<String, Vec<RoutedResult>> {
        let mut results: HashMap<String, Vec<RoutedResult>> = HashMap::new();
        loop {
            if !self.accepting.load(Ordering::SeqCst) {
                break;
            }
            let Some(item) = self.pop_highest_priority(None) else {
                break;
            };
            self.acquire_slot().await;
            let _permit = self.burst_semaphore.acquire().await.expect("semaphore not closed");
            let result = self.router.route(&item.request).await;
            results.entry(item.info_type.clone()).or_default().push(result);
        }
        results
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_priority_matches_phase_table() {
        assert_eq!(base_priority("FOUNDATION"), 5);
        assert_eq!(base_priority("RECONCILIATION"), 4);
        assert_eq!(base_priority("RECORDS"), 3);
        assert_eq!(base_priority("INTELLIGENCE"), 2);
        assert_eq!(base_priority("NETWORK"), 2);
    }

    #[test]
    fn urgent_modifier_raises_priority() {
        let priority = apply_modifiers(base_priority("RECORDS"), &["+urgent".to_string()]);
        assert_eq!(priority, 1);
    }

    #[test]
    fn unknown_modifier_is_ignored() {
        let priority = apply_modifiers(base_priority("RECORDS"), &["+nonsense".to_string()]);
        assert_eq!(priority, 3);
    }

    #[test]
    fn bulk_modifier_lowers_priority() {
        let priority = apply_modifiers(base_priority("NETWORK"), &["-bulk".to_string()]);
        assert_eq!(priority, 3);
    }
}
