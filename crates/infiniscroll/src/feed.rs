//! Simulated paged feed
//!
//! Stands in for a network data source. The feed owns its own cursor; the
//! UI only asks for "the next page" and restarts it on reset. Responses carry
//! the generation they were requested in so the UI can drop answers that
//! arrive after a restart.

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::FeedConfig;

/// Request sent to the feed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRequest {
    /// Fetch the page after the last delivered one
    NextPage,
    /// Forget delivered pages and start over
    Restart,
}

/// Response from the feed task
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Page {
        generation: u64,
        items: Vec<String>,
        has_more: bool,
    },
    Failed {
        generation: u64,
        message: String,
    },
}

/// Pagination state of the feed
#[derive(Debug, Clone)]
pub struct FeedCursor {
    config: FeedConfig,
    delivered: usize,
    generation: u64,
}

impl FeedCursor {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            delivered: 0,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn restart(&mut self) {
        self.delivered = 0;
        self.generation += 1;
    }

    /// Produce the next page and advance
    pub fn next_page(&mut self) -> FeedEvent {
        let end = (self.delivered + self.config.page_size).min(self.config.total_items);
        let items = (self.delivered..end)
            .map(|n| format!("Item #{:04}", n + 1))
            .collect();
        self.delivered = end;
        FeedEvent::Page {
            generation: self.generation,
            items,
            has_more: end < self.config.total_items,
        }
    }

    pub fn failure(&self, message: impl Into<String>) -> FeedEvent {
        FeedEvent::Failed {
            generation: self.generation,
            message: message.into(),
        }
    }
}

/// Spawn the feed task
pub fn spawn_feed(
    config: FeedConfig,
) -> (
    mpsc::UnboundedSender<FeedRequest>,
    mpsc::UnboundedReceiver<FeedEvent>,
) {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let latency = config.latency();
        let failure_rate = config.failure_rate;
        let mut cursor = FeedCursor::new(config);

        while let Some(request) = request_rx.recv().await {
            match request {
                FeedRequest::Restart => {
                    cursor.restart();
                    debug!(generation = cursor.generation(), "Feed restarted");
                }
                FeedRequest::NextPage => {
                    tokio::time::sleep(latency).await;
                    let failed = rand::thread_rng().gen_bool(failure_rate);
                    let event = if failed {
                        cursor.failure("simulated network error")
                    } else {
                        cursor.next_page()
                    };
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
        info!("Feed task stopped");
    });

    (request_tx, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(page_size: usize, total_items: usize) -> FeedConfig {
        FeedConfig {
            page_size,
            total_items,
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }

    #[test]
    fn test_pages_until_exhausted() {
        let mut cursor = FeedCursor::new(config(4, 10));

        let mut sizes = Vec::new();
        loop {
            match cursor.next_page() {
                FeedEvent::Page {
                    items, has_more, ..
                } => {
                    sizes.push(items.len());
                    if !has_more {
                        break;
                    }
                }
                FeedEvent::Failed { .. } => unreachable!(),
            }
        }
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_restart_bumps_generation() {
        let mut cursor = FeedCursor::new(config(5, 5));
        cursor.next_page();
        cursor.restart();
        match cursor.next_page() {
            FeedEvent::Page {
                generation, items, ..
            } => {
                assert_eq!(generation, 1);
                assert_eq!(items[0], "Item #0001");
            }
            FeedEvent::Failed { .. } => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_feed_task_answers_requests() {
        let (tx, mut rx) = spawn_feed(config(3, 3));
        tx.send(FeedRequest::NextPage).unwrap();
        match rx.recv().await.unwrap() {
            FeedEvent::Page {
                items, has_more, ..
            } => {
                assert_eq!(items.len(), 3);
                assert!(!has_more);
            }
            FeedEvent::Failed { .. } => panic!("failure rate is zero"),
        }
    }
}
