use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::domain::{FeedItem, ResolutionReport};
use crate::services::resolver::WaterfallResolver;

/// Resolves many items on a bounded set of worker threads.
pub struct BatchResolver<'a> {
    resolver: &'a WaterfallResolver,
    workers: usize,
}

impl<'a> BatchResolver<'a> {
    pub fn new(resolver: &'a WaterfallResolver, workers: usize) -> Self {
        Self {
            resolver,
            workers: workers.max(1),
        }
    }

    /// One report per item, in input order.
    pub fn resolve_all(&self, items: &[FeedItem]) -> Vec<ResolutionReport> {
        if items.is_empty() {
            return Vec::new();
        }

        let workers = self.workers.min(items.len());
        let next = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<ResolutionReport>>> =
            items.iter().map(|_| Mutex::new(None)).collect();

        debug!(items = items.len(), workers, "resolving batch");

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    let report = self.resolver.resolve_with_report(item);
                    if let Ok(mut slot) = slots[index].lock() {
                        *slot = Some(report);
                    }
                });
            }
        });

        slots
            .into_iter()
            .zip(items)
            .map(|(slot, item)| {
                slot.into_inner()
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| ResolutionReport::not_found(item))
            })
            .collect()
    }
}
