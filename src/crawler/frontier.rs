//! Crawl frontier: FIFO queue plus visited set
//!
//! URLs are marked visited when they are enqueued, so a URL can enter the
//! queue at most once. The visited set is capped; once full, newly
//! discovered URLs are dropped.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Breadth-first frontier with normalized-URL deduplication
#[derive(Debug)]
pub struct Frontier {
    /// URLs waiting to be fetched, in discovery order
    queue: VecDeque<Url>,

    /// Every URL ever enqueued, keyed by its normalized string
    visited: HashSet<String>,

    /// Maximum size of the visited set
    cap: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `cap` - Maximum number of distinct URLs the frontier will ever accept
    pub fn new(cap: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            cap,
        }
    }

    /// Enqueues a normalized URL unless it was seen before or the cap is hit
    ///
    /// # Returns
    ///
    /// `true` if the URL was added to the queue
    pub fn push(&mut self, url: Url) -> bool {
        if self.visited.len() >= self.cap || self.visited.contains(url.as_str()) {
            return false;
        }
        self.visited.insert(url.as_str().to_string());
        self.queue.push_back(url);
        true
    }

    /// Pops the oldest queued URL
    pub fn pop(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
