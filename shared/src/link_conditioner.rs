use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    time::{Duration, Instant},
};

/// Contains Config properties which will be used by a link conditioner to
/// simulate a lossy, reordering network
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConditionerConfig {
    /// Delay to receive incoming frames in milliseconds
    pub incoming_latency: u32,
    /// The maximum additional random delay to received incoming frames in
    /// milliseconds. Jitter larger than the gap between frames reorders them.
    pub incoming_jitter: u32,
    /// The ratio of incoming frames that will be dropped, in [0.0, 1.0]
    pub incoming_loss: f32,
}

impl LinkConditionerConfig {
    pub fn new(incoming_latency: u32, incoming_jitter: u32, incoming_loss: f32) -> Self {
        Self {
            incoming_latency,
            incoming_jitter,
            incoming_loss,
        }
    }

    /// No delay, no loss
    pub fn perfect_condition() -> Self {
        Self::new(0, 0, 0.0)
    }

    /// No loss, but enough jitter that consecutive frames routinely swap order
    pub fn shuffled_condition() -> Self {
        Self::new(5, 40, 0.0)
    }

    pub fn average_condition() -> Self {
        Self::new(40, 10, 0.02)
    }

    pub fn poor_condition() -> Self {
        Self::new(100, 50, 0.1)
    }
}

pub mod link_condition_logic {
    use std::time::{Duration, Instant};

    use super::{LinkConditionerConfig, TimeQueue};

    /// Given a config and a frame, either drops the frame or schedules it for
    /// release after the configured latency plus random jitter
    pub fn process_packet<T: Eq>(
        config: &LinkConditionerConfig,
        time_queue: &mut TimeQueue<T>,
        packet: T,
    ) {
        if config.incoming_loss > 0.0 && fastrand::f32() < config.incoming_loss {
            // drop the frame
            return;
        }

        let mut latency_ms = config.incoming_latency;
        if config.incoming_jitter > 0 {
            latency_ms += fastrand::u32(0..=config.incoming_jitter);
        }

        let release_at = Instant::now() + Duration::from_millis(u64::from(latency_ms));
        time_queue.add_item(release_at, packet);
    }
}

/// Items ordered by the instant they become available, earliest first
pub struct TimeQueue<T: Eq> {
    queue: BinaryHeap<ItemContainer<T>>,
    insertion_count: u64,
}

impl<T: Eq> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            insertion_count: 0,
        }
    }

    pub fn add_item(&mut self, instant: Instant, item: T) {
        self.insertion_count += 1;
        self.queue.push(ItemContainer {
            instant,
            order: self.insertion_count,
            item,
        });
    }

    /// Whether the earliest item is ready
    pub fn has_item(&self) -> bool {
        match self.queue.peek() {
            Some(container) => container.instant <= Instant::now(),
            None => false,
        }
    }

    pub fn pop_item(&mut self) -> Option<T> {
        if self.has_item() {
            return self.queue.pop().map(|container| container.item);
        }
        None
    }

    /// Time until the earliest item becomes ready, if any item is queued
    pub fn next_ready_in(&self) -> Option<Duration> {
        self.queue
            .peek()
            .map(|container| container.instant.saturating_duration_since(Instant::now()))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Eq, PartialEq)]
struct ItemContainer<T: Eq> {
    instant: Instant,
    order: u64,
    item: T,
}

impl<T: Eq> Ord for ItemContainer<T> {
    // BinaryHeap is a max-heap, so reverse to pop the earliest instant first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .instant
            .cmp(&self.instant)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl<T: Eq> PartialOrd for ItemContainer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
