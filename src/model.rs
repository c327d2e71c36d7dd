/// Point-in-time view of a queue's occupancy.
#[derive(Debug, Clone)]
pub struct QueueMetrics {
    pub buffered: usize,
    pub pending_requests: usize,
    pub capacity: usize,
}

impl QueueMetrics {
    /// Fraction of buffer capacity in use. Zero-capacity queues report 0.
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.buffered as f64 / self.capacity as f64
    }

    /// True when consumers are queued up waiting for producers.
    pub fn consumers_waiting(&self) -> bool {
        self.pending_requests > 0
    }
}

/// Point-in-time view of a pool's scheduling state.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub worker_threads: usize,
    pub busy: usize,
    pub pending: usize,
    pub running_keys: usize,
    pub shutdown: bool,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.worker_threads == 0 {
            return 0.0;
        }
        self.busy as f64 / self.worker_threads as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.pending as f64
    }

    pub fn is_idle(&self) -> bool {
        self.busy == 0 && self.pending == 0
    }
}
