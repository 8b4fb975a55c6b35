use fnv::FnvHashMap;
use parking_lot::RwLock;

/// Named monotonic counters, self-registering on first increment.
#[derive(Default)]
pub struct CounterRegistry {
    counters: RwLock<FnvHashMap<String, u64>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str, value: u64) {
        *self.counters.write().entry(name.to_string()).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.read().get(name).copied().unwrap_or(0)
    }

    pub fn all(&self) -> Vec<(String, u64)> {
        self.counters.read().iter().map(|(name, count)| (name.clone(), *count)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_unseen_counter_reads_zero() {
        let counters = CounterRegistry::new();
        assert_eq!(counters.get("orders.placed"), 0);
    }

    #[test]
    fn increments_accumulate_by_name() {
        let counters = CounterRegistry::new();
        counters.increment("orders.placed", 1);
        counters.increment("orders.placed", 1);
        counters.increment("orders.rejected", 3);

        assert_eq!(counters.get("orders.placed"), 2);
        assert_eq!(counters.get("orders.rejected"), 3);
    }
}
