// Per-dataset run guard and short-lived result cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use fieldwatch_domain::RunReport;

#[derive(Default)]
struct Slot {
    in_flight: bool,
    last: Option<(Instant, Arc<RunReport>)>,
}

pub struct RunCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

/// Held for the duration of a run; releases the dataset on drop.
pub struct RunGuard<'a> {
    cache: &'a RunCache,
    key: String,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.cache.lock().get_mut(&self.key) {
            slot.in_flight = false;
        }
    }
}

impl RunCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `None` when another run over the same dataset is still in flight.
    pub fn try_begin(&self, key: &str) -> Option<RunGuard<'_>> {
        let mut slots = self.lock();
        let slot = slots.entry(key.to_string()).or_default();
        if slot.in_flight {
            return None;
        }
        slot.in_flight = true;
        Some(RunGuard {
            cache: self,
            key: key.to_string(),
        })
    }

    pub fn fresh(&self, key: &str) -> Option<Arc<RunReport>> {
        let slots = self.lock();
        let (stored_at, report) = slots.get(key)?.last.as_ref()?;
        if stored_at.elapsed() <= self.ttl {
            Some(Arc::clone(report))
        } else {
            None
        }
    }

    pub fn store(&self, key: &str, report: RunReport) {
        let mut slots = self.lock();
        let slot = slots.entry(key.to_string()).or_default();
        slot.last = Some((Instant::now(), Arc::new(report)));
    }
}
