use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Registry, TextEncoder,
};

lazy_static! {
    pub static ref KUNLUN_ALLOCATION_METRICS: Registry =
        Registry::new_custom(Some("kunlun_allocation".to_string()), None)
            .expect("fail to create registry");
    static ref ALLOCATION_MODIFICATIONS: IntCounterVec = register_int_counter_vec_with_registry!(
        "allocation_modifications_total",
        "Count of allocation modifications",
        &["kind"],
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
    static ref DEALLOCATIONS_CLEARED: IntCounter = register_int_counter_with_registry!(
        "deallocations_cleared_total",
        "Count of deallocation queue entries cleared",
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
    static ref SLASHES: IntCounter = register_int_counter_with_registry!(
        "slashes_total",
        "Count of slashes",
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
    static ref MAGNITUDE_SLASHED: IntCounter = register_int_counter_with_registry!(
        "magnitude_slashed_total",
        "Magnitude removed by slashing",
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
    static ref REGISTRATIONS: IntCounterVec = register_int_counter_vec_with_registry!(
        "registrations_total",
        "Count of operator set registration changes",
        &["action"],
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
    static ref REGISTRAR_FAILURES_IGNORED: IntCounter = register_int_counter_with_registry!(
        "registrar_failures_ignored_total",
        "Count of deregistration hook failures that were ignored",
        &KUNLUN_ALLOCATION_METRICS
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    Allocate,
    QueuedDeallocation,
    InstantDeallocation,
}

impl ModificationKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::QueuedDeallocation => "queued_deallocation",
            Self::InstantDeallocation => "instant_deallocation",
        }
    }
}

pub struct AllocationMetrics;

impl AllocationMetrics {
    pub fn modification(kind: ModificationKind) {
        ALLOCATION_MODIFICATIONS.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn deallocations_cleared(count: usize) {
        DEALLOCATIONS_CLEARED.inc_by(count as u64);
    }

    pub fn slash(magnitude: u64) {
        SLASHES.inc();
        MAGNITUDE_SLASHED.inc_by(magnitude);
    }

    pub fn registration(action: &str) {
        REGISTRATIONS.with_label_values(&[action]).inc();
    }

    pub fn registrar_failure_ignored() {
        REGISTRAR_FAILURES_IGNORED.inc();
    }
}

/// Text exposition of every metric in the allocation registry.
pub fn gather() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder.encode(&KUNLUN_ALLOCATION_METRICS.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathered_text_contains_prefixed_counters() {
        AllocationMetrics::modification(ModificationKind::Allocate);
        AllocationMetrics::slash(10);
        let text = gather().unwrap();
        assert!(text.contains("kunlun_allocation_allocation_modifications_total"));
        assert!(text.contains("kunlun_allocation_slashes_total"));
    }
}
