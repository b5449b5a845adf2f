//!
//! The PerfCounters module contains everything associated with the "perf_counters" feature
//!

/// Performance counters for observing how a store serves its operations.
///
/// These counters don't reflect stats and totals across the whole store, rather they can
/// be reset and therefore used to measure individual operations or sequences of operations.
#[cfg(feature = "perf_counters")]
use core::cell::Cell;

/// All of the performance counters kept by the stores
///
/// NOTE: In order to get valid data, you must enable the `perf_counters` feature in the `Cargo.toml` file
/// with an entry similar to this:
///
/// ```toml
/// [dependencies]
/// record_cabinet = { version = "0.1.0", features = ["perf_counters"] }
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PerfCounterFields {

    /// The number of slots (or slot headers) read from the backing file
    ///
    /// Opening a file store reads one header per slot; every record returned from a query or a
    /// secondary lookup reads one whole slot.
    pub slot_read_count : usize,

    /// The number of whole slots written to the backing file, including the rewrites of a purge
    pub slot_write_count : usize,

    /// The number of times an index was consulted to resolve a lookup or to narrow a filtered query
    pub index_lookup_count : usize,

    /// The number of filtered queries the memory store answered from its result cache
    pub cache_hit_count : usize,

    /// The number of filtered queries the memory store had to evaluate
    ///
    /// The cache hit ratio is: `cache_hit_count / (cache_hit_count + cache_miss_count)`
    pub cache_miss_count : usize,
}

impl PerfCounterFields {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "perf_counters")]
pub struct PerfCounters(Cell<PerfCounterFields>);

#[cfg(feature = "perf_counters")]
impl PerfCounters {
    pub fn new() -> Self {
        Self(Cell::new(PerfCounterFields::new()))
    }
    pub fn reset(&self) {
        self.set(PerfCounterFields::new())
    }
    pub fn update<F : Fn(&mut PerfCounterFields)>(&self, func : F) {
        let mut fields = self.get();
        func(&mut fields);
        self.set(fields);
    }
    pub fn get(&self) -> PerfCounterFields {
        self.0.get()
    }
    pub fn set(&self, fields : PerfCounterFields) {
        self.0.set(fields);
    }
}

#[cfg(not(feature = "perf_counters"))]
pub struct PerfCounters();

#[cfg(not(feature = "perf_counters"))]
impl PerfCounters {
    pub fn new() -> Self {
        Self()
    }
    pub fn reset(&self) {
    }
    pub fn update<F : Fn(&mut PerfCounterFields)>(&self, _func : F) {
    }
    pub fn get(&self) -> PerfCounterFields {
        PerfCounterFields::new()
    }
}
