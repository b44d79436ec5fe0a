//! Opt-in timing hooks for the polyface search paths.
//!
//! Active only with the `kernel_metrics` feature on non-wasm targets; every
//! call is a no-op otherwise and [`KernelMetrics::end`] returns `None`.
//!
//! ```ignore
//! let mut metrics = KernelMetrics::default();
//! metrics.begin();
//! let tree = metrics.time(TimingBucket::TreeBuild, || FacetRangeTree::build(&boxes));
//! if let Some(report) = metrics.end() {
//!     println!("tree build: {} ns", report.tree_build_ns);
//! }
//! ```

/// Phases of a search or pick run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Reading facets through the visitor.
    FacetCollection,
    /// Building facet range trees.
    TreeBuild,
    /// Strided presample for the initial distance bound.
    Presample,
    /// Pair search (tree-pruned, brute force or self).
    PairSearch,
    /// Matrix setup and inversion.
    MatrixAlgebra,
    /// Per-facet stroke picking.
    Picking,
    /// Overlap analysis of stroke picks.
    Visibility,
}

/// Cumulative nanoseconds per [`TimingBucket`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KernelTimingReport {
    pub facet_collection_ns: u64,
    pub tree_build_ns: u64,
    pub presample_ns: u64,
    pub pair_search_ns: u64,
    pub matrix_algebra_ns: u64,
    pub picking_ns: u64,
    pub visibility_ns: u64,
}

impl KernelTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.facet_collection_ns
            .saturating_add(self.tree_build_ns)
            .saturating_add(self.presample_ns)
            .saturating_add(self.pair_search_ns)
            .saturating_add(self.matrix_algebra_ns)
            .saturating_add(self.picking_ns)
            .saturating_add(self.visibility_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Timing accumulator: [`begin`](Self::begin), wrap work in
/// [`time`](Self::time), collect with [`end`](Self::end).
#[derive(Debug, Default)]
pub struct KernelMetrics {
    #[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
    report: KernelTimingReport,
}

impl KernelMetrics {
    /// Resets all counters.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
        {
            self.report = KernelTimingReport::default();
        }
    }

    /// Accumulated report, or `None` when metrics are compiled out.
    #[must_use]
    pub fn end(&self) -> Option<KernelTimingReport> {
        #[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "kernel_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Runs `f`, adding its elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "kernel_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::FacetCollection => &mut self.report.facet_collection_ns,
            TimingBucket::TreeBuild => &mut self.report.tree_build_ns,
            TimingBucket::Presample => &mut self.report.presample_ns,
            TimingBucket::PairSearch => &mut self.report.pair_search_ns,
            TimingBucket::MatrixAlgebra => &mut self.report.matrix_algebra_ns,
            TimingBucket::Picking => &mut self.report.picking_ns,
            TimingBucket::Visibility => &mut self.report.visibility_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}
