//! Counters reported by polyface searches and stroke picks.
//!
//! ```ignore
//! let (approach, diagnostics) = search_closest_approach(&mesh_a, &mesh_b, &options);
//! log::debug!("{}", diagnostics.summary());
//! ```

use std::fmt;

use super::metrics::KernelTimingReport;

/// What a closest-approach search or pick run did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchDiagnostics {
    /// Facets read through the visitor, over all meshes involved.
    pub facets_visited: usize,

    /// Facet pairs whose exact distance was computed.
    pub pairs_tested: usize,

    /// Node or facet pairs rejected because their boxes were farther apart
    /// than the running bound.
    pub pairs_pruned: usize,

    /// Self-approach pairs skipped because the facets share a point index.
    pub pairs_sharing_vertices: usize,

    /// Self-approach pairs rejected by the near-tangent normal test.
    pub pairs_rejected_by_normal: usize,

    /// True when the all-pairs path ran instead of the range trees.
    pub brute_force_used: bool,

    /// Distance bound found by the strided presample, if one ran and hit.
    pub presample_bound: Option<f64>,

    /// Only populated with the `kernel_metrics` feature off wasm.
    pub timing: Option<KernelTimingReport>,

    /// Human-readable notes, e.g. skipped malformed facets.
    pub warnings: Vec<String>,
}

impl SearchDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums counters and appends warnings; `timing` is not merged.
    pub fn merge(&mut self, other: &Self) {
        self.facets_visited += other.facets_visited;
        self.pairs_tested += other.pairs_tested;
        self.pairs_pruned += other.pairs_pruned;
        self.pairs_sharing_vertices += other.pairs_sharing_vertices;
        self.pairs_rejected_by_normal += other.pairs_rejected_by_normal;
        self.brute_force_used |= other.brute_force_used;
        self.presample_bound = match (self.presample_bound, other.presample_bound) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// One-line summary for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "facets:{} tested:{}",
            self.facets_visited, self.pairs_tested
        )];
        if self.pairs_pruned > 0 {
            parts.push(format!("pruned:{}", self.pairs_pruned));
        }
        if self.pairs_sharing_vertices > 0 {
            parts.push(format!("shared:{}", self.pairs_sharing_vertices));
        }
        if self.pairs_rejected_by_normal > 0 {
            parts.push(format!("normal-test:{}", self.pairs_rejected_by_normal));
        }
        if self.brute_force_used {
            parts.push("brute-force".to_string());
        }
        if let Some(bound) = self.presample_bound {
            parts.push(format!("presample:{bound:.6}"));
        }
        if let Some(timing) = &self.timing {
            parts.push(format!("time:{:.3}ms", timing.total_ms()));
        }
        parts.join(" ")
    }
}

impl fmt::Display for SearchDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Diagnostics:")?;
        writeln!(f, "  Facets visited: {}", self.facets_visited)?;
        writeln!(f, "  Pairs tested: {}", self.pairs_tested)?;
        if self.pairs_pruned > 0 {
            writeln!(f, "  Pairs pruned: {}", self.pairs_pruned)?;
        }
        if self.pairs_sharing_vertices > 0 || self.pairs_rejected_by_normal > 0 {
            writeln!(f, "  Self-approach filters:")?;
            writeln!(f, "    - Shared vertices: {}", self.pairs_sharing_vertices)?;
            writeln!(f, "    - Normal test: {}", self.pairs_rejected_by_normal)?;
        }
        if self.brute_force_used {
            writeln!(f, "  Brute force: yes")?;
        }
        if let Some(bound) = self.presample_bound {
            writeln!(f, "  Presample bound: {bound}")?;
        }
        if let Some(timing) = &self.timing {
            writeln!(f, "  Time: {:.3} ms", timing.total_ms())?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_smaller_presample_bound() {
        let mut a = SearchDiagnostics {
            pairs_tested: 3,
            presample_bound: Some(2.0),
            ..SearchDiagnostics::default()
        };
        let b = SearchDiagnostics {
            pairs_tested: 4,
            presample_bound: Some(1.5),
            brute_force_used: true,
            ..SearchDiagnostics::default()
        };
        a.merge(&b);
        assert_eq!(a.pairs_tested, 7);
        assert_eq!(a.presample_bound, Some(1.5));
        assert!(a.brute_force_used);
    }

    #[test]
    fn summary_lists_active_counters() {
        let mut d = SearchDiagnostics::new();
        d.facets_visited = 4;
        d.brute_force_used = true;
        d.add_warning("facet 7 skipped");
        let s = d.summary();
        assert!(s.starts_with("facets:4 tested:0"));
        assert!(s.contains("brute-force"));
        assert!(!s.contains("pruned"));
        assert!(!s.contains("time:"));
    }

    #[test]
    fn summary_reports_timing_total() {
        let d = SearchDiagnostics {
            timing: Some(KernelTimingReport {
                visibility_ns: 2_500_000,
                ..KernelTimingReport::default()
            }),
            ..SearchDiagnostics::default()
        };
        assert!(d.summary().ends_with("time:2.500ms"));
    }
}
