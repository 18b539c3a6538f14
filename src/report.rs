//! Per-run statistics
//!
//! Every top-level component (crawler, replicator, provisioner) owns one
//! [`RunStats`] value, mutates it as it works and hands it back at the end
//! of the run for display. Nothing here is shared or global.

use console::Style;

/// Counters accumulated over one backup, restore or provision run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// HTTP requests issued, by verb
    pub gets: u64,
    pub posts: u64,
    pub patches: u64,
    pub puts: u64,
    pub deletes: u64,

    /// Pagination cursors followed
    pub pages: u64,
    /// Link relations examined (the `uri` self-relation excluded)
    pub links: u64,
    /// Envelopes written to the store
    pub saved: u64,

    /// Objects applied to the target
    pub applied: u64,
    /// Creates that hit an already-existing object
    pub conflicts: u64,
    /// Objects skipped by policy
    pub skipped: u64,
    /// Mutating calls rejected by the broker
    pub rejected: u64,
    /// Branches abandoned after an error
    pub abandoned: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the non-zero counters, right-aligned like the broker CLI does
    pub fn print_summary(&self, title: &str) {
        println!("{}", Style::new().bold().apply_to(title));
        for (label, value) in self.rows() {
            if value > 0 {
                println!("  {:>18} : {}", label, value);
            }
        }
    }

    fn rows(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("GET", self.gets),
            ("POST", self.posts),
            ("PATCH", self.patches),
            ("PUT", self.puts),
            ("DELETE", self.deletes),
            ("pages", self.pages),
            ("links", self.links),
            ("files written", self.saved),
            ("applied", self.applied),
            ("conflicts", self.conflicts),
            ("skipped", self.skipped),
            ("rejected", self.rejected),
            ("branches dropped", self.abandoned),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_zero() {
        let stats = RunStats::new();
        assert!(stats.rows().iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn test_rows_reflect_counters() {
        let stats = RunStats {
            gets: 3,
            saved: 2,
            ..RunStats::default()
        };
        let rows = stats.rows();
        assert!(rows.contains(&("GET", 3)));
        assert!(rows.contains(&("files written", 2)));
    }
}
