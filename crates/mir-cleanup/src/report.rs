/// Counts of what a cleanup run rewrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub constants_materialized: usize,
    /// Constant references left unchanged for a later phase.
    pub constants_deferred: usize,
    pub unsizings: usize,
    /// Struct layers rebuilt by `CoerceUnsized` propagation.
    pub coercions: usize,
    pub virtualized_calls: usize,
    pub statements_inserted: usize,
    pub temporaries_added: usize,
    pub per_function: Vec<(String, usize)>,
}

impl CleanupReport {
    /// Operands rewritten in place. Inserted statements and temporaries
    /// are not counted separately.
    pub fn total_changes(&self) -> usize {
        self.constants_materialized + self.unsizings + self.coercions + self.virtualized_calls
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
            && self.constants_deferred == 0
            && self.statements_inserted == 0
            && self.temporaries_added == 0
    }

    pub fn merge(&mut self, other: &CleanupReport) {
        self.constants_materialized += other.constants_materialized;
        self.constants_deferred += other.constants_deferred;
        self.unsizings += other.unsizings;
        self.coercions += other.coercions;
        self.virtualized_calls += other.virtualized_calls;
        self.statements_inserted += other.statements_inserted;
        self.temporaries_added += other.temporaries_added;
        self.per_function.extend(other.per_function.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counters_and_keeps_function_order() {
        let mut total = CleanupReport {
            unsizings: 1,
            statements_inserted: 1,
            per_function: vec![("demo::a".into(), 1)],
            ..Default::default()
        };
        let other = CleanupReport {
            virtualized_calls: 2,
            constants_deferred: 1,
            per_function: vec![("demo::b".into(), 2)],
            ..Default::default()
        };
        total.merge(&other);
        assert_eq!(total.total_changes(), 3);
        assert_eq!(total.constants_deferred, 1);
        assert_eq!(
            total.per_function,
            vec![("demo::a".to_string(), 1), ("demo::b".to_string(), 2)]
        );
        assert!(CleanupReport::default().is_empty());
        assert!(!total.is_empty());
    }
}
