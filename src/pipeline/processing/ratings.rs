use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{RatingEvent, RatingValue, ReconciledRow};

/// Per-movie rating distribution pivoted on rating value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingCounts {
    columns: Vec<RatingValue>,
    counts: HashMap<i64, BTreeMap<RatingValue, u64>>,
}

impl RatingCounts {
    /// Count events by `(movie id, rating)`. The pivot columns are the
    /// distinct rating values in the log, ascending.
    pub fn aggregate(events: &[RatingEvent]) -> Self {
        let mut values = BTreeSet::new();
        let mut counts: HashMap<i64, BTreeMap<RatingValue, u64>> = HashMap::new();

        for event in events {
            let value = event.rating_value();
            values.insert(value);
            *counts
                .entry(event.movie_id)
                .or_default()
                .entry(value)
                .or_insert(0) += 1;
        }

        Self {
            columns: values.into_iter().collect(),
            counts,
        }
    }

    pub fn columns(&self) -> &[RatingValue] {
        &self.columns
    }

    pub fn movie_count(&self) -> usize {
        self.counts.len()
    }

    /// Counts for one movie with a zero for every pivot column it lacks.
    pub fn counts_for(&self, movie_id: i64) -> BTreeMap<RatingValue, u64> {
        let observed = self.counts.get(&movie_id);
        self.columns
            .iter()
            .map(|value| {
                let count = observed
                    .and_then(|c| c.get(value))
                    .copied()
                    .unwrap_or(0);
                (*value, count)
            })
            .collect()
    }

    /// Left join onto reconciled rows by `kaggle_id`.
    pub fn attach(&self, rows: &mut [ReconciledRow]) {
        for row in rows.iter_mut() {
            row.rating_counts = self.counts_for(row.kaggle_id);
        }
    }
}
