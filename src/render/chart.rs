use std::collections::VecDeque;

use simple_moving_average::{SMA, SumTreeSMA};

use crate::monitor::SegmentRecord;

pub const DEFAULT_CHART_WINDOW: usize = 50;
const TREND_WINDOW: usize = 5;

/// Load time by chunk index, kept across polls.
///
/// Entries stay in arrival order. A chunk index seen again overwrites its value in place, and
/// once `capacity` entries are held every new index evicts the oldest one.
#[derive(Clone, Debug)]
pub struct LoadTimeChart {
    capacity: usize,
    entries: VecDeque<(String, f64)>,
}

impl Default for LoadTimeChart {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHART_WINDOW)
    }
}

impl LoadTimeChart {
    pub fn with_capacity(capacity: usize) -> Self {
        // the window comes from user config, so nothing is reserved up front
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn update(&mut self, records: &[SegmentRecord]) {
        for record in records {
            self.insert(record.chunk_index(), record.load_time);
        }
    }

    pub fn insert(&mut self, chunk_index: &str, load_time: f64) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(index, _)| index == chunk_index)
        {
            entry.1 = load_time;
            return;
        }

        self.entries.push_back((chunk_index.to_string(), load_time));
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, chunk_index: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(index, _)| index == chunk_index)
            .map(|(_, load_time)| *load_time)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(index, load_time)| (index.as_str(), *load_time))
    }

    /// x-axis labels, in plotting order
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(index, _)| index.clone()).collect()
    }

    /// `[position, load time]` pairs for plotting
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, (_, load_time))| [position as f64, *load_time])
            .collect()
    }

    /// Moving average of the load times over the last few chunks.
    pub fn trend_points(&self) -> Vec<[f64; 2]> {
        let mut average = SumTreeSMA::<f64, f64, TREND_WINDOW>::new();
        self.entries
            .iter()
            .enumerate()
            .map(|(position, (_, load_time))| {
                average.add_sample(*load_time);
                [position as f64, average.get_average()]
            })
            .collect()
    }

    pub fn max_load_time(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|(_, load_time)| *load_time)
            .reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(url: &str, load_time: f64) -> SegmentRecord {
        SegmentRecord {
            url: url.to_string(),
            duration: 6.,
            load_time,
            is_delayed: false,
        }
    }

    #[test]
    fn test_huge_window_allocates_lazily() {
        let mut chart = LoadTimeChart::with_capacity(usize::MAX);
        assert_eq!(chart.capacity(), usize::MAX);
        chart.update(&[record("https://h/1.ts", 0.5), record("https://h/2.ts", 0.7)]);
        assert_eq!(chart.labels(), vec!["1", "2"]);
    }

    #[test]
    fn test_repeated_chunk_overwrites_in_place() {
        let mut chart = LoadTimeChart::default();
        chart.update(&[record("https://h/1.ts", 0.5)]);
        chart.update(&[record("https://h/1.ts", 0.8), record("https://h/2.ts", 0.3)]);

        assert_eq!(
            chart.entries().collect::<Vec<_>>(),
            vec![("1", 0.8), ("2", 0.3)]
        );
        assert_eq!(chart.get("1"), Some(0.8));
        assert_eq!(chart.get("2"), Some(0.3));
    }

    #[test]
    fn test_urls_without_chunk_index_are_keyed_by_url() {
        let mut chart = LoadTimeChart::default();
        chart.update(&[record("https://h/init.mp4", 1.2)]);
        assert_eq!(chart.labels(), vec!["https://h/init.mp4".to_string()]);
    }

    #[test]
    fn test_empty_update_leaves_chart_unchanged() {
        let mut chart = LoadTimeChart::default();
        chart.update(&[record("https://h/1.ts", 0.5)]);
        chart.update(&[]);
        assert_eq!(chart.len(), 1);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut chart = LoadTimeChart::with_capacity(3);
        for i in 0..5 {
            chart.insert(&i.to_string(), i as f64);
        }
        assert_eq!(chart.labels(), vec!["2", "3", "4"]);
        assert_eq!(chart.points(), vec![[0., 2.], [1., 3.], [2., 4.]]);
        assert_eq!(chart.get("0"), None);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut chart = LoadTimeChart::with_capacity(2);
        chart.insert("1", 0.1);
        chart.insert("2", 0.2);
        chart.insert("1", 0.3);
        assert_eq!(chart.labels(), vec!["1", "2"]);
        assert_eq!(chart.get("1"), Some(0.3));
    }

    #[test]
    fn test_trend_is_moving_average() {
        let mut chart = LoadTimeChart::default();
        for (i, load_time) in [1., 2., 3., 4., 5., 6.].iter().enumerate() {
            chart.insert(&i.to_string(), *load_time);
        }
        let trend = chart.trend_points();
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[0], [0., 1.]);
        assert_eq!(trend[1], [1., 1.5]);
        // window of 5: (2 + 3 + 4 + 5 + 6) / 5
        assert_eq!(trend[5], [5., 4.]);
        assert_eq!(chart.max_load_time(), Some(6.));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_never_exceeds_capacity(
            capacity in 1usize..20,
            chunks in prop::collection::vec(0u32..40, 0..200),
        ) {
            let mut chart = LoadTimeChart::with_capacity(capacity);
            for chunk in &chunks {
                chart.insert(&chunk.to_string(), *chunk as f64);
                prop_assert!(chart.len() <= capacity);
            }
            // labels are unique
            let mut labels = chart.labels();
            labels.sort();
            labels.dedup();
            prop_assert_eq!(labels.len(), chart.len());
        }
    }
}
