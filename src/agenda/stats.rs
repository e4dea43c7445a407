use crate::{
    models::Task,
    schema::{AnalyticsResponse, PieChart, PieSlice, Priority},
};

/// Counts over a user's whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TaskStats {
    pub fn compute(tasks: &[Task]) -> Self {
        let mut stats = tasks.iter().fold(TaskStats::default(), |mut acc, task| {
            acc.total += 1;
            if task.completed {
                acc.completed += 1;
            }
            match task.priority {
                Priority::High => acc.high += 1,
                Priority::Medium => acc.medium += 1,
                Priority::Low => acc.low += 1,
            }
            acc
        });
        stats.incomplete = stats.total - stats.completed;
        stats
    }

    pub fn priority_chart(&self) -> PieChart {
        PieChart {
            has_data: self.high + self.medium + self.low > 0,
            slices: vec![
                slice("high", self.high),
                slice("medium", self.medium),
                slice("low", self.low),
            ],
        }
    }

    pub fn completion_chart(&self) -> PieChart {
        PieChart {
            has_data: self.completed + self.incomplete > 0,
            slices: vec![
                slice("completed", self.completed),
                slice("incomplete", self.incomplete),
            ],
        }
    }
}

fn slice(label: &str, value: usize) -> PieSlice {
    PieSlice {
        label: label.to_string(),
        value,
    }
}

impl From<TaskStats> for AnalyticsResponse {
    fn from(stats: TaskStats) -> Self {
        AnalyticsResponse {
            total: stats.total,
            completed: stats.completed,
            incomplete: stats.incomplete,
            high: stats.high,
            medium: stats.medium,
            low: stats.low,
            priority_chart: stats.priority_chart(),
            completion_chart: stats.completion_chart(),
        }
    }
}
