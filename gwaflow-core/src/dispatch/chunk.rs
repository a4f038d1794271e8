//! Grouping commands into array jobs.
//!
//! Commands are first packed into array elements (`commands_per_task`
//! each, run sequentially), then elements are split into submissions of
//! at most `max_array_size`.

use serde::{Deserialize, Serialize};

use super::ResourceProfile;
use crate::scheduler::ArrayJob;

/// Scheduler limits that shape a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    pub max_array_size: usize,
    pub commands_per_task: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_array_size: 1000,
            commands_per_task: 1,
        }
    }
}

/// Split `commands` into array jobs. Zero limits are treated as 1.
pub fn plan_array_jobs(
    name: &str,
    profile: &ResourceProfile,
    commands: Vec<String>,
    limits: BatchLimits,
) -> Vec<ArrayJob> {
    let per_task = limits.commands_per_task.max(1);
    let max_array = limits.max_array_size.max(1);

    let tasks: Vec<Vec<String>> = commands
        .chunks(per_task)
        .map(|c| c.to_vec())
        .collect();
    let n_chunks = tasks.len().div_ceil(max_array);

    tasks
        .chunks(max_array)
        .enumerate()
        .map(|(i, chunk)| ArrayJob {
            name: if n_chunks > 1 {
                format!("{}_{}", name, i)
            } else {
                name.to_string()
            },
            profile: profile.clone(),
            tasks: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("echo {}", i)).collect()
    }

    #[test]
    fn test_single_chunk_keeps_name() {
        let jobs = plan_array_jobs(
            "finemap",
            &ResourceProfile::new(1, 10),
            commands(3),
            BatchLimits::default(),
        );
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "finemap");
        assert_eq!(jobs[0].tasks.len(), 3);
    }

    #[test]
    fn test_chunking_over_limit() {
        let limits = BatchLimits {
            max_array_size: 4,
            commands_per_task: 1,
        };
        let jobs = plan_array_jobs("prs", &ResourceProfile::new(1, 10), commands(10), limits);
        assert_eq!(jobs.len(), 3);
        assert_eq!(
            jobs.iter().map(|j| j.tasks.len()).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
        assert_eq!(jobs[2].name, "prs_2");
        assert_eq!(jobs[2].tasks[1], vec!["echo 9".to_string()]);
    }

    #[test]
    fn test_commands_per_task_packing() {
        let limits = BatchLimits {
            max_array_size: 2,
            commands_per_task: 3,
        };
        let jobs = plan_array_jobs("mr", &ResourceProfile::new(1, 10), commands(7), limits);
        // 7 commands -> 3 tasks -> 2 submissions
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].tasks[0].len(), 3);
        assert_eq!(jobs[1].tasks[0].len(), 1);
    }

    #[test]
    fn test_empty() {
        let jobs = plan_array_jobs(
            "x",
            &ResourceProfile::new(1, 10),
            Vec::new(),
            BatchLimits::default(),
        );
        assert!(jobs.is_empty());
    }
}
