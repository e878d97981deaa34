//! Merging successful outcomes and summarizing ages
//!
//! Median selection indexes the ascending age list at `ceil(n / 2)`, which is one past
//! the conventional upper median. As a consequence a single user yields no median at
//! all. Downstream reports depend on these exact values, so both quirks are kept.

use serde::Serialize;
use tracing::info;

use crate::outcome::Outcome;
use crate::parser::User;

/// Statistics over the merged user set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub count: usize,
    /// Integer mean of all ages, truncated; `None` when there are no users
    pub mean: Option<i64>,
    pub median: Option<Median>,
}

/// Median age plus every user who has exactly that age
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Median {
    pub age: i64,
    pub users: Vec<User>,
}

impl Summary {
    /// Emit the summary as log lines
    pub fn log(&self) {
        info!(count = self.count, "{} users", self.count);

        if let Some(mean) = self.mean {
            info!(mean, "mean {}", mean);
        }

        if let Some(ref median) = self.median {
            info!(median = median.age, ties = median.users.len(), "median {} users:", median.age);
            for user in &median.users {
                info!("{}", user);
            }
        }
    }
}

/// Concatenate the users of every successful outcome, in outcome order
pub fn merge(outcomes: &[Outcome]) -> Vec<User> {
    outcomes
        .iter()
        .flat_map(|outcome| outcome.users().iter().cloned())
        .collect()
}

pub fn summarize(users: &[User]) -> Summary {
    let count = users.len();
    if count == 0 {
        return Summary {
            count,
            mean: None,
            median: None,
        };
    }

    let mut ages: Vec<i64> = users.iter().map(|u| u.age).collect();
    ages.sort_unstable();

    // Ages span all of i64, so the sum is carried in i128. The quotient of n values
    // divided by n always fits back into i64.
    let total: i128 = ages.iter().map(|&age| i128::from(age)).sum();
    let mean = i64::try_from(total / count as i128).ok();

    let mid = count.div_ceil(2);
    let median = ages.get(mid).map(|&age| Median {
        age,
        users: users.iter().filter(|u| u.age == age).cloned().collect(),
    });

    Summary {
        count,
        mean,
        median,
    }
}
