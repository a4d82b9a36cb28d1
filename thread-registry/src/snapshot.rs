//! On-disk snapshot format.
//!
//! Shape: `{"Threads":[{"BotName":"a","Threads":{"42":"thread_x"}}]}`. Older writers appended one
//! bucket per saved thread, so the same `BotName` may appear several times; loading merges them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// All threads of one bot, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotBucket {
    #[serde(rename = "BotName")]
    pub bot_name: String,
    #[serde(rename = "Threads", default)]
    pub threads: BTreeMap<String, String>,
}

/// Whole-registry snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "Threads", default)]
    pub buckets: Vec<BotBucket>,
}

impl Snapshot {
    /// Builds a snapshot with buckets sorted by bot name; empty buckets are skipped.
    pub(crate) fn from_map(map: &HashMap<String, HashMap<String, String>>) -> Self {
        let mut buckets: Vec<BotBucket> = map
            .iter()
            .filter(|(_, threads)| !threads.is_empty())
            .map(|(bot, threads)| BotBucket {
                bot_name: bot.clone(),
                threads: threads
                    .iter()
                    .map(|(user, thread)| (user.clone(), thread.clone()))
                    .collect(),
            })
            .collect();
        buckets.sort_by(|a, b| a.bot_name.cmp(&b.bot_name));
        Self { buckets }
    }

    /// Merges buckets into a map; for a repeated (bot, user) the later entry wins.
    pub(crate) fn into_map(self) -> HashMap<String, HashMap<String, String>> {
        let mut map: HashMap<String, HashMap<String, String>> = HashMap::new();
        for bucket in self.buckets {
            if bucket.threads.is_empty() {
                continue;
            }
            map.entry(bucket.bot_name)
                .or_default()
                .extend(bucket.threads);
        }
        map
    }

    /// Total number of (bot, user) entries.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.threads.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
