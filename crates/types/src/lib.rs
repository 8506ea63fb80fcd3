use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A single exam-room booking as ingested from the source table.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub room_id: String,
    pub subject_id: String,
    pub students: i64,
    pub capacity: i64,
    pub slot_key: String,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl Row {
    /// Canonical subject form used for disjointness comparisons: trimmed and
    /// uppercased. The original form is kept in `subject_id` for reporting.
    pub fn canonical_subject(&self) -> String {
        self.subject_id.trim().to_uppercase()
    }
}

/// Size-routing and timing knobs for `room_dispatch::optimize`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "Config::default_threshold")]
    pub threshold: u32,
    #[serde(default = "Config::default_time_limit_seconds")]
    pub time_limit_seconds: u32,
    #[serde(default)]
    pub worker_count: Option<u32>,
}

impl Config {
    pub fn default_threshold() -> u32 {
        80
    }
    pub fn default_time_limit_seconds() -> u32 {
        30
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            time_limit_seconds: Self::default_time_limit_seconds(),
            worker_count: None,
        }
    }
}

/// Numeric form of a partition, ready for a solver. Room index `i` is the
/// only identifier the solvers see; names/subjects ride along so an
/// assignment can be decoded back into a report.
#[derive(Clone, Debug)]
pub struct Instance {
    pub name: Vec<String>,
    pub subject: Vec<String>,
    pub subject_canonical: Vec<String>,
    pub students: Vec<i64>,
    pub capacity: Vec<i64>,
}

impl Instance {
    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// The always-feasible fallback: every room hosts only itself.
    pub fn identity_assignment(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

/// `assign[i]` is the destination room index hosting source room `i`.
pub type Assignment = Vec<usize>;

/// Key identifying a partition: (slot_key, campus).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct PartitionKey {
    pub slot_key: String,
    pub campus: String,
}

impl PartitionKey {
    pub const DEFAULT_CAMPUS: &'static str = "__default__";

    pub fn for_row(row: &Row) -> Self {
        Self {
            slot_key: row.slot_key.clone(),
            campus: row
                .campus
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_CAMPUS.to_string()),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slot_key, self.campus)
    }
}

/// One kept (destination) room and everything merged into it.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeptRoom {
    pub name: String,
    pub subject: String,
    pub students: i64,
    pub capacity: i64,
    pub merged_sources: Vec<MergedSource>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergedSource {
    pub name: String,
    pub subject: String,
    pub students: i64,
}

/// One removed (source) room and where it went.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovedRoom {
    pub name: String,
    pub subject: String,
    pub students: i64,
    pub capacity: i64,
    pub merged_to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartitionDetail {
    pub slot: String,
    pub campus: String,
    pub initial: u32,
    pub r#final: u32,
    pub saved: u32,
    pub kept_rooms_data: Vec<KeptRoom>,
    pub removed_rooms_data: Vec<RemovedRoom>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overall {
    pub initial_rooms: u32,
    pub final_rooms: u32,
    pub rooms_saved: u32,
    pub efficiency_percent: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct OptimizeResult {
    pub overall: Overall,
    pub details: Vec<PartitionDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(subject: &str, campus: Option<&str>) -> Row {
        Row {
            room_id: "R1".into(),
            subject_id: subject.into(),
            students: 1,
            capacity: 1,
            slot_key: "2026-01-01.AM".into(),
            campus: campus.map(String::from),
            date: None,
        }
    }

    #[test]
    fn canonical_subject_trims_and_uppercases() {
        assert_eq!(row("  math ", None).canonical_subject(), "MATH");
    }

    #[test]
    fn partition_key_defaults_missing_campus() {
        let key = PartitionKey::for_row(&row("MATH", None));
        assert_eq!(key.campus, PartitionKey::DEFAULT_CAMPUS);
    }

    #[test]
    fn partition_key_uses_explicit_campus() {
        let key = PartitionKey::for_row(&row("MATH", Some("north")));
        assert_eq!(key.campus, "north");
    }
}
