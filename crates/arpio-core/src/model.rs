//! Arpio API objects
//!
//! These mirror the JSON bodies exchanged with the Arpio API. The provider
//! keeps a projection of [`App`] in resource state and only ever reads
//! [`RecoveryPoint`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A disaster-recovery application pairing a primary and a recovery location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Remote-assigned identifier (empty until created)
    #[serde(default)]
    pub app_id: String,
    /// Arpio account that owns the app
    #[serde(default)]
    pub account_id: String,
    /// User-chosen name; not guaranteed unique
    pub name: String,
    /// Recovery point objective, in seconds
    pub rpo: i64,
    #[serde(default)]
    pub source_aws_account_id: String,
    #[serde(default)]
    pub source_region: String,
    #[serde(default)]
    pub target_aws_account_id: String,
    #[serde(default)]
    pub target_region: String,
    #[serde(default)]
    pub notification_emails: Vec<String>,
    #[serde(default)]
    pub selection_rules: Vec<SelectionRule>,
}

impl App {
    /// Create an empty app owned by an Arpio account
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    /// The replication relationship this app protects
    pub fn sync_pair(&self) -> SyncPair {
        SyncPair::new(
            &self.source_aws_account_id,
            &self.source_region,
            &self.target_aws_account_id,
            &self.target_region,
        )
    }
}

/// Rule selecting which AWS resources an app protects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ruleType", rename_all = "lowercase")]
pub enum SelectionRule {
    /// Match resources by ARN
    Arn { arns: Vec<String> },
    /// Match resources carrying a tag
    Tag { name: String, value: String },
}

impl SelectionRule {
    pub fn arn_rule<S: Into<String>>(arns: impl IntoIterator<Item = S>) -> Self {
        SelectionRule::Arn {
            arns: arns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tag_rule(name: impl Into<String>, value: impl Into<String>) -> Self {
        SelectionRule::Tag {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An AWS account and region
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub account_id: String,
    pub region: String,
}

impl Location {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.region)
    }
}

/// Source and target locations of a replication relationship
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncPair {
    pub source: Location,
    pub target: Location,
}

impl SyncPair {
    pub fn new(
        source_account_id: impl Into<String>,
        source_region: impl Into<String>,
        target_account_id: impl Into<String>,
        target_region: impl Into<String>,
    ) -> Self {
        Self {
            source: Location::new(source_account_id, source_region),
            target: Location::new(target_account_id, target_region),
        }
    }
}

impl fmt::Display for SyncPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// A recoverable, timestamped snapshot state of an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPoint {
    pub recovery_point_id: String,
    pub timestamp: DateTime<Utc>,
    pub source_aws_account_id: String,
    pub source_region: String,
    pub target_aws_account_id: String,
    pub target_region: String,
}

impl RecoveryPoint {
    pub fn sync_pair(&self) -> SyncPair {
        SyncPair::new(
            &self.source_aws_account_id,
            &self.source_region,
            &self.target_aws_account_id,
            &self.target_region,
        )
    }
}

/// A search for the latest recovery point of a sync pair inside a time window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPointQuery {
    pub sync_pair: SyncPair,
    /// Inclusive lower bound
    pub timestamp_min: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub timestamp_max: Option<DateTime<Utc>>,
}

impl RecoveryPointQuery {
    pub fn new(
        sync_pair: SyncPair,
        timestamp_min: Option<DateTime<Utc>>,
        timestamp_max: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            sync_pair,
            timestamp_min,
            timestamp_max,
        }
    }

    /// Whether a recovery point belongs to the pair and falls inside the window
    pub fn matches(&self, rp: &RecoveryPoint) -> bool {
        rp.sync_pair() == self.sync_pair
            && self.timestamp_min.is_none_or(|min| rp.timestamp >= min)
            && self.timestamp_max.is_none_or(|max| rp.timestamp <= max)
    }

    /// The most recent matching recovery point
    pub fn latest<'a>(
        &self,
        points: impl IntoIterator<Item = &'a RecoveryPoint>,
    ) -> Option<&'a RecoveryPoint> {
        points
            .into_iter()
            .filter(|rp| self.matches(rp))
            .max_by_key(|rp| rp.timestamp)
    }

    /// Message explaining why nothing matched, worded after the bounds in use
    pub fn not_found_message(&self) -> String {
        match (self.timestamp_min, self.timestamp_max) {
            (Some(min), Some(max)) => format!(
                "no recovery points between {} and {}",
                min.to_rfc3339(),
                max.to_rfc3339()
            ),
            (Some(min), None) => format!("no recovery points on or after {}", min.to_rfc3339()),
            (None, Some(max)) => format!("no recovery points on or before {}", max.to_rfc3339()),
            (None, None) => format!("no recovery points exist for {}", self.sync_pair),
        }
    }
}
