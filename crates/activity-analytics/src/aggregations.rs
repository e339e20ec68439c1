//! Membership resolution, sent/read aggregation, and reconciliation.
//!
//! Every structure here keeps an explicit insertion-order vector next to
//! its map, so downstream rendering never depends on hash order.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use activity_core::client::StreamClient;
use activity_core::error::{ActivityError, Result};
use activity_core::types::{Identity, MessageEnvelope, RosterMember, StreamMessage};

/// Mapping from user id to display email, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipMap {
    emails: HashMap<String, String>,
    order: Vec<String>,
}

impl MembershipMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update an entry. Last write wins for the email; the
    /// original insertion position is kept.
    pub fn insert(&mut self, user_id: impl Into<String>, email: impl Into<String>) {
        let user_id = user_id.into();
        if !self.emails.contains_key(&user_id) {
            self.order.push(user_id.clone());
        }
        self.emails.insert(user_id, email.into());
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.emails.contains_key(user_id)
    }

    pub fn email(&self, user_id: &str) -> Option<&str> {
        self.emails.get(user_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|uid| self.emails.get(uid).map(|email| (uid.as_str(), email.as_str())))
    }
}

/// Per-user activity: messages in fetch order plus the last email observed
/// for the user during aggregation.
#[derive(Debug, Clone, Default)]
pub struct UserActivity {
    pub email: String,
    pub messages: Vec<StreamMessage>,
}

/// Mapping from user id to an ordered message sequence. Used for both the
/// sent index and the read index.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    entries: HashMap<String, UserActivity>,
    order: Vec<String>,
}

impl ActivityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to `identity`'s sequence, refreshing the
    /// last-known email.
    pub fn append(&mut self, identity: &Identity, message: StreamMessage) {
        if !self.entries.contains_key(&identity.user_id) {
            self.order.push(identity.user_id.clone());
        }
        let entry = self.entries.entry(identity.user_id.clone()).or_default();
        entry.email = identity.email.clone();
        entry.messages.push(message);
    }

    /// Messages recorded for a user, empty when the user has no activity.
    pub fn messages(&self, user_id: &str) -> &[StreamMessage] {
        self.entries
            .get(user_id)
            .map(|e| e.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Message count for a user; zero is the expected answer for an
    /// inactive member, never an error.
    pub fn count(&self, user_id: &str) -> usize {
        self.entries.get(user_id).map(|e| e.messages.len()).unwrap_or(0)
    }

    pub fn email(&self, user_id: &str) -> Option<&str> {
        self.entries.get(user_id).map(|e| e.email.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Users in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserActivity)> {
        self.order
            .iter()
            .filter_map(|uid| self.entries.get(uid).map(|e| (uid.as_str(), e)))
    }
}

/// Build the membership map from the current roster.
///
/// User ids are trimmed, emails stored verbatim. Duplicate ids must not
/// occur in a well-formed platform response, but if they do the last
/// record wins. A record missing the nested user fields is a `DataShape`
/// error, propagated to the caller.
pub fn resolve_members(roster: &[RosterMember]) -> Result<MembershipMap> {
    let mut members = MembershipMap::new();
    for record in roster {
        let user = record
            .user
            .as_ref()
            .ok_or_else(|| ActivityError::DataShape("roster record missing user object".into()))?;
        let identity = user.identity()?;
        let email = user.email.clone().ok_or_else(|| {
            ActivityError::DataShape(format!(
                "roster record for {} missing email",
                identity.user_id
            ))
        })?;
        members.insert(identity.user_id, email);
    }
    Ok(members)
}

/// Result of the sent-message pass.
#[derive(Debug, Clone, Default)]
pub struct SentAggregation {
    pub index: ActivityIndex,
    /// Messages skipped because the payload was missing expected fields.
    pub malformed: u32,
}

/// Group the message snapshot by sender, preserving fetch order within
/// each group.
///
/// A malformed message is skipped and counted; the rest of the snapshot
/// still aggregates.
pub fn collect_sent(snapshot: &[MessageEnvelope]) -> SentAggregation {
    let mut aggregation = SentAggregation::default();
    for envelope in snapshot {
        match envelope.message() {
            Ok(message) => {
                let sender = message.sender.clone();
                aggregation.index.append(&sender, message);
            }
            Err(err) => {
                warn!("skipping malformed message in sent aggregation: {err}");
                aggregation.malformed += 1;
            }
        }
    }
    aggregation
}

/// Result of the read-receipt pass.
#[derive(Debug, Clone, Default)]
pub struct ReadAggregation {
    pub index: ActivityIndex,
    /// Status lookups that failed. Not retried.
    pub failed_lookups: u32,
    /// Messages or reader records skipped for missing fields.
    pub malformed: u32,
}

/// Resolve readers for every message in the snapshot.
///
/// Issues exactly one status lookup per message, sequentially in fetch
/// order. A reader reported more than once for the same message counts
/// once. A failed lookup is counted and skipped without disturbing
/// results already gathered for other messages; a status with no readers
/// is a normal, empty answer.
pub async fn collect_read(
    client: &dyn StreamClient,
    snapshot: &[MessageEnvelope],
) -> ReadAggregation {
    let mut aggregation = ReadAggregation::default();
    for envelope in snapshot {
        let message = match envelope.message() {
            Ok(message) => message,
            Err(err) => {
                warn!("skipping malformed message in read aggregation: {err}");
                aggregation.malformed += 1;
                continue;
            }
        };

        let status = match client.get_message_status(&message.message_id).await {
            Ok(status) => status,
            Err(err) => {
                warn!("read-status lookup failed for {}: {err}", message.message_id);
                aggregation.failed_lookups += 1;
                continue;
            }
        };

        let mut seen = HashSet::new();
        for reader in &status.read {
            let identity = match reader.identity() {
                Ok(identity) => identity,
                Err(err) => {
                    warn!("skipping malformed reader on {}: {err}", message.message_id);
                    aggregation.malformed += 1;
                    continue;
                }
            };
            if seen.insert(identity.user_id.clone()) {
                aggregation.index.append(&identity, message.clone());
            }
        }
    }
    aggregation
}

/// Merge identities observed only through activity into the membership
/// map.
///
/// Returns a new map: existing entries are untouched, and every sent or
/// read index key absent from the roster is appended with the last-known
/// email captured during aggregation. Sent keys come before read keys, so
/// the resulting order is stable. Applying the merge twice yields the
/// same map.
pub fn reconcile(
    members: &MembershipMap,
    sent: &ActivityIndex,
    read: &ActivityIndex,
) -> MembershipMap {
    let mut merged = members.clone();
    for index in [sent, read] {
        for (user_id, activity) in index.iter() {
            if !merged.contains(user_id) {
                merged.insert(user_id, activity.email.clone());
            }
        }
    }
    merged
}
