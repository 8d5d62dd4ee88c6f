//! Example wire entities (§4.4.3) demonstrating the serialization
//! convention every entity type in this transport must follow: nullable
//! fields are omitted, not emitted as `null`, via
//! `#[serde(skip_serializing_if = "Option::is_none")]`.

use serde::{Deserialize, Serialize};

/// A minimal GitLab-shaped merge request entity, standing in for "the"
/// entity type a caller would define for their own endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
   pub iid: u64,
   pub title: String,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub description: Option<String>,
   pub state: MergeRequestState,
}

/// Enum fields serialize via their declared wire name, not the symbolic
/// Rust variant name (§4.4.3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeRequestState {
   Opened,
   Closed,
   Merged,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn omits_absent_nullable_field_instead_of_emitting_null() {
      let mr = MergeRequest { iid: 1, title: "fix".to_string(), description: None, state: MergeRequestState::Opened };
      let json = serde_json::to_string(&mr).expect("serialize");
      assert!(!json.contains("description"));
      assert!(json.contains("\"state\":\"opened\""));
   }

   #[test]
   fn includes_present_nullable_field() {
      let mr = MergeRequest { iid: 1, title: "fix".to_string(), description: Some("why".to_string()), state: MergeRequestState::Merged };
      let json = serde_json::to_string(&mr).expect("serialize");
      assert!(json.contains("\"description\":\"why\""));
   }
}
