use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Denormalized view of a user plus (optionally) their linked partner.
/// Partner fields are present iff pairing has occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: Uuid,
    pub user_name: String,
    pub pairing_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_pairing_code: Option<String>,
}

impl Account {
    pub fn is_paired(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// A tracked moment. `start_date` is immutable once set — it is sampled at
/// record time, decoupled from when the title is typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub messages: Vec<EventMessage>,
}

/// A note on an event's thread. Append-only: no edit, no delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: MessageAuthor,
}

/// Authorship tag relative to the submitting side, not an absolute user id.
/// The same message reads as "me" to its author and "partner" to the other
/// side purely through rendering symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    Me,
    Partner,
}

impl MessageAuthor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::Partner => "partner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "me" => Some(Self::Me),
            "partner" => Some(Self::Partner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_tag_round_trips_through_storage_form() {
        for author in [MessageAuthor::Me, MessageAuthor::Partner] {
            assert_eq!(MessageAuthor::parse(author.as_str()), Some(author));
        }
        assert_eq!(MessageAuthor::parse("them"), None);
    }

    #[test]
    fn author_tag_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageAuthor::Partner).unwrap(),
            "\"partner\""
        );
    }

    #[test]
    fn unpaired_account_omits_partner_fields() {
        let account = Account {
            user_id: Uuid::new_v4(),
            user_name: "Yuki".into(),
            pairing_code: "A1B2C3D4".into(),
            partner_id: None,
            partner_name: None,
            partner_pairing_code: None,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("partner_id").is_none());
        assert!(!account.is_paired());
    }
}
