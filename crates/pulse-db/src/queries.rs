use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;
use uuid::Uuid;

use pulse_types::models::{Event, EventMessage, MessageAuthor};

use crate::models::{EventRow, JoinedUserRow, MessageRow, UserRow};
use crate::{Database, Result, StoreError};

impl Database {
    // -- Users --

    pub fn insert_user(&self, id: &str, name: &str, pairing_code: &str) -> Result<()> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, name, pairing_code) VALUES (?1, ?2, ?3)",
                (id, name, pairing_code),
            ) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::DuplicateCode)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Exact (name, pairing_code) match — the pair is the credential, names
    /// alone are not unique.
    pub fn find_user_by_credentials(&self, name: &str, code: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, name, pairing_code, partner_id, created_at, last_login
                 FROM users WHERE name = ?1 AND pairing_code = ?2",
                (name, code),
            )
        })
    }

    pub fn find_user_by_pairing_code(&self, code: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "SELECT id, name, pairing_code, partner_id, created_at, last_login
                 FROM users WHERE pairing_code = ?1",
                (code,),
            )
        })
    }

    /// Self row LEFT JOINed with the partner's display fields.
    pub fn get_user_with_partner(&self, id: &str) -> Result<Option<JoinedUserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT u.id, u.name, u.pairing_code, u.partner_id,
                            p.name, p.pairing_code
                     FROM users u
                     LEFT JOIN users p ON u.partner_id = p.id
                     WHERE u.id = ?1",
                    [id],
                    |row| {
                        Ok(JoinedUserRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            pairing_code: row.get(2)?,
                            partner_id: row.get(3)?,
                            partner_name: row.get(4)?,
                            partner_pairing_code: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Point both rows at each other inside one transaction: either both
    /// links land or neither does. Re-pairing overwrites an existing link
    /// without touching the abandoned partner's row.
    pub fn link_partners(&self, user_id: &str, partner_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let n1 = tx.execute(
                "UPDATE users SET partner_id = ?2 WHERE id = ?1",
                (user_id, partner_id),
            )?;
            let n2 = tx.execute(
                "UPDATE users SET partner_id = ?2 WHERE id = ?1",
                (partner_id, user_id),
            )?;
            if n1 != 1 || n2 != 1 {
                return Err(StoreError::RowNotFound);
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn touch_last_login(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_login = datetime('now') WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    // -- Events --

    pub fn insert_event(
        &self,
        id: &str,
        title: &str,
        start_date: &str,
        user_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, title, start_date, user_id) VALUES (?1, ?2, ?3, ?4)",
                (id, title, start_date, user_id),
            )?;
            Ok(())
        })
    }

    /// The server-side visibility rule: an event is visible to its owner
    /// and to the owner's current partner.
    pub fn find_event_visible_to(&self, event_id: &str, user_id: &str) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, start_date, user_id, created_at
                     FROM events
                     WHERE id = ?1
                       AND (user_id = ?2
                            OR user_id = (SELECT partner_id FROM users WHERE id = ?2))",
                    (event_id, user_id),
                    map_event_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_events_visible_to(&self, user_id: &str) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, start_date, user_id, created_at
                 FROM events
                 WHERE user_id = ?1
                    OR user_id = (SELECT partner_id FROM users WHERE id = ?1)
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_event_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Title is the only mutable event field; `start_date` is immutable
    /// once captured.
    pub fn update_event_title(&self, id: &str, title: &str) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE events SET title = ?2 WHERE id = ?1",
                (id, title),
            )?;
            if n != 1 {
                return Err(StoreError::RowNotFound);
            }
            Ok(())
        })
    }

    /// Deletes the event and its whole message thread in one transaction.
    pub fn delete_event(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM event_messages WHERE event_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM events WHERE id = ?1", [id])?;
            if n != 1 {
                return Err(StoreError::RowNotFound);
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        event_id: &str,
        text: &str,
        author: MessageAuthor,
        user_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO event_messages (id, event_id, text, author, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, event_id, text, author.as_str(), user_id),
            )?;
            Ok(())
        })
    }

    /// Batch-fetch threads for a set of event IDs in one query.
    pub fn list_messages_for_events(&self, event_ids: &[String]) -> Result<Vec<MessageRow>> {
        if event_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=event_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, event_id, text, author, user_id, created_at
                 FROM event_messages
                 WHERE event_id IN ({})
                 ORDER BY created_at, rowid",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = event_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        text: row.get(2)?,
                        author: row.get(3)?,
                        user_id: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Assembly --

    /// Everything a client renders: visible events newest-first, each with
    /// its thread in chronological order. One events query plus one batched
    /// messages query.
    pub fn load_events_visible_to(&self, user_id: &str) -> Result<Vec<Event>> {
        let rows = self.list_events_visible_to(user_id)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let message_rows = self.list_messages_for_events(&ids)?;

        let mut threads: HashMap<String, Vec<EventMessage>> = HashMap::new();
        for row in message_rows {
            let message = message_from_row(&row);
            threads.entry(row.event_id).or_default().push(message);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let messages = threads.remove(&row.id).unwrap_or_default();
                event_from_row(row, messages)
            })
            .collect())
    }
}

fn map_event_row(row: &rusqlite::Row<'_>) -> std::result::Result<EventRow, rusqlite::Error> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        start_date: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_user<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(sql, params, |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                pairing_code: row.get(2)?,
                partner_id: row.get(3)?,
                created_at: row.get(4)?,
                last_login: row.get(5)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn event_from_row(row: EventRow, messages: Vec<EventMessage>) -> Event {
    Event {
        id: parse_uuid(&row.id, "event id"),
        start_date: parse_timestamp(&row.start_date).unwrap_or_else(|| {
            warn!("Corrupt start_date '{}' on event '{}'", row.start_date, row.id);
            DateTime::default()
        }),
        title: row.title,
        messages,
    }
}

fn message_from_row(row: &MessageRow) -> EventMessage {
    EventMessage {
        id: parse_uuid(&row.id, "message id"),
        text: row.text.clone(),
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on message '{}'", row.created_at, row.id);
            DateTime::default()
        }),
        author: MessageAuthor::parse(&row.author).unwrap_or_else(|| {
            warn!("Corrupt author '{}' on message '{}'", row.author, row.id);
            MessageAuthor::Me
        }),
    }
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// Timestamps written by the app are RFC 3339; SQLite's `datetime('now')`
/// defaults are "YYYY-MM-DD HH:MM:SS" without timezone. Accept both.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|ndt| ndt.and_utc())
            .ok()
    })
}
