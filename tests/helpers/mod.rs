#![allow(dead_code)]

use async_trait::async_trait;
use detour::catalog::store;
use detour::catalog::types::{NewSource, Source};
use detour::db;
use detour::remote::chat::{ChatRequest, ChatService};
use detour::remote::memory::{MemoryItem, MemoryRecord, MemoryService, RetrieveResponse};
use detour::remote::RemoteError;
use detour::session::{Session, SessionContext};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// A source value for pure engine tests; nothing is stored.
pub fn source(id: &str, category: &str) -> Source {
    Source {
        id: id.into(),
        name: format!("{category} {id}"),
        category: category.into(),
        memo: String::new(),
        duration_min: None,
        anchor_id: None,
        priority: None,
        tags: None,
        kind: None,
    }
}

pub fn with_duration(mut s: Source, minutes: u32) -> Source {
    s.duration_min = Some(minutes);
    s
}

pub fn with_anchor(mut s: Source, anchor: &str) -> Source {
    s.anchor_id = Some(anchor.into());
    s
}

pub fn with_priority(mut s: Source, priority: i64) -> Source {
    s.priority = Some(priority);
    s
}

/// Insert a source into the catalog. Returns the stored record.
pub fn insert_source(
    conn: &Connection,
    id: &str,
    category: &str,
    duration_min: Option<u32>,
    anchor_id: Option<&str>,
) -> Source {
    let new = NewSource {
        id: Some(id.into()),
        duration_min,
        anchor_id: anchor_id.map(str::to_string),
        ..NewSource::new(format!("{category} {id}"), category)
    };
    store::add_source(conn, &new).unwrap()
}

/// Five cafes (two at `anchor_covent_garden`) and three museums.
pub fn seed_trip(conn: &Connection) {
    insert_source(conn, "c1", "cafe", Some(30), None);
    insert_source(conn, "c2", "cafe", Some(30), Some("anchor_covent_garden"));
    insert_source(conn, "c3", "cafe", Some(20), None);
    insert_source(conn, "c4", "cafe", Some(30), Some("anchor_covent_garden"));
    insert_source(conn, "c5", "cafe", Some(45), None);
    insert_source(conn, "m1", "museum", Some(60), None);
    insert_source(conn, "m2", "museum", Some(120), None);
    insert_source(conn, "m3", "museum", Some(75), None);
}

pub fn context() -> SessionContext {
    SessionContext {
        default_anchor: "anchor_covent_garden".into(),
        gap_free_time_min: 90,
        user_id: "test-user".into(),
        transcript_limit: 20,
    }
}

/// A session over a seeded in-memory catalog and the given collaborators.
pub fn test_session(memory: Arc<FakeMemory>, chat: Arc<FakeChat>) -> Session {
    let conn = test_db();
    seed_trip(&conn);
    Session::new(Arc::new(Mutex::new(conn)), context(), memory, chat)
}

/// In-process memory service that records writes and answers retrieves with
/// fixed text.
#[derive(Default)]
pub struct FakeMemory {
    pub memorized: Mutex<Vec<Vec<MemoryRecord>>>,
    pub remembered: Vec<String>,
    pub fail: bool,
}

impl FakeMemory {
    pub fn remembering(items: &[&str]) -> Self {
        Self {
            remembered: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<Vec<MemoryRecord>> {
        self.memorized.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryService for FakeMemory {
    async fn memorize(&self, records: &[MemoryRecord], _user_id: &str) -> Result<(), RemoteError> {
        if self.fail {
            return Err(RemoteError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.memorized.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    async fn retrieve(&self, _query: &str, _user_id: &str) -> Result<RetrieveResponse, RemoteError> {
        if self.fail {
            return Err(RemoteError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(RetrieveResponse {
            items: self
                .remembered
                .iter()
                .map(|t| MemoryItem {
                    content: Some(t.clone()),
                    text: None,
                })
                .collect(),
        })
    }
}

/// Chat collaborator that records every request and replies with fixed text.
#[derive(Default)]
pub struct FakeChat {
    pub requests: Mutex<Vec<ChatRequest>>,
    pub fail: bool,
}

impl FakeChat {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatService for FakeChat {
    async fn chat(&self, request: &ChatRequest) -> Result<String, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(RemoteError::Decode("no content".into()));
        }
        Ok("Try the flower market.".into())
    }
}
