use chrono::{Duration, Utc};
use speculate2::speculate;
use uuid::Uuid;

use almostme::models::Session;
use almostme::session::{MemorySessionStore, SessionStore, SqliteSessionStore};

fn session_with_turn() -> Session {
    let mut session = Session::new(Uuid::new_v4());
    session.history.push_turn("hola", "buenas", 12);
    session.mark_shown("piscina");
    session.manual_context = true;
    session
}

fn stale(mut session: Session) -> Session {
    session.updated_at = Utc::now() - Duration::minutes(31);
    session
}

/// Behaviour shared by every store implementation.
fn exercise_round_trip(store: &dyn SessionStore) {
    let session = session_with_turn();
    store.save(&session).expect("save failed");

    let loaded = store.load(session.id).expect("load failed").expect("session missing");
    assert_eq!(loaded.history, session.history);
    assert_eq!(loaded.shown_manuals, vec!["piscina".to_string()]);
    assert!(loaded.manual_context);
}

fn exercise_expiry(store: &dyn SessionStore) {
    let session = stale(session_with_turn());
    store.save(&session).expect("save failed");

    assert!(store.load(session.id).expect("load failed").is_none());
    // Expired sessions are deleted on load
    assert!(!store.remove(session.id).expect("remove failed"));
}

fn exercise_purge(store: &dyn SessionStore) {
    let live = session_with_turn();
    store.save(&live).unwrap();
    store.save(&stale(session_with_turn())).unwrap();
    store.save(&stale(session_with_turn())).unwrap();

    assert_eq!(store.purge_expired().unwrap(), 2);
    assert!(store.load(live.id).unwrap().is_some());
}

speculate! {
    describe "memory store" {
        before {
            let store = MemorySessionStore::new(Duration::minutes(30));
        }

        it "returns None for unknown sessions" {
            assert!(store.load(Uuid::new_v4()).unwrap().is_none());
        }

        it "round-trips a session" {
            exercise_round_trip(&store);
        }

        it "replaces on save" {
            let mut session = session_with_turn();
            store.save(&session).unwrap();
            session.history.push_turn("otra", "respuesta", 12);
            store.save(&session).unwrap();

            let loaded = store.load(session.id).unwrap().unwrap();
            assert_eq!(loaded.history.len(), 4);
            assert_eq!(store.len(), 1);
        }

        it "treats idle sessions as expired" {
            exercise_expiry(&store);
        }

        it "purges only expired sessions" {
            exercise_purge(&store);
        }

        it "reports whether remove deleted something" {
            let session = session_with_turn();
            store.save(&session).unwrap();

            assert!(store.remove(session.id).unwrap());
            assert!(!store.remove(session.id).unwrap());
            assert!(store.is_empty());
        }
    }

    describe "sqlite store" {
        before {
            let store = SqliteSessionStore::open_memory(Duration::minutes(30))
                .expect("Failed to create in-memory database");
            store.migrate().expect("Failed to run migrations");
        }

        it "returns None for unknown sessions" {
            assert!(store.load(Uuid::new_v4()).unwrap().is_none());
        }

        it "round-trips a session" {
            exercise_round_trip(&store);
        }

        it "replaces on save" {
            let mut session = session_with_turn();
            store.save(&session).unwrap();
            session.history.push_turn("otra", "respuesta", 12);
            store.save(&session).unwrap();

            let loaded = store.load(session.id).unwrap().unwrap();
            assert_eq!(loaded.history.len(), 4);
        }

        it "treats idle sessions as expired" {
            exercise_expiry(&store);
        }

        it "purges only expired sessions" {
            exercise_purge(&store);
        }

        it "reports whether remove deleted something" {
            let session = session_with_turn();
            store.save(&session).unwrap();

            assert!(store.remove(session.id).unwrap());
            assert!(!store.remove(session.id).unwrap());
        }
    }
}

#[test]
fn default_session_database_lives_in_the_data_directory() {
    let path = SqliteSessionStore::default_path().expect("data directory available");
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("sessions.db"));
}

#[test]
fn sqlite_sessions_survive_reopening() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("sessions.db");
    let session = session_with_turn();

    {
        let store = SqliteSessionStore::open(path.clone(), Duration::minutes(30)).unwrap();
        store.migrate().unwrap();
        store.save(&session).unwrap();
    }

    let store = SqliteSessionStore::open(path, Duration::minutes(30)).unwrap();
    store.migrate().unwrap();
    let loaded = store.load(session.id).unwrap().expect("session persisted");
    assert_eq!(loaded.history, session.history);
}
