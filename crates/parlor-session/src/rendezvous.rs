//! Room code → host endpoint lookup.
//!
//! A guest only knows the room code. Something both sides can reach has
//! to map that code to the host's WebSocket URL; that is a
//! [`Rendezvous`]. Implementations here are deliberately small:
//!
//! - [`LocalRendezvous`]: in-process map, for tests and same-process demos
//! - [`DirectoryRendezvous`]: a JSON file shared by processes on one machine
//! - [`WithFallback`]: primary with a timeout, then exactly one fallback

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parlor_protocol::RoomCode;
use tracing::{debug, warn};

use crate::SessionError;

/// Maps room codes to host endpoints.
#[async_trait]
pub trait Rendezvous: Send + Sync + 'static {
    /// Publishes `endpoint` (a `ws://` URL) under `code`, replacing any
    /// previous entry.
    async fn register(&self, code: &RoomCode, endpoint: &str) -> Result<(), SessionError>;

    /// Looks up the endpoint registered under `code`.
    ///
    /// # Errors
    ///
    /// [`SessionError::RoomNotFound`] if nothing is registered.
    async fn resolve(&self, code: &RoomCode) -> Result<String, SessionError>;

    /// Removes `code`. Removing an unknown code is not an error.
    async fn unregister(&self, code: &RoomCode) -> Result<(), SessionError>;
}

#[async_trait]
impl<R: Rendezvous + ?Sized> Rendezvous for Arc<R> {
    async fn register(&self, code: &RoomCode, endpoint: &str) -> Result<(), SessionError> {
        (**self).register(code, endpoint).await
    }

    async fn resolve(&self, code: &RoomCode) -> Result<String, SessionError> {
        (**self).resolve(code).await
    }

    async fn unregister(&self, code: &RoomCode) -> Result<(), SessionError> {
        (**self).unregister(code).await
    }
}

// ---------------------------------------------------------------------------
// LocalRendezvous
// ---------------------------------------------------------------------------

/// In-process rendezvous. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct LocalRendezvous {
    rooms: Arc<Mutex<HashMap<RoomCode, String>>>,
}

impl LocalRendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.lock().map(|rooms| rooms.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_rooms<T>(
        &self,
        f: impl FnOnce(&mut HashMap<RoomCode, String>) -> T,
    ) -> Result<T, SessionError> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| SessionError::Rendezvous("room table poisoned".into()))?;
        Ok(f(&mut rooms))
    }
}

#[async_trait]
impl Rendezvous for LocalRendezvous {
    async fn register(&self, code: &RoomCode, endpoint: &str) -> Result<(), SessionError> {
        self.with_rooms(|rooms| rooms.insert(code.clone(), endpoint.to_string()))?;
        Ok(())
    }

    async fn resolve(&self, code: &RoomCode) -> Result<String, SessionError> {
        self.with_rooms(|rooms| rooms.get(code).cloned())?
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))
    }

    async fn unregister(&self, code: &RoomCode) -> Result<(), SessionError> {
        self.with_rooms(|rooms| rooms.remove(code))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DirectoryRendezvous
// ---------------------------------------------------------------------------

/// Rendezvous through a JSON file (`{"code": "ws://..."}`).
///
/// Good enough for several terminals on one machine. Writes are
/// read-modify-write without locking, so two hosts registering in the
/// same instant can lose an entry.
#[derive(Debug, Clone)]
pub struct DirectoryRendezvous {
    path: PathBuf,
}

impl DirectoryRendezvous {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `parlor-rooms.json` in the system temp directory.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("parlor-rooms.json")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SessionError::Rendezvous(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(SessionError::Rendezvous(format!("{}: {e}", self.path.display()))),
        }
    }

    async fn store(&self, rooms: &HashMap<String, String>) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(rooms)
            .map_err(|e| SessionError::Rendezvous(e.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| SessionError::Rendezvous(format!("{}: {e}", self.path.display())))
    }
}

impl Default for DirectoryRendezvous {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl Rendezvous for DirectoryRendezvous {
    async fn register(&self, code: &RoomCode, endpoint: &str) -> Result<(), SessionError> {
        let mut rooms = self.load().await?;
        rooms.insert(code.as_str().to_string(), endpoint.to_string());
        self.store(&rooms).await
    }

    async fn resolve(&self, code: &RoomCode) -> Result<String, SessionError> {
        self.load()
            .await?
            .remove(code.as_str())
            .ok_or_else(|| SessionError::RoomNotFound(code.clone()))
    }

    async fn unregister(&self, code: &RoomCode) -> Result<(), SessionError> {
        let mut rooms = self.load().await?;
        if rooms.remove(code.as_str()).is_some() {
            self.store(&rooms).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WithFallback
// ---------------------------------------------------------------------------

/// Tries `primary` under a timeout, then `fallback` exactly once.
///
/// There is no retry loop: a failed fallback is the final answer.
#[derive(Debug, Clone)]
pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
    timeout: Duration,
}

impl<P: Rendezvous, F: Rendezvous> WithFallback<P, F> {
    pub fn new(primary: P, fallback: F, timeout: Duration) -> Self {
        Self { primary, fallback, timeout }
    }

    async fn try_primary<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, SessionError>
    where
        Fut: std::future::Future<Output = Result<T, SessionError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!(op, error = %e, "primary rendezvous failed, trying fallback");
                Err(e)
            }
            Err(_) => {
                warn!(op, timeout = ?self.timeout, "primary rendezvous timed out, trying fallback");
                Err(SessionError::RendezvousTimeout)
            }
        }
    }
}

#[async_trait]
impl<P: Rendezvous, F: Rendezvous> Rendezvous for WithFallback<P, F> {
    async fn register(&self, code: &RoomCode, endpoint: &str) -> Result<(), SessionError> {
        match self.try_primary("register", self.primary.register(code, endpoint)).await {
            Ok(()) => Ok(()),
            Err(_) => self.fallback.register(code, endpoint).await,
        }
    }

    async fn resolve(&self, code: &RoomCode) -> Result<String, SessionError> {
        match self.try_primary("resolve", self.primary.resolve(code)).await {
            Ok(endpoint) => Ok(endpoint),
            Err(_) => self.fallback.resolve(code).await,
        }
    }

    async fn unregister(&self, code: &RoomCode) -> Result<(), SessionError> {
        let primary = self.try_primary("unregister", self.primary.unregister(code)).await;
        let fallback = self.fallback.unregister(code).await;
        primary.or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    /// Never answers.
    struct Stalled;

    #[async_trait]
    impl Rendezvous for Stalled {
        async fn register(&self, _: &RoomCode, _: &str) -> Result<(), SessionError> {
            std::future::pending().await
        }

        async fn resolve(&self, _: &RoomCode) -> Result<String, SessionError> {
            std::future::pending().await
        }

        async fn unregister(&self, _: &RoomCode) -> Result<(), SessionError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_local_register_then_resolve_returns_endpoint() {
        let rv = LocalRendezvous::new();
        rv.register(&code("red-fox"), "ws://127.0.0.1:9").await.unwrap();

        assert_eq!(rv.resolve(&code("red-fox")).await.unwrap(), "ws://127.0.0.1:9");
        assert_eq!(rv.len(), 1);
    }

    #[tokio::test]
    async fn test_local_resolve_unknown_returns_not_found() {
        let rv = LocalRendezvous::new();
        let err = rv.resolve(&code("nobody-home")).await.unwrap_err();
        assert!(matches!(err, SessionError::RoomNotFound(c) if c.as_str() == "nobody-home"));
    }

    #[tokio::test]
    async fn test_local_clones_share_table() {
        let a = LocalRendezvous::new();
        let b = a.clone();
        a.register(&code("shared"), "ws://x").await.unwrap();
        b.unregister(&code("shared")).await.unwrap();
        assert!(a.is_empty());
    }

    #[tokio::test]
    async fn test_directory_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("parlor-rv-test-{}.json", std::process::id()));
        let rv = DirectoryRendezvous::new(&path);

        rv.register(&code("blue-cat"), "ws://127.0.0.1:1").await.unwrap();
        let other = DirectoryRendezvous::new(&path);
        assert_eq!(other.resolve(&code("blue-cat")).await.unwrap(), "ws://127.0.0.1:1");

        other.unregister(&code("blue-cat")).await.unwrap();
        assert!(matches!(
            rv.resolve(&code("blue-cat")).await,
            Err(SessionError::RoomNotFound(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_directory_missing_file_is_empty() {
        let rv = DirectoryRendezvous::new(std::env::temp_dir().join("parlor-rv-does-not-exist.json"));
        assert!(matches!(
            rv.resolve(&code("x")).await,
            Err(SessionError::RoomNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_used_when_primary_stalls() {
        let fallback = LocalRendezvous::new();
        fallback.register(&code("slow"), "ws://fallback").await.unwrap();
        let rv = WithFallback::new(Stalled, fallback, Duration::from_secs(2));

        assert_eq!(rv.resolve(&code("slow")).await.unwrap(), "ws://fallback");
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_misses() {
        let primary = LocalRendezvous::new();
        let fallback = LocalRendezvous::new();
        fallback.register(&code("elsewhere"), "ws://fallback").await.unwrap();
        let rv = WithFallback::new(primary, fallback, Duration::from_secs(2));

        assert_eq!(rv.resolve(&code("elsewhere")).await.unwrap(), "ws://fallback");
    }

    #[tokio::test]
    async fn test_fallback_not_consulted_when_primary_answers() {
        let primary = LocalRendezvous::new();
        let fallback = LocalRendezvous::new();
        primary.register(&code("here"), "ws://primary").await.unwrap();
        fallback.register(&code("here"), "ws://fallback").await.unwrap();
        let rv = WithFallback::new(primary, fallback, Duration::from_secs(2));

        assert_eq!(rv.resolve(&code("here")).await.unwrap(), "ws://primary");
    }

    #[tokio::test]
    async fn test_fallback_both_miss_returns_not_found() {
        let rv = WithFallback::new(LocalRendezvous::new(), LocalRendezvous::new(), Duration::from_secs(1));
        assert!(matches!(
            rv.resolve(&code("ghost")).await,
            Err(SessionError::RoomNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_register_lands_in_fallback_when_primary_stalls() {
        let fallback = LocalRendezvous::new();
        let rv = WithFallback::new(Stalled, fallback.clone(), Duration::from_secs(1));

        rv.register(&code("late"), "ws://h").await.unwrap();
        assert_eq!(fallback.resolve(&code("late")).await.unwrap(), "ws://h");
    }
}
