//! Who this session is connected to.
//!
//! A host has one entry per guest; a guest has exactly one entry, the
//! host. The registry does no I/O. It hands out `Arc`s so callers can
//! release the lock before awaiting a send.

use std::collections::HashMap;
use std::sync::Arc;

use parlor_protocol::{PeerId, Recipient};

use crate::SessionError;

/// Maps peer ids to live connections.
#[derive(Debug)]
pub struct ConnectionRegistry<T> {
    peers: HashMap<PeerId, Arc<T>>,
}

impl<T> ConnectionRegistry<T> {
    pub fn new() -> Self {
        Self { peers: HashMap::new() }
    }

    /// Registers `conn` under `peer`.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the id is taken. Peer ids are
    /// the only identity in a room, so a duplicate is refused rather than
    /// allowed to shadow the first connection.
    pub fn insert(&mut self, peer: PeerId, conn: Arc<T>) -> Result<(), SessionError> {
        if self.peers.contains_key(&peer) {
            return Err(SessionError::AlreadyConnected(peer));
        }
        self.peers.insert(peer, conn);
        Ok(())
    }

    /// Removes `peer` only if it is still mapped to `conn`.
    ///
    /// A reader task that outlives its entry must not evict a newer
    /// connection registered under the same id.
    pub fn remove_if_current(&mut self, peer: &PeerId, conn: &Arc<T>) -> bool {
        match self.peers.get(peer) {
            Some(current) if Arc::ptr_eq(current, conn) => {
                self.peers.remove(peer);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, peer: &PeerId) -> Option<Arc<T>> {
        self.peers.get(peer).cloned()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    /// Connections addressed by `to`.
    pub fn recipients(&self, to: &Recipient) -> Vec<(PeerId, Arc<T>)> {
        self.peers
            .iter()
            .filter(|(peer, _)| to.includes(peer))
            .map(|(peer, conn)| (peer.clone(), Arc::clone(conn)))
            .collect()
    }

    /// Connected peer ids, sorted for stable output.
    pub fn peers(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Empties the registry, returning every connection.
    pub fn drain(&mut self) -> Vec<(PeerId, Arc<T>)> {
        self.peers.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<T> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PeerId {
        PeerId::new(s)
    }

    #[test]
    fn test_insert_new_peer_succeeds() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(&pid("a")));
    }

    #[test]
    fn test_insert_duplicate_returns_already_connected() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();

        let result = reg.insert(pid("a"), Arc::new(2));

        assert!(matches!(result, Err(SessionError::AlreadyConnected(p)) if p == pid("a")));
        assert_eq!(*reg.get(&pid("a")).unwrap(), 1, "first connection must survive");
    }

    #[test]
    fn test_remove_if_current_matching_connection_removes() {
        let mut reg = ConnectionRegistry::new();
        let conn = Arc::new(1);
        reg.insert(pid("a"), Arc::clone(&conn)).unwrap();

        assert!(reg.remove_if_current(&pid("a"), &conn));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_if_current_stale_connection_keeps_entry() {
        let mut reg = ConnectionRegistry::new();
        let old = Arc::new(1);
        reg.insert(pid("a"), Arc::new(2)).unwrap();

        assert!(!reg.remove_if_current(&pid("a"), &old));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_recipients_all_except_skips_sender() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();
        reg.insert(pid("b"), Arc::new(2)).unwrap();
        reg.insert(pid("c"), Arc::new(3)).unwrap();

        let mut ids: Vec<PeerId> = reg
            .recipients(&Recipient::AllExcept(pid("b")))
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        ids.sort();

        assert_eq!(ids, vec![pid("a"), pid("c")]);
    }

    #[test]
    fn test_recipients_single_peer() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();
        reg.insert(pid("b"), Arc::new(2)).unwrap();

        let picked = reg.recipients(&Recipient::Peer(pid("b")));

        assert_eq!(picked.len(), 1);
        assert_eq!(*picked[0].1, 2);
    }

    #[test]
    fn test_recipients_unknown_peer_is_empty() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();
        assert!(reg.recipients(&Recipient::Peer(pid("zz"))).is_empty());
    }

    #[test]
    fn test_peers_sorted() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("c"), Arc::new(())).unwrap();
        reg.insert(pid("a"), Arc::new(())).unwrap();
        assert_eq!(reg.peers(), vec![pid("a"), pid("c")]);
    }

    #[test]
    fn test_drain_empties_registry() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(pid("a"), Arc::new(1)).unwrap();
        reg.insert(pid("b"), Arc::new(2)).unwrap();

        assert_eq!(reg.drain().len(), 2);
        assert!(reg.is_empty());
    }
}
