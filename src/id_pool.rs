//! Identifier allocator
//!
//! Hands out the smallest free identifier in `[0, max_id]`.

use crate::types::ClientId;

/// In-use bitmap over `[0, max_id]`
#[derive(Debug)]
pub struct IdPool {
    in_use: Vec<bool>,
}

impl IdPool {
    pub fn new(max_id: u16) -> Self {
        Self {
            in_use: vec![false; usize::from(max_id) + 1],
        }
    }

    /// Mark and return the lowest free identifier
    ///
    /// Returns None when every identifier is taken.
    pub fn acquire(&mut self) -> Option<ClientId> {
        let slot = self.in_use.iter().position(|used| !used)?;
        self.in_use[slot] = true;
        // slot <= max_id, which is a u16
        u16::try_from(slot).ok().map(ClientId)
    }

    /// Mark an identifier free again
    pub fn release(&mut self, id: ClientId) {
        if let Some(slot) = self.in_use.get_mut(usize::from(id.0)) {
            *slot = false;
        }
    }

    #[cfg(test)]
    fn is_in_use(&self, id: ClientId) -> bool {
        self.in_use.get(usize::from(id.0)).copied().unwrap_or(false)
    }

    #[cfg(test)]
    fn in_use_count(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_lowest_first() {
        let mut pool = IdPool::new(4);
        assert_eq!(pool.acquire(), Some(ClientId(0)));
        assert_eq!(pool.acquire(), Some(ClientId(1)));
        assert_eq!(pool.acquire(), Some(ClientId(2)));
        assert_eq!(pool.in_use_count(), 3);
    }

    #[test]
    fn test_release_makes_id_reusable() {
        let mut pool = IdPool::new(4);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.acquire().unwrap();

        pool.release(b);
        assert!(!pool.is_in_use(b));
        assert!(pool.is_in_use(a));

        // The freed hole is filled before higher ids
        assert_eq!(pool.acquire(), Some(b));
        assert_eq!(pool.acquire(), Some(ClientId(3)));
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = IdPool::new(1);
        assert_eq!(pool.acquire(), Some(ClientId(0)));
        assert_eq!(pool.acquire(), Some(ClientId(1)));
        assert_eq!(pool.acquire(), None);

        pool.release(ClientId(0));
        assert_eq!(pool.acquire(), Some(ClientId(0)));
    }

    #[test]
    fn test_release_out_of_range_is_ignored() {
        let mut pool = IdPool::new(2);
        pool.release(ClientId(900));
        assert!(!pool.is_in_use(ClientId(900)));
        assert_eq!(pool.in_use_count(), 0);
    }
}
