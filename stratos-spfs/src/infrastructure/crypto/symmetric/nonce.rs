use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub const NONCE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonceError {
    #[error("nonce counter exhausted")]
    CounterOverflow,
    #[error("system clock is before the unix epoch")]
    SystemTimeError,
}

/// 96-bit GCM nonces: 4-byte timestamp, 4-byte counter, 4 random bytes.
///
/// The counter starts at a random offset so short-lived clients sharing one
/// key do not walk the same counter sequence. It is shared by every call on
/// one client and never repeats a value.
#[derive(Debug)]
pub struct NonceGenerator {
    offset: u32,
    issued: AtomicU64,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::starting_at(rand::thread_rng().next_u32(), 0)
    }

    fn starting_at(offset: u32, issued: u64) -> Self {
        Self {
            offset,
            issued: AtomicU64::new(issued),
        }
    }

    pub fn generate(&self) -> Result<[u8; NONCE_LEN], NonceError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| NonceError::SystemTimeError)?
            .as_nanos() as u32;

        let issued = self
            .issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < u32::MAX as u64).then_some(n + 1)
            })
            .map_err(|_| NonceError::CounterOverflow)?;
        let counter = self.offset.wrapping_add(issued as u32);

        let mut random_bytes = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let mut nonce = [0u8; NONCE_LEN];
        nonce[..4].copy_from_slice(&timestamp.to_be_bytes());
        nonce[4..8].copy_from_slice(&counter.to_be_bytes());
        nonce[8..].copy_from_slice(&random_bytes);

        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_generate_unique_nonce() {
        let generator = NonceGenerator::new();
        let mut nonces = HashSet::new();

        for i in 0..1000 {
            let nonce = generator.generate().unwrap();
            assert!(
                nonces.insert(nonce),
                "Duplicate nonce detected at iteration {}",
                i + 1
            );
        }
    }

    fn counter_of(nonce: &[u8; NONCE_LEN]) -> u32 {
        u32::from_be_bytes(nonce[4..8].try_into().unwrap())
    }

    #[test]
    fn test_nonce_format() {
        let generator = NonceGenerator::starting_at(41, 0);
        let first = generator.generate().unwrap();
        let second = generator.generate().unwrap();

        assert_eq!(counter_of(&first), 41);
        assert_eq!(counter_of(&second), 42);
    }

    #[test]
    fn test_counter_wraps_from_offset_without_repeating() {
        let generator = NonceGenerator::starting_at(u32::MAX, 0);
        assert_eq!(counter_of(&generator.generate().unwrap()), u32::MAX);
        assert_eq!(counter_of(&generator.generate().unwrap()), 0);
    }

    #[test]
    fn test_clients_start_at_random_offsets() {
        let offsets: HashSet<u32> = (0..8).map(|_| NonceGenerator::new().offset).collect();
        // eight draws of 32 random bits colliding down to one is not plausible
        assert!(offsets.len() > 1);
    }

    #[test]
    fn test_thread_safety() {
        let generator = Arc::new(NonceGenerator::new());
        let all_nonces = Arc::new(Mutex::new(HashSet::new()));
        let mut handles = vec![];

        for _ in 0..10 {
            let generator = generator.clone();
            let all_nonces = all_nonces.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let nonce = generator.generate().unwrap();
                    let mut all_nonces = all_nonces.lock().unwrap();
                    assert!(all_nonces.insert(nonce), "Duplicate nonce detected");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(all_nonces.lock().unwrap().len(), 1000);
    }

    #[test]
    fn test_counter_overflow() {
        let generator = NonceGenerator::starting_at(7, u32::MAX as u64 - 1);

        // last counter value still available
        let nonce = generator.generate().unwrap();
        assert_eq!(counter_of(&nonce), 7u32.wrapping_add(u32::MAX - 1));

        assert_eq!(generator.generate(), Err(NonceError::CounterOverflow));
        assert_eq!(generator.generate(), Err(NonceError::CounterOverflow));
    }
}
