//! Guided randomness.
//!
//! Workload code should take its random decisions from here rather than
//! from `rand::thread_rng()`.  Inside the platform the values come from its
//! native library, so it can steer and replay them.  Outside it they come
//! from the thread-local `rand` generator.

use crate::internal::global_ref;
use crate::Sdk;
use rand::RngCore;
use std::sync::Arc;

/// A random `u64`.
///
/// # Example
///
/// ```rust,ignore
/// let delay_ms = voidstar_sdk::random::get_random() % 1000;
/// sleep(Duration::from_millis(delay_ms));
/// ```
pub fn get_random() -> u64 {
    global_ref().get_random()
}

/// Pick one element of `items`, or `None` if it is empty.
///
/// ```rust,ignore
/// let actions = ["read", "write", "delete"];
/// if let Some(action) = voidstar_sdk::random::random_choice(&actions) {
///     execute(action);
/// }
/// ```
pub fn random_choice<T>(items: &[T]) -> Option<&T> {
    global_ref().random_choice(items)
}

/// Fill `buf` with random bytes, eight at a time.
pub fn fill_bytes(buf: &mut [u8]) {
    fill_from(buf, get_random);
}

fn fill_from(buf: &mut [u8], mut next: impl FnMut() -> u64) {
    for chunk in buf.chunks_mut(8) {
        let bytes = next().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

/// A [`rand::RngCore`] backed by an SDK context, so `rand` adapters
/// (`gen_range`, `shuffle`, distributions) draw guided values.
///
/// ```rust,ignore
/// use rand::Rng;
/// let mut rng = voidstar_sdk::random::VoidstarRng::global();
/// let delay = rng.gen_range(10..500);
/// ```
#[derive(Clone)]
pub struct VoidstarRng {
    sdk: Arc<Sdk>,
}

impl VoidstarRng {
    /// Draws from the process-wide context.
    pub fn global() -> Self {
        Self::new(crate::global())
    }

    pub fn new(sdk: Arc<Sdk>) -> Self {
        Self { sdk }
    }
}

impl std::fmt::Debug for VoidstarRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoidstarRng")
            .field("mode", &self.sdk.mode())
            .finish()
    }
}

impl RngCore for VoidstarRng {
    fn next_u32(&mut self) -> u32 {
        self.sdk.get_random() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.sdk.get_random()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_from(dest, || self.sdk.get_random());
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
