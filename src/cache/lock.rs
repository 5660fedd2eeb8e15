use std::sync::LockResult;

use tracing::warn;

/// Take the guard out of a lock result, recovering from poisoning.
///
/// A panic while holding one of these locks leaves plain data behind (maps of
/// cloned values, counters), so carrying on with it is sound.
pub(crate) trait RecoverPoison<G> {
    fn recover(self, module: &'static str, op: &'static str) -> G;
}

impl<G> RecoverPoison<G> for LockResult<G> {
    fn recover(self, module: &'static str, op: &'static str) -> G {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    target_module = module,
                    result = "poisoned_recovered",
                    hint = "state may be stale after panic in another thread",
                    "Recovered from poisoned lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::{Mutex, RwLock};

    use super::*;

    #[test]
    fn mutex_recovers_after_panic() {
        let lock = Mutex::new(1_u32);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.lock().expect("first lock");
            panic!("poison mutex");
        }));

        *lock.lock().recover("tests", "write") += 1;
        assert_eq!(*lock.lock().recover("tests", "read"), 2);
    }

    #[test]
    fn rwlock_recovers_after_panic() {
        let lock = RwLock::new(vec![1_u8]);
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.write().expect("first write");
            panic!("poison rwlock");
        }));

        lock.write().recover("tests", "push").push(2);
        assert_eq!(lock.read().recover("tests", "len").len(), 2);
    }
}
