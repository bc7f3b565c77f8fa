use super::PhysicsManager;
use crate::error::Result;
use parking_lot::{Mutex, MutexGuard};
use std::{sync::Arc, time::Duration};

/// A cloneable handle to a physics manager shared between threads or timers.
///
/// Physics is strictly single-threaded, but a host may drive it from a periodic timer
/// while rendering reads collider poses from another. Every access goes through
/// one mutex, so ticks and queries never interleave.
#[derive(Clone)]
pub struct SharedPhysics {
    inner: Arc<Mutex<PhysicsManager>>,
}

impl SharedPhysics {
    pub fn new(manager: PhysicsManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Lock the manager for any number of queries or changes.
    /// Blocks while another handle holds the lock.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, PhysicsManager> {
        self.inner.lock()
    }

    /// Run a single tick.
    pub fn resolve(&self, dt: f64) -> Result<()> {
        self.inner.lock().resolve(dt)
    }

    /// Run as many fixed ticks as fit into the elapsed time.
    pub fn advance(&self, elapsed: Duration) -> Result<usize> {
        self.inner.lock().advance(elapsed)
    }
}

impl From<PhysicsManager> for SharedPhysics {
    fn from(manager: PhysicsManager) -> Self {
        Self::new(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{
        collision::{ColliderDesc, ColliderShape},
        PhysicsConfig,
    };
    use std::thread;

    #[test]
    fn ticks_from_another_thread_are_visible() {
        let shared = SharedPhysics::new(PhysicsManager::new(PhysicsConfig::default()).unwrap());
        let (a, b) = {
            let mut physics = shared.lock();
            let shape = ColliderShape::square(2.0).unwrap();
            (
                physics
                    .add_collider(ColliderDesc::new("default", shape.clone()))
                    .unwrap(),
                physics
                    .add_collider(ColliderDesc::new("default", shape).with_position([1.0, 0.0]))
                    .unwrap(),
            )
        };

        let ticker = shared.clone();
        thread::spawn(move || ticker.resolve(1.0 / 60.0))
            .join()
            .unwrap()
            .unwrap();

        let physics = shared.lock();
        assert_eq!(physics.collisions(a).len(), 1);
        assert_eq!(physics.collisions(b)[0].remote, a);
    }
}
