//! Pinning worker threads to host CPUs.
//!
//! Linux uses `sched_setaffinity` through libc. Other platforms have no
//! portable hard affinity, so pinning is reported as unavailable there.

#[cfg(target_os = "linux")]
mod platform {
    use std::cell::RefCell;

    thread_local! {
        static ORIGINAL_AFFINITY: RefCell<Option<libc::cpu_set_t>> = const { RefCell::new(None) };
    }

    pub fn get_core_ids() -> Option<Vec<usize>> {
        // SAFETY: sysconf has no memory-safety preconditions.
        let num_cpus = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if num_cpus <= 0 {
            return None;
        }
        Some((0..num_cpus as usize).collect())
    }

    pub fn save_affinity() -> bool {
        // SAFETY: `set` is a plain bitmask and the size passed matches it.
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
                return false;
            }
            ORIGINAL_AFFINITY.with(|cell| *cell.borrow_mut() = Some(set));
            true
        }
    }

    pub fn set_affinity(core_id: usize) -> bool {
        // SAFETY: as above; CPU_SET ignores ids beyond the mask.
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
        }
    }

    pub fn restore_affinity() -> bool {
        ORIGINAL_AFFINITY.with(|cell| match cell.borrow_mut().take() {
            // SAFETY: restores a mask previously returned by the kernel.
            Some(set) => unsafe {
                libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
            },
            None => false,
        })
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub fn get_core_ids() -> Option<Vec<usize>> {
        std::thread::available_parallelism()
            .ok()
            .map(|n| (0..n.get()).collect())
    }
    pub fn save_affinity() -> bool {
        true
    }
    pub fn set_affinity(_core_id: usize) -> bool {
        false
    }
    pub fn restore_affinity() -> bool {
        true
    }
}

/// Get all online host CPU ids.
pub fn get_core_ids() -> Option<Vec<usize>> {
    platform::get_core_ids()
}

/// RAII guard: pins the current thread on creation, restores the previous
/// affinity on drop.
#[derive(Debug)]
pub struct CpuPinGuard {
    pinned_core: Option<usize>,
}

impl CpuPinGuard {
    /// Pin the current thread to `core_id`.
    pub fn with_core(core_id: usize) -> Self {
        let saved = platform::save_affinity();
        let pinned = saved && platform::set_affinity(core_id);
        Self {
            pinned_core: pinned.then_some(core_id),
        }
    }

    /// Host CPU this thread is pinned to, if pinning succeeded.
    pub fn core_id(&self) -> Option<usize> {
        self.pinned_core
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_core.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if self.pinned_core.is_some() {
            platform::restore_affinity();
        }
    }
}
