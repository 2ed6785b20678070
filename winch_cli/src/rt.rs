//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall).
//!
//! A missed control tick stretches the pulse schedule and audibly jerks the
//! line, so `--rt` pins the loop to one CPU at FIFO priority and locks the
//! address space. Every step degrades to a logged warning; the controller
//! still runs without any of them.

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, rt_cpu: Option<usize>) {
    use libc::{
        CPU_ISSET, CPU_SET, CPU_ZERO, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO,
        sched_get_priority_max, sched_get_priority_min, sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn mlock_flags(lock: RtLock) -> Option<libc::c_int> {
        match lock {
            RtLock::None => None,
            RtLock::Current => Some(MCL_CURRENT),
            RtLock::All => Some(MCL_CURRENT | MCL_FUTURE),
        }
    }

    fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
        let Some(flags) = mlock_flags(lock) else {
            return Ok(());
        };
        let rc = unsafe { libc::mlockall(flags) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        // All may exceed the memlock limit where Current still fits
        if lock == RtLock::All
            && matches!(err.raw_os_error(), Some(c) if c == libc::EPERM || c == libc::ENOMEM)
            && unsafe { libc::mlockall(MCL_CURRENT) } == 0
        {
            tracing::warn!("mlockall(all) refused, fell back to current pages");
            return Ok(());
        }
        Err(eyre::eyre!(
            "mlockall failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
        ))
    }

    fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<()> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = sched_param {
            sched_priority: prio.unwrap_or(max).clamp(min, max),
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            return Err(eyre::eyre!(
                "{err}; hint: needs CAP_SYS_NICE or root ('sudo setcap cap_sys_nice=ep winch')"
            ));
        }
        Ok(())
    }

    fn try_apply_affinity(rt_cpu: Option<usize>) -> eyre::Result<()> {
        let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if online < 1 {
            eyre::bail!("_SC_NPROCESSORS_ONLN < 1");
        }
        let target = rt_cpu.unwrap_or(0);
        if target as libc::c_long >= online || target >= MAX_CPUSET_BITS {
            eyre::bail!("requested CPU {target} out of range (online: {online})");
        }
        let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut allowed)
        };
        if rc == 0 && !unsafe { CPU_ISSET(target, &allowed) } {
            eyre::bail!("CPU {target} not permitted by current affinity mask");
        }
        let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            CPU_ZERO(&mut desired);
            CPU_SET(target, &mut desired);
        }
        let rc =
            unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &desired) };
        if rc != 0 {
            return Err(eyre::eyre!(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
            Err(err) => tracing::warn!(%err, "mlockall failed"),
        }
        if let Err(err) = try_apply_fifo_priority(prio) {
            tracing::warn!(%err, "SCHED_FIFO not applied");
        }
        if let Err(err) = try_apply_affinity(rt_cpu) {
            tracing::warn!(%err, "affinity not applied");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock, _rt_cpu: Option<usize>) {
    if rt {
        tracing::warn!("--rt is only supported on Linux; running without real-time setup");
    }
}
