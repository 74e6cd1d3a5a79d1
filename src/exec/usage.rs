//! Resource accounting for terminated children.
//!
//! The child is reaped by tokio, so its own `wait4` record is not available.
//! Instead `RUSAGE_CHILDREN` is sampled before spawn and after the wait; the
//! difference is the usage of the one child reaped in between.

use std::time::Duration;

/// Resource usage of a terminated child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub user_time: Duration,
    pub sys_time: Duration,
    /// Peak resident set size in kilobytes (largest of any reaped child).
    pub max_rss_kb: u64,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub block_inputs: u64,
    pub block_outputs: u64,
    pub voluntary_switches: u64,
    pub involuntary_switches: u64,
}

impl ResourceUsage {
    /// Cumulative usage of all reaped children of this process.
    #[cfg(unix)]
    pub fn children() -> Self {
        let mut raw = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        let rc = unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, raw.as_mut_ptr()) };
        if rc != 0 {
            return Self::default();
        }
        let raw = unsafe { raw.assume_init() };
        Self {
            user_time: timeval(raw.ru_utime),
            sys_time: timeval(raw.ru_stime),
            max_rss_kb: raw.ru_maxrss.max(0) as u64,
            minor_faults: raw.ru_minflt.max(0) as u64,
            major_faults: raw.ru_majflt.max(0) as u64,
            block_inputs: raw.ru_inblock.max(0) as u64,
            block_outputs: raw.ru_oublock.max(0) as u64,
            voluntary_switches: raw.ru_nvcsw.max(0) as u64,
            involuntary_switches: raw.ru_nivcsw.max(0) as u64,
        }
    }

    #[cfg(not(unix))]
    pub fn children() -> Self {
        Self::default()
    }

    /// Usage accrued between `earlier` and `self`.
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            user_time: self.user_time.saturating_sub(earlier.user_time),
            sys_time: self.sys_time.saturating_sub(earlier.sys_time),
            max_rss_kb: self.max_rss_kb,
            minor_faults: self.minor_faults.saturating_sub(earlier.minor_faults),
            major_faults: self.major_faults.saturating_sub(earlier.major_faults),
            block_inputs: self.block_inputs.saturating_sub(earlier.block_inputs),
            block_outputs: self.block_outputs.saturating_sub(earlier.block_outputs),
            voluntary_switches: self
                .voluntary_switches
                .saturating_sub(earlier.voluntary_switches),
            involuntary_switches: self
                .involuntary_switches
                .saturating_sub(earlier.involuntary_switches),
        }
    }
}

#[cfg(unix)]
fn timeval(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_subtracts_counters_and_keeps_peak_rss() {
        let before = ResourceUsage {
            user_time: Duration::from_millis(10),
            minor_faults: 5,
            max_rss_kb: 100,
            ..Default::default()
        };
        let after = ResourceUsage {
            user_time: Duration::from_millis(25),
            minor_faults: 9,
            max_rss_kb: 300,
            ..Default::default()
        };
        let d = after.since(&before);
        assert_eq!(d.user_time, Duration::from_millis(15));
        assert_eq!(d.minor_faults, 4);
        assert_eq!(d.max_rss_kb, 300);
    }

    #[test]
    fn since_never_underflows() {
        let big = ResourceUsage {
            sys_time: Duration::from_secs(1),
            major_faults: 10,
            ..Default::default()
        };
        let d = ResourceUsage::default().since(&big);
        assert_eq!(d, ResourceUsage::default());
    }
}
