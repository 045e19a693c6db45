//! Channel fan-out configuration for multichannel operators.
//!
//! With the `parallel` feature, [`UndecimatedWavelet`](crate::undecimated::UndecimatedWavelet)
//! processes channels on the rayon pool once their count reaches
//! [`parallel_channel_threshold`]. The threshold is resolved in order from
//! [`set_parallel_channel_threshold`], the `MRWAVE_PAR_CHANNELS` environment
//! variable (read once), and finally a default of two channels on multi-core
//! machines.

#[cfg(feature = "parallel")]
use core::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "parallel")]
use std::sync::OnceLock;

/// `0` means no override.
#[cfg(feature = "parallel")]
static PARALLEL_CHANNELS_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
#[cfg(feature = "parallel")]
static PARALLEL_CHANNELS_ENV: OnceLock<usize> = OnceLock::new();

#[cfg(feature = "parallel")]
fn env_threshold() -> usize {
    *PARALLEL_CHANNELS_ENV.get_or_init(|| {
        std::env::var("MRWAVE_PAR_CHANNELS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0)
    })
}

/// Set the minimum channel count processed in parallel.
///
/// Passing `0` reverts to the environment variable or the default.
#[cfg(feature = "parallel")]
pub fn set_parallel_channel_threshold(channels: usize) {
    PARALLEL_CHANNELS_OVERRIDE.store(channels, Ordering::Relaxed);
}

/// Minimum channel count processed in parallel.
///
/// Without the `parallel` feature this is `usize::MAX`, i.e. never.
pub fn parallel_channel_threshold() -> usize {
    #[cfg(feature = "parallel")]
    {
        let forced = PARALLEL_CHANNELS_OVERRIDE.load(Ordering::Relaxed);
        if forced != 0 {
            return forced;
        }
        let env = env_threshold();
        if env != 0 {
            return env;
        }
        if num_cpus::get() > 1 {
            2
        } else {
            usize::MAX
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        usize::MAX
    }
}

/// Whether `channels` channels should be fanned out.
pub fn should_parallelize(channels: usize) -> bool {
    channels > 1 && channels >= parallel_channel_threshold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_channel_never_parallel() {
        assert!(!should_parallelize(0));
        assert!(!should_parallelize(1));
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn serial_build_never_parallel() {
        assert_eq!(parallel_channel_threshold(), usize::MAX);
        assert!(!should_parallelize(64));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn override_takes_precedence() {
        set_parallel_channel_threshold(3);
        assert_eq!(parallel_channel_threshold(), 3);
        assert!(!should_parallelize(2));
        assert!(should_parallelize(3));
        set_parallel_channel_threshold(0);
        assert_ne!(parallel_channel_threshold(), 0);
    }
}
