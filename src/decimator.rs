use std::num::NonZeroU32;

/// Picks one of every `ratio` samples for display.
///
/// The counter is not an average: the `ratio`-th sample of each period is
/// forwarded as-is, so bursts in the source stay visible. With `n` samples in,
/// `n / ratio` come out, at zero-based positions `ratio - 1`, `2 * ratio - 1`, …
#[derive(Debug, Clone)]
pub struct Decimator {
    ratio: NonZeroU32,
    count: u32,
}

impl Decimator {
    /// 1000 Hz full rate down to 50 Hz on screen.
    pub const DEFAULT_RATIO: NonZeroU32 = match NonZeroU32::new(20) {
        Some(r) => r,
        None => unreachable!(),
    };

    pub fn new(ratio: NonZeroU32) -> Self {
        Self { ratio, count: 0 }
    }

    /// Counts one sample; `true` if it goes to the display path.
    pub fn select(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.ratio.get() {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn ratio(&self) -> NonZeroU32 {
        self.ratio
    }

    /// Changing the ratio starts a new period.
    pub fn set_ratio(&mut self, ratio: NonZeroU32) {
        self.ratio = ratio;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Position within the current period.
    pub fn phase(&self) -> u32 {
        self.count
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATIO)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn selected(ratio: u32, n: usize) -> Vec<usize> {
        let mut d = Decimator::new(NonZeroU32::new(ratio).unwrap());
        (0..n).filter(|_| d.select()).collect()
    }

    #[test]
    fn forwards_every_rth() {
        assert_eq!(selected(3, 10), vec![2, 5, 8]);
        assert_eq!(selected(20, 100).len(), 5);
        assert_eq!(selected(20, 119).len(), 5);
    }

    #[test]
    fn ratio_one_forwards_everything() {
        assert_eq!(selected(1, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn floor_of_n_over_r() {
        for r in 1..8u32 {
            for n in 0..50usize {
                assert_eq!(selected(r, n).len(), n / r as usize, "r={r} n={n}");
            }
        }
    }

    #[test]
    fn reset_restarts_period() {
        let mut d = Decimator::new(NonZeroU32::new(3).unwrap());
        assert!(!d.select());
        assert!(!d.select());
        d.reset();
        assert_eq!(d.phase(), 0);
        assert!(!d.select());
        assert!(!d.select());
        assert!(d.select());
    }

    #[test]
    fn default_ratio_is_twenty() {
        assert_eq!(Decimator::default().ratio().get(), 20);
    }
}
