//! Geometric decay of relation weights by block height

use crate::config::Parameters;

/// Turns a block height into a multiplicative weight factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayManager {
    period: u64,
    koefficient: f64,
}

impl DecayManager {
    /// `period` must be positive and `koefficient` inside (0, 1); both are
    /// checked by `Parameters::validate`
    pub fn new(period: u64, koefficient: f64) -> Self {
        Self {
            period: period.max(1),
            koefficient,
        }
    }

    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(params.decay_period, params.decay_koefficient)
    }

    /// `koefficient ^ floor(height / period)`, by repeated multiplication
    pub fn decay_factor(&self, height: u64) -> f64 {
        let periods = height / self.period;
        let mut factor = 1.0;
        for _ in 0..periods {
            factor *= self.koefficient;
            if factor == 0.0 {
                break;
            }
        }
        factor
    }

    /// Factor for a relation; non-decayable relations always get 1
    pub fn factor_for(&self, decayable: bool, height: u64) -> f64 {
        if decayable {
            self.decay_factor(height)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_periods_only() {
        let d = DecayManager::new(10, 0.5);
        assert_eq!(d.decay_factor(0), 1.0);
        assert_eq!(d.decay_factor(9), 1.0);
        assert_eq!(d.decay_factor(10), 0.5);
        assert_eq!(d.decay_factor(29), 0.25);
        assert_eq!(d.decay_factor(30), 0.125);
    }

    #[test]
    fn test_monotonic_in_height() {
        let d = DecayManager::new(86_400, 0.9);
        let mut previous = d.decay_factor(0);
        for height in (0..2_000_000).step_by(40_000) {
            let current = d.decay_factor(height);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn test_non_decayable_ignores_height() {
        let d = DecayManager::new(1, 0.5);
        assert_eq!(d.factor_for(false, 1_000), 1.0);
        assert_eq!(d.factor_for(true, 2), 0.25);
    }

    #[test]
    fn test_underflow_stops_early() {
        let d = DecayManager::new(1, 0.1);
        assert_eq!(d.decay_factor(u64::MAX), 0.0);
    }
}
