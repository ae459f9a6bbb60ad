//! Add-compare-select on fixed-width groups of 16-bit lanes
//!
//! States `2i` and `2i + 1` share the predecessors `i` and `i + 32`, so the trellis step is done
//! as butterflies over `i in 0 .. 32`, `LANES` butterflies at a time. The lane loops have the
//! shape of one register operation each and compile to packed instructions where available.

use super::{
    check_buffers, output_symbols, pattern_costs, traceback, Backend, VectorizedDeconvolver,
    INITIAL_METRIC, NUM_STATES, RATE, TAIL_BITS,
};
use crate::Error;

/// Strategy using `LANES` saturating 16-bit path metrics per operation
#[derive(Debug)]
pub(super) struct LaneDeconvolver<const LANES: usize> {
    /// Number of information bits per frame
    frame_bits: usize,
    /// Strategy reported to callers
    backend: Backend,
    /// Code bits for each value of the encoder register
    syms: [u8; 2 * NUM_STATES],
    /// Path metrics before the current step
    metrics: [i16; NUM_STATES],
    /// Path metrics after the current step
    next_metrics: [i16; NUM_STATES],
    /// Packed survivor decisions, one word per step
    decisions: Vec<u64>,
}

impl<const LANES: usize> LaneDeconvolver<LANES> {
    /// Path metrics are renormalised once the smallest exceeds this value.
    const RENORM_THRESHOLD: i16 = if LANES >= 16 { 8192 } else { 16384 };

    /// Returns strategy for given frame length.
    pub(super) fn new(frame_bits: usize, backend: Backend) -> Self {
        Self {
            frame_bits,
            backend,
            syms: output_symbols(),
            metrics: [0; NUM_STATES],
            next_metrics: [0; NUM_STATES],
            decisions: vec![0; frame_bits + TAIL_BITS],
        }
    }

    /// Runs one trellis step and returns the packed decisions.
    fn step(&mut self, costs: &[i16; 16]) -> u64 {
        let half = NUM_STATES / 2;
        let mut word = 0u64;
        for base in (0 .. half).step_by(LANES) {
            let mut lo = [0i16; LANES];
            let mut hi = [0i16; LANES];
            let mut even_lo = [0i16; LANES];
            let mut even_hi = [0i16; LANES];
            let mut odd_lo = [0i16; LANES];
            let mut odd_hi = [0i16; LANES];
            for lane in 0 .. LANES {
                let i = base + lane;
                lo[lane] = self.metrics[i];
                hi[lane] = self.metrics[i + half];
                even_lo[lane] = costs[usize::from(self.syms[2 * i])];
                even_hi[lane] = costs[usize::from(self.syms[2 * i + NUM_STATES])];
                odd_lo[lane] = costs[usize::from(self.syms[2 * i + 1])];
                odd_hi[lane] = costs[usize::from(self.syms[2 * i + 1 + NUM_STATES])];
            }
            let (even, even_decisions) = add_compare_select(&lo, &hi, &even_lo, &even_hi);
            let (odd, odd_decisions) = add_compare_select(&lo, &hi, &odd_lo, &odd_hi);
            for lane in 0 .. LANES {
                let i = base + lane;
                self.next_metrics[2 * i] = even[lane];
                self.next_metrics[2 * i + 1] = odd[lane];
                word |= u64::from(even_decisions[lane]) << (2 * i);
                word |= u64::from(odd_decisions[lane]) << (2 * i + 1);
            }
        }
        std::mem::swap(&mut self.metrics, &mut self.next_metrics);
        let min = self.metrics.iter().copied().min().unwrap_or(0);
        if min > Self::RENORM_THRESHOLD {
            self.metrics.iter_mut().for_each(|m| *m = m.saturating_sub(min));
        }
        word
    }
}

impl<const LANES: usize> VectorizedDeconvolver for LaneDeconvolver<LANES> {
    fn frame_bits(&self) -> usize {
        self.frame_bits
    }

    fn backend(&self) -> Backend {
        self.backend
    }

    fn deconvolve(&mut self, input: &[i16], output: &mut [u8]) -> Result<(), Error> {
        check_buffers(self.frame_bits, input, output)?;
        self.metrics = [INITIAL_METRIC; NUM_STATES];
        self.metrics[0] = 0;
        for step in 0 .. self.decisions.len() {
            let costs = pattern_costs(&input[RATE * step .. RATE * (step + 1)]);
            self.decisions[step] = self.step(&costs);
        }
        traceback(&self.decisions, output);
        Ok(())
    }
}

/// Returns survivor metrics and decisions (`true` when the upper predecessor wins) for one group
/// of butterflies.
fn add_compare_select<const LANES: usize>(
    lo: &[i16; LANES],
    hi: &[i16; LANES],
    cost_lo: &[i16; LANES],
    cost_hi: &[i16; LANES],
) -> ([i16; LANES], [bool; LANES]) {
    let mut metrics = [0i16; LANES];
    let mut decisions = [false; LANES];
    for lane in 0 .. LANES {
        let m0 = lo[lane].saturating_add(cost_lo[lane]);
        let m1 = hi[lane].saturating_add(cost_hi[lane]);
        decisions[lane] = m1 < m0;
        metrics[lane] = if decisions[lane] { m1 } else { m0 };
    }
    (metrics, decisions)
}

#[cfg(test)]
mod tests_of_lanes {
    use super::*;

    #[test]
    fn test_add_compare_select() {
        let (metrics, decisions) =
            add_compare_select(&[0, 10, i16::MAX], &[5, 5, 0], &[1, 1, 10], &[1, 6, 10]);
        assert_eq!(metrics, [1, 11, 10]);
        // Ties go to the lower predecessor
        assert_eq!(decisions, [false, false, true]);
    }

    #[test]
    fn test_renormalisation() {
        let mut acs = LaneDeconvolver::<16>::new(4, Backend::Avx2);
        acs.metrics = [20000; NUM_STATES];
        acs.metrics[3] = 9000;
        acs.step(&[100; 16]);
        assert_eq!(acs.metrics.iter().copied().min(), Some(0));
        assert!(acs.metrics.iter().all(|&m| m <= 11000));
    }
}
