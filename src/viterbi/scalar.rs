//! Add-compare-select one state at a time

use super::{
    check_buffers, output_symbols, pattern_costs, traceback, Backend, VectorizedDeconvolver,
    INITIAL_METRIC, NUM_STATES, RATE, TAIL_BITS,
};
use crate::Error;

/// Path metrics are renormalised once the smallest exceeds this value.
const RENORM_THRESHOLD: i32 = 1 << 24;

/// Strategy using 32-bit path metrics
#[derive(Debug)]
pub(super) struct ScalarDeconvolver {
    /// Number of information bits per frame
    frame_bits: usize,
    /// Code bits for each value of the encoder register
    syms: [u8; 2 * NUM_STATES],
    /// Path metrics before the current step
    metrics: [i32; NUM_STATES],
    /// Path metrics after the current step
    next_metrics: [i32; NUM_STATES],
    /// Packed survivor decisions, one word per step
    decisions: Vec<u64>,
}

impl ScalarDeconvolver {
    /// Returns strategy for given frame length.
    pub(super) fn new(frame_bits: usize) -> Self {
        Self {
            frame_bits,
            syms: output_symbols(),
            metrics: [0; NUM_STATES],
            next_metrics: [0; NUM_STATES],
            decisions: vec![0; frame_bits + TAIL_BITS],
        }
    }

    /// Runs one trellis step and returns the packed decisions.
    fn step(&mut self, costs: &[i16; 16]) -> u64 {
        let mut word = 0u64;
        for state in 0 .. NUM_STATES {
            let pred = state >> 1;
            let m0 = self.metrics[pred] + i32::from(costs[usize::from(self.syms[state])]);
            let m1 = self.metrics[pred | NUM_STATES / 2]
                + i32::from(costs[usize::from(self.syms[state | NUM_STATES])]);
            if m1 < m0 {
                self.next_metrics[state] = m1;
                word |= 1 << state;
            } else {
                self.next_metrics[state] = m0;
            }
        }
        std::mem::swap(&mut self.metrics, &mut self.next_metrics);
        let min = self.metrics.iter().copied().min().unwrap_or(0);
        if min > RENORM_THRESHOLD {
            self.metrics.iter_mut().for_each(|m| *m -= min);
        }
        word
    }
}

impl VectorizedDeconvolver for ScalarDeconvolver {
    fn frame_bits(&self) -> usize {
        self.frame_bits
    }

    fn backend(&self) -> Backend {
        Backend::Scalar
    }

    fn deconvolve(&mut self, input: &[i16], output: &mut [u8]) -> Result<(), Error> {
        check_buffers(self.frame_bits, input, output)?;
        self.metrics = [i32::from(INITIAL_METRIC); NUM_STATES];
        self.metrics[0] = 0;
        for step in 0 .. self.decisions.len() {
            let costs = pattern_costs(&input[RATE * step .. RATE * (step + 1)]);
            self.decisions[step] = self.step(&costs);
        }
        traceback(&self.decisions, output);
        Ok(())
    }
}
