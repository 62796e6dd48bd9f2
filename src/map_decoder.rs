//! MAX-LOG-MAP decoding of one constituent code over the eight-state trellis.
//!
//! Each decoding pass takes channel observations of the systematic and parity streams
//! (trellis termination steps included), an optional a-priori term per information bit,
//! and returns the posterior log-likelihood ratio of every information bit. Three
//! interchangeable engines implement the same recursions: a scalar reference, a form
//! whose arithmetic runs across the eight trellis states in lanes, and a form that
//! additionally stacks several same-length codeblocks and decodes them in lockstep.

use crate::common::clamp_llr;
use crate::encoder::{parity_bit, FEEDBACK_POLY, FEEDFORWARD_POLY, MEMORY_LEN};
use crate::{Llr, LLR_INF};

/// Number of trellis states of one constituent code
const NUM_STATES: usize = 1 << MEMORY_LEN;

/// Selection of the MAP engine a turbo decoder runs on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum MapVariant {
    /// Per-state loops, the reference form
    Scalar,
    /// Lane-parallel arithmetic across the eight trellis states
    #[default]
    StateLanes,
    /// Lane-parallel arithmetic across eight same-length codeblocks decoded in lockstep.
    /// Not yet validated for production use.
    InterFrame8,
    /// Lane-parallel arithmetic across sixteen same-length codeblocks decoded in lockstep.
    /// Not yet validated for production use.
    InterFrame16,
}

/// Observations consumed by one MAP pass.
///
/// The systematic and parity slices cover the information steps and the three termination
/// steps of one constituent code, so they hold at least `block_len + 3` entries. The
/// a-priori slice, when present, holds one entry per information bit.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MapInput<'a> {
    pub systematic: &'a [Llr],
    pub parity: &'a [Llr],
    pub apriori: Option<&'a [Llr]>,
}

/// One MAP decoding engine.
///
/// An engine processes any number of same-length jobs per call; [`lanes`](Self::lanes)
/// advertises how many of them it decodes simultaneously, which callers use to size
/// their batches. Each job's posterior goes to the output slice of the same index,
/// `block_len` values per job.
pub(crate) trait MapEngine: std::fmt::Debug + Send {
    /// Number of jobs this engine decodes in lockstep.
    fn lanes(&self) -> usize;

    /// Runs one MAP pass over every job.
    fn run(&mut self, jobs: &[MapInput<'_>], outputs: &mut [&mut [Llr]], block_len: usize);
}

/// Builds the engine for a variant, sized for codeblocks up to `max_block_len` bits.
pub(crate) fn build_engine(variant: MapVariant, max_block_len: usize) -> Box<dyn MapEngine> {
    match variant {
        MapVariant::Scalar => Box::new(ScalarMap::new(max_block_len)),
        MapVariant::StateLanes => Box::new(StateLanesMap::new(max_block_len)),
        MapVariant::InterFrame8 => Box::new(InterFrameMap::<8>::new(max_block_len)),
        MapVariant::InterFrame16 => Box::new(InterFrameMap::<16>::new(max_block_len)),
    }
}

/// Transition tables of one constituent code, derived from the encoder polynomials.
///
/// Branch metrics come in `(g0, g1)` pairs per trellis step, where `g1` is the metric of
/// a transition emitting parity one under input one. For input one at state `s` the
/// metric is the pair entry `branch_for_one[s]`; for input zero it is the negation of
/// that same entry, because the parity output flips with the input everywhere on this
/// trellis.
#[derive(Clone, Copy, Debug)]
struct Trellis {
    next_for_zero: [usize; NUM_STATES],
    next_for_one: [usize; NUM_STATES],
    prev_for_zero: [usize; NUM_STATES],
    prev_for_one: [usize; NUM_STATES],
    branch_for_one: [usize; NUM_STATES],
}

impl Trellis {
    fn new() -> Self {
        let mut next_for_zero = [0; NUM_STATES];
        let mut next_for_one = [0; NUM_STATES];
        let mut branch_for_one = [0; NUM_STATES];
        for state in 0 .. NUM_STATES {
            for input in 0 .. 2 {
                let feedback = parity_bit(((input << MEMORY_LEN) | state) & FEEDBACK_POLY);
                let augmented = (feedback << MEMORY_LEN) | state;
                if input == 0 {
                    next_for_zero[state] = augmented >> 1;
                } else {
                    next_for_one[state] = augmented >> 1;
                    branch_for_one[state] = parity_bit(augmented & FEEDFORWARD_POLY);
                }
            }
        }
        let mut prev_for_zero = [0; NUM_STATES];
        let mut prev_for_one = [0; NUM_STATES];
        for state in 0 .. NUM_STATES {
            prev_for_zero[next_for_zero[state]] = state;
            prev_for_one[next_for_one[state]] = state;
        }
        Self {
            next_for_zero,
            next_for_one,
            prev_for_zero,
            prev_for_one,
            branch_for_one,
        }
    }
}

/// Computes the `(g0, g1)` branch metric pair of one trellis step.
///
/// The a-priori term joins the systematic observation on information steps only; the
/// termination steps carry none.
fn branch_pair(job: &MapInput<'_>, step: usize, block_len: usize) -> [Llr; 2] {
    let mut effective = i32::from(job.systematic[step]);
    if step < block_len {
        if let Some(apriori) = job.apriori {
            effective += i32::from(apriori[step]);
        }
    }
    let parity = i32::from(job.parity[step]);
    [
        clamp_llr((effective - parity) / 2),
        clamp_llr((effective + parity) / 2),
    ]
}

/// Scalar reference engine.
#[derive(Debug)]
struct ScalarMap {
    trellis: Trellis,
    branch: Vec<[Llr; 2]>,
    alpha: Vec<[Llr; NUM_STATES]>,
}

impl ScalarMap {
    fn new(max_block_len: usize) -> Self {
        Self {
            trellis: Trellis::new(),
            branch: Vec::with_capacity(max_block_len + MEMORY_LEN),
            alpha: Vec::with_capacity(max_block_len),
        }
    }

    fn decode_one(&mut self, job: &MapInput<'_>, output: &mut [Llr], block_len: usize) {
        self.branch.clear();
        for step in 0 .. block_len + MEMORY_LEN {
            self.branch.push(branch_pair(job, step, block_len));
        }
        self.forward(block_len);
        self.backward(output, block_len);
    }

    /// Forward recursion, keeping the metrics of every information step for the output
    /// pass. Both trellis boundaries are the all-zero state.
    fn forward(&mut self, block_len: usize) {
        let trellis = self.trellis;
        let mut current = [-LLR_INF; NUM_STATES];
        current[0] = 0;
        self.alpha.clear();
        for step in 0 .. block_len {
            self.alpha.push(current);
            let pair = self.branch[step];
            let mut next: [Llr; NUM_STATES] = [0; NUM_STATES];
            for state in 0 .. NUM_STATES {
                let from_one = trellis.prev_for_one[state];
                let from_zero = trellis.prev_for_zero[state];
                let path_one =
                    current[from_one].saturating_add(pair[trellis.branch_for_one[from_one]]);
                let path_zero =
                    current[from_zero].saturating_sub(pair[trellis.branch_for_one[from_zero]]);
                next[state] = path_one.max(path_zero);
            }
            let norm = next[0];
            for metric in &mut next {
                *metric = metric.saturating_sub(norm);
            }
            current = next;
        }
    }

    /// Backward recursion fused with the posterior computation. The three termination
    /// steps run first, carrying the known final state back to the last information step.
    fn backward(&mut self, output: &mut [Llr], block_len: usize) {
        let trellis = self.trellis;
        let mut beta = [-LLR_INF; NUM_STATES];
        beta[0] = 0;
        for step in (block_len .. block_len + MEMORY_LEN).rev() {
            beta = self.step_backward(beta, self.branch[step]);
        }
        for step in (0 .. block_len).rev() {
            let pair = self.branch[step];
            let alpha = self.alpha[step];
            let mut best_one = i32::MIN;
            let mut best_zero = i32::MIN;
            for state in 0 .. NUM_STATES {
                let metric_one = i32::from(pair[trellis.branch_for_one[state]]);
                let base = i32::from(alpha[state]);
                best_one = best_one
                    .max(base + metric_one + i32::from(beta[trellis.next_for_one[state]]));
                best_zero = best_zero
                    .max(base - metric_one + i32::from(beta[trellis.next_for_zero[state]]));
            }
            output[step] = clamp_llr(best_one - best_zero);
            beta = self.step_backward(beta, pair);
        }
    }

    fn step_backward(
        &self,
        beta_next: [Llr; NUM_STATES],
        pair: [Llr; 2],
    ) -> [Llr; NUM_STATES] {
        let trellis = &self.trellis;
        let mut beta: [Llr; NUM_STATES] = [0; NUM_STATES];
        for state in 0 .. NUM_STATES {
            let metric_one = pair[trellis.branch_for_one[state]];
            let path_one = beta_next[trellis.next_for_one[state]].saturating_add(metric_one);
            let path_zero = beta_next[trellis.next_for_zero[state]].saturating_sub(metric_one);
            beta[state] = path_one.max(path_zero);
        }
        let norm = beta[0];
        for metric in &mut beta {
            *metric = metric.saturating_sub(norm);
        }
        beta
    }
}

impl MapEngine for ScalarMap {
    fn lanes(&self) -> usize {
        1
    }

    fn run(&mut self, jobs: &[MapInput<'_>], outputs: &mut [&mut [Llr]], block_len: usize) {
        debug_assert_eq!(jobs.len(), outputs.len());
        for (job, output) in jobs.iter().zip(outputs) {
            self.decode_one(job, output, block_len);
        }
    }
}

/// Engine whose recursions run as straight-line arithmetic over all eight states at once.
///
/// The per-state branch metrics of every step are gathered up front so the recursions
/// only shuffle, add and take maxima of eight-lane vectors. Metrics renormalize every
/// fourth step; the normalization offset is common to all states of a step, so posteriors
/// match the scalar engine exactly away from saturation.
#[derive(Debug)]
struct StateLanesMap {
    trellis: Trellis,
    metric_for_one: Vec<[Llr; NUM_STATES]>,
    alpha: Vec<[Llr; NUM_STATES]>,
}

impl StateLanesMap {
    fn new(max_block_len: usize) -> Self {
        Self {
            trellis: Trellis::new(),
            metric_for_one: Vec::with_capacity(max_block_len + MEMORY_LEN),
            alpha: Vec::with_capacity(max_block_len),
        }
    }

    fn decode_one(&mut self, job: &MapInput<'_>, output: &mut [Llr], block_len: usize) {
        let branch_for_one = self.trellis.branch_for_one;
        self.metric_for_one.clear();
        for step in 0 .. block_len + MEMORY_LEN {
            let pair = branch_pair(job, step, block_len);
            self.metric_for_one
                .push(std::array::from_fn(|state| pair[branch_for_one[state]]));
        }
        self.forward(block_len);
        self.backward(output, block_len);
    }

    fn forward(&mut self, block_len: usize) {
        let prev_one = self.trellis.prev_for_one;
        let prev_zero = self.trellis.prev_for_zero;
        let mut current = [-LLR_INF; NUM_STATES];
        current[0] = 0;
        self.alpha.clear();
        for step in 0 .. block_len {
            self.alpha.push(current);
            let metric = self.metric_for_one[step];
            let from_one: [Llr; NUM_STATES] = std::array::from_fn(|state| {
                current[prev_one[state]].saturating_add(metric[prev_one[state]])
            });
            let from_zero: [Llr; NUM_STATES] = std::array::from_fn(|state| {
                current[prev_zero[state]].saturating_sub(metric[prev_zero[state]])
            });
            current = std::array::from_fn(|state| from_one[state].max(from_zero[state]));
            if step % 4 == 3 {
                let norm = current[0];
                current = current.map(|value| value.saturating_sub(norm));
            }
        }
    }

    fn backward(&mut self, output: &mut [Llr], block_len: usize) {
        let next_one = self.trellis.next_for_one;
        let next_zero = self.trellis.next_for_zero;
        let mut beta = [-LLR_INF; NUM_STATES];
        beta[0] = 0;
        for step in (block_len .. block_len + MEMORY_LEN).rev() {
            beta = self.step_backward(beta, step);
        }
        for step in (0 .. block_len).rev() {
            let metric = self.metric_for_one[step];
            let alpha = self.alpha[step];
            let path_one: [i32; NUM_STATES] = std::array::from_fn(|state| {
                i32::from(alpha[state])
                    + i32::from(metric[state])
                    + i32::from(beta[next_one[state]])
            });
            let path_zero: [i32; NUM_STATES] = std::array::from_fn(|state| {
                i32::from(alpha[state]) - i32::from(metric[state])
                    + i32::from(beta[next_zero[state]])
            });
            let best_one = path_one.into_iter().max().unwrap_or(i32::MIN);
            let best_zero = path_zero.into_iter().max().unwrap_or(i32::MIN);
            output[step] = clamp_llr(best_one - best_zero);
            beta = self.step_backward(beta, step);
        }
    }

    fn step_backward(&self, beta_next: [Llr; NUM_STATES], step: usize) -> [Llr; NUM_STATES] {
        let next_one = self.trellis.next_for_one;
        let next_zero = self.trellis.next_for_zero;
        let metric = self.metric_for_one[step];
        let from_one: [Llr; NUM_STATES] = std::array::from_fn(|state| {
            beta_next[next_one[state]].saturating_add(metric[state])
        });
        let from_zero: [Llr; NUM_STATES] = std::array::from_fn(|state| {
            beta_next[next_zero[state]].saturating_sub(metric[state])
        });
        let mut beta: [Llr; NUM_STATES] =
            std::array::from_fn(|state| from_one[state].max(from_zero[state]));
        if step % 4 == 0 {
            let norm = beta[0];
            beta = beta.map(|value| value.saturating_sub(norm));
        }
        beta
    }
}

impl MapEngine for StateLanesMap {
    fn lanes(&self) -> usize {
        1
    }

    fn run(&mut self, jobs: &[MapInput<'_>], outputs: &mut [&mut [Llr]], block_len: usize) {
        debug_assert_eq!(jobs.len(), outputs.len());
        for (job, output) in jobs.iter().zip(outputs) {
            self.decode_one(job, output, block_len);
        }
    }
}

/// Engine that stacks `LANES` same-length codeblocks and decodes them in lockstep.
///
/// Metrics are laid out state-major: for each state, one vector holding that state's
/// metric in every stacked codeblock. Unused lanes of a partial batch run on all-zero
/// observations and their outputs are simply not read back. Batches larger than `LANES`
/// are processed in chunks.
#[derive(Debug)]
struct InterFrameMap<const LANES: usize> {
    trellis: Trellis,
    metric_for_one: Vec<[[Llr; LANES]; NUM_STATES]>,
    alpha: Vec<[[Llr; LANES]; NUM_STATES]>,
}

impl<const LANES: usize> InterFrameMap<LANES> {
    fn new(max_block_len: usize) -> Self {
        Self {
            trellis: Trellis::new(),
            metric_for_one: Vec::with_capacity(max_block_len + MEMORY_LEN),
            alpha: Vec::with_capacity(max_block_len),
        }
    }

    fn decode_stack(
        &mut self,
        jobs: &[MapInput<'_>],
        outputs: &mut [&mut [Llr]],
        block_len: usize,
    ) {
        let branch_for_one = self.trellis.branch_for_one;
        self.metric_for_one.clear();
        for step in 0 .. block_len + MEMORY_LEN {
            let mut pairs: [[Llr; 2]; LANES] = [[0; 2]; LANES];
            for (lane, job) in jobs.iter().enumerate() {
                pairs[lane] = branch_pair(job, step, block_len);
            }
            self.metric_for_one.push(std::array::from_fn(|state| {
                std::array::from_fn(|lane| pairs[lane][branch_for_one[state]])
            }));
        }
        self.forward(block_len);
        self.backward(outputs, block_len);
    }

    fn forward(&mut self, block_len: usize) {
        let prev_one = self.trellis.prev_for_one;
        let prev_zero = self.trellis.prev_for_zero;
        let mut current = [[-LLR_INF; LANES]; NUM_STATES];
        current[0] = [0; LANES];
        self.alpha.clear();
        for step in 0 .. block_len {
            self.alpha.push(current);
            let metric = &self.metric_for_one[step];
            let mut next: [[Llr; LANES]; NUM_STATES] = [[0; LANES]; NUM_STATES];
            for state in 0 .. NUM_STATES {
                let from_one = prev_one[state];
                let from_zero = prev_zero[state];
                for lane in 0 .. LANES {
                    let path_one =
                        current[from_one][lane].saturating_add(metric[from_one][lane]);
                    let path_zero =
                        current[from_zero][lane].saturating_sub(metric[from_zero][lane]);
                    next[state][lane] = path_one.max(path_zero);
                }
            }
            if step % 4 == 3 {
                let norm = next[0];
                for state_metrics in &mut next {
                    for lane in 0 .. LANES {
                        state_metrics[lane] = state_metrics[lane].saturating_sub(norm[lane]);
                    }
                }
            }
            current = next;
        }
    }

    fn backward(&mut self, outputs: &mut [&mut [Llr]], block_len: usize) {
        let next_one = self.trellis.next_for_one;
        let next_zero = self.trellis.next_for_zero;
        let mut beta = [[-LLR_INF; LANES]; NUM_STATES];
        beta[0] = [0; LANES];
        for step in (block_len .. block_len + MEMORY_LEN).rev() {
            beta = self.step_backward(beta, step);
        }
        for step in (0 .. block_len).rev() {
            let metric = &self.metric_for_one[step];
            let alpha = &self.alpha[step];
            let mut best_one = [i32::MIN; LANES];
            let mut best_zero = [i32::MIN; LANES];
            for state in 0 .. NUM_STATES {
                let to_one = next_one[state];
                let to_zero = next_zero[state];
                for lane in 0 .. LANES {
                    let base = i32::from(alpha[state][lane]);
                    let metric_one = i32::from(metric[state][lane]);
                    best_one[lane] = best_one[lane]
                        .max(base + metric_one + i32::from(beta[to_one][lane]));
                    best_zero[lane] = best_zero[lane]
                        .max(base - metric_one + i32::from(beta[to_zero][lane]));
                }
            }
            for (lane, output) in outputs.iter_mut().enumerate() {
                output[step] = clamp_llr(best_one[lane] - best_zero[lane]);
            }
            beta = self.step_backward(beta, step);
        }
    }

    fn step_backward(
        &self,
        beta_next: [[Llr; LANES]; NUM_STATES],
        step: usize,
    ) -> [[Llr; LANES]; NUM_STATES] {
        let next_one = self.trellis.next_for_one;
        let next_zero = self.trellis.next_for_zero;
        let metric = &self.metric_for_one[step];
        let mut beta: [[Llr; LANES]; NUM_STATES] = [[0; LANES]; NUM_STATES];
        for state in 0 .. NUM_STATES {
            let to_one = next_one[state];
            let to_zero = next_zero[state];
            for lane in 0 .. LANES {
                let path_one = beta_next[to_one][lane].saturating_add(metric[state][lane]);
                let path_zero = beta_next[to_zero][lane].saturating_sub(metric[state][lane]);
                beta[state][lane] = path_one.max(path_zero);
            }
        }
        if step % 4 == 0 {
            let norm = beta[0];
            for state_metrics in &mut beta {
                for lane in 0 .. LANES {
                    state_metrics[lane] = state_metrics[lane].saturating_sub(norm[lane]);
                }
            }
        }
        beta
    }
}

impl<const LANES: usize> MapEngine for InterFrameMap<LANES> {
    fn lanes(&self) -> usize {
        LANES
    }

    fn run(&mut self, jobs: &[MapInput<'_>], outputs: &mut [&mut [Llr]], block_len: usize) {
        debug_assert_eq!(jobs.len(), outputs.len());
        for (job_chunk, output_chunk) in jobs.chunks(LANES).zip(outputs.chunks_mut(LANES)) {
            self.decode_stack(job_chunk, output_chunk, block_len);
        }
    }
}

#[cfg(test)]
mod tests_of_trellis {
    use super::*;

    #[test]
    fn test_tables_match_published_trellis() {
        // Published transition tables for the LTE constituent code
        let trellis = Trellis::new();
        assert_eq!(trellis.next_for_zero, [0, 4, 5, 1, 2, 6, 7, 3]);
        assert_eq!(trellis.next_for_one, [4, 0, 1, 5, 6, 2, 3, 7]);
        assert_eq!(trellis.branch_for_one, [1, 1, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_prev_tables_invert_next_tables() {
        let trellis = Trellis::new();
        for state in 0 .. NUM_STATES {
            assert_eq!(trellis.next_for_zero[trellis.prev_for_zero[state]], state);
            assert_eq!(trellis.next_for_one[trellis.prev_for_one[state]], state);
        }
    }
}

#[cfg(test)]
mod tests_of_map_engines {
    use super::*;
    use crate::{encoder, tables, utils, Bit};

    /// Builds the systematic and top-parity observations of a codeblock, in the layout a
    /// MAP pass consumes: information steps first, then the three termination steps.
    fn constituent_observations(info_bits: &[Bit], magnitude: Llr) -> (Vec<Llr>, Vec<Llr>) {
        let block_len = info_bits.len();
        let interleaver = tables::interleaver(block_len).unwrap();
        let code_bits = encoder::encode(info_bits, &interleaver).unwrap();
        let to_llr = |bit: Bit| match bit {
            Bit::One => magnitude,
            Bit::Zero => -magnitude,
        };
        let mut systematic: Vec<Llr> =
            (0 .. block_len).map(|k| to_llr(code_bits[3 * k])).collect();
        let mut parity: Vec<Llr> =
            (0 .. block_len).map(|k| to_llr(code_bits[3 * k + 1])).collect();
        for index in 0 .. 3 {
            systematic.push(to_llr(code_bits[3 * block_len + 2 * index]));
            parity.push(to_llr(code_bits[3 * block_len + 2 * index + 1]));
        }
        (systematic, parity)
    }

    fn run_variant(
        variant: MapVariant,
        systematic: &[Llr],
        parity: &[Llr],
        apriori: Option<&[Llr]>,
        block_len: usize,
    ) -> Vec<Llr> {
        let mut engine = build_engine(variant, block_len);
        let mut output = vec![0; block_len];
        let jobs = [MapInput {
            systematic,
            parity,
            apriori,
        }];
        let mut outputs = [&mut output[..]];
        engine.run(&jobs, &mut outputs, block_len);
        output
    }

    #[test]
    fn test_scalar_decodes_clean_observations() {
        let info_bits = utils::random_bits(40);
        let (systematic, parity) = constituent_observations(&info_bits, 1000);
        let posterior = run_variant(MapVariant::Scalar, &systematic, &parity, None, 40);
        for k in 0 .. 40 {
            assert_eq!(posterior[k] > 0, info_bits[k] == Bit::One, "position {k}");
        }
    }

    #[test]
    fn test_scalar_recovers_erased_systematic_bits() {
        // The parity stream alone pins down information bits erased from the systematic
        // stream, including the last one thanks to the termination observations
        let info_bits = utils::random_bits(48);
        let (mut systematic, parity) = constituent_observations(&info_bits, 1000);
        for &k in &[0, 7, 20, 33, 47] {
            systematic[k] = 0;
        }
        let posterior = run_variant(MapVariant::Scalar, &systematic, &parity, None, 48);
        for k in 0 .. 48 {
            assert_eq!(posterior[k] > 0, info_bits[k] == Bit::One, "position {k}");
        }
    }

    #[test]
    fn test_all_variants_agree_exactly() {
        // Away from saturation the renormalization cadence cancels out of the posterior,
        // so every engine returns identical values
        for &block_len in &[40, 96] {
            let info_bits = utils::random_bits(block_len);
            let (mut systematic, mut parity) = constituent_observations(&info_bits, 600);
            for (index, llr) in systematic.iter_mut().enumerate() {
                *llr += i16::try_from((index * 37) % 100).unwrap() - 50;
            }
            for (index, llr) in parity.iter_mut().enumerate() {
                *llr -= i16::try_from((index * 53) % 90).unwrap() - 45;
            }
            let apriori: Vec<Llr> = (0 .. block_len)
                .map(|k| i16::try_from((k * 29) % 160).unwrap() - 80)
                .collect();
            let reference = run_variant(
                MapVariant::Scalar,
                &systematic,
                &parity,
                Some(&apriori),
                block_len,
            );
            for variant in [
                MapVariant::StateLanes,
                MapVariant::InterFrame8,
                MapVariant::InterFrame16,
            ] {
                let posterior =
                    run_variant(variant, &systematic, &parity, Some(&apriori), block_len);
                assert_eq!(posterior, reference, "{variant:?}");
            }
        }
    }

    #[test]
    fn test_inter_frame_decodes_distinct_codeblocks_per_lane() {
        // Eleven jobs on an eight-lane engine also exercises the chunked second pass
        let blocks: Vec<Vec<Bit>> = (0 .. 11).map(|_| utils::random_bits(40)).collect();
        let observations: Vec<(Vec<Llr>, Vec<Llr>)> = blocks
            .iter()
            .map(|block| constituent_observations(block, 900))
            .collect();
        let jobs: Vec<MapInput<'_>> = observations
            .iter()
            .map(|(systematic, parity)| MapInput {
                systematic,
                parity,
                apriori: None,
            })
            .collect();
        let mut engine = build_engine(MapVariant::InterFrame8, 40);
        assert_eq!(engine.lanes(), 8);
        let mut output_blocks: Vec<Vec<Llr>> = vec![vec![0; 40]; 11];
        let mut outputs: Vec<&mut [Llr]> =
            output_blocks.iter_mut().map(|output| &mut output[..]).collect();
        engine.run(&jobs, &mut outputs, 40);
        for (block, posterior) in blocks.iter().zip(&output_blocks) {
            for k in 0 .. 40 {
                assert_eq!(posterior[k] > 0, block[k] == Bit::One, "position {k}");
            }
        }
    }
}
