//! Iterative turbo decoder exchanging extrinsic information between two MAP passes

use crate::crc::Crc;
use crate::encoder::MEMORY_LEN;
use crate::map_decoder::{build_engine, MapEngine, MapInput};
use crate::tables::TurboTables;
use crate::{coded_block_len, tables, Bit, Error, Llr, MAX_BLOCK_LEN};
use std::sync::Arc;

pub use crate::map_decoder::MapVariant;

/// CRC gate that lets [`TurboDecoder::run_all`] stop before its iteration limit.
#[derive(Clone, Copy, Debug)]
pub struct EarlyStop {
    /// Checksum the hard decision must satisfy
    pub crc: Crc,
    /// Number of leading filler bits excluded from the check
    pub filler_len: usize,
}

/// Iterative decoder for the rate-1/3 turbo code.
///
/// One turbo iteration runs a MAP pass over each constituent code and exchanges
/// extrinsic information between them through the QPP interleaver. The decoder holds
/// independent state for as many codeblocks as its engine decodes in lockstep (one for
/// the scalar and state-lane engines, eight or sixteen for the inter-frame engines), so
/// [`iterate_batch`](Self::iterate_batch) can advance several same-length codeblocks per
/// call.
///
/// A decoder is configured for one codeblock length at a time with
/// [`reset`](Self::reset) and reuses its buffers across codeblocks.
#[derive(Debug)]
pub struct TurboDecoder {
    tables: Arc<TurboTables>,
    engine: Box<dyn MapEngine>,
    variant: MapVariant,
    max_block_len: usize,
    num_lanes: usize,
    block_len: Option<usize>,
    syst: Vec<Vec<Llr>>,
    parity0: Vec<Vec<Llr>>,
    parity1: Vec<Vec<Llr>>,
    app1: Vec<Vec<Llr>>,
    app2: Vec<Vec<Llr>>,
    ext1: Vec<Vec<Llr>>,
    ext2: Vec<Vec<Llr>>,
    num_iterations: Vec<u32>,
    avg_iterations: f64,
}

impl TurboDecoder {
    /// Returns a decoder running the default engine, sized for the largest codeblock.
    #[must_use]
    pub fn new(tables: Arc<TurboTables>) -> Self {
        Self::build(tables, MapVariant::default(), MAX_BLOCK_LEN)
    }

    /// Returns a builder over the given shared tables. Options left unset keep their
    /// defaults: the state-lane engine, sized for the largest codeblock.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::tables::TurboTables;
    /// use lte_turbo::{MapVariant, TurboDecoder};
    /// use std::sync::Arc;
    ///
    /// let tables = Arc::new(TurboTables::new()?);
    /// let decoder = TurboDecoder::builder(tables)
    ///     .variant(MapVariant::InterFrame8)
    ///     .max_block_len(2048)
    ///     .build()?;
    /// assert_eq!(decoder.num_lanes(), 8);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn builder(tables: Arc<TurboTables>) -> TurboDecoderBuilder {
        TurboDecoderBuilder {
            tables,
            variant: MapVariant::default(),
            max_block_len: MAX_BLOCK_LEN,
        }
    }

    /// Returns a decoder running a chosen MAP engine, sized for codeblocks up to
    /// `max_block_len` bits.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_block_len` is not a legal codeblock length.
    pub fn with_variant(
        tables: Arc<TurboTables>,
        variant: MapVariant,
        max_block_len: usize,
    ) -> Result<Self, Error> {
        tables::cb_index(max_block_len)?;
        Ok(Self::build(tables, variant, max_block_len))
    }

    fn build(tables: Arc<TurboTables>, variant: MapVariant, max_block_len: usize) -> Self {
        let engine = build_engine(variant, max_block_len);
        let num_lanes = engine.lanes();
        Self {
            tables,
            engine,
            variant,
            max_block_len,
            num_lanes,
            block_len: None,
            syst: vec![Vec::new(); num_lanes],
            parity0: vec![Vec::new(); num_lanes],
            parity1: vec![Vec::new(); num_lanes],
            app1: vec![Vec::new(); num_lanes],
            app2: vec![Vec::new(); num_lanes],
            ext1: vec![Vec::new(); num_lanes],
            ext2: vec![Vec::new(); num_lanes],
            num_iterations: vec![0; num_lanes],
            avg_iterations: 0.0,
        }
    }

    /// Returns the engine variant this decoder runs.
    #[must_use]
    pub fn variant(&self) -> MapVariant {
        self.variant
    }

    /// Returns the number of codeblocks the engine decodes in lockstep.
    #[must_use]
    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// Returns the number of iterations run on a lane since the last reset.
    #[must_use]
    pub fn iterations(&self, lane: usize) -> u32 {
        self.num_iterations.get(lane).copied().unwrap_or(0)
    }

    /// Returns an exponential moving average of the iterations per [`run_all`] call,
    /// a convergence diagnostic across codeblocks.
    ///
    /// [`run_all`]: Self::run_all
    #[must_use]
    pub fn average_iterations(&self) -> f64 {
        self.avg_iterations
    }

    /// Configures the decoder for codeblocks of `block_len` bits and discards all
    /// iteration state on every lane.
    ///
    /// # Errors
    ///
    /// Returns an error if `block_len` is not a legal codeblock length or exceeds the
    /// sizing given at construction.
    pub fn reset(&mut self, block_len: usize) -> Result<(), Error> {
        tables::cb_index(block_len)?;
        if block_len > self.max_block_len {
            return Err(Error::InsufficientBuffer(format!(
                "Decoder sized for codeblocks up to {} bits cannot take {block_len}",
                self.max_block_len
            )));
        }
        let extended_len = block_len + MEMORY_LEN;
        for buffer in [
            &mut self.syst,
            &mut self.parity0,
            &mut self.parity1,
            &mut self.app2,
        ] {
            for lane in buffer.iter_mut() {
                lane.clear();
                lane.resize(extended_len, 0);
            }
        }
        for buffer in [&mut self.app1, &mut self.ext1, &mut self.ext2] {
            for lane in buffer.iter_mut() {
                lane.clear();
                lane.resize(block_len, 0);
            }
        }
        self.num_iterations.fill(0);
        self.block_len = Some(block_len);
        Ok(())
    }

    /// Runs one turbo iteration on lane 0.
    ///
    /// `input` holds the `3 * (block_len + 4)` combined channel values in triplet
    /// layout. It is read on a lane's first iteration after a reset and ignored on
    /// later ones, when the exchanged terms carry the state instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder has not been reset or the input length does not
    /// match the configured codeblock length.
    pub fn iterate(&mut self, input: &[Llr]) -> Result<(), Error> {
        self.iterate_batch(&[input])
    }

    /// Runs one turbo iteration on up to [`num_lanes`](Self::num_lanes) codeblocks in
    /// lockstep, one lane per input.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder has not been reset, the number of inputs is zero
    /// or exceeds the lane count, or any input length does not match the configured
    /// codeblock length.
    pub fn iterate_batch(&mut self, inputs: &[&[Llr]]) -> Result<(), Error> {
        let block_len = self.configured()?;
        if inputs.is_empty() || inputs.len() > self.num_lanes {
            return Err(Error::InvalidInput(format!(
                "Expected between 1 and {} decoder inputs, found {}",
                self.num_lanes,
                inputs.len()
            )));
        }
        for input in inputs {
            if input.len() != coded_block_len(block_len) {
                return Err(Error::InvalidInput(format!(
                    "Invalid decoder input length (expected {}, found {})",
                    coded_block_len(block_len),
                    input.len()
                )));
            }
        }
        for (lane, input) in inputs.iter().enumerate() {
            if self.num_iterations[lane] == 0 {
                self.extract_input(lane, input, block_len);
            }
        }
        let num_jobs = inputs.len();
        let Self {
            tables,
            engine,
            syst,
            parity0,
            parity1,
            app1,
            app2,
            ext1,
            ext2,
            num_iterations,
            ..
        } = self;
        let interleaver = &tables.by_len(block_len)?.interleaver;

        // The stored posterior from the previous second MAP pass still carries the first
        // pass's contribution; removing it leaves this round's a-priori term
        for lane in 0 .. num_jobs {
            if num_iterations[lane] > 0 {
                for k in 0 .. block_len {
                    app1[lane][k] = app1[lane][k].saturating_sub(ext1[lane][k]);
                }
            }
        }

        // MAP pass over the first constituent code
        let jobs: Vec<MapInput<'_>> = (0 .. num_jobs)
            .map(|lane| MapInput {
                systematic: &syst[lane],
                parity: &parity0[lane],
                apriori: (num_iterations[lane] > 0).then_some(app1[lane].as_slice()),
            })
            .collect();
        let mut outputs: Vec<&mut [Llr]> = ext1
            .iter_mut()
            .take(num_jobs)
            .map(Vec::as_mut_slice)
            .collect();
        engine.run(&jobs, &mut outputs, block_len);

        // Removing the a-priori term from the posterior leaves the channel systematic
        // plus the extrinsic term, which interleaves into the second pass's systematic
        // input
        for lane in 0 .. num_jobs {
            if num_iterations[lane] > 0 {
                for k in 0 .. block_len {
                    ext1[lane][k] = ext1[lane][k].saturating_sub(app1[lane][k]);
                }
            }
            interleaver.interleave_into(&ext1[lane], &mut app2[lane])?;
        }

        // MAP pass over the second constituent code; its systematic input already folds
        // in everything known, so it takes no separate a-priori term
        let jobs: Vec<MapInput<'_>> = (0 .. num_jobs)
            .map(|lane| MapInput {
                systematic: &app2[lane],
                parity: &parity1[lane],
                apriori: None,
            })
            .collect();
        let mut outputs: Vec<&mut [Llr]> = ext2
            .iter_mut()
            .take(num_jobs)
            .map(Vec::as_mut_slice)
            .collect();
        engine.run(&jobs, &mut outputs, block_len);

        // The deinterleaved posterior of the second pass is both the decision statistic
        // and the seed of the next round's a-priori term
        for lane in 0 .. num_jobs {
            interleaver.deinterleave_into(&ext2[lane], &mut app1[lane])?;
            num_iterations[lane] += 1;
        }
        Ok(())
    }

    /// Writes the hard decision of a lane into `bits` (any pre-existing contents will be
    /// cleared). A positive posterior decides [`Bit::One`].
    ///
    /// # Errors
    ///
    /// Returns an error if the lane index is out of range or no iteration has run on the
    /// lane since the last reset.
    pub fn decision(&self, lane: usize, bits: &mut Vec<Bit>) -> Result<(), Error> {
        let block_len = self.decided_lane(lane)?;
        bits.clear();
        bits.reserve(block_len);
        for &posterior in &self.app1[lane][.. block_len] {
            bits.push(if posterior > 0 { Bit::One } else { Bit::Zero });
        }
        Ok(())
    }

    /// Writes the hard decision of a lane into `bytes`, eight bits per byte with the
    /// first bit in the most significant position (every legal codeblock length is a
    /// multiple of eight).
    ///
    /// # Errors
    ///
    /// Returns an error if the lane index is out of range or no iteration has run on the
    /// lane since the last reset.
    pub fn decision_byte(&self, lane: usize, bytes: &mut Vec<u8>) -> Result<(), Error> {
        let block_len = self.decided_lane(lane)?;
        bytes.clear();
        bytes.reserve(block_len / 8);
        for byte_start in (0 .. block_len).step_by(8) {
            let mut byte = 0u8;
            for &posterior in &self.app1[lane][byte_start .. byte_start + 8] {
                byte <<= 1;
                if posterior > 0 {
                    byte |= 1;
                }
            }
            bytes.push(byte);
        }
        Ok(())
    }

    /// Decodes one codeblock on lane 0, iterating until the stop gate passes or the
    /// iteration limit is reached, and leaves the hard decision in `bits`.
    ///
    /// Iteration state left on lane 0 is discarded first; other lanes keep theirs.
    /// Returns the number of iterations run, and folds it into
    /// [`average_iterations`](Self::average_iterations).
    ///
    /// # Parameters
    ///
    /// - `input`: Combined channel values, `3 * (block_len + 4)` in triplet layout.
    ///
    /// - `bits`: Buffer for the hard decision (any pre-existing contents will be
    ///   cleared).
    ///
    /// - `max_iterations`: Iteration limit, at least 1.
    ///
    /// - `early_stop`: Optional CRC gate checked against the decision after every
    ///   iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder has not been reset, the input length is wrong,
    /// `max_iterations` is zero, or the gate's filler length exceeds the codeblock. A
    /// decision that never satisfies the gate is not an error; callers detect it by
    /// checking the returned bits themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::tables::TurboTables;
    /// use lte_turbo::{encoder, utils, TurboDecoder};
    /// use std::sync::Arc;
    ///
    /// let tables = Arc::new(TurboTables::new()?);
    /// let info_bits = utils::random_bits(40);
    /// let code_bits = encoder::encode(&info_bits, &tables.by_len(40)?.interleaver)?;
    /// let mut decoder = TurboDecoder::new(Arc::clone(&tables));
    /// decoder.reset(40)?;
    /// let mut decoded = Vec::new();
    /// decoder.run_all(&utils::ideal_llrs(&code_bits), &mut decoded, 8, None)?;
    /// assert_eq!(decoded, info_bits);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn run_all(
        &mut self,
        input: &[Llr],
        bits: &mut Vec<Bit>,
        max_iterations: u32,
        early_stop: Option<EarlyStop>,
    ) -> Result<u32, Error> {
        let block_len = self.configured()?;
        if max_iterations == 0 {
            return Err(Error::InvalidInput(
                "At least one decoder iteration is required".to_string(),
            ));
        }
        if let Some(stop) = early_stop {
            if stop.filler_len > block_len {
                return Err(Error::InvalidInput(format!(
                    "Filler length {} exceeds the codeblock length {block_len}",
                    stop.filler_len
                )));
            }
        }
        self.num_iterations[0] = 0;
        loop {
            self.iterate(input)?;
            self.decision(0, bits)?;
            let iterations = self.num_iterations[0];
            let passed =
                early_stop.is_some_and(|stop| stop.crc.check(&bits[stop.filler_len ..]));
            if passed || iterations >= max_iterations {
                self.avg_iterations = 0.2 * f64::from(iterations) + 0.8 * self.avg_iterations;
                return Ok(iterations);
            }
        }
    }

    /// Splits one combined-channel input in triplet layout into per-constituent streams
    /// on a lane, and clears the lane's exchanged terms.
    fn extract_input(&mut self, lane: usize, input: &[Llr], block_len: usize) {
        for k in 0 .. block_len {
            self.syst[lane][k] = input[3 * k];
            self.parity0[lane][k] = input[3 * k + 1];
            self.parity1[lane][k] = input[3 * k + 2];
        }
        // Termination observations arrive as the first constituent's systematic/parity
        // pairs followed by the second's; the second's systematic values go straight
        // into the tail of the second MAP pass's input
        for index in 0 .. MEMORY_LEN {
            self.syst[lane][block_len + index] = input[3 * block_len + 2 * index];
            self.parity0[lane][block_len + index] = input[3 * block_len + 2 * index + 1];
            self.app2[lane][block_len + index] =
                input[3 * block_len + 2 * (MEMORY_LEN + index)];
            self.parity1[lane][block_len + index] =
                input[3 * block_len + 2 * (MEMORY_LEN + index) + 1];
        }
        for k in 0 .. block_len {
            self.app1[lane][k] = 0;
            self.ext1[lane][k] = 0;
            self.ext2[lane][k] = 0;
        }
    }

    /// Checks a lane index and returns the block length once a decision exists for it.
    fn decided_lane(&self, lane: usize) -> Result<usize, Error> {
        let block_len = self.configured()?;
        if lane >= self.num_lanes {
            return Err(Error::InvalidInput(format!(
                "Lane {lane} is not less than the lane count {}",
                self.num_lanes
            )));
        }
        if self.num_iterations[lane] == 0 {
            return Err(Error::InvalidInput(format!(
                "No iteration has run on lane {lane} since the last reset"
            )));
        }
        Ok(block_len)
    }

    fn configured(&self) -> Result<usize, Error> {
        self.block_len.ok_or_else(|| {
            Error::InvalidInput("Decoder has not been reset for a codeblock length".to_string())
        })
    }
}

/// Deferred [`TurboDecoder`] configuration, returned by [`TurboDecoder::builder`].
#[derive(Debug)]
pub struct TurboDecoderBuilder {
    tables: Arc<TurboTables>,
    variant: MapVariant,
    max_block_len: usize,
}

impl TurboDecoderBuilder {
    /// Selects the MAP engine the decoder will run.
    #[must_use]
    pub fn variant(mut self, variant: MapVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sizes the decoder for codeblocks up to `max_block_len` bits.
    #[must_use]
    pub fn max_block_len(mut self, max_block_len: usize) -> Self {
        self.max_block_len = max_block_len;
        self
    }

    /// Builds the decoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured maximum is not a legal codeblock length.
    pub fn build(self) -> Result<TurboDecoder, Error> {
        TurboDecoder::with_variant(self.tables, self.variant, self.max_block_len)
    }
}

#[cfg(test)]
mod tests_of_turbo_decoder {
    use super::*;
    use crate::{encoder, utils};
    use float_eq::assert_float_eq;

    fn encoded_llrs(info_bits: &[Bit], tables: &TurboTables) -> Vec<Llr> {
        let table = tables.by_len(info_bits.len()).unwrap();
        let code_bits = encoder::encode(info_bits, &table.interleaver).unwrap();
        utils::ideal_llrs(&code_bits)
    }

    #[test]
    fn test_run_all_round_trip_for_every_variant() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let info_bits = utils::random_bits(40);
        let llrs = encoded_llrs(&info_bits, &tables);
        for variant in [
            MapVariant::Scalar,
            MapVariant::StateLanes,
            MapVariant::InterFrame8,
            MapVariant::InterFrame16,
        ] {
            let mut decoder =
                TurboDecoder::with_variant(Arc::clone(&tables), variant, 6144).unwrap();
            assert_eq!(decoder.variant(), variant);
            decoder.reset(40).unwrap();
            let mut decoded = Vec::new();
            let iterations = decoder.run_all(&llrs, &mut decoded, 8, None).unwrap();
            assert_eq!(iterations, 8);
            assert_eq!(decoded, info_bits, "{variant:?}");
        }
    }

    #[test]
    fn test_run_all_recovers_every_table_length() {
        // Clean channel values decode exactly within two iterations at every legal
        // codeblock length
        let tables = Arc::new(TurboTables::new().unwrap());
        let mut decoder = TurboDecoder::new(Arc::clone(&tables));
        let mut decoded = Vec::new();
        for index in 0 .. tables::NUM_CB_SIZES {
            let block_len = tables::cb_size(index).unwrap();
            let info_bits = utils::random_bits(block_len);
            let llrs = encoded_llrs(&info_bits, &tables);
            decoder.reset(block_len).unwrap();
            decoder.run_all(&llrs, &mut decoded, 2, None).unwrap();
            assert_eq!(decoded, info_bits, "block_len {block_len}");
        }
    }

    #[test]
    fn test_run_all_stops_early_on_crc_pass() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let crc = Crc::crc24a();
        let mut info_bits = utils::random_bits(16);
        crc.attach(&mut info_bits);
        assert_eq!(info_bits.len(), 40);
        let llrs = encoded_llrs(&info_bits, &tables);
        let mut decoder = TurboDecoder::new(Arc::clone(&tables));
        decoder.reset(40).unwrap();
        let mut decoded = Vec::new();
        let iterations = decoder
            .run_all(&llrs, &mut decoded, 8, Some(EarlyStop { crc, filler_len: 0 }))
            .unwrap();
        assert_eq!(iterations, 1);
        assert_eq!(decoded, info_bits);
        assert_float_eq!(decoder.average_iterations(), 0.2, abs <= 1e-12);
    }

    #[test]
    fn test_corrects_corrupted_systematic_values() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let info_bits = utils::random_bits(64);
        let mut llrs = encoded_llrs(&info_bits, &tables);
        // Flip the systematic observation of four information bits
        for &k in &[3, 17, 36, 60] {
            llrs[3 * k] = -llrs[3 * k];
        }
        let mut decoder = TurboDecoder::new(Arc::clone(&tables));
        decoder.reset(64).unwrap();
        let mut decoded = Vec::new();
        decoder.run_all(&llrs, &mut decoded, 8, None).unwrap();
        assert_eq!(decoded, info_bits);
    }

    #[test]
    fn test_decision_byte_packs_msb_first() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let payload: [u8; 5] = [0xA5, 0x0F, 0x00, 0xFF, 0x3C];
        let info_bits: Vec<Bit> = payload
            .iter()
            .flat_map(|&byte| {
                (0 .. 8).rev().map(move |shift| {
                    if byte >> shift & 1 == 1 {
                        Bit::One
                    } else {
                        Bit::Zero
                    }
                })
            })
            .collect();
        let llrs = encoded_llrs(&info_bits, &tables);
        let mut decoder = TurboDecoder::new(tables);
        decoder.reset(40).unwrap();
        let mut decoded = Vec::new();
        decoder.run_all(&llrs, &mut decoded, 4, None).unwrap();
        let mut bytes = Vec::new();
        decoder.decision_byte(0, &mut bytes).unwrap();
        assert_eq!(bytes, payload);
    }

    #[test]
    fn test_iterate_batch_decodes_lanes_in_lockstep() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let blocks: Vec<Vec<Bit>> = (0 .. 5).map(|_| utils::random_bits(48)).collect();
        let all_llrs: Vec<Vec<Llr>> =
            blocks.iter().map(|block| encoded_llrs(block, &tables)).collect();
        let mut decoder =
            TurboDecoder::with_variant(Arc::clone(&tables), MapVariant::InterFrame8, 6144)
                .unwrap();
        assert_eq!(decoder.num_lanes(), 8);
        decoder.reset(48).unwrap();
        let inputs: Vec<&[Llr]> = all_llrs.iter().map(Vec::as_slice).collect();
        for _ in 0 .. 2 {
            decoder.iterate_batch(&inputs).unwrap();
        }
        let mut decoded = Vec::new();
        for (lane, block) in blocks.iter().enumerate() {
            assert_eq!(decoder.iterations(lane), 2);
            decoder.decision(lane, &mut decoded).unwrap();
            assert_eq!(&decoded, block, "lane {lane}");
        }
    }

    #[test]
    fn test_run_all_leaves_other_lanes_intact() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let blocks: Vec<Vec<Bit>> = (0 .. 3).map(|_| utils::random_bits(40)).collect();
        let all_llrs: Vec<Vec<Llr>> =
            blocks.iter().map(|block| encoded_llrs(block, &tables)).collect();
        let mut decoder =
            TurboDecoder::with_variant(Arc::clone(&tables), MapVariant::InterFrame8, 6144)
                .unwrap();
        decoder.reset(40).unwrap();
        let inputs: Vec<&[Llr]> = all_llrs.iter().map(Vec::as_slice).collect();
        decoder.iterate_batch(&inputs).unwrap();

        // A fresh codeblock through run_all restarts lane 0 only
        let fresh_bits = utils::random_bits(40);
        let fresh_llrs = encoded_llrs(&fresh_bits, &tables);
        let mut decoded = Vec::new();
        let iterations = decoder.run_all(&fresh_llrs, &mut decoded, 2, None).unwrap();
        assert_eq!(iterations, 2);
        assert_eq!(decoded, fresh_bits);
        for lane in 1 .. 3 {
            assert_eq!(decoder.iterations(lane), 1);
            decoder.decision(lane, &mut decoded).unwrap();
            assert_eq!(&decoded, &blocks[lane], "lane {lane}");
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let mut decoder = TurboDecoder::new(Arc::clone(&tables));
        let mut decoded = Vec::new();
        // Not reset yet
        assert!(decoder.iterate(&[0; 132]).is_err());
        assert!(decoder.run_all(&[0; 132], &mut decoded, 8, None).is_err());
        // Length not in the size table
        assert!(decoder.reset(41).is_err());
        // Larger than the sizing given at construction
        let mut small =
            TurboDecoder::with_variant(Arc::clone(&tables), MapVariant::Scalar, 40).unwrap();
        assert!(small.reset(48).is_err());
        // Sizing must itself be a legal length
        assert!(TurboDecoder::with_variant(tables, MapVariant::Scalar, 100).is_err());
        decoder.reset(40).unwrap();
        // Wrong input length
        assert!(decoder.iterate(&[0; 131]).is_err());
        // Decision before any iteration
        assert!(decoder.decision(0, &mut decoded).is_err());
        decoder.iterate(&[0; 132]).unwrap();
        // Lane beyond the engine's lane count
        assert!(decoder.decision(1, &mut decoded).is_err());
        // Iteration limit of zero
        assert!(decoder.run_all(&[0; 132], &mut decoded, 0, None).is_err());
        // Too many batch inputs for a single-lane engine
        let input: [Llr; 132] = [0; 132];
        assert!(decoder.iterate_batch(&[&input, &input]).is_err());
    }

    #[test]
    fn test_builder() {
        let tables = Arc::new(TurboTables::new().unwrap());
        let decoder = TurboDecoder::builder(Arc::clone(&tables))
            .variant(MapVariant::InterFrame16)
            .max_block_len(512)
            .build()
            .unwrap();
        assert_eq!(decoder.variant(), MapVariant::InterFrame16);
        assert_eq!(decoder.num_lanes(), 16);
        // Defaults
        let decoder = TurboDecoder::builder(Arc::clone(&tables)).build().unwrap();
        assert_eq!(decoder.variant(), MapVariant::StateLanes);
        // Sizing must itself be a legal length
        assert!(TurboDecoder::builder(tables).max_block_len(100).build().is_err());
    }
}
