//! This crate implements the LTE turbo channel-coding chain (3GPP TS 36.212): transport-block
//! CRC attachment and codeblock segmentation, the rate-1/3 parallel-concatenated convolutional
//! (turbo) encoder with its quadratic permutation polynomial (QPP) internal interleaver,
//! sub-block interleaving and circular-buffer rate matching with redundancy-version offsets,
//! HARQ soft combining in transmit/receive soft buffers, and an iterative MAX-LOG-MAP decoder
//! with CRC-gated early stopping. All per-length permutation and rate-matching tables are built
//! once into a shared arena and looked up thereafter.
//!
//! The decoder works on 16-bit fixed-point log-likelihood ratios and comes in three forms
//! behind one interface: a scalar reference, a lane-parallel form over the eight trellis
//! states, and an inter-frame form that stacks 8 or 16 same-length codeblocks.
//!
//! # Examples
//!
//! Encoding and decoding one transport block over an ideal channel:
//!
//! ```
//! use lte_turbo::tables::TurboTables;
//! use lte_turbo::transport::{Grant, TbCodec};
//! use lte_turbo::{utils, SoftBufferRx, SoftBufferTx};
//! use std::sync::Arc;
//!
//! let tables = Arc::new(TurboTables::new()?);
//! let mut codec = TbCodec::new(Arc::clone(&tables), 8)?;
//! let grant = Grant {
//!     tbs: 40,
//!     modulation_order: 2,
//!     num_coded_bits: 256,
//!     redundancy_version: 0,
//! };
//! let data = utils::random_bits(40);
//! let mut tx_buffer = SoftBufferTx::new(6144);
//! tx_buffer.reset(40)?;
//! let codeword = codec.encode_tb(&grant, &data, &mut tx_buffer)?;
//! assert_eq!(codeword.len(), 256);
//!
//! let llrs = utils::ideal_llrs(&codeword);
//! let mut rx_buffer = SoftBufferRx::new(6144);
//! rx_buffer.reset(40)?;
//! let mut decoded = Vec::new();
//! let crc_ok = codec.decode_tb(&grant, &mut rx_buffer, &llrs, &mut decoded)?;
//! assert!(crc_ok);
//! assert_eq!(decoded, data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

mod common;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod interleaver;
mod map_decoder;
pub mod rate_match;
pub mod segmentation;
mod sim;
pub mod soft_buffer;
pub mod tables;
pub mod transport;
pub mod utils;

pub use common::{Bit, Error, Llr, LLR_INF};
pub use decoder::{EarlyStop, MapVariant, TurboDecoder, TurboDecoderBuilder};
pub use interleaver::Interleaver;
pub use sim::{run_bpsk_awgn_sims, SimParams, SimResults};
pub use soft_buffer::{SoftBufferRx, SoftBufferTx};

/// Smallest codeblock length in the standard size table
pub const MIN_BLOCK_LEN: usize = 40;

/// Largest codeblock length in the standard size table
pub const MAX_BLOCK_LEN: usize = 6144;

/// Number of trellis termination bits appended to each of the three output streams
pub const TAIL_LEN: usize = 4;

/// Length of the CRC appended to a transport block (CRC24A) or codeblock (CRC24B)
pub const CRC_LEN: usize = 24;

/// Largest transport block size carried by this crate, in bits
pub const MAX_TB_BITS: usize = 391_656;

/// Number of coded bits produced by the turbo encoder for a codeblock of `block_len` bits.
///
/// This is also the exact capacity of the dummy-stripped circular buffer used for rate
/// matching, `3 * (block_len + 4)`.
#[must_use]
pub const fn coded_block_len(block_len: usize) -> usize {
    3 * (block_len + TAIL_LEN)
}
