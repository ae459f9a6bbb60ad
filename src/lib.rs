//! This crate implements the channel-decoding core of a DAB/DAB+ receiver. Soft decisions of the
//! fast information channel (FIC) are de-punctured, Viterbi decoded and freed from energy dispersal
//! by the [`fic::FicHandler`]; fast information blocks (FIBs) passing their CRC are parsed by the
//! [`fib::FibDecoder`], which maintains the ensemble, its services and the double-buffered
//! multiplex configuration. Sub-channels of the main service channel are decoded by the
//! [`msc::SubChannelDecoder`], and DAB+ superframes are synchronised and corrected with the
//! shortened Reed-Solomon code by the [`superframe::SuperframeDecoder`].
//!
//! The convolutional decoder comes in interchangeable add-compare-select strategies (see
//! [`viterbi::Backend`]), all producing identical output.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use dabcore::config::DecoderConfig;
//! use dabcore::events;
//! use dabcore::fib::FibDecoder;
//! use dabcore::fic::FicHandler;
//!
//! let (sender, receiver) = events::channel();
//! let fib_decoder = Arc::new(FibDecoder::new(Some(sender.clone())));
//! let mut fic = FicHandler::new(&DecoderConfig::default(), Arc::clone(&fib_decoder), Some(sender))?;
//! let symbol = vec![0i16; fic.mode().bits_per_symbol()];
//! fic.process_block(&symbol, 1)?;
//! assert!(!fib_decoder.sync_reached());
//! drop(receiver);
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
pub mod config;
pub mod crc;
pub mod events;
pub mod fib;
pub mod fic;
mod galois;
pub mod msc;
pub mod prbs;
pub mod protection;
pub mod reed_solomon;
pub mod sim;
pub mod superframe;
#[cfg(test)]
mod test_vectors;
pub mod utils;
pub mod viterbi;

pub use common::{Error, TableKind};
pub use galois::Galois;
pub use reed_solomon::ReedSolomon;
