//! aribts: MPEG-2 TS demultiplexer and PSI/SI decoder for Japanese digital
//! broadcast (ARIB) recordings.
//!
//! The pipeline runs leaf to root: framing probe, packet parse, continuity
//! gate, per-PID section reassembly with CRC validation, then table and
//! descriptor decoding including ARIB STD-B24 text.

pub mod analyzer {
    pub use crate::core::{run, run_buffer, Analysis, Options, ReportJson, TsDemuxer};

    /// Convenience entry point for one stored file.
    pub fn analyze_file<P: Into<std::path::PathBuf>>(path: P) -> anyhow::Result<Analysis> {
        crate::core::run(&Options { path: path.into() })
    }
}

pub mod assembler;
pub mod catalog;
pub mod constants;
pub mod continuity;
mod core;
pub mod desc;
pub mod framer;
pub mod packet;
pub mod pes;
pub mod psi;
pub mod stats;
pub mod text;
pub mod utils;
