//! Protocol decoding modules.
//!
//! Each protocol keeps its wire layout, decoding state and presentation in
//! separate submodules. Decoders are pure and contain no I/O; sources and the
//! analysis layer handle file access and aggregation.

pub mod rdm;
