//! Core processing modules
//!
//! Contains the request dispatch, transport seam, and response
//! normalization logic.

pub mod dispatcher;
pub mod normalizer;
pub mod transport;
