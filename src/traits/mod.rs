//! Trait definitions for extensible components
//!
//! These traits allow applications to swap the session backend or provide
//! their own.

pub mod session;
