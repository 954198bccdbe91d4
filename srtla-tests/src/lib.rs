//! Integration test crate for the srtla receiver.
//!
//! All tests live under `tests/`; this library is intentionally empty.
