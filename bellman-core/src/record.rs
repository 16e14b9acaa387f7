//! Records of training metrics.
//!
//! ```rust
//! use bellman_core::record::{Record, RecordValue};
//!
//! let record = Record::from_slice(&[
//!     ("loss", RecordValue::Scalar(0.5)),
//!     ("n_opts", RecordValue::Scalar(1.0)),
//! ]);
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
//! ```
mod base;
pub use base::{Record, RecordValue};
