//! Small shared helpers

pub mod helper;
pub mod hex;

pub use helper::{format_address, micro_to_units, truncate_string, units_to_micro};
pub use hex::{decode_hex, encode_hex};
