pub mod signature;

pub use signature::{SIGNATURE_HEADER, sign, verify};
