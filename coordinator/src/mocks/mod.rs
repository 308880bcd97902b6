//! Mock implementations of the external collaborators, for tests and demos.

mod ciphertext;
pub use ciphertext::{Key, Masked, MODULUS};
mod oracle;
pub use oracle::{Decryptor, Fulfillment, Oracle, Submission, NAMESPACE};
mod reporter;
pub use reporter::Reporter;
