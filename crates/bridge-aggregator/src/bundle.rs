//! The output of a sealed signature set (spec §4.4: "the set is sealed and
//! handed to C5 as an authorized bundle").

use bridge_core::{Transfer, ValidatorSignature};

#[derive(Debug, Clone)]
pub struct AuthorizedBundle {
    pub transfer: Transfer,
    pub signatures: Vec<ValidatorSignature>,
}
