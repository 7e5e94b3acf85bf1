//! Wire format of the agent protocol: the plaintext marker, the versioned
//! envelope around encrypted output and the cipher agents encrypt with.

pub mod crypto;
pub mod envelope;
