//! Decides how raw agent output is turned into plaintext under a host's
//! encryption policy.

use std::borrow::Cow;

use agentlink_common::config::{EncryptionMode, EncryptionPolicy};
use agentlink_common::error::{AgentError, ProtocolError, Result};
use agentlink_protocols::crypto::{self, CryptoError};
use agentlink_protocols::envelope::{self, Envelope};
use tracing::{debug, warn};

/// Applies `policy` to `raw`, returning the plaintext agent output.
///
/// Plaintext and unencrypted-by-policy output is passed through borrowed.
/// Under [`EncryptionMode::Allow`] a failed decryption also passes the input
/// through unchanged: the agent may simply not be configured for encryption.
pub fn negotiate<'a>(raw: &'a [u8], policy: &EncryptionPolicy) -> Result<Cow<'a, [u8]>> {
    let plaintext: bool = envelope::is_plaintext(raw);

    match (plaintext, policy.mode) {
        (true, EncryptionMode::Enforce) => Err(ProtocolError::PlaintextEnforced.into()),
        (true, _) | (false, EncryptionMode::Disabled) => Ok(Cow::Borrowed(raw)),
        (false, mode) => {
            let package: Envelope = envelope::open(raw)?;
            debug!(version = package.version, bytes = package.ciphertext.len(), "Decrypting agent output");

            match crypto::decrypt_package(package.ciphertext, policy.passphrase()) {
                Ok(decrypted) => Ok(Cow::Owned(decrypted)),
                Err(e) if mode == EncryptionMode::Enforce => Err(AgentError::Decryption(e.to_string())),
                Err(e) => {
                    log_swallowed(&e);
                    Ok(Cow::Borrowed(raw))
                }
            }
        }
    }
}

fn log_swallowed(err: &CryptoError) {
    warn!(error = %err, "Ignoring undecryptable agent output, encryption is not enforced");
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
