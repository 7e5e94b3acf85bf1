use agentlink_common::PLAINTEXT_MARKER;
use agentlink_common::error::ProtocolError;
use tracing::trace;

pub const VERSION_TAG_LEN: usize = 2;

/// Protocol version agents currently put in front of encrypted output.
pub const CURRENT_VERSION: u8 = 0;

/// An encrypted agent package: a two-digit protocol tag plus ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub version: u8,
    pub ciphertext: &'a [u8],
}

pub fn is_plaintext(payload: &[u8]) -> bool {
    payload.starts_with(PLAINTEXT_MARKER)
}

/// Splits a non-plaintext payload into its version tag and ciphertext.
///
/// # Errors
///
/// [`ProtocolError::UnsupportedVersion`] with the offending tag bytes when the
/// first two bytes are not ASCII digits.
pub fn open(payload: &[u8]) -> Result<Envelope<'_>, ProtocolError> {
    let (tag, ciphertext) = payload.split_at(VERSION_TAG_LEN.min(payload.len()));

    let version: u8 = match tag {
        [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => (tens - b'0') * 10 + (ones - b'0'),
        _ => return Err(ProtocolError::UnsupportedVersion(tag.to_vec())),
    };

    trace!(version, bytes = ciphertext.len(), "Opened agent envelope");
    Ok(Envelope {
        version,
        ciphertext,
    })
}

/// Builds the on-wire form of an encrypted package.
pub fn seal(version: u8, ciphertext: &[u8]) -> Vec<u8> {
    let mut wire: Vec<u8> = format!("{:02}", version % 100).into_bytes();
    wire.extend_from_slice(ciphertext);
    wire
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
