//! Password digests in the game server's format.

use sha1::{Digest, Sha1};

/// Derive the digest the game server compares logins against.
///
/// SHA-1 over the UTF-8 bytes of the password, SHA-1 again over the raw 20-byte result, rendered
/// as upper-case hex with a `*` prefix. This is MySQL's `PASSWORD()` for 4.1+ servers and must
/// stay bit-for-bit identical, or created accounts cannot log in.
pub fn game_password_digest(password: &str) -> String {
    let stage1 = Sha1::digest(password.as_bytes());
    let stage2 = Sha1::digest(stage1);
    format!("*{}", hex::encode_upper(stage2))
}
