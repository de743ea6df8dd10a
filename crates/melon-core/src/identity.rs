use md5::{Digest, Md5};

const OFFLINE_PREFIX: &str = "OfflinePlayer:";

/// UUID the game itself assigns to an offline player name.
///
/// MD5 of `OfflinePlayer:<name>`, stamped as a version 3 / variant 1 UUID.
pub fn offline_uuid(username: &str) -> String {
    let digest = Md5::digest(format!("{OFFLINE_PREFIX}{username}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    format_uuid(&bytes)
}

pub(crate) fn format_uuid(bytes: &[u8; 16]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
