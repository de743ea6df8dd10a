use crate::identity::offline_uuid;
use crate::request::AccountProfile;

/// Identity handed to the game for one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub display_name: String,
    pub identifier: String,
    pub auth_token: String,
}

impl Session {
    pub fn offline(username: &str) -> Self {
        Self {
            display_name: username.to_string(),
            identifier: offline_uuid(username),
            auth_token: String::new(),
        }
    }

    pub fn from_account(account: &AccountProfile) -> Self {
        Self {
            display_name: account.name.clone(),
            identifier: account.id.clone(),
            auth_token: account.access_token.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub username: String,
    pub uuid: String,
    pub token: String,
    pub jvm_arguments: Vec<String>,
}

impl LaunchOptions {
    pub fn new(session: &Session, memory_gb: u32) -> Self {
        Self {
            username: session.display_name.clone(),
            uuid: session.identifier.clone(),
            token: session.auth_token.clone(),
            jvm_arguments: heap_arguments(memory_gb).to_vec(),
        }
    }
}

/// `-Xmx` is the requested size, `-Xms` half of it (at least 1G).
pub fn heap_arguments(memory_gb: u32) -> [String; 2] {
    let max = memory_gb.max(1);
    let min = (max / 2).max(1);
    [format!("-Xmx{max}G"), format!("-Xms{min}G")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_minimum_is_half_rounded_down() {
        assert_eq!(heap_arguments(4), ["-Xmx4G".to_string(), "-Xms2G".to_string()]);
        assert_eq!(heap_arguments(5), ["-Xmx5G".to_string(), "-Xms2G".to_string()]);
        assert_eq!(heap_arguments(16), ["-Xmx16G".to_string(), "-Xms8G".to_string()]);
    }

    #[test]
    fn heap_minimum_never_drops_below_one() {
        assert_eq!(heap_arguments(1), ["-Xmx1G".to_string(), "-Xms1G".to_string()]);
        assert_eq!(heap_arguments(0), ["-Xmx1G".to_string(), "-Xms1G".to_string()]);
    }

    #[test]
    fn offline_session_has_empty_token() {
        let session = Session::offline("Steve");
        assert_eq!(session.display_name, "Steve");
        assert_eq!(session.identifier, "5627dd98-e6be-3c21-b8a8-e92344183641");
        assert!(session.auth_token.is_empty());
    }

    #[test]
    fn account_session_passes_profile_through() {
        let session = Session::from_account(&AccountProfile {
            name: "Player".to_string(),
            id: "0f0e0d0c-0b0a-4908-8706-050403020100".to_string(),
            access_token: "token".to_string(),
        });
        let options = LaunchOptions::new(&session, 8);
        assert_eq!(options.username, "Player");
        assert_eq!(options.uuid, "0f0e0d0c-0b0a-4908-8706-050403020100");
        assert_eq!(options.token, "token");
        assert_eq!(options.jvm_arguments, vec!["-Xmx8G", "-Xms4G"]);
    }
}
