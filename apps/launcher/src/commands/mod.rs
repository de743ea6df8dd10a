pub mod launch;
pub mod login;
pub mod logout;
pub mod prefs;
