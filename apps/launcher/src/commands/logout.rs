use anyhow::{Context, Result};

use crate::auth;
use crate::paths;

pub fn run() -> Result<()> {
    let store = paths::auth_store_path().map_err(anyhow::Error::msg)?;
    let removed = auth::clear_session(&store).context("Failed to sign out")?;
    if removed {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}
