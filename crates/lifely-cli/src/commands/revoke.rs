//! Sign-out command.

use crate::commands::open_session;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Revokes the stored token with Google and deletes it locally.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let session = open_session(config)?;
    if session.sign_out().await? {
        println!("Access revoked and local tokens deleted.");
    } else {
        println!("Not signed in; nothing to revoke.");
    }
    Ok(())
}
