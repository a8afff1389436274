//! Account command.

use lifely_google::GoogleCalendarClient;

use crate::commands::open_session;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Prints the signed-in account and whether Google still accepts the token.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let session = open_session(config)?;
    let token = session.access_token().await?;
    let client = GoogleCalendarClient::new(token.as_str(), session.identity().config())?;
    let user = client.fetch_user_info().await?;

    println!("{} <{}>", user.display_name(), user.email);
    if session.identity().is_token_valid(&token).await {
        println!("token: valid");
    } else {
        println!("token: rejected by Google - run 'lifely auth --force'");
    }
    Ok(())
}
