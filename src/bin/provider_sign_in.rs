use estatecal::components::meetings::token::{OAuthSettings, TokenManager};
use estatecal::components::meetings::Provider;
use estatecal::config::Config;
use estatecal::error::{config_error, validation_error, CalendarResult};
use std::env;

/// Sign in to a meeting provider in the browser and print the refresh token
/// to put in the environment.
#[tokio::main]
async fn main() -> CalendarResult<()> {
    let provider: Provider = env::args()
        .nth(1)
        .ok_or_else(|| validation_error("Usage: provider_sign_in <google|teams>"))?
        .parse()
        .map_err(|e: String| validation_error(&e))?;

    // Load configuration
    let config = Config::load()?;

    let (credentials, settings) = match provider {
        Provider::Google => {
            let credentials = config
                .google
                .as_ref()
                .ok_or_else(|| config_error("GOOGLE_CLIENT_ID is not set"))?;
            (credentials, OAuthSettings::google(credentials, config.oauth_redirect_port))
        }
        Provider::Teams => {
            let credentials = config
                .teams
                .as_ref()
                .ok_or_else(|| config_error("TEAMS_CLIENT_ID is not set"))?;
            (credentials, OAuthSettings::teams(credentials, config.oauth_redirect_port))
        }
    };

    if credentials.refresh_token.is_some() {
        println!("A refresh token is already configured, requesting a new one anyway");
    }

    // No stored refresh token forces the interactive flow
    let token_manager = TokenManager::new(settings, None);

    println!("Opening browser for {} authorization...", provider);
    println!("Waiting for callback on {}", token_manager.settings().redirect_uri());
    token_manager.sign_in().await?;

    match token_manager.refresh_token() {
        Some(refresh_token) => {
            let var = match provider {
                Provider::Google => "GOOGLE_REFRESH_TOKEN",
                Provider::Teams => "TEAMS_REFRESH_TOKEN",
            };
            println!("Signed in. Add this to your environment:");
            println!("{}={}", var, refresh_token);
        }
        None => println!("Signed in, but {} did not return a refresh token", provider),
    }

    Ok(())
}
