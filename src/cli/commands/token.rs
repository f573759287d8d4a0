use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;

pub fn handle(user: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(user);
    let token = generate_jwt(&claims, config().security.auth_secret.as_deref())?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "user": user, "expires_at": claims.exp })),
        ),
    }
}
