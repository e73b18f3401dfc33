mod admin;
mod play;

pub fn commands() -> Vec<poise::Command<crate::handler::Data, Error>> {
    vec![
        play::play(),
        play::leave(),
        admin::register(),
    ]
}

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
pub type Context<'a> = poise::Context<'a, crate::handler::Data, Error>;

/// Locale used for replies: the invoker's client locale, or the configured fallback.
fn reply_locale(ctx: Context<'_>) -> &str {
    ctx.locale().unwrap_or_else(|| ctx.data().locales.fallback())
}
