pub mod discord;

type Error = anyhow::Error;
type FluentBundle = fluent::bundle::FluentBundle<fluent::FluentResource, intl_memoizer::concurrent::IntlLangMemoizer>;

pub use discord::{load_discord_locales, Locales};
