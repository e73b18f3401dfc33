use crate::command::{Context, Result};

/// Shows buttons for (un)registering application commands, globally or in this guild.
#[poise::command(prefix_command, owners_only)]
pub async fn register(ctx: Context<'_>) -> Result<()> {
    tracing::info!(user = %ctx.author().id, "Application command registration requested");
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}
