use std::path::PathBuf;

use eggshop::catalog::EggCatalog;
use eggshop::error::{Error, Result};
use eggshop::notifications::{
    Channel, DiscordChannel, DiscordConfig, ShopAnnouncement, ShopSnapshot,
};

/// Parameters for `announce`
#[derive(Debug, Clone)]
pub struct AnnounceParams {
    pub output: PathBuf,
    pub eggs_csv: PathBuf,
    pub discord: DiscordConfig,
    pub dry_run: bool,
}

/// Post the current shop to Discord
///
/// `token` is only needed when actually posting.
pub async fn announce(params: AnnounceParams, token: Option<String>) -> Result<()> {
    let snapshot = ShopSnapshot::from_path(&params.output)?;
    let catalog = EggCatalog::from_path(&params.eggs_csv)?;

    let announcement = ShopAnnouncement::render(&snapshot, &catalog);
    if announcement.is_empty() {
        return Err(Error::other(format!(
            "Shop state {} has no current shop",
            params.output.display()
        )));
    }

    if params.dry_run {
        println!("{}", announcement.content);
        return Ok(());
    }

    let token = token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        Error::config("Discord bot token is not set; use --token or DISCORD_BOT_TOKEN")
    })?;

    let channel = DiscordChannel::new(params.discord, token)?;
    tracing::debug!(channel = %channel.config(), eggs = announcement.eggs.len(), "Posting announcement");

    let status = channel.send(&announcement).await?;

    println!("{status}");
    if !status.success {
        return Err(Error::other("Announcement was not delivered"));
    }

    Ok(())
}
