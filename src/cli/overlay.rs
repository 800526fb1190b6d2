use anyhow::{anyhow, Result};
use clap::Subcommand;
use tracing::info;

use crate::{
    overlay::settings::{OverlaySettings, SIZE_DP_RANGE},
    storage::KeyValueStore,
    utils::percentage::Percentage,
};

use super::AppContext;

#[derive(Subcommand, Debug)]
pub enum OverlayCommand {
    #[command(about = "Show the stored overlay settings")]
    Status,
    #[command(about = "Turn the floating button on")]
    Enable,
    #[command(about = "Turn the floating button off")]
    Disable,
    #[command(about = "Move the button back to its default place")]
    ResetPosition,
    #[command(about = "Change how the button looks. Applies the next time it is shown")]
    Configure {
        #[arg(long, value_parser = parse_size_dp, help = "Button size in dp, from 36 to 72")]
        size: Option<f32>,
        #[arg(long, help = "Opacity, from 40% to 100%")]
        alpha: Option<Percentage>,
    },
}

fn parse_size_dp(value: &str) -> Result<f32> {
    let size = value.trim().trim_end_matches("dp").parse::<f32>()?;
    if SIZE_DP_RANGE.contains(&size) {
        Ok(size)
    } else {
        Err(anyhow!(
            "Size should be between {} and {}",
            SIZE_DP_RANGE.start(),
            SIZE_DP_RANGE.end()
        ))
    }
}

pub async fn process_overlay_command(context: &AppContext, command: OverlayCommand) -> Result<()> {
    apply_overlay_command(&context.overlay, command).await?;
    println!("{}", describe(&context.overlay).await);
    Ok(())
}

async fn apply_overlay_command<S: KeyValueStore>(
    settings: &OverlaySettings<S>,
    command: OverlayCommand,
) -> Result<()> {
    match command {
        OverlayCommand::Status => {}
        OverlayCommand::Enable => settings.set_enabled(true).await?,
        OverlayCommand::Disable => settings.set_enabled(false).await?,
        OverlayCommand::ResetPosition => settings.reset_position().await?,
        OverlayCommand::Configure { size, alpha } => {
            let mut appearance = settings.load_appearance().await;
            if let Some(size) = size {
                appearance.size_dp = size;
            }
            if let Some(alpha) = alpha {
                appearance.alpha = alpha.as_fraction();
            }
            info!("Saving overlay appearance {appearance:?}");
            settings.save_appearance(appearance).await?;
        }
    }
    Ok(())
}

async fn describe<S: KeyValueStore>(settings: &OverlaySettings<S>) -> String {
    let enabled = if settings.is_enabled().await {
        "켜짐"
    } else {
        "꺼짐"
    };
    let position = settings.load_position().await;
    let appearance = settings.load_appearance().await;
    format!(
        "플로팅 버튼: {enabled}\n위치: ({}, {})\n크기: {}dp\n투명도: {}",
        position.x,
        position.y,
        appearance.size_dp.round() as i32,
        Percentage::from_fraction(appearance.alpha)
    )
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{
        overlay::{
            gesture::Position,
            settings::{OverlaySettings, DEFAULT_POSITION},
        },
        storage::memory::MemoryStore,
        utils::percentage::Percentage,
    };

    use super::{apply_overlay_command, describe, parse_size_dp, OverlayCommand};

    #[test]
    fn test_parse_size_dp() {
        assert_eq!(parse_size_dp("48").unwrap(), 48.);
        assert_eq!(parse_size_dp("72dp").unwrap(), 72.);
        assert!(parse_size_dp("35.9").is_err());
        assert!(parse_size_dp("big").is_err());
    }

    #[tokio::test]
    async fn test_overlay_commands() -> Result<()> {
        let settings = OverlaySettings::new(MemoryStore::new());
        assert_eq!(
            describe(&settings).await,
            "플로팅 버튼: 꺼짐\n위치: (0, 240)\n크기: 48dp\n투명도: 80%"
        );

        apply_overlay_command(&settings, OverlayCommand::Enable).await?;
        assert!(settings.is_enabled().await);

        apply_overlay_command(
            &settings,
            OverlayCommand::Configure {
                size: Some(60.),
                alpha: Some(Percentage::new_opt(10.).unwrap()),
            },
        )
        .await?;
        let appearance = settings.load_appearance().await;
        assert_eq!(appearance.size_dp, 60.);
        assert_eq!(appearance.alpha, 0.4);

        settings.save_position(Position { x: 5, y: 7 }).await?;
        apply_overlay_command(&settings, OverlayCommand::ResetPosition).await?;
        assert_eq!(settings.load_position().await, DEFAULT_POSITION);

        apply_overlay_command(&settings, OverlayCommand::Disable).await?;
        assert!(!settings.is_enabled().await);
        Ok(())
    }
}
