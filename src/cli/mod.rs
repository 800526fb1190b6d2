pub mod events;
pub mod overlay;
pub mod shutdown;
pub mod timeline;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use events::{process_clear_command, process_quick_command, process_rename_command, process_start_command};
use overlay::{process_overlay_command, OverlayCommand};
use timeline::{process_list_command, process_watch_command, DaySelection};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    overlay::settings::{OverlaySettings, OVERLAY_NAMESPACE},
    storage::file::JsonFileStore,
    store::{event_store::EVENTS_NAMESPACE, EventStore},
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "hardtrack", version, long_about = None)]
#[command(about = "Log what you are doing and see how long each activity lasted", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start a named activity now. It lasts until the next one starts")]
    Start { label: String },
    #[command(about = "Record an unnamed activity now, to be named later with `rename`")]
    Quick {},
    #[command(about = "Rename a recorded activity")]
    Rename { id: String, label: String },
    #[command(about = "Show the activities of a day")]
    List {
        #[command(flatten)]
        day: DaySelection,
    },
    #[command(about = "Show the activities of a day and keep the view updated")]
    Watch {
        #[command(flatten)]
        day: DaySelection,
    },
    #[command(about = "Delete the whole history")]
    Clear {
        #[arg(long, short, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(about = "Manage the floating record button")]
    Overlay {
        #[command(subcommand)]
        command: OverlayCommand,
    },
}

/// Everything a command works with. Both namespaces live under `<dir>/prefs`.
pub struct AppContext {
    pub dir: PathBuf,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<EventStore<JsonFileStore>>,
    pub overlay: OverlaySettings<JsonFileStore>,
}

impl AppContext {
    pub async fn open(dir: PathBuf, clock: Arc<dyn Clock>) -> Result<Self> {
        let prefs = dir.join("prefs");
        let store = Arc::new(EventStore::new(
            JsonFileStore::open(&prefs, EVENTS_NAMESPACE)?,
            clock.clone(),
        ));
        store.initialize().await;
        let overlay = OverlaySettings::new(JsonFileStore::open(&prefs, OVERLAY_NAMESPACE)?);
        Ok(Self {
            dir,
            clock,
            store,
            overlay,
        })
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir.join("logs"), logging_level, args.log)?;
    debug!("Using application directory {dir:?}");

    let context = AppContext::open(dir, Arc::new(DefaultClock)).await?;

    match args.commands {
        Commands::Start { label } => process_start_command(&context, &label).await,
        Commands::Quick {} => process_quick_command(&context).await,
        Commands::Rename { id, label } => process_rename_command(&context, id, &label).await,
        Commands::List { day } => process_list_command(&context, day).await,
        Commands::Watch { day } => process_watch_command(&context, day).await,
        Commands::Clear { yes } => process_clear_command(&context, yes).await,
        Commands::Overlay { command } => process_overlay_command(&context, command).await,
    }
}
