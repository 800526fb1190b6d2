use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::screen::{
    ticker::{NowTicker, DEFAULT_TICK},
    Screen,
};

use super::{shutdown::detect_shutdown, AppContext, Args};

const CLEAR_TERMINAL: &str = "\x1B[2J\x1B[H";

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct DaySelection {
    #[arg(
        long,
        short,
        help = "Day to show. Examples are \"yesterday\", \"2 days ago\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Don't color the output")]
    plain: bool,
}

impl DaySelection {
    /// `None` means today, which keeps moving while the view is open.
    fn parse(&self, now: DateTime<Local>) -> Result<Option<NaiveDate>> {
        let Some(date) = &self.date else {
            return Ok(None);
        };
        match parse_date_string(date, now, self.date_style.into()) {
            Ok(value) => Ok(Some(value.date_naive())),
            Err(e) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate date {e}"),
                )
                .into()),
        }
    }
}

pub async fn process_list_command(context: &AppContext, day: DaySelection) -> Result<()> {
    let mut screen = Screen::new(context.store.clone(), Local, context.clock.time());
    if let Some(date) = day.parse(screen.now().with_timezone(&Local))? {
        screen.select_date(date);
    }
    println!("{}", screen.render(!day.plain));
    Ok(())
}

/// Redraws the day on every store change and every tick until Ctrl-C.
pub async fn process_watch_command(context: &AppContext, day: DaySelection) -> Result<()> {
    let mut screen = Screen::new(context.store.clone(), Local, context.clock.time());
    let fixed_date = day.parse(screen.now().with_timezone(&Local))?;
    if let Some(date) = fixed_date {
        screen.select_date(date);
    }

    let shutdown = CancellationToken::new();
    let (ticker, mut now) = NowTicker::new(context.clock.clone(), DEFAULT_TICK, shutdown.clone());

    let render_loop = async {
        loop {
            println!("{CLEAR_TERMINAL}{}", screen.render(!day.plain));
            select! {
                _ = shutdown.cancelled() => break,
                changed = now.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    screen.set_now(*now.borrow_and_update());
                    if fixed_date.is_none() && screen.selected_date() != screen.today() {
                        debug!("Day changed, following today");
                        screen.select_date(screen.today());
                    }
                }
                changed = screen.changed() => changed?,
            }
        }
        anyhow::Ok(())
    };

    let (_, _, result) = tokio::join!(ticker.run(), detect_shutdown(shutdown.clone()), async {
        let result = render_loop.await;
        if let Err(e) = &result {
            error!("Watch stopped {e:?}");
        }
        shutdown.cancel();
        result
    });
    println!();
    result
}
