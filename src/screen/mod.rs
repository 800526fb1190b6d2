//! The timeline screen: a presentation layer over the store's snapshots and a ticking "now".
//!
//! [Screen] keeps no events of its own. It reads whatever the store last published, derives
//! end-times with [timeline::build_rows] and routes every change back through the store.

pub mod ticker;
pub mod timeline;

use std::{fmt::Display, sync::Arc};

use ansi_term::{Colour, Style};
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::{
    storage::KeyValueStore,
    store::{EventId, EventStore, Snapshot, TimeEvent},
    utils::time::local_date,
};

use timeline::{
    build_rows, format_date, format_date_time, format_duration_minutes, format_timestamp,
    rows_for_day, TimelineRow,
};

pub const TODAY_TITLE: &str = "오늘의 기록";
pub const EMPTY_MESSAGE: &str = "아직 기록이 없습니다.";
pub const UNLABELED: &str = "행동 이름 없음";
pub const UNLABELED_HINT: &str = "잠금화면에서 시작한 기록입니다. 이름을 입력하세요.";

pub struct Screen<S, Tz: TimeZone> {
    store: Arc<EventStore<S>>,
    events: watch::Receiver<Snapshot>,
    tz: Tz,
    now: DateTime<Utc>,
    selected_date: NaiveDate,
}

impl<S: KeyValueStore, Tz: TimeZone> Screen<S, Tz>
where
    Tz::Offset: Display,
{
    /// Subscribes to `store`. The screen starts on the day `now` falls on.
    pub fn new(store: Arc<EventStore<S>>, tz: Tz, now: DateTime<Utc>) -> Self {
        let events = store.subscribe();
        let selected_date = local_date(now, &tz);
        Self {
            store,
            events,
            tz,
            now,
            selected_date,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }

    pub fn today(&self) -> NaiveDate {
        local_date(self.now, &self.tz)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Resolves once the store published a snapshot this screen hasn't rendered.
    pub async fn changed(&mut self) -> Result<()> {
        self.events.changed().await?;
        Ok(())
    }

    /// Every event ordered by start, with derived ends.
    pub fn all_rows(&self) -> Vec<TimelineRow> {
        build_rows(&self.events.borrow(), self.now)
    }

    /// Rows of the selected day.
    pub fn rows(&self) -> Vec<TimelineRow> {
        rows_for_day(self.all_rows(), self.selected_date, &self.tz)
    }

    /// Starts a named event. Blank names are refused; use [Self::quick_start] for an unnamed
    /// one.
    pub async fn start_event(&self, label: &str) -> Result<TimeEvent> {
        let label = label.trim();
        if label.is_empty() {
            bail!("Label can't be empty");
        }
        Ok(self.store.append(label).await)
    }

    /// Starts an unnamed event, to be named later.
    pub async fn quick_start(&self) -> TimeEvent {
        self.store.append("").await
    }

    pub async fn rename(&self, id: &EventId, label: &str) -> Result<()> {
        if !self.store.update_label(id, label.trim()).await {
            bail!("No event with id {id}");
        }
        Ok(())
    }

    /// Clearing the history needs an explicit confirmation.
    pub fn request_clear(&self) -> ClearConfirmation<'_, S, Tz> {
        ClearConfirmation {
            screen: self,
            count: self.events.borrow().len(),
        }
    }

    pub fn title(&self) -> String {
        if self.selected_date == self.today() {
            TODAY_TITLE.to_string()
        } else {
            format!("{} 기록", format_date(self.selected_date))
        }
    }

    /// Text rendition of the screen, optionally with terminal colors.
    pub fn render(&mut self, colors: bool) -> String {
        self.events.mark_unchanged();
        let paint = |style: Style, text: &str| {
            if colors {
                style.paint(text).to_string()
            } else {
                text.to_string()
            }
        };

        let mut lines = vec![
            paint(Style::new().bold(), &format_date_time(self.now, &self.tz)),
            paint(Colour::Green.bold(), &self.title()),
        ];

        let rows = self.rows();
        if rows.is_empty() {
            lines.push(EMPTY_MESSAGE.to_string());
        }
        for row in rows {
            let start = format_timestamp(row.event.start, &self.tz);
            let end = format_timestamp(row.end, &self.tz);
            lines.push(String::new());
            lines.push(paint(Style::new().bold(), &format!("{start} → {end}")));
            lines.push(format!(
                "{start}-{end} ({})",
                format_duration_minutes(row.event.start, row.end)
            ));
            if row.event.is_unlabeled() {
                lines.push(paint(Style::new().bold(), UNLABELED));
                lines.push(paint(Colour::Yellow.dimmed(), UNLABELED_HINT));
            } else {
                lines.push(paint(Style::new().bold(), &row.event.label));
            }
            lines.push(paint(Style::new().dimmed(), &format!("id: {}", row.event.id)));
        }

        let mut rendered = lines.join("\n");
        rendered.push('\n');
        rendered
    }
}

/// Pending "clear all" request. Nothing is deleted unless [Self::confirm] is called.
pub struct ClearConfirmation<'a, S, Tz: TimeZone> {
    screen: &'a Screen<S, Tz>,
    count: usize,
}

impl<S: KeyValueStore, Tz: TimeZone> ClearConfirmation<'_, S, Tz> {
    pub fn prompt(&self) -> String {
        format!("모든 기록을 삭제합니다. 계속할까요? ({}개)", self.count)
    }

    pub async fn confirm(self) {
        info!("Clearing history after confirmation");
        self.screen.store.clear_all().await;
    }

    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    use crate::{
        storage::memory::MemoryStore,
        store::{EventId, EventStore},
        utils::clock::ManualClock,
    };

    use super::{Screen, EMPTY_MESSAGE, TODAY_TITLE, UNLABELED, UNLABELED_HINT};

    fn seoul() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    /// 09:00 on May 2nd in Seoul.
    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
    }

    fn setup() -> (
        Arc<ManualClock>,
        Arc<EventStore<MemoryStore>>,
        Screen<MemoryStore, FixedOffset>,
    ) {
        let clock = Arc::new(ManualClock::new(nine_am()));
        let store = Arc::new(EventStore::new(MemoryStore::new(), clock.clone()));
        let screen = Screen::new(store.clone(), seoul(), nine_am());
        (clock, store, screen)
    }

    #[tokio::test]
    async fn test_empty_day() {
        let (_, _, mut screen) = setup();

        let rendered = screen.render(false);

        assert_eq!(
            rendered,
            format!("05월 02일 09:00\n{TODAY_TITLE}\n{EMPTY_MESSAGE}\n")
        );
    }

    #[tokio::test]
    async fn test_render_cards() -> Result<()> {
        let (clock, _, mut screen) = setup();
        let focus = screen.start_event("  집중 작업 ").await?;
        clock.set(nine_am() + chrono::Duration::minutes(30));
        let unnamed = screen.quick_start().await;
        screen.set_now(nine_am() + chrono::Duration::minutes(60));

        let rendered = screen.render(false);

        let expected = [
            "05월 02일 10:00".to_string(),
            TODAY_TITLE.to_string(),
            String::new(),
            "09:00 → 09:30".to_string(),
            "09:00-09:30 (30분)".to_string(),
            "집중 작업".to_string(),
            format!("id: {}", focus.id),
            String::new(),
            "09:30 → 10:00".to_string(),
            "09:30-10:00 (30분)".to_string(),
            UNLABELED.to_string(),
            UNLABELED_HINT.to_string(),
            format!("id: {}", unnamed.id),
        ]
        .join("\n")
            + "\n";
        assert_eq!(rendered, expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_start_is_refused() {
        let (_, store, screen) = setup();

        assert!(screen.start_event("   ").await.is_err());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_rename() -> Result<()> {
        let (_, store, screen) = setup();
        let event = screen.quick_start().await;

        screen.rename(&event.id, " 휴식 ").await?;
        assert_eq!(store.snapshot()[0].label, "휴식");

        assert!(screen.rename(&EventId::from("missing"), "x").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_other_day_title_and_filter() -> Result<()> {
        let (clock, _, mut screen) = setup();
        screen.start_event("today").await?;
        clock.set(nine_am() - chrono::Duration::days(1));
        screen.start_event("yesterday").await?;

        assert_eq!(screen.rows().len(), 1);

        screen.select_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(screen.title(), "05월 01일 기록");
        let rows = screen.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event.label, "yesterday");
        assert_eq!(rows[0].end, nine_am());

        assert!(screen.render(false).contains("09:00-09:00 (1440분)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() -> Result<()> {
        let (_, store, screen) = setup();
        screen.start_event("a").await?;
        screen.start_event("b").await?;

        let request = screen.request_clear();
        assert!(request.prompt().contains("2개"));
        request.cancel();
        assert_eq!(store.snapshot().len(), 2);

        screen.request_clear().confirm().await;
        assert!(store.snapshot().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_screen_observes_store_changes() -> Result<()> {
        let (_, store, mut screen) = setup();
        screen.render(false);

        store.append("from the overlay").await;
        screen.changed().await?;

        assert_eq!(screen.rows().len(), 1);
        Ok(())
    }
}
