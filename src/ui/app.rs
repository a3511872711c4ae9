use crate::error::ExportError;
use crate::model::ProgressResult;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};

type Reload = Box<dyn FnMut() -> std::result::Result<Vec<ProgressResult>, ExportError>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    Name,
    /// Least complete first.
    Progress,
}

pub struct App {
    pub areas: Vec<ProgressResult>,
    pub source: String,
    pub selected_area: usize,
    pub sort: SortOrder,
    pub status: Option<String>,
    pub should_quit: bool,
    reload: Option<Reload>,
}

impl App {
    #[must_use]
    pub fn new(areas: Vec<ProgressResult>, source: impl Into<String>) -> Self {
        let mut app = Self {
            areas,
            source: source.into(),
            selected_area: 0,
            sort: SortOrder::Name,
            status: None,
            should_quit: false,
            reload: None,
        };
        app.apply_sort();
        app
    }

    /// Enables `r` to re-read every area from the store.
    #[must_use]
    pub fn with_reload<F>(mut self, reload: F) -> Self
    where
        F: FnMut() -> std::result::Result<Vec<ProgressResult>, ExportError> + 'static,
    {
        self.reload = Some(Box::new(reload));
        self
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        super::dashboard::draw_dashboard(frame, self);
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.previous_area(),
            KeyCode::Down | KeyCode::Char('j') => self.next_area(),
            KeyCode::Home | KeyCode::Char('g') => self.selected_area = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected_area = self.areas.len().saturating_sub(1);
            }
            KeyCode::Char('s') => self.toggle_sort(),
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }

    fn previous_area(&mut self) {
        self.selected_area = self.selected_area.saturating_sub(1);
    }

    fn next_area(&mut self) {
        if self.selected_area < self.areas.len().saturating_sub(1) {
            self.selected_area += 1;
        }
    }

    fn toggle_sort(&mut self) {
        let current = self.selected().map(|a| a.area_id.clone());
        self.sort = match self.sort {
            SortOrder::Name => SortOrder::Progress,
            SortOrder::Progress => SortOrder::Name,
        };
        self.apply_sort();
        self.reselect(current.as_deref());
    }

    fn refresh(&mut self) {
        let Some(reload) = self.reload.as_mut() else {
            self.status = Some("reload not available".to_string());
            return;
        };
        match reload() {
            Ok(areas) => {
                let current = self.selected().map(|a| a.area_id.clone());
                self.areas = areas;
                self.apply_sort();
                self.reselect(current.as_deref());
                self.status = Some(format!("reloaded {} areas", self.areas.len()));
            }
            Err(e) => self.status = Some(format!("reload failed: {e}")),
        }
    }

    fn apply_sort(&mut self) {
        match self.sort {
            SortOrder::Name => self.areas.sort_by(|a, b| a.area_id.cmp(&b.area_id)),
            SortOrder::Progress => self.areas.sort_by(|a, b| {
                a.percentage_overall
                    .total_cmp(&b.percentage_overall)
                    .then_with(|| a.area_id.cmp(&b.area_id))
            }),
        }
    }

    fn reselect(&mut self, area_id: Option<&str>) {
        self.selected_area = area_id
            .and_then(|id| self.areas.iter().position(|a| a.area_id == id))
            .unwrap_or(0);
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ProgressResult> {
        self.areas.get(self.selected_area)
    }

    /// Achieved and expected summed over every area.
    #[must_use]
    pub fn overall(&self) -> (u64, u64) {
        self.areas.iter().fold((0, 0), |(achieved, expected), a| {
            (achieved + a.achieved_total, expected + a.expected_total)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn area(id: &str, achieved: u64, expected: u64) -> ProgressResult {
        ProgressResult {
            area_id: id.into(),
            percentage_overall: crate::model::result::percentage(achieved, expected),
            percentage_this_photo: 0.0,
            achieved_total: achieved,
            expected_total: expected,
            achieved: BTreeMap::new(),
            expected: BTreeMap::new(),
        }
    }

    fn app() -> App {
        App::new(
            vec![area("plataforma", 9, 10), area("acesso", 1, 10), area("mezanino", 5, 10)],
            "data",
        )
    }

    #[test]
    fn sorts_by_name_then_progress_keeping_selection() {
        let mut app = app();
        assert_eq!(app.selected().unwrap().area_id, "acesso");

        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected().unwrap().area_id, "mezanino");

        app.handle_key(KeyCode::Char('s'));
        let order: Vec<&str> = app.areas.iter().map(|a| a.area_id.as_str()).collect();
        assert_eq!(order, ["acesso", "mezanino", "plataforma"]);
        assert_eq!(app.selected().unwrap().area_id, "mezanino");
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut app = app();
        app.handle_key(KeyCode::Up);
        assert_eq!(app.selected_area, 0);
        app.handle_key(KeyCode::End);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.selected_area, 2);
    }

    #[test]
    fn reload_replaces_areas() {
        let mut app = app().with_reload(|| Ok(vec![area("tunel", 0, 4)]));
        app.handle_key(KeyCode::Char('r'));

        assert_eq!(app.areas.len(), 1);
        assert_eq!(app.status.as_deref(), Some("reloaded 1 areas"));
        assert_eq!(app.overall(), (0, 4));
    }
}
