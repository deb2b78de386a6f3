// TUI application state and key handling
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use loanwatch_core::{LoanApplication, Session, StatusFilter, SyncState};
use ratatui::widgets::TableState;

pub struct App {
    pub session: Session,
    pub should_quit: bool,
    pub selected_index: usize,
    pub table_state: TableState,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            session,
            should_quit: false,
            selected_index: 0,
            table_state,
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.session.store().filter()
    }

    pub fn sync_state(&self) -> SyncState {
        self.session.sync_state()
    }

    /// Rows currently on screen
    pub fn visible_rows(&self) -> Vec<&LoanApplication> {
        self.session.store().filtered_view()
    }

    pub fn selected_application(&self) -> Option<&LoanApplication> {
        self.visible_rows().get(self.selected_index).copied()
    }

    /// Pull in whatever the session finished since the last frame
    pub fn tick(&mut self) -> bool {
        let changed = self.session.pump();
        if changed {
            self.clamp_selection();
        }
        changed
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.retry(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.next_filter(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.previous_filter(),
            KeyCode::Char('1') => self.select_filter(StatusFilter::All),
            KeyCode::Char('2') => self.select_filter(StatusFilter::Approved),
            KeyCode::Char('3') => self.select_filter(StatusFilter::ReviewRequired),
            KeyCode::Char('4') => self.select_filter(StatusFilter::Rejected),
            KeyCode::Char('j') | KeyCode::Down => self.next_row(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_row(),
            KeyCode::Home | KeyCode::Char('g') => self.select_row(0),
            KeyCode::End | KeyCode::Char('G') => {
                let last = self.visible_rows().len().saturating_sub(1);
                self.select_row(last);
            }
            _ => {}
        }
    }

    pub fn quit(&mut self) {
        self.session.stop();
        self.should_quit = true;
    }

    pub fn retry(&mut self) {
        self.session.retry();
    }

    pub fn select_filter(&mut self, filter: StatusFilter) {
        self.session.store_mut().set_filter(filter);
        self.select_row(0);
    }

    pub fn next_filter(&mut self) {
        self.select_filter(self.filter().next());
    }

    pub fn previous_filter(&mut self) {
        self.select_filter(self.filter().previous());
    }

    pub fn next_row(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 {
            self.select_row((self.selected_index + 1).min(len - 1));
        }
    }

    pub fn previous_row(&mut self) {
        self.select_row(self.selected_index.saturating_sub(1));
    }

    fn select_row(&mut self, index: usize) {
        self.selected_index = index;
        self.table_state.select(Some(index));
    }

    /// A refresh can shrink the list out from under the cursor
    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        if self.selected_index >= len {
            self.select_row(len.saturating_sub(1));
        }
    }
}
