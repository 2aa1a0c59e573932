//! App: terminal init, main loop, frame timing and key handling.

use crate::FrontConfig;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use blockfall::{Direction, DropOutcome, GameResult, GameSession, PieceSource, Rules, Sweep};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, warn};

/// Rows that were just cleared, plus the fade that flashes them.
#[derive(Default)]
pub struct LineClearFlash {
    /// Grid rows as they were before the sweep removed them.
    pub rows: Vec<usize>,
    pub effect: Option<Effect>,
    /// Last time the effect was processed (for delta).
    pub process_time: Option<Instant>,
}

impl LineClearFlash {
    /// `removals` are the sweep's removal indices, where stacked rows repeat.
    pub fn from_removals(removals: Vec<usize>) -> Self {
        Self {
            rows: Sweep { rows: removals }.cleared_rows().collect(),
            ..Self::default()
        }
    }
}

pub struct App {
    session: GameSession,
    theme: Theme,
    front: FrontConfig,
    results_rx: Receiver<GameResult>,
    results: Vec<GameResult>,
    last_frame: Instant,
    line_clear: Option<LineClearFlash>,
}

impl App {
    pub fn new(rules: Rules, pieces: Box<dyn PieceSource>, theme: Theme, front: FrontConfig) -> Self {
        let (tx, results_rx) = mpsc::channel();
        let mut session = GameSession::new(rules, pieces, tx);
        if front.no_menu {
            session.start();
        }
        Self {
            session,
            theme,
            front,
            results_rx,
            results: Vec::new(),
            last_frame: Instant::now(),
            line_clear: None,
        }
    }

    /// Every game finished so far, oldest first.
    pub fn results(&self) -> &[GameResult] {
        &self.results
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let result = match DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout)) {
            Ok(mut terminal) => self.run_loop(&mut terminal),
            Err(e) => Err(e.into()),
        };

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        // Quitting mid-game stops the session without a result.
        self.session.abandon();
        self.collect_results();
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.front.frame_rate.max(1.0));
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            let delta = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;

            if let Some(outcome) = self.session.step(delta) {
                self.on_drop(outcome);
            }
            self.collect_results();

            terminal.draw(|f| {
                crate::ui::draw(f, &self.session, &self.theme, &mut self.line_clear, now);
            })?;

            if self
                .line_clear
                .as_ref()
                .is_some_and(|lc| lc.effect.as_ref().is_some_and(Effect::done))
            {
                self.line_clear = None;
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // Ignore OS repeats and releases; only the first press acts.
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.apply_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Returns false when the app should exit.
    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::Start => {
                if self.session.start() {
                    self.line_clear = None;
                }
            }
            Action::MoveLeft => {
                self.session.move_horizontal(Direction::Left);
            }
            Action::MoveRight => {
                self.session.move_horizontal(Direction::Right);
            }
            Action::Rotate => {
                self.session.rotate_active();
            }
            Action::SoftDrop => {
                if let Some(outcome) = self.session.soft_drop() {
                    self.on_drop(outcome);
                }
            }
            Action::None => {}
        }
        true
    }

    fn on_drop(&mut self, outcome: DropOutcome) {
        match outcome {
            DropOutcome::Fell => {}
            DropOutcome::Locked { rows } => {
                if !rows.is_empty() && !self.front.no_animation {
                    self.line_clear = Some(LineClearFlash::from_removals(rows));
                }
            }
            DropOutcome::ToppedOut(result) => {
                debug!(score = result.score, lines = result.lines, "showing game over");
                self.line_clear = None;
            }
        }
    }

    fn collect_results(&mut self) {
        loop {
            match self.results_rx.try_recv() {
                Ok(result) => self.results.push(result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("result channel closed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::{ScriptedPieces, Status};

    fn app(no_menu: bool) -> App {
        let front = FrontConfig {
            no_menu,
            no_animation: false,
            frame_rate: 60.0,
        };
        let pieces = Box::new(ScriptedPieces::parse("O").unwrap());
        App::new(Rules::default(), pieces, Theme::classic(), front)
    }

    #[test]
    fn test_menu_waits_for_start() {
        let mut app = app(false);
        assert_eq!(app.session.status(), Status::Idle);
        assert!(app.apply_action(Action::SoftDrop));
        assert_eq!(app.session.status(), Status::Idle);
        assert!(app.apply_action(Action::Start));
        assert_eq!(app.session.status(), Status::Running);
    }

    #[test]
    fn test_no_menu_starts_immediately() {
        let app = app(true);
        assert_eq!(app.session.status(), Status::Running);
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut app = app(true);
        assert!(!app.apply_action(Action::Quit));
    }

    #[test]
    fn test_results_collected_after_top_out() {
        let mut app = app(true);
        let mut guard = 0;
        while app.session.status() == Status::Running {
            app.apply_action(Action::SoftDrop);
            guard += 1;
            assert!(guard < 10_000);
        }
        app.collect_results();
        assert_eq!(app.results(), &[GameResult { score: 0, lines: 0 }]);
    }

    #[test]
    fn test_flash_covers_every_stacked_row() {
        let flash = LineClearFlash::from_removals(vec![29, 29, 27]);
        assert_eq!(flash.rows, vec![29, 28, 25]);
        assert!(flash.effect.is_none());
    }
}
