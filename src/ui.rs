//! Layout and drawing: start screen, playfield, sidebar, game over.

use crate::app::LineClearFlash;
use crate::theme::Theme;
use blockfall::{GameSession, Status};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count};

/// Each grid cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const CELL_SYMBOL: &str = "██";
const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the line-clear flash (TachyonFX) in ms.
const LINE_CLEAR_FLASH_MS: u32 = 250;

/// Playfield size in terminal cells, border included.
fn playfield_outer_size(session: &GameSession) -> (u16, u16) {
    let grid = session.grid();
    (
        grid.width() as u16 * CELL_WIDTH + 2,
        grid.height() as u16 + 2,
    )
}

/// Split the screen into (playfield, sidebar), centred.
fn game_layout(area: Rect, session: &GameSession) -> (Rect, Rect) {
    let (pw, ph) = playfield_outer_size(session);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Draw the screen for the session's status. While a line-clear flash is active its
/// effect is created on first use and advanced by the time since the last frame.
pub fn draw(
    frame: &mut Frame,
    session: &GameSession,
    theme: &Theme,
    line_clear: &mut Option<LineClearFlash>,
    now: Instant,
) {
    let area = frame.area();
    let (playfield_area, sidebar_area) = game_layout(area, session);
    let board = draw_playfield(frame, session, theme, playfield_area);
    draw_sidebar(frame, session, theme, sidebar_area);

    match session.status() {
        Status::Idle => draw_start_screen(frame, theme, area),
        Status::Running => {
            if let Some(flash) = line_clear {
                apply_line_clear_effect(frame, board, flash, now);
            }
        }
        Status::GameOver => draw_game_over(frame, session, theme, area),
    }
}

/// Returns the board rect (inside the border).
fn draw_playfield(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", Style::default().fg(theme.title)));
    let board = block.inner(area);
    frame.render_widget(block, area);

    let buf = frame.buffer_mut();
    let bg = Style::default().bg(theme.bg);
    for y in board.top()..board.bottom() {
        for x in board.left()..board.right() {
            buf[(x, y)].set_symbol(" ").set_style(bg);
        }
    }

    let mut put = |gx: i32, gy: i32, class: u8| {
        let Some(color) = theme.block_color(class) else {
            return;
        };
        if gx < 0 || gy < 0 {
            return;
        }
        let rx = board.x + gx as u16 * CELL_WIDTH;
        let ry = board.y + gy as u16;
        if rx + CELL_WIDTH <= board.right() && ry < board.bottom() {
            buf.set_string(rx, ry, CELL_SYMBOL, Style::default().fg(color).bg(theme.bg));
        }
    };

    for (y, row) in session.grid().rows().enumerate() {
        for (x, &class) in row.iter().enumerate() {
            put(x as i32, y as i32, class);
        }
    }
    if let Some(piece) = session.active() {
        for (x, y, class) in piece.cells() {
            put(x, y, class);
        }
    }
    board
}

fn draw_sidebar(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stats (border + score, lines, speed)
            Constraint::Length(1), // gap
            Constraint::Length(8), // Controls
        ])
        .split(area);

    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(session.score().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(session.lines().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Drop:  ", title_style),
            Span::styled(format!("{} ms", session.interval().as_millis()), fg_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(stats_lines).block(stats_block), chunks[0]);

    let controls_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Keys ", title_style));
    let controls = [
        ("←/h →/l", "move"),
        ("↓/j", "soft drop"),
        ("↑/k/Space", "rotate"),
        ("Enter", "start"),
        ("q/Esc", "quit"),
    ];
    let control_lines: Vec<Line> = controls
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<10}"), title_style),
                Span::styled(*what, fg_style),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(control_lines).block(controls_block), chunks[2]);
}

fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_popup(frame: &mut Frame, theme: &Theme, area: Rect, lines: Vec<Line>) {
    let popup = popup_rect(area, 32, lines.len() as u16 + 2);
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}

fn draw_start_screen(frame: &mut Frame, theme: &Theme, area: Rect) {
    let bold = Modifier::BOLD;
    let title = Line::from(vec![
        Span::styled(
            " Block",
            Style::default().fg(theme.pieces[0]).add_modifier(bold),
        ),
        Span::styled(
            "fall ",
            Style::default().fg(theme.main_fg).add_modifier(bold),
        ),
    ]);
    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            " Clear rows, 100 points each ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter — Start    Q — Quit ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(""),
    ];
    draw_popup(frame, theme, area, lines);
}

fn draw_game_over(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", session.score()), fg)),
        Line::from(Span::styled(format!(" Lines: {} ", session.lines()), fg)),
        Line::from(""),
        Line::from(Span::styled(" Enter — Restart    Q — Quit ", fg)),
        Line::from(""),
    ];
    draw_popup(frame, theme, area, lines);
}

/// Buffer rows covered by the cleared grid rows.
fn flash_rows(board: Rect, rows: &[usize]) -> HashSet<u16> {
    rows.iter()
        .map(|&y| board.y + y as u16)
        .filter(|&y| y < board.bottom())
        .collect()
}

fn apply_line_clear_effect(frame: &mut Frame, board: Rect, flash: &mut LineClearFlash, now: Instant) {
    let delta = flash
        .process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    flash.process_time = Some(now);

    if flash.effect.is_none() {
        let rows = flash_rows(board, &flash.rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| rows.contains(&pos.y)));
        let effect = fx::fade_from(
            Color::White,
            Color::White,
            (LINE_CLEAR_FLASH_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, tfx_delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::{NullSink, Rules, ScriptedPieces};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn session() -> GameSession {
        GameSession::new(Rules::default(), ScriptedPieces::parse("T").unwrap(), NullSink)
    }

    fn render(session: &GameSession) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 34)).unwrap();
        let theme = Theme::classic();
        let mut flash = None;
        terminal
            .draw(|f| draw(f, session, &theme, &mut flash, Instant::now()))
            .unwrap();
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_playfield_size() {
        let s = session();
        assert_eq!(playfield_outer_size(&s), (32, 32));
    }

    #[test]
    fn test_start_screen_shown_when_idle() {
        let text = render(&session());
        assert!(text.contains("Start"));
    }

    #[test]
    fn test_running_draws_piece_and_stats() {
        let mut s = session();
        s.start();
        let text = render(&s);
        assert!(text.contains("██"));
        assert!(text.contains("Score: 0"));
        assert!(text.contains("980 ms"));
        assert!(!text.contains("Game Over"));
    }

    #[test]
    fn test_flash_rows_stay_inside_board() {
        let board = Rect::new(1, 1, 30, 30);
        let rows = flash_rows(board, &[29, 29, 40]);
        assert_eq!(rows, HashSet::from([30]));
    }

    #[test]
    fn test_flash_rows_for_stacked_clear() {
        let board = Rect::new(1, 1, 30, 30);
        let flash = LineClearFlash::from_removals(vec![29, 29]);
        assert_eq!(flash_rows(board, &flash.rows), HashSet::from([29, 30]));
    }
}
