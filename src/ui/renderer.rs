/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads: it is handed a `View` built from a world
/// snapshot and the leaderboard, and never mutates game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::Tile;
use crate::sim::leaderboard::Leaderboard;
use crate::sim::world::{Snapshot, Status};

/// What to draw this frame.
pub enum View<'a> {
    Title {
        levels: &'a [String],
        cursor: usize,
        board: &'a Leaderboard,
    },
    Playing {
        snap: Snapshot<'a>,
    },
    Result {
        snap: Snapshot<'a>,
        /// Leaderboard rank earned by this attempt, if any.
        rank: Option<usize>,
        has_next: bool,
        board: &'a Leaderboard,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ViewKind {
    Title,
    Playing,
    Result,
}

impl View<'_> {
    fn kind(&self) -> ViewKind {
        match self {
            View::Title { .. } => ViewKind::Title,
            View::Playing { .. } => ViewKind::Playing,
            View::Result { .. } => ViewKind::Result,
        }
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap between rows matches the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; overflow is clipped.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GOOD: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const BAD: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const KEY: Color = Color::Rgb { r: 100, g: 200, b: 255 };

/// Each grid cell is drawn 2 terminal columns wide.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_view: Option<ViewKind>,
    frame: u32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_view: None,
            frame: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.invalidate();

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, view: &View) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }

        // Screen change or resize → clear for a clean transition
        if resized || self.last_view != Some(view.kind()) {
            self.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_view = Some(view.kind());
        }

        self.frame = self.frame.wrapping_add(1);
        self.compose(view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn compose(&mut self, view: &View) {
        self.front.clear();
        match view {
            View::Title { levels, cursor, board } => self.compose_title(levels, *cursor, board),
            View::Playing { snap } => {
                self.compose_game(snap);
                if snap.status == Status::Paused {
                    self.compose_pause_overlay(snap);
                }
            }
            View::Result { snap, rank, has_next, board } => {
                self.compose_game(snap);
                self.compose_result(snap, *rank, *has_next, board);
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors, never ResetColor (terminal default may differ from BASE_BG)
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Game screen ──

    fn map_origin(&self, snap: &Snapshot) -> usize {
        let map_cols = snap.grid.width() * CELL_W;
        self.front.width.saturating_sub(map_cols) / 2
    }

    fn compose_game(&mut self, snap: &Snapshot) {
        // ── HUD row ──
        let clock = if snap.time_remaining > 0.0 {
            format!("{:>4}", snap.time_remaining.ceil() as u32)
        } else {
            "  --".to_string()
        };
        let exit = if snap.exit_open { "EXIT OPEN" } else { "exit closed" };
        let hud = format!(
            " L{}  {}   Gems {}/{}   Time {}   Score {:<6}  {} ",
            snap.level + 1, snap.level_name,
            snap.gems_collected, snap.gems_required,
            clock, snap.score, exit,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        let x0 = self.map_origin(snap);
        for (gy, row) in snap.grid.rows().enumerate() {
            let y = MAP_ROW + gy;
            if y >= self.front.height { break; }
            for (gx, &tile) in row.iter().enumerate() {
                let pos = (gx as i32, gy as i32);
                let (glyph, fg, bg) = if pos == snap.player {
                    player_glyph(snap.player_alive)
                } else if pos == snap.exit && tile == Tile::Exit {
                    exit_glyph(snap.exit_open, self.frame)
                } else {
                    tile_glyph(tile)
                };
                let col = x0 + gx * CELL_W;
                for (i, ch) in glyph.chars().enumerate() {
                    self.front.set(col + i, y, Cell::new(ch, fg, bg));
                }
            }
        }

        // ── Help bar ──
        let help_row = MAP_ROW + snap.grid.height() + 1;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD Move   Shift/Ctrl+Dir Dig   P Pause   R Restart   Esc Title";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_pause_overlay(&mut self, snap: &Snapshot) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 28;
        let x = self.map_origin(snap) + (snap.grid.width() * CELL_W).saturating_sub(box_w) / 2;
        let y = MAP_ROW + snap.grid.height().saturating_sub(5) / 2;

        let lines: [(&str, Color); 5] = [
            ("", ACCENT),
            ("         PAUSED", ACCENT),
            ("", ACCENT),
            ("   P Resume   R Restart", KEY),
            ("   Esc Back to Title", KEY),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            for dx in 0..box_w {
                self.front.set(x + dx, y + i, Cell::new(' ', *fg, dim));
            }
            self.front.put_str(x, y + i, text, *fg, dim);
        }
    }

    // ── Result panel ──

    fn compose_result(&mut self, snap: &Snapshot, rank: Option<usize>, has_next: bool, board: &Leaderboard) {
        let row0 = MAP_ROW + snap.grid.height() + 3;
        let x = 2;

        let (headline, color) = match snap.status {
            Status::Won => ("LEVEL COMPLETE", GOOD),
            _ if snap.player_alive => ("OUT OF TIME", BAD),
            _ => ("CRUSHED", BAD),
        };
        self.front.put_str(x, row0, headline, color, Color::Reset);
        self.front.put_str(x + 18, row0, &format!("Score {}", snap.score), Color::White, Color::Reset);

        let rank_line = match rank {
            Some(r) => format!("New high score! Rank #{r}"),
            None if snap.status == Status::Won => "Did not make the leaderboard".to_string(),
            None => String::new(),
        };
        self.front.put_str(x, row0 + 1, &rank_line, ACCENT, Color::Reset);

        let mut y = row0 + 3;
        self.front.put_str(x, y, "High Scores", ACCENT, Color::Reset);
        y += 1;
        for (i, entry) in board.top(5).iter().enumerate() {
            let fg = if Some(i + 1) == rank { GOOD } else { Color::White };
            let line = format!("{:>2}. {:<12} {:>7}  L{}", i + 1, entry.name, entry.score, entry.level + 1);
            self.front.put_str(x, y, &line, fg, Color::Reset);
            y += 1;
        }

        let next = match (snap.status, has_next) {
            (Status::Won, true) => "Enter Next level",
            (Status::Won, false) => "Enter Title",
            _ => "Enter Retry",
        };
        self.front.put_str(x, y + 1, &format!("{next}   R Retry   Esc Title"), KEY, Color::Reset);
    }

    // ── Title screen ──

    fn compose_title(&mut self, levels: &[String], cursor: usize, board: &Leaderboard) {
        let title = [
            r"  ___                        _   _          ",
            r" | __|_ _____ __ ___ ____ _| |_(_)___ _ _  ",
            r" | _|\ \ / _/ _` \ V / _` |  _| / _ \ ' \ ",
            r" |___/_\_\__\__,_|\_/\__,_|\__|_\___/_||_|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, ACCENT, Color::Reset);
        }

        let list_row = 7;
        self.front.put_str(4, list_row, "Select a level", Color::White, Color::Reset);

        let visible = self.front.height.saturating_sub(list_row + 6).max(1);
        let scroll = cursor.saturating_sub(visible - 1);
        for (i, name) in levels.iter().enumerate().skip(scroll).take(visible) {
            let y = list_row + 2 + (i - scroll);
            let selected = i == cursor;
            let marker = if selected { "▸" } else { " " };
            let best = match board.best_for_level(i) {
                Some(e) => format!("best {:>6}", e.score),
                None => String::new(),
            };
            let line = format!("{marker} {:>2}. {:<32} {best}", i + 1, name);
            let fg = if selected { GOOD } else { Color::White };
            self.front.put_str(4, y, &line, fg, Color::Reset);
        }

        if let Some(best) = board.best() {
            let y = self.front.height.saturating_sub(3);
            let line = format!("Top score: {} by {}", best.score, best.name);
            self.front.put_str(4, y, &line, Color::DarkGrey, Color::Reset);
        }

        let y = self.front.height.saturating_sub(2);
        self.front.put_str(4, y, "↑↓ Choose   Enter Play   Esc/Q Quit", KEY, Color::Reset);
    }
}

// ── Glyphs ──

fn tile_glyph(tile: Tile) -> (&'static str, Color, Color) {
    match tile {
        Tile::Empty => ("  ", Color::Reset, Color::Reset),
        Tile::Dirt => ("░░", Color::Rgb { r: 180, g: 120, b: 60 }, Color::Rgb { r: 100, g: 65, b: 30 }),
        Tile::Wall => ("██", Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        Tile::Boulder { falling } => {
            let fg = if falling { Color::White } else { Color::Rgb { r: 170, g: 170, b: 170 } };
            ("()", fg, Color::Reset)
        }
        Tile::Gem { .. } => ("<>", Color::Rgb { r: 80, g: 230, b: 255 }, Color::Reset),
        Tile::Exit => ("[]", Color::DarkGrey, Color::Reset),
    }
}

fn exit_glyph(open: bool, frame: u32) -> (&'static str, Color, Color) {
    if !open {
        return ("[]", Color::DarkGrey, Color::Reset);
    }
    let bg = if (frame / 8) % 2 == 0 { Color::Rgb { r: 0, g: 90, b: 0 } } else { Color::Reset };
    ("[]", GOOD, bg)
}

fn player_glyph(alive: bool) -> (&'static str, Color, Color) {
    if alive {
        ("@ ", ACCENT, Color::Reset)
    } else {
        ("XX", BAD, Color::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::sim::level::embedded_pack;
    use crate::sim::world::World;

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(w, h);
        r.back.resize(w, h);
        r
    }

    fn world() -> World {
        World::new(0, embedded_pack().levels[0].clone(), ScoringConfig::default()).unwrap()
    }

    fn board() -> (tempfile::TempDir, Leaderboard) {
        let dir = tempfile::tempdir().unwrap();
        let b = Leaderboard::load(dir.path().join("scores.json"));
        (dir, b)
    }

    #[test]
    fn hud_shows_progress() {
        let mut r = renderer(100, 30);
        let w = world();
        r.compose(&View::Playing { snap: w.snapshot() });
        let hud = r.front.row_text(HUD_ROW);
        assert!(hud.contains("Gems 0/3"), "{hud}");
        assert!(hud.contains("Time  120"), "{hud}");
        assert!(hud.contains("exit closed"), "{hud}");
    }

    #[test]
    fn map_draws_player_and_tiles() {
        let mut r = renderer(40, 30);
        let w = world();
        r.compose(&View::Playing { snap: w.snapshot() });
        assert_eq!(r.front.row_text(MAP_ROW), "█".repeat(40));
        let row = r.front.row_text(MAP_ROW + 1);
        assert!(row.starts_with("██@ ░░"), "{row}");
    }

    #[test]
    fn pause_overlay_only_when_paused() {
        let mut r = renderer(60, 30);
        let mut w = world();
        r.compose(&View::Playing { snap: w.snapshot() });
        assert!(!(0..30).any(|y| r.front.row_text(y).contains("PAUSED")));
        w.pause();
        r.compose(&View::Playing { snap: w.snapshot() });
        assert!((0..30).any(|y| r.front.row_text(y).contains("PAUSED")));
    }

    #[test]
    fn result_lists_rank_and_scores() {
        let mut r = renderer(80, 40);
        let (_dir, mut b) = board();
        let rank = b.record_score("ann", 900, 0);
        let mut w = world();
        w.status = Status::Won;
        w.score = 900;
        r.compose(&View::Result { snap: w.snapshot(), rank, has_next: true, board: &b });
        let text: Vec<String> = (0..40).map(|y| r.front.row_text(y)).collect();
        assert!(text.iter().any(|l| l.contains("LEVEL COMPLETE")));
        assert!(text.iter().any(|l| l.contains("Rank #1")));
        assert!(text.iter().any(|l| l.contains("ann") && l.contains("900")));
        assert!(text.iter().any(|l| l.contains("Next level")));
    }

    #[test]
    fn title_marks_cursor_and_best() {
        let mut r = renderer(80, 24);
        let (_dir, mut b) = board();
        b.record_score("bob", 420, 1);
        let names = vec!["One".to_string(), "Two".to_string()];
        r.compose(&View::Title { levels: &names, cursor: 1, board: &b });
        let text: Vec<String> = (0..24).map(|y| r.front.row_text(y)).collect();
        let two = text.iter().find(|l| l.contains("Two")).unwrap();
        assert!(two.contains('▸') && two.contains("420"), "{two}");
        let one = text.iter().find(|l| l.contains("One")).unwrap();
        assert!(!one.contains('▸') && !one.contains("best"), "{one}");
    }
}
