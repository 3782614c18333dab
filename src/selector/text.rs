//! Text layout collaborator used by the label strip.
//!
//! A toolkit backend (pango, cosmic-text, ...) implements [`TextLayoutEngine`];
//! [`MonospaceLayout`] is the headless engine with one fixed-width cell per
//! character.

use crate::brush::Rgb;

/// Color attributes applied to the byte range `start..end` of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub background: Rgb,
    pub foreground: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

pub trait TextLayoutEngine {
    /// Lays out `text`, wrapping at `width` pixels (`0` disables wrapping),
    /// and returns the pixel size of the result.
    fn layout(&mut self, text: &str, runs: &[TextRun], width: u32) -> (u32, u32);

    /// Byte offset of the character under a pixel position of the last layout.
    ///
    /// Positions outside the text clamp to the nearest line, and to the first
    /// or last character of that line.
    fn index_at(&self, x: i32, y: i32) -> Option<usize>;

    /// Pixel box of the character starting at byte `offset`.
    fn offset_rect(&self, offset: usize) -> Option<PixelRect>;

    /// Height of one line without spacing.
    fn line_height(&self) -> u32;

    /// Extra pixels between consecutive lines.
    fn set_spacing(&mut self, spacing: u32);
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    offset: usize,
    x: i32,
    width: u32,
}

#[derive(Debug, Clone, Default)]
struct Line {
    y: i32,
    width: u32,
    glyphs: Vec<Glyph>,
}

#[derive(Debug, Clone)]
pub struct MonospaceLayout {
    cell_width: u32,
    line_height: u32,
    spacing: u32,
    lines: Vec<Line>,
    runs: Vec<TextRun>,
}

impl MonospaceLayout {
    pub fn new(cell_width: u32, line_height: u32) -> Self {
        Self {
            cell_width,
            line_height,
            spacing: 0,
            lines: Vec::new(),
            runs: Vec::new(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Color runs of the last layout.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    fn char_width(&self, c: char) -> u32 {
        match c {
            '\u{200b}' | '\n' => 0,
            _ => self.cell_width,
        }
    }

    fn line_pitch(&self) -> i32 {
        (self.line_height + self.spacing) as i32
    }
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self::new(8, 18)
    }
}

/// Break opportunities follow a zero-width space or a plain space.
fn is_break_after(c: char) -> bool {
    matches!(c, '\u{200b}' | ' ')
}

impl TextLayoutEngine for MonospaceLayout {
    fn layout(&mut self, text: &str, runs: &[TextRun], width: u32) -> (u32, u32) {
        self.runs = runs.to_vec();

        // Split into unbreakable words, each ending at a break opportunity
        let mut words: Vec<Vec<(usize, u32)>> = Vec::new();
        let mut word: Vec<(usize, u32)> = Vec::new();
        for (offset, c) in text.char_indices() {
            word.push((offset, self.char_width(c)));
            if is_break_after(c) {
                words.push(std::mem::take(&mut word));
            }
        }
        if !word.is_empty() {
            words.push(word);
        }

        let mut lines: Vec<Line> = vec![Line::default()];
        for word in words {
            let word_width: u32 = word.iter().map(|(_, w)| *w).sum();
            let needs_wrap = match lines.last() {
                Some(line) => width > 0 && !line.glyphs.is_empty() && line.width + word_width > width,
                None => false,
            };
            if needs_wrap {
                lines.push(Line::default());
            }
            if let Some(line) = lines.last_mut() {
                for (offset, glyph_width) in word {
                    line.glyphs.push(Glyph {
                        offset,
                        x: line.width as i32,
                        width: glyph_width,
                    });
                    line.width += glyph_width;
                }
            }
        }

        let pitch = self.line_pitch();
        for (i, line) in lines.iter_mut().enumerate() {
            line.y = i as i32 * pitch;
        }

        let count = lines.len() as u32;
        let height = count * self.line_height + count.saturating_sub(1) * self.spacing;
        let width = lines.iter().map(|line| line.width).max().unwrap_or(0);
        self.lines = lines;
        (width, height)
    }

    fn index_at(&self, x: i32, y: i32) -> Option<usize> {
        let last = self.lines.len().checked_sub(1)?;
        let row = if y < 0 { 0 } else { (y / self.line_pitch().max(1)) as usize };
        let line = &self.lines[row.min(last)];

        let first = line.glyphs.first()?;
        if x < first.x {
            return Some(first.offset);
        }
        line.glyphs
            .iter()
            .find(|g| g.width > 0 && x >= g.x && x < g.x + g.width as i32)
            .or_else(|| line.glyphs.last())
            .map(|g| g.offset)
    }

    fn offset_rect(&self, offset: usize) -> Option<PixelRect> {
        self.lines.iter().find_map(|line| {
            line.glyphs.iter().find(|g| g.offset == offset).map(|g| PixelRect {
                x: g.x,
                y: line.y,
                width: g.width,
                height: self.line_height,
            })
        })
    }

    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn set_spacing(&mut self, spacing: u32) {
        self.spacing = spacing;
    }
}
