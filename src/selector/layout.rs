//! Label strip layout: every group name as one padded run in a single
//! wrapped text buffer, plus the offset index used for hit-testing.

use super::text::{TextLayoutEngine, TextRun};
use crate::brush::Rgb;

/// Narrow no-break space around each label.
pub const LABEL_PAD: &str = "\u{202f}";
/// Narrow no-break space followed by a zero-width space, the only place a
/// line may wrap between labels.
pub const LABEL_SEPARATOR: &str = "\u{202f}\u{200b}";
/// Separator used when label padding is disabled.
pub const PLAIN_SEPARATOR: &str = " ";

/// Visual state of a label; mirrors the toolkit's widget state levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateLevel {
    Normal,
    /// Under the pointer
    Prelight,
    /// Group is visible
    Selected,
    /// Group owns the open context menu
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelState {
    pub background: StateLevel,
    pub foreground: StateLevel,
}

/// Menu ownership beats visibility, which beats hover. A visible group
/// always keeps the selected foreground.
pub fn label_state(
    group: &str,
    active_groups: &[String],
    hovered: Option<&str>,
    menu_group: Option<&str>,
) -> LabelState {
    let visible = active_groups.iter().any(|g| g == group);

    let level = if menu_group == Some(group) {
        StateLevel::Active
    } else if visible {
        StateLevel::Selected
    } else if hovered == Some(group) {
        StateLevel::Prelight
    } else {
        StateLevel::Normal
    };

    LabelState {
        background: level,
        foreground: if visible { StateLevel::Selected } else { level },
    }
}

/// Colors per state level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: [Rgb; 4],
    pub foreground: [Rgb; 4],
}

impl Palette {
    pub fn background(&self, level: StateLevel) -> Rgb {
        self.background[level as usize]
    }

    pub fn foreground(&self, level: StateLevel) -> Rgb {
        self.foreground[level as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [
                Rgb::new(0xed, 0xec, 0xeb),
                Rgb::new(0xf6, 0xf5, 0xf4),
                Rgb::new(0x35, 0x84, 0xe4),
                Rgb::new(0xde, 0xdd, 0xda),
            ],
            foreground: [
                Rgb::new(0x2e, 0x34, 0x36),
                Rgb::new(0x2e, 0x34, 0x36),
                Rgb::new(0xff, 0xff, 0xff),
                Rgb::new(0x2e, 0x34, 0x36),
            ],
        }
    }
}

/// Everything a rebuild reads.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    /// Group names in any order; the strip shows them sorted
    pub groups: &'a [String],
    pub active_groups: &'a [String],
    pub hovered: Option<&'a str>,
    pub menu_group: Option<&'a str>,
    pub padding: bool,
    /// Available width in pixels
    pub width: u32,
}

/// Byte range of one label in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpan {
    pub group: String,
    pub start: usize,
    pub end: usize,
    pub state: LabelState,
}

#[derive(Debug, Clone, Default)]
pub struct LabelStripLayout {
    text: String,
    /// Sorted by offset, non-overlapping; separators fall between spans
    spans: Vec<LabelSpan>,
    size: (u32, u32),
    vmargin: u32,
    width: u32,
}

impl LabelStripLayout {
    pub fn build<E: TextLayoutEngine>(
        engine: &mut E,
        input: &LayoutInput<'_>,
        palette: &Palette,
    ) -> Self {
        let mut groups: Vec<&str> = input.groups.iter().map(String::as_str).collect();
        groups.sort_unstable();

        let (pad, separator) = if input.padding {
            (LABEL_PAD, LABEL_SEPARATOR)
        } else {
            ("", PLAIN_SEPARATOR)
        };

        let mut text = String::new();
        let mut spans = Vec::with_capacity(groups.len());
        let mut runs = Vec::with_capacity(groups.len());
        for group in groups {
            let start = text.len();
            text.push_str(pad);
            text.push_str(group);
            text.push_str(pad);
            let end = text.len();

            let state = label_state(group, input.active_groups, input.hovered, input.menu_group);
            runs.push(TextRun {
                start,
                end,
                background: palette.background(state.background),
                foreground: palette.foreground(state.foreground),
            });
            spans.push(LabelSpan {
                group: group.to_string(),
                start,
                end,
                state,
            });

            text.push_str(separator);
        }

        let leading = engine.line_height() / 6;
        engine.set_spacing(leading);
        let size = engine.layout(&text, &runs, input.width);

        Self {
            text,
            spans,
            size,
            vmargin: leading,
            width: input.width,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[LabelSpan] {
        &self.spans
    }

    /// Pixel size of the laid-out text, without margins.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn vmargin(&self) -> u32 {
        self.vmargin
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn requested_height(&self) -> u32 {
        self.size.1 + 2 * self.vmargin
    }

    /// Owning group of a buffer offset. Separators belong to no group.
    pub fn group_at_offset(&self, offset: usize) -> Option<&str> {
        let index = self.spans.partition_point(|span| span.end <= offset);
        self.spans
            .get(index)
            .filter(|span| span.start <= offset)
            .map(|span| span.group.as_str())
    }

    pub fn span_for(&self, group: &str) -> Option<&LabelSpan> {
        self.spans.iter().find(|span| span.group == group)
    }

    /// Group under a widget-space pixel position; the text is drawn one
    /// `vmargin` below the top edge.
    pub fn hit_test<E: TextLayoutEngine>(&self, engine: &E, x: i32, y: i32) -> Option<&str> {
        let offset = engine.index_at(x, y - self.vmargin as i32)?;
        self.group_at_offset(offset)
    }
}
