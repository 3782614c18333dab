//! Group selector: a wrapped strip of group labels that shows which groups
//! are visible and maps pointer positions back to groups.

mod layout;
mod strip;
mod text;

pub use layout::{
    label_state, LabelSpan, LabelState, LabelStripLayout, LayoutInput, Palette, StateLevel,
    LABEL_PAD, LABEL_SEPARATOR, PLAIN_SEPARATOR,
};
pub use strip::{LabelStrip, MenuEntry, Modifiers, PointerButton, PressOutcome, Prompter};
pub use text::{MonospaceLayout, PixelRect, TextLayoutEngine, TextRun};
