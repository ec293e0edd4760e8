//! Generic dismissible overlay.
//!
//! Holds no business state: just whether it is open. Escape, a backdrop
//! click, or the close button dismiss it; clicks inside the content do not.
//! While open the underlying view is scroll-locked, which in a terminal means
//! the view behind the box is not redrawn.

use colored::*;

/// Input events a modal reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalInput {
    Escape,
    BackdropClick,
    CloseButton,
    ContentClick,
}

impl ModalInput {
    /// Whether this input closes an open modal.
    pub fn dismisses(self) -> bool {
        !matches!(self, ModalInput::ContentClick)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modal {
    open: bool,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn scroll_locked(&self) -> bool {
        self.open
    }

    /// Feed an input. Returns `true` when the input closed the modal.
    pub fn handle(&mut self, input: ModalInput) -> bool {
        if self.open && input.dismisses() {
            self.open = false;
            return true;
        }
        false
    }
}

/// Render a boxed overlay with a close marker, a body, and an optional footer.
pub fn render_box(title: &str, body: &str, footer: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(title.to_string());
    lines.push(String::new());
    lines.extend(body.lines().map(str::to_owned));
    if let Some(footer) = footer {
        lines.push(String::new());
        lines.extend(footer.lines().map(str::to_owned));
    }

    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(20);

    let mut out = String::new();
    out.push_str(&format!("┌{}┐\n", "─".repeat(width + 2)));
    out.push_str(&format!("│ {:>width$} │\n", "✕", width = width));
    for (i, line) in lines.iter().enumerate() {
        let pad = width - line.chars().count();
        let text = if i == 0 { line.bold().to_string() } else { line.clone() };
        out.push_str(&format!("│ {}{} │\n", text, " ".repeat(pad)));
    }
    out.push_str(&format!("└{}┘", "─".repeat(width + 2)));
    out
}
