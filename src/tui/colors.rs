//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background
pub const SLATE: Color = Color::Rgb(40, 60, 90);
/// Favorite marker
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Destructive confirmation overlay
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Rows in inline edit mode
pub const EDIT_BLUE: Color = Color::Rgb(110, 170, 255);
