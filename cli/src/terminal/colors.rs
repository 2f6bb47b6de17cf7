use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const HW_ADDR: Color = Color::BrightYellow;
pub const ENABLED: Color = Color::Green;
pub const DISABLED: Color = Color::Red;
