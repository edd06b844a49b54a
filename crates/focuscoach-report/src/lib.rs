//! focuscoach-report — Report cards, counselor rosters and display markup.

pub mod card;
pub mod markup;
pub mod roster;

pub use card::{render_markdown, render_text, write_report_card};
pub use roster::{build_roster, RosterEntry, RosterStatus};
