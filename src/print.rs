//! ## Printing Module
//!
//! Makes the terminal output easier to read. Log records are printed with a coloured
//! level tag, the same way on every component, and the controller status can be
//! printed as a small table.
//!
//! Logging goes through the `log` macros everywhere in the crate; this module only
//! decides how the records look.
use std::io::Write;

use ansi_term::Colour::{self, Blue, Green, Purple, Red, White, Yellow};
use log::Level;
use prettytable::{format, Cell, Row, Table};

use crate::controller::state::{Direction, Status};

/// Light blue used for `[INFO]`.
const LIGHT_BLUE: Colour = Colour::RGB(102, 178, 255);

/// Colour and padded tag printed in front of a record of the given level.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
/// - "\[WARNING\]: {}", msg
/// - "\[INFO\]:    {}", msg
fn level_tag(level: Level) -> (Colour, &'static str) {
    match level {
        Level::Error => (Red, "[ERROR]:   "),
        Level::Warn => (Yellow, "[WARNING]: "),
        Level::Info => (LIGHT_BLUE, "[INFO]:    "),
        Level::Debug => (Purple, "[DEBUG]:   "),
        Level::Trace => (White, "[TRACE]:   "),
    }
}

/// Installs the coloured logger.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. Calling this more than
/// once (for instance from several tests) leaves the first logger in place.
///
/// ## Example
/// ```
/// dumbwaiter::print::init_logger();
/// log::info!("controller started");
/// ```
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let (colour, tag) = level_tag(record.level());
            writeln!(buf, "{}{}", colour.paint(tag), colour.paint(record.args().to_string()))
        })
        .try_init();
}

/// Builds a table of the controller status.
///
/// Direction is coloured (green up, yellow down, red stopped) and a missing request is
/// shown as `-`.
pub fn status_table(status: &Status) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(vec![
        Cell::new(&Blue.bold().paint("Direction").to_string()),
        Cell::new(&Blue.bold().paint("Requested floor").to_string()),
        Cell::new(&Blue.bold().paint("Last seen floor").to_string()),
    ]));

    let direction = match status.direction {
        Direction::Up => Green.paint("up").to_string(),
        Direction::Down => Yellow.paint("down").to_string(),
        Direction::Stopped => Red.paint("stopped").to_string(),
    };
    let requested = status
        .requested_floor
        .map(|floor| floor.to_string())
        .unwrap_or_else(|| "-".to_string());

    table.add_row(Row::new(vec![
        Cell::new(&direction),
        Cell::new(&requested),
        Cell::new(&status.last_seen_floor.to_string()),
    ]));
    table
}

/// Prints the controller status to the terminal.
pub fn status(status: &Status) {
    println!("{}", Purple.bold().paint("DUMBWAITER STATUS"));
    status_table(status).printstd();
    println!();
}
