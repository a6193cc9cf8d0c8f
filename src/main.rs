use std::io::Write;

use anstyle::{AnsiColor, Style};
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;
use log::kv::Key;

use altai_admin::cli::{self, Cli};
use altai_admin::common::API_RUNTIME;

const META_STYLE: Style = AnsiColor::BrightBlack.on_default();
const DURATION_STYLE: Style = AnsiColor::Cyan.on_default();

/// Logs go to stderr so command output stays pipeable. `RUST_LOG`
/// overrides the default info filter.
fn initialize_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level());
            write!(
                buf,
                "{}{}{} {}{}{} {}{}{} {}",
                META_STYLE.render(),
                buf.timestamp(),
                META_STYLE.render_reset(),
                level_style.render(),
                record.level(),
                level_style.render_reset(),
                META_STYLE.render(),
                record.target(),
                META_STYLE.render_reset(),
                record.args(),
            )?;
            // Structured duration values ride along as a cyan suffix.
            if let Some(value) = record.key_values().get(Key::from("duration")) {
                let raw = format!("{}", value);
                let pretty = match raw.find(|c: char| c.is_alphabetic()) {
                    Some(index) => {
                        let (number, unit) = raw.split_at(index);
                        match number.parse::<f32>() {
                            Ok(number) => format!("{:.2} {}", number, unit),
                            Err(_) => raw,
                        }
                    }
                    None => raw,
                };
                write!(
                    buf,
                    " {}{}{}",
                    DURATION_STYLE.render(),
                    pretty,
                    DURATION_STYLE.render_reset()
                )?;
            }
            writeln!(buf)
        })
        .init();
}

fn main() {
    initialize_logger();
    let cli = Cli::parse();
    if let Err(err) = API_RUNTIME.block_on(cli::run(cli)) {
        error!("{}", err);
        std::process::exit(1);
    }
}
