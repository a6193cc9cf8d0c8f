pub mod auth;
pub mod contacts;
pub mod draft;
pub mod media;
pub mod plot;
pub mod quiz;
pub mod requests;
pub mod stats;

use std::sync::Arc;

use anstyle::{AnsiColor, Style};
use clap::{Parser, Subcommand};

use crate::api::{ApiClient, ApiResult};
use crate::config::PUBLIC_CONFIG;
use crate::models::plot::PlotStatus;
use crate::store::Store;

#[derive(Debug, Parser)]
#[command(
    name = "altai-admin",
    version,
    about = "AltaiLand administration utility"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(subcommand, about = "Admin session management")]
    Auth(auth::AuthCommand),
    #[command(subcommand, about = "Plot catalog and records")]
    Plot(plot::PlotCommand),
    #[command(subcommand, about = "Local draft of a new plot")]
    Draft(draft::DraftCommand),
    #[command(subcommand, about = "Plot image collections")]
    Media(media::MediaCommand),
    #[command(subcommand, about = "Inbound leads")]
    Requests(requests::RequestsCommand),
    #[command(subcommand, about = "Quiz questions")]
    Quiz(quiz::QuizCommand),
    #[command(subcommand, about = "Site contact details")]
    Contacts(contacts::ContactsCommand),
    #[command(subcommand, about = "Dashboard statistics")]
    Stats(stats::StatsCommand),
}

pub async fn run(cli: Cli) -> ApiResult<()> {
    let store = Arc::new(Store::open(&PUBLIC_CONFIG.db_path())?);
    let client = Arc::new(ApiClient::from_config(Arc::clone(&store))?);
    match cli.command {
        Commands::Auth(command) => auth::run(&client, command).await,
        Commands::Plot(command) => plot::run(&client, command).await,
        Commands::Draft(command) => draft::run(&client, command).await,
        Commands::Media(command) => media::run(&client, command).await,
        Commands::Requests(command) => requests::run(&client, command).await,
        Commands::Quiz(command) => quiz::run(&client, command).await,
        Commands::Contacts(command) => contacts::run(&client, command).await,
        Commands::Stats(command) => stats::run(&client, command).await,
    }
}

pub(crate) const GREEN: Style = AnsiColor::Green.on_default();
pub(crate) const YELLOW: Style = AnsiColor::Yellow.on_default();
pub(crate) const RED: Style = AnsiColor::Red.on_default();
pub(crate) const DIM: Style = AnsiColor::BrightBlack.on_default();

pub(crate) fn paint(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub(crate) fn status_style(status: PlotStatus) -> Style {
    match status {
        PlotStatus::Available => GREEN,
        PlotStatus::Reserved => YELLOW,
        PlotStatus::Sold => RED,
    }
}

pub(crate) fn status_label(status: PlotStatus) -> String {
    paint(status_style(status), status.as_str())
}
