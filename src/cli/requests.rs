use std::sync::Arc;

use anstyle::Style;
use clap::Subcommand;

use crate::api::{ApiClient, ApiResult};
use crate::cli::{DIM, GREEN, RED, YELLOW, paint};
use crate::models::request::{LeadQuery, LeadRequest, RequestStatusUpdate};
use crate::validate::format_phone;

#[derive(Debug, Subcommand)]
pub enum RequestsCommand {
    /// List inbound leads
    List {
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        /// Filter by lead type: quiz, contact_form or callback
        #[arg(long = "type")]
        kind: Option<String>,
        /// Filter by status: new, processing, completed or rejected
        #[arg(long)]
        status: Option<String>,
    },
    /// Change the status or notes of a lead
    Update {
        id: i64,
        #[arg(long)]
        status: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

pub async fn run(client: &Arc<ApiClient>, command: RequestsCommand) -> ApiResult<()> {
    match command {
        RequestsCommand::List {
            skip,
            limit,
            kind,
            status,
        } => {
            let query = LeadQuery {
                skip,
                limit,
                kind,
                status,
            };
            let leads = client.list_requests(&query).await?;
            if leads.is_empty() {
                println!("No requests matched");
                return Ok(());
            }
            for lead in &leads {
                print_lead(lead);
            }
        }
        RequestsCommand::Update { id, status, notes } => {
            let update = RequestStatusUpdate { status, notes };
            let lead = client.update_request(id, &update).await?;
            print_lead(&lead);
        }
    }
    Ok(())
}

fn lead_status_style(status: &str) -> Style {
    match status {
        "new" => YELLOW,
        "processing" => GREEN,
        "rejected" => RED,
        _ => DIM,
    }
}

fn print_lead(lead: &LeadRequest) {
    // Pad before painting, ANSI codes would skew the width.
    let status = paint(lead_status_style(&lead.status), &format!("{:<10}", lead.status));
    println!(
        "#{:<5} {} {} {:<13} {:<18} {}",
        lead.id,
        lead.created_at.format("%Y-%m-%d %H:%M"),
        status,
        lead.kind,
        format_phone(&lead.phone),
        lead.name,
    );
    if let Some(email) = lead.email.as_deref().filter(|value| !value.is_empty()) {
        println!("       email: {}", email);
    }
    if let Some(promo) = lead.promo_code.as_deref() {
        println!("       promo: {}", promo);
    }
    if let Some(message) = lead.message.as_deref().filter(|value| !value.is_empty()) {
        println!("       {}", message);
    }
    if let Some(answers) = &lead.answers {
        println!("       answers: {}", answers);
    }
    if let Some(notes) = lead.notes.as_deref().filter(|value| !value.is_empty()) {
        println!("       notes: {}", paint(DIM, notes));
    }
}
