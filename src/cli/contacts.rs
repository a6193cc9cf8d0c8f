use std::sync::Arc;

use anyhow::anyhow;
use clap::{Args, Subcommand};

use crate::api::contacts::fetch_contacts_cached;
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::models::contact::{ContactInfo, ContactInfoPayload, SocialLink};
use crate::validate::{validate_email, validate_phone};

#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// Show the site contact block (served from cache when fresh)
    Show,
    /// Change parts of the contact block
    Update(UpdateArgs),
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Work hours Monday to Friday, e.g. "9:00 - 18:00"
    #[arg(long)]
    weekdays: Option<String>,
    /// Work hours on the weekend
    #[arg(long)]
    weekend: Option<String>,
    /// Enable WhatsApp under this account
    #[arg(long, conflicts_with = "no_whatsapp")]
    whatsapp: Option<String>,
    #[arg(long)]
    no_whatsapp: bool,
    /// Enable Telegram under this account
    #[arg(long, conflicts_with = "no_telegram")]
    telegram: Option<String>,
    #[arg(long)]
    no_telegram: bool,
    /// Enable VK under this account
    #[arg(long, conflicts_with = "no_vk")]
    vk: Option<String>,
    #[arg(long)]
    no_vk: bool,
}

pub async fn run(client: &Arc<ApiClient>, command: ContactsCommand) -> ApiResult<()> {
    match command {
        ContactsCommand::Show => {
            let info = fetch_contacts_cached(client).await?;
            print_contacts(&info);
        }
        ContactsCommand::Update(args) => {
            // Edits are merged over the live server state, not the cache.
            let current = client.get_contacts().await?;
            let payload = args.into_payload(current)?;
            let updated = client.update_contacts(&payload).await?;
            print_contacts(&updated);
        }
    }
    Ok(())
}

impl UpdateArgs {
    fn into_payload(self, current: ContactInfo) -> ApiResult<ContactInfoPayload> {
        let mut payload = ContactInfoPayload {
            phone: current.phone,
            email: current.email,
            address: current.address,
            work_hours: current.work_hours,
            social_links: current.social_links,
        };
        if let Some(phone) = self.phone {
            if !validate_phone(&phone) {
                return Err(ApiError::new(
                    ApiErrorKind::Validation,
                    anyhow!("неверный формат телефона: {}", phone),
                ));
            }
            payload.phone = phone;
        }
        if let Some(email) = self.email {
            if !validate_email(&email) {
                return Err(ApiError::new(
                    ApiErrorKind::Validation,
                    anyhow!("неверный формат email: {}", email),
                ));
            }
            payload.email = email;
        }
        if let Some(address) = self.address {
            payload.address = address;
        }
        if let Some(weekdays) = self.weekdays {
            payload.work_hours.monday_friday = weekdays;
        }
        if let Some(weekend) = self.weekend {
            payload.work_hours.saturday_sunday = weekend;
        }
        if let Some(username) = self.whatsapp {
            payload.social_links.whatsapp = SocialLink {
                enabled: true,
                username,
            };
        }
        if self.no_whatsapp {
            payload.social_links.whatsapp.enabled = false;
        }
        if let Some(username) = self.telegram {
            payload.social_links.telegram = SocialLink {
                enabled: true,
                username,
            };
        }
        if self.no_telegram {
            payload.social_links.telegram.enabled = false;
        }
        if let Some(username) = self.vk {
            payload.social_links.vk = SocialLink {
                enabled: true,
                username,
            };
        }
        if self.no_vk {
            payload.social_links.vk.enabled = false;
        }
        Ok(payload)
    }
}

fn print_contacts(info: &ContactInfo) {
    println!("Phone:   {}", info.phone);
    println!("Email:   {}", info.email);
    println!("Address: {}", info.address);
    let hours = &info.work_hours;
    if !hours.monday_friday.is_empty() || !hours.saturday_sunday.is_empty() {
        println!("Hours:   пн-пт {}, сб-вс {}", hours.monday_friday, hours.saturday_sunday);
    }
    let socials = [
        ("whatsapp", &info.social_links.whatsapp),
        ("telegram", &info.social_links.telegram),
        ("vk", &info.social_links.vk),
    ];
    for (name, link) in socials {
        if link.enabled {
            println!("{}: {}", name, link.username);
        }
    }
    if let Some(updated) = info.updated_at {
        println!("Updated: {}", updated.format("%Y-%m-%d %H:%M"));
    }
}
