use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Subcommand};
use log::{error, info};

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::cli::plot::ensure_valid;
use crate::config::PUBLIC_CONFIG;
use crate::media::collection::MediaCollection;
use crate::media::commit::MediaTransport;
use crate::media::item::{MediaItem, MediaOrigin};
use crate::media::preview::{content_fingerprint, stage_files};
use crate::models::plot::{Attachment, Description, LandPlotCreate, PlotStatus};
use crate::store::draft::PlotDraft;
use crate::validate::derive_unit_prices;

#[derive(Debug, Subcommand)]
pub enum DraftCommand {
    /// Print the current draft
    Show,
    /// Change draft fields; every change is saved immediately
    Edit(EditArgs),
    /// Stage image files or directories into the draft
    AddImages {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Create the plot from the draft and upload its images
    Publish,
    /// Drop the draft and its staged previews
    Clear,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub permitted_use: Option<String>,
    /// Area in sotka
    #[arg(long)]
    pub area: Option<f64>,
    #[arg(long)]
    pub specified_area: Option<f64>,
    /// Total price in rubles
    #[arg(long)]
    pub price: Option<i64>,
    #[arg(long)]
    pub status: Option<PlotStatus>,
    /// Keep the published plot out of the catalog
    #[arg(long)]
    pub hidden: bool,
    /// Put the published plot into the catalog
    #[arg(long, conflicts_with = "hidden")]
    pub visible: bool,
    #[arg(long = "cadastral")]
    pub cadastral_numbers: Vec<String>,
    #[arg(long = "feature")]
    pub features: Vec<String>,
    #[arg(long = "communication")]
    pub communications: Vec<String>,
    /// Upload document files and attach them to the draft
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
}

pub async fn run(client: &Arc<ApiClient>, command: DraftCommand) -> ApiResult<()> {
    let store = client.store();
    match command {
        DraftCommand::Show => {
            let draft = store.load_draft()?.unwrap_or_default();
            let images = store.load_draft_images()?;
            if draft.is_blank() && images.is_empty() {
                println!("Draft is empty");
                return Ok(());
            }
            print_draft(&draft);
            if !images.is_empty() {
                println!("Images:");
                for image in &images {
                    let marker = if image.is_main { " main" } else { "" };
                    println!("  [{}] {} {}{}", image.order, image.id(), image.filename, marker);
                }
            }
        }
        DraftCommand::Edit(args) => {
            let mut draft = store.load_draft()?.unwrap_or_default();
            let uploads = args.attachments.clone();
            apply_edit(&mut draft, args);
            if !uploads.is_empty() {
                let outcomes = client.upload_documents(&uploads, "document").await;
                for (path, outcome) in outcomes {
                    match outcome {
                        Ok(document) => {
                            println!("Attached {} ({})", document.name, document.url);
                            draft.attachments.push(Attachment {
                                id: document.id,
                                name: document.name,
                                url: document.url,
                                kind: document.kind,
                            });
                        }
                        Err(err) => error!("Failed to upload {:?}: {}", path, err),
                    }
                }
            }
            store.save_draft(&draft)?;
            println!("Draft saved");
        }
        DraftCommand::AddImages { paths } => {
            let mut collection = MediaCollection::from_items(store.load_draft_images()?);
            let report = stage_files(
                &paths,
                &PUBLIC_CONFIG.preview_dir(),
                PUBLIC_CONFIG.upload_limit_mb,
            )?;
            let rejected = report.failures.len();
            let added = collection.add_files(report.staged);
            store.save_draft_images(collection.items())?;
            if rejected > 0 {
                println!("Staged {} images, {} rejected", added.len(), rejected);
            } else {
                println!("Staged {} images", added.len());
            }
        }
        DraftCommand::Publish => {
            let Some(draft) = store.load_draft()? else {
                return Err(ApiError::new(
                    ApiErrorKind::Validation,
                    anyhow!("нет черновика для публикации"),
                ));
            };
            let images = MediaCollection::from_items(store.load_draft_images()?);
            let payload = draft_payload(&draft);
            ensure_valid(&payload)?;
            verify_staged_sources(&images).await?;

            let created = client.create_plot(&payload).await?;
            info!("Created plot #{} from draft", created.id);

            // Main image goes first so it lands at order zero even if
            // a later upload fails.
            let mut ordered: Vec<&MediaItem> = images.items().iter().collect();
            ordered.sort_by_key(|item| (!item.is_main, item.order));
            for (position, item) in ordered.iter().enumerate() {
                let Some(source) = item.source_file() else {
                    continue;
                };
                let uploaded = client
                    .upload_image(
                        created.id,
                        Path::new(source),
                        &item.filename,
                        item.is_main,
                        position as i64,
                    )
                    .await;
                if let Err(err) = uploaded {
                    // The plot must not stay half-populated.
                    if let Err(cleanup) = client.delete_plot(created.id).await {
                        error!(
                            "Plot #{} left behind after upload failure, delete it manually: {}",
                            created.id, cleanup
                        );
                    }
                    return Err(ApiError::new(
                        err.kind,
                        err.error
                            .context(format!("uploading {} aborted the publish", item.filename)),
                    ));
                }
            }
            store.clear_draft()?;
            println!("Published plot #{} with {} images", created.id, images.len());
        }
        DraftCommand::Clear => {
            for item in store.load_draft_images()? {
                if let MediaOrigin::New { preview, .. } = &item.origin {
                    let _ = std::fs::remove_file(preview);
                }
            }
            store.clear_draft()?;
            println!("Draft cleared");
        }
    }
    Ok(())
}

fn apply_edit(draft: &mut PlotDraft, args: EditArgs) {
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(region) = args.region {
        draft.region = region;
    }
    if let Some(location) = args.location {
        draft.location = location;
    }
    if let Some(category) = args.category {
        draft.land_category = category;
    }
    if let Some(permitted_use) = args.permitted_use {
        draft.permitted_use = permitted_use;
    }
    if args.area.is_some() {
        draft.area = args.area;
    }
    if args.specified_area.is_some() {
        draft.specified_area = args.specified_area;
    }
    if args.price.is_some() {
        draft.price = args.price;
    }
    if let Some(status) = args.status {
        draft.status = status;
    }
    if args.hidden {
        draft.is_visible = false;
    }
    if args.visible {
        draft.is_visible = true;
    }
    if !args.cadastral_numbers.is_empty() {
        draft.cadastral_numbers = args.cadastral_numbers;
    }
    if !args.features.is_empty() {
        draft.features = args.features;
    }
    if !args.communications.is_empty() {
        draft.communications = args.communications;
    }
}

fn draft_payload(draft: &PlotDraft) -> LandPlotCreate {
    let area = draft.area.unwrap_or_default();
    let price = draft.price.unwrap_or_default();
    let (price_per_sotka, price_per_meter) = if area > 0.0 {
        derive_unit_prices(price, area)
    } else {
        (0, 0)
    };
    LandPlotCreate {
        title: draft.title.clone(),
        description: Description {
            text: draft.description.clone(),
            attachments: draft.attachments.clone(),
        },
        cadastral_numbers: draft.cadastral_numbers.clone(),
        area,
        specified_area: draft.specified_area,
        price,
        price_per_sotka,
        price_per_meter: Some(price_per_meter),
        location: draft.location.clone(),
        region: draft.region.clone(),
        land_category: draft.land_category.clone(),
        permitted_use: draft.permitted_use.clone(),
        features: draft.features.clone(),
        communications: draft.communications.clone(),
        status: draft.status,
        is_visible: draft.is_visible,
    }
}

/// The draft only records paths; the files may have changed or moved
/// since staging. Every source must still match its fingerprint before
/// anything is created on the backend.
async fn verify_staged_sources(images: &MediaCollection) -> ApiResult<()> {
    for item in images.items() {
        let MediaOrigin::New {
            file, fingerprint, ..
        } = &item.origin
        else {
            continue;
        };
        let bytes = tokio::fs::read(file)
            .await
            .context(format!("staged image {} is gone", file))?;
        if content_fingerprint(&bytes) != *fingerprint {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                anyhow!("{} изменился после подготовки, добавьте его заново", file),
            ));
        }
    }
    Ok(())
}

fn print_draft(draft: &PlotDraft) {
    let field = |value: &str| {
        if value.is_empty() { "-".to_string() } else { value.to_string() }
    };
    println!("Title: {}", field(&draft.title));
    println!("Region: {} / {}", field(&draft.region), field(&draft.location));
    println!(
        "Category: {} ({})",
        field(&draft.land_category),
        field(&draft.permitted_use)
    );
    match draft.area {
        Some(area) => println!("Area: {} сот.", area),
        None => println!("Area: -"),
    }
    match draft.price {
        Some(price) => println!("Price: {} ₽", price),
        None => println!("Price: -"),
    }
    println!("Status: {}  Visible: {}", draft.status.as_str(), draft.is_visible);
    if !draft.cadastral_numbers.is_empty() {
        println!("Cadastral: {}", draft.cadastral_numbers.join(", "));
    }
    if !draft.features.is_empty() {
        println!("Features: {}", draft.features.join(", "));
    }
    if !draft.communications.is_empty() {
        println!("Communications: {}", draft.communications.join(", "));
    }
    if !draft.description.is_empty() {
        println!("{}", draft.description);
    }
    for attachment in &draft.attachments {
        println!("  doc: {} ({})", attachment.name, attachment.url);
    }
}
