use std::sync::Arc;

use anyhow::anyhow;
use clap::{Args, Subcommand};

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::cli::{DIM, paint, status_label, status_style};
use crate::models::plot::{
    Attachment, Description, LandPlot, LandPlotCreate, LandPlotUpdate, PlotQuery, PlotStatus,
};
use crate::validate::{derive_unit_prices, validate_plot};

#[derive(Debug, Subcommand)]
pub enum PlotCommand {
    /// List plots from the catalog
    List(ListArgs),
    /// Show one plot in full
    Show { id: i64 },
    /// Create a plot directly, without going through the draft
    Create(CreateArgs),
    /// Update fields of an existing plot
    Update {
        id: i64,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Toggle catalog visibility: `on` or `off`
    Visibility { id: i64, state: String },
    /// Delete a plot and everything attached to it
    Delete {
        id: i64,
        /// Deletion is permanent, require explicit confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Upload documents and attach them to a plot's description
    Attach {
        id: i64,
        #[arg(required = true)]
        files: Vec<std::path::PathBuf>,
        /// Document type stored with each attachment
        #[arg(long, default_value = "document")]
        kind: String,
    },
    /// Download an attached document
    Download {
        id: i64,
        /// Attachment id or name, as shown by `plot show`
        document: String,
        /// Output path, defaults to the attachment name
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },
    /// Known regions, locations and land categories
    Refs {
        /// Restrict locations to one region
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Include hidden plots (requires a session)
    #[arg(long)]
    pub all: bool,
    /// Print only the number of matching plots
    #[arg(long)]
    pub count: bool,
    #[arg(long)]
    pub search: Option<String>,
    /// available, reserved or sold
    #[arg(long)]
    pub status: Option<PlotStatus>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub price_min: Option<i64>,
    #[arg(long)]
    pub price_max: Option<i64>,
    #[arg(long)]
    pub area_min: Option<f64>,
    #[arg(long)]
    pub area_max: Option<f64>,
    #[arg(long)]
    pub skip: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl ListArgs {
    fn query(&self) -> PlotQuery {
        PlotQuery {
            search: self.search.clone(),
            status: self.status,
            category: self.category.clone(),
            price_min: self.price_min,
            price_max: self.price_max,
            area_min: self.area_min,
            area_max: self.area_max,
            region: self.region.clone(),
            location: self.location.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub region: String,
    /// Settlement shown in the catalog
    #[arg(long)]
    pub location: String,
    /// Land category
    #[arg(long)]
    pub category: String,
    /// Permitted land use (ВРИ)
    #[arg(long)]
    pub permitted_use: String,
    /// Area in sotka
    #[arg(long)]
    pub area: f64,
    /// Total price in rubles
    #[arg(long)]
    pub price: i64,
    #[arg(long)]
    pub specified_area: Option<f64>,
    #[arg(long)]
    pub status: Option<PlotStatus>,
    /// Keep the plot out of the public catalog
    #[arg(long)]
    pub hidden: bool,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "cadastral")]
    pub cadastral_numbers: Vec<String>,
    #[arg(long = "feature")]
    pub features: Vec<String>,
    #[arg(long = "communication")]
    pub communications: Vec<String>,
}

impl CreateArgs {
    fn into_payload(self) -> LandPlotCreate {
        let (price_per_sotka, price_per_meter) = if self.area > 0.0 {
            derive_unit_prices(self.price, self.area)
        } else {
            (0, 0)
        };
        LandPlotCreate {
            title: self.title,
            description: Description {
                text: self.description.unwrap_or_default(),
                attachments: Vec::new(),
            },
            cadastral_numbers: self.cadastral_numbers,
            area: self.area,
            specified_area: self.specified_area,
            price: self.price,
            price_per_sotka,
            price_per_meter: Some(price_per_meter),
            location: self.location,
            region: self.region,
            land_category: self.category,
            permitted_use: self.permitted_use,
            features: self.features,
            communications: self.communications,
            status: self.status.unwrap_or_default(),
            is_visible: !self.hidden,
        }
    }
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub permitted_use: Option<String>,
    /// Area in sotka; unit prices are recomputed
    #[arg(long)]
    pub area: Option<f64>,
    /// Total price in rubles; unit prices are recomputed
    #[arg(long)]
    pub price: Option<i64>,
    #[arg(long)]
    pub specified_area: Option<f64>,
    #[arg(long)]
    pub status: Option<PlotStatus>,
    #[arg(long)]
    pub description: Option<String>,
    /// Replaces the whole list when given
    #[arg(long = "cadastral")]
    pub cadastral_numbers: Vec<String>,
    #[arg(long = "feature")]
    pub features: Vec<String>,
    #[arg(long = "communication")]
    pub communications: Vec<String>,
}

impl UpdateArgs {
    fn into_update(self) -> LandPlotUpdate {
        LandPlotUpdate {
            title: self.title,
            description: self.description.map(|text| Description {
                text,
                attachments: Vec::new(),
            }),
            cadastral_numbers: none_when_empty(self.cadastral_numbers),
            area: self.area,
            specified_area: self.specified_area,
            price: self.price,
            price_per_sotka: None,
            price_per_meter: None,
            location: self.location,
            region: self.region,
            land_category: self.category,
            permitted_use: self.permitted_use,
            features: none_when_empty(self.features),
            communications: none_when_empty(self.communications),
            status: self.status,
            is_visible: None,
        }
    }
}

fn none_when_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

/// Runs the pre-flight field checks and prints every problem before
/// refusing the payload.
pub(crate) fn ensure_valid(payload: &LandPlotCreate) -> ApiResult<()> {
    let problems = validate_plot(payload);
    if problems.is_empty() {
        return Ok(());
    }
    for problem in &problems {
        eprintln!("{}", problem);
    }
    Err(ApiError::new(
        ApiErrorKind::Validation,
        anyhow!("участок не прошел проверку"),
    ))
}

pub async fn run(client: &Arc<ApiClient>, command: PlotCommand) -> ApiResult<()> {
    match command {
        PlotCommand::List(args) => {
            let query = args.query();
            if args.count {
                let count = if args.all {
                    client.admin_plot_count(&query).await?
                } else {
                    client.plot_count(&query).await?
                };
                println!("{}", count.total);
                return Ok(());
            }
            let plots = if args.all {
                client.admin_list_plots(&query).await?
            } else {
                client.list_plots(&query).await?
            };
            if plots.is_empty() {
                println!("No plots matched");
                return Ok(());
            }
            for plot in &plots {
                let hidden = if plot.is_visible {
                    String::new()
                } else {
                    format!(" {}", paint(DIM, "hidden"))
                };
                // Pad before painting, ANSI codes would skew the width.
                let status = paint(
                    status_style(plot.status),
                    &format!("{:<9}", plot.status.as_str()),
                );
                println!(
                    "#{:<5} {} {:>12} ₽ {:>8} сот.  {}{}",
                    plot.id, status, plot.price, plot.area, plot.title, hidden
                );
            }
        }
        PlotCommand::Show { id } => {
            let plot = if client.has_session() {
                client.admin_get_plot(id).await?
            } else {
                client.get_plot(id).await?
            };
            print_plot(&plot);
        }
        PlotCommand::Create(args) => {
            let payload = args.into_payload();
            ensure_valid(&payload)?;
            let created = client.create_plot(&payload).await?;
            println!("Created plot #{}", created.id);
        }
        PlotCommand::Update { id, fields } => {
            let mut update = fields.into_update();
            if update == LandPlotUpdate::default() {
                println!("Nothing to update");
                return Ok(());
            }
            if update.price.is_some() || update.area.is_some() {
                let current = client.admin_get_plot(id).await?;
                let price = update.price.unwrap_or(current.price);
                let area = update.area.unwrap_or(current.area);
                if area > 0.0 {
                    let (per_sotka, per_meter) = derive_unit_prices(price, area);
                    update.price_per_sotka = Some(per_sotka);
                    update.price_per_meter = Some(per_meter);
                }
            }
            let updated = client.update_plot(id, &update).await?;
            println!("Updated plot #{}", updated.id);
            print_plot(&updated);
        }
        PlotCommand::Visibility { id, state } => {
            let visible = match state.as_str() {
                "on" => true,
                "off" => false,
                other => {
                    return Err(ApiError::new(
                        ApiErrorKind::Validation,
                        anyhow!("expected `on` or `off`, got {:?}", other),
                    ));
                }
            };
            let plot = client.set_plot_visibility(id, visible).await?;
            if plot.is_visible {
                println!("Plot #{} is now visible in the catalog", plot.id);
            } else {
                println!("Plot #{} is hidden from the catalog", plot.id);
            }
        }
        PlotCommand::Delete { id, yes } => {
            if !yes {
                return Err(ApiError::new(
                    ApiErrorKind::Validation,
                    anyhow!("deleting plot #{} is permanent, pass --yes to confirm", id),
                ));
            }
            client.delete_plot(id).await?;
            client.store().clear_working_set(id)?;
            println!("Deleted plot #{}", id);
        }
        PlotCommand::Attach { id, files, kind } => {
            let current = client.admin_get_plot(id).await?;
            let outcomes = client.upload_documents(&files, &kind).await;
            let mut attachments = current.description.attachments.clone();
            let mut attached = 0usize;
            let mut failed = 0usize;
            for (path, outcome) in outcomes {
                match outcome {
                    Ok(document) => {
                        println!("Uploaded {} ({})", document.name, document.url);
                        attachments.push(Attachment {
                            id: document.id,
                            name: document.name,
                            url: document.url,
                            kind: document.kind,
                        });
                        attached += 1;
                    }
                    Err(err) => {
                        log::error!("Failed to upload {:?}: {}", path, err);
                        failed += 1;
                    }
                }
            }
            if attached > 0 {
                let update = LandPlotUpdate {
                    description: Some(Description {
                        text: current.description.text,
                        attachments,
                    }),
                    ..Default::default()
                };
                client.update_plot(id, &update).await?;
            }
            if failed > 0 {
                println!("Attached {} documents to plot #{}, {} failed", attached, id, failed);
            } else {
                println!("Attached {} documents to plot #{}", attached, id);
            }
        }
        PlotCommand::Download { id, document, out } => {
            let plot = if client.has_session() {
                client.admin_get_plot(id).await?
            } else {
                client.get_plot(id).await?
            };
            let attachment = plot
                .description
                .attachments
                .iter()
                .find(|attachment| attachment.id == document || attachment.name == document)
                .ok_or_else(|| {
                    ApiError::new(
                        ApiErrorKind::Validation,
                        anyhow!("no document {:?} attached to plot #{}", document, id),
                    )
                })?;
            let bytes = client.download_file(&attachment.url).await?;
            let target = out.unwrap_or_else(|| std::path::PathBuf::from(&attachment.name));
            tokio::fs::write(&target, &bytes).await?;
            println!("Saved {} ({} bytes)", target.display(), bytes.len());
        }
        PlotCommand::Refs { region } => {
            let regions = client.list_regions().await?;
            let locations = client.list_locations(region.as_deref()).await?;
            let categories = client.list_categories().await?;
            println!("Regions:");
            for name in regions {
                println!("  {}", name);
            }
            println!("Locations:");
            for name in locations {
                println!("  {}", name);
            }
            println!("Categories:");
            for name in categories {
                println!("  {}", name);
            }
        }
    }
    Ok(())
}

fn print_plot(plot: &LandPlot) {
    println!("#{} {}", plot.id, plot.title);
    let visibility = if plot.is_visible {
        "visible".to_string()
    } else {
        paint(DIM, "hidden")
    };
    println!(
        "Status: {}  Catalog: {}",
        status_label(plot.status),
        visibility
    );
    println!("Region: {} / {}", plot.region, plot.location);
    println!("Category: {} ({})", plot.land_category, plot.permitted_use);
    match plot.specified_area {
        Some(specified) => println!("Area: {} сот. (уточненная {} сот.)", plot.area, specified),
        None => println!("Area: {} сот.", plot.area),
    }
    println!("Price: {} ₽ ({} ₽/сот.)", plot.price, plot.price_per_sotka);
    if !plot.cadastral_numbers.is_empty() {
        println!("Cadastral: {}", plot.cadastral_numbers.join(", "));
    }
    if !plot.features.is_empty() {
        println!("Features: {}", plot.features.join(", "));
    }
    if !plot.communications.is_empty() {
        println!("Communications: {}", plot.communications.join(", "));
    }
    if !plot.description.text.is_empty() {
        println!("{}", plot.description.text);
    }
    for attachment in &plot.description.attachments {
        println!("  doc: {} ({})", attachment.name, attachment.url);
    }
    if !plot.images.is_empty() {
        let mut images: Vec<_> = plot.images.iter().collect();
        images.sort_by_key(|image| image.order);
        println!("Images:");
        for image in images {
            let marker = if image.is_main { " main" } else { "" };
            println!("  [{}] #{} {}{}", image.order, image.id, image.filename, marker);
        }
    }
}
