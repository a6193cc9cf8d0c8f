use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::Subcommand;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::cli::{GREEN, YELLOW, paint};
use crate::config::PUBLIC_CONFIG;
use crate::media::collection::MediaCollection;
use crate::media::commit::{MediaTransport, commit};
use crate::media::item::{MediaId, MediaOrigin};
use crate::media::preview::stage_files;
use crate::store::Store;

#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    /// Seed the working set from the server's current image list
    Pull {
        plot_id: i64,
        /// Replace a working set that still has unuploaded images
        #[arg(long)]
        force: bool,
    },
    /// Show the working set
    Ls { plot_id: i64 },
    /// Stage image files or directories into the working set
    Add {
        plot_id: i64,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove an image from the working set
    Rm { plot_id: i64, id: MediaId },
    /// Make an image the main one
    SetMain {
        plot_id: i64,
        id: MediaId,
        /// Also push the flag to the backend right away
        #[arg(long)]
        now: bool,
    },
    /// Move an image from one position to another (zero-based)
    Move {
        plot_id: i64,
        from: usize,
        to: usize,
    },
    /// Move the main image to the front
    Front { plot_id: i64 },
    /// Push deletions, uploads and the final order to the backend
    Commit { plot_id: i64 },
}

pub async fn run(client: &Arc<ApiClient>, command: MediaCommand) -> ApiResult<()> {
    let store = client.store();
    match command {
        MediaCommand::Pull { plot_id, force } => {
            if !force {
                if let Some(existing) = store.load_working_set(plot_id)? {
                    if existing.new_items().next().is_some() {
                        return Err(ApiError::new(
                            ApiErrorKind::Validation,
                            anyhow!(
                                "working set of plot #{} has unuploaded images, commit them or pass --force",
                                plot_id
                            ),
                        ));
                    }
                }
            }
            let plot = client.fetch_plot(plot_id).await?;
            let collection = MediaCollection::from_server(&plot.images);
            store.save_working_set(plot_id, &collection)?;
            println!("Pulled {} images of plot #{}", collection.len(), plot_id);
            print_collection(&collection);
        }
        MediaCommand::Ls { plot_id } => {
            let collection = load_required(store, plot_id)?;
            print_collection(&collection);
        }
        MediaCommand::Add { plot_id, paths } => {
            let mut collection = load_required(store, plot_id)?;
            let report = stage_files(
                &paths,
                &PUBLIC_CONFIG.preview_dir(),
                PUBLIC_CONFIG.upload_limit_mb,
            )?;
            let rejected = report.failures.len();
            let added = collection.add_files(report.staged);
            store.save_working_set(plot_id, &collection)?;
            if rejected > 0 {
                println!("Staged {} images, {} rejected", added.len(), rejected);
            } else {
                println!("Staged {} images", added.len());
            }
            print_collection(&collection);
        }
        MediaCommand::Rm { plot_id, id } => {
            let mut collection = load_required(store, plot_id)?;
            if !collection.remove(id) {
                return Err(unknown_image(plot_id, id));
            }
            store.save_working_set(plot_id, &collection)?;
            print_collection(&collection);
        }
        MediaCommand::SetMain { plot_id, id, now } => {
            let mut collection = load_required(store, plot_id)?;
            if !collection.set_main(id) {
                return Err(unknown_image(plot_id, id));
            }
            store.save_working_set(plot_id, &collection)?;
            if now {
                match id {
                    MediaId::Server(image_id) => {
                        client.set_main_image(plot_id, image_id).await?;
                        println!("Main flag pushed to the backend");
                    }
                    MediaId::Client(_) => {
                        println!("{} is not uploaded yet, the flag will apply on commit", id);
                    }
                }
            }
            print_collection(&collection);
        }
        MediaCommand::Move { plot_id, from, to } => {
            let mut collection = load_required(store, plot_id)?;
            collection
                .reorder(from, to)
                .map_err(|err| ApiError::new(ApiErrorKind::Validation, err))?;
            store.save_working_set(plot_id, &collection)?;
            print_collection(&collection);
        }
        MediaCommand::Front { plot_id } => {
            let mut collection = load_required(store, plot_id)?;
            collection.promote_main_to_front();
            store.save_working_set(plot_id, &collection)?;
            print_collection(&collection);
        }
        MediaCommand::Commit { plot_id } => {
            let mut collection = load_required(store, plot_id)?;
            match commit(client.as_ref(), plot_id, &mut collection).await {
                Ok(report) => {
                    println!(
                        "Deleted {}, uploaded {}, reordered: {}",
                        report.deleted.len(),
                        report.uploaded.len(),
                        report.reordered
                    );
                    if report.is_clean() {
                        store.clear_working_set(plot_id)?;
                        println!("Working set of plot #{} is in sync and was cleared", plot_id);
                        return Ok(());
                    }
                    // Promotions that did succeed are kept, a re-run
                    // picks up only what is still missing.
                    store.save_working_set(plot_id, &collection)?;
                    for failure in &report.failures {
                        eprintln!("{} {}: {}", failure.phase, failure.id, failure.message);
                    }
                    return Err(ApiError::new(
                        ApiErrorKind::Server,
                        anyhow!(
                            "{} items failed, working set kept for another run",
                            report.failures.len()
                        ),
                    ));
                }
                Err(err) => {
                    store.save_working_set(plot_id, &collection)?;
                    return Err(err.into_api());
                }
            }
        }
    }
    Ok(())
}

fn load_required(store: &Store, plot_id: i64) -> ApiResult<MediaCollection> {
    store.load_working_set(plot_id)?.ok_or_else(|| {
        ApiError::new(
            ApiErrorKind::Validation,
            anyhow!(
                "no working set for plot #{}, run `media pull {}` first",
                plot_id,
                plot_id
            ),
        )
    })
}

fn unknown_image(plot_id: i64, id: MediaId) -> ApiError {
    ApiError::new(
        ApiErrorKind::Validation,
        anyhow!("no image {} in the working set of plot #{}", id, plot_id),
    )
}

fn print_collection(collection: &MediaCollection) {
    if collection.is_empty() {
        println!("No images");
        return;
    }
    for item in collection.items() {
        let marker = if item.is_main {
            format!(" {}", paint(GREEN, "main"))
        } else {
            String::new()
        };
        let origin = match &item.origin {
            MediaOrigin::Existing { path, .. } => path.clone(),
            MediaOrigin::New { .. } => paint(YELLOW, "local"),
        };
        println!(
            "  [{}] {:<18} {}{}  {}",
            item.order,
            item.id().to_string(),
            item.filename,
            marker,
            origin
        );
    }
}
