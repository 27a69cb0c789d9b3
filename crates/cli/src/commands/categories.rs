//! Category commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use srisri_client::CatalogClient;
use srisri_core::{CategoryId, CategoryInput, CategoryPatch, Slug};

use super::{CommandError, print_json, read_files};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories in display order
    List {
        /// Only active (true) or inactive (false) categories
        #[arg(long)]
        active: Option<bool>,
    },
    /// Show a single category
    Show {
        /// Category ID
        id: String,
    },
    /// Create a category
    Create(CreateArgs),
    /// Update fields of a category (the slug cannot change)
    Update(UpdateArgs),
    /// Delete a category
    Delete {
        /// Category ID
        id: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    name: String,

    /// URL slug; derived from the name when omitted
    #[arg(long)]
    slug: Option<String>,

    #[arg(long, default_value = "")]
    description: String,

    /// Image file to upload
    #[arg(long, conflicts_with = "image_url")]
    image: Option<PathBuf>,

    /// Already-hosted image URL
    #[arg(long)]
    image_url: Option<String>,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    display_order: i32,

    /// Create the category hidden from the storefront
    #[arg(long)]
    inactive: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Category ID
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Image file to upload as the new category image
    #[arg(long, conflicts_with = "image_url")]
    image: Option<PathBuf>,

    #[arg(long)]
    image_url: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    display_order: Option<i32>,

    #[arg(long)]
    active: Option<bool>,
}

pub async fn run(client: &CatalogClient, action: CategoryAction) -> Result<(), CommandError> {
    match action {
        CategoryAction::List { active } => {
            let categories = client.categories().list(active).await?;
            print_json(&categories)
        }
        CategoryAction::Show { id } => {
            let category = client.categories().get(&CategoryId::new(id)).await?;
            print_json(&category)
        }
        CategoryAction::Create(args) => create(client, args).await,
        CategoryAction::Update(args) => update(client, args).await,
        CategoryAction::Delete { id } => {
            let id = CategoryId::new(id);
            client.categories().delete(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

async fn create(client: &CatalogClient, args: CreateArgs) -> Result<(), CommandError> {
    let mut input = CategoryInput::from_name(&args.name)?;
    if let Some(slug) = &args.slug {
        input.slug = Slug::parse(slug)?;
    }
    input.description = args.description;
    input.display_order = args.display_order;
    input.is_active = !args.inactive;
    input.image_url = image_url(client, args.image, args.image_url)
        .await?
        .unwrap_or_default();

    let category = client.categories().create(&input).await?;
    print_json(&category)
}

async fn update(client: &CatalogClient, args: UpdateArgs) -> Result<(), CommandError> {
    let patch = CategoryPatch {
        name: args.name,
        description: args.description,
        image_url: image_url(client, args.image, args.image_url).await?,
        display_order: args.display_order,
        is_active: args.active,
    };
    if patch.is_empty() {
        return Err(CommandError::NothingToUpdate);
    }

    let category = client
        .categories()
        .update(&CategoryId::new(args.id), &patch)
        .await?;
    print_json(&category)
}

/// Upload `image` if given, otherwise pass `url` through.
async fn image_url(
    client: &CatalogClient,
    image: Option<PathBuf>,
    url: Option<String>,
) -> Result<Option<String>, CommandError> {
    let Some(path) = image else {
        return Ok(url);
    };
    let files = read_files(&[path]).await?;
    let mut urls = client.uploader().upload_many(files).await.into_urls()?;
    Ok(urls.pop())
}
