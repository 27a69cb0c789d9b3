//! Product commands.
//!
//! # Usage
//!
//! ```bash
//! srisri products list --category sarees --price-range 2 --sort price-asc
//! srisri products create --name "Silk Saree" --price 5999 --category sarees \
//!     --image front.jpg --image back.jpg --size "Free Size" --color Red
//! srisri products update p-123 --stock 4 --active false
//! srisri products delete p-123
//! ```

use std::path::PathBuf;

use clap::{Args, Subcommand};
use srisri_client::CatalogClient;
use srisri_core::{
    Color, DEFAULT_PAGE_SIZE, PRICE_RANGES, Price, ProductFilters, ProductId, ProductInput,
    ProductPatch, Size, SortOption,
};

use super::{CommandError, print_json, read_files};

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products
    List(ListArgs),
    /// Show a single product
    Show {
        /// Product ID
        id: String,
    },
    /// Upload images and create a product
    Create(CreateArgs),
    /// Update fields of a product
    Update(UpdateArgs),
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Category slug
    #[arg(long)]
    category: Option<String>,

    /// Free-text search
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    min_price: Option<Price>,

    #[arg(long)]
    max_price: Option<Price>,

    /// Price range preset (1 = under ₹1,000 ... 5 = above ₹50,000)
    #[arg(long, conflicts_with_all = ["min_price", "max_price"])]
    price_range: Option<usize>,

    /// Only active (true) or inactive (false) products
    #[arg(long)]
    active: Option<bool>,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: u32,

    /// Pagination cursor from a previous page's `lastKey`
    #[arg(long)]
    after: Option<String>,

    /// Reorder the fetched page (newest, price-asc, price-desc, name-asc)
    #[arg(long)]
    sort: Option<SortOption>,
}

impl ListArgs {
    fn filters(&self) -> Result<ProductFilters, CommandError> {
        let mut filters = ProductFilters {
            category: self.category.clone(),
            search: self.search.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            is_active: self.active,
            limit: Some(self.limit),
            last_key: self.after.clone(),
        };

        if let Some(index) = self.price_range {
            let range = index
                .checked_sub(1)
                .and_then(|i| PRICE_RANGES.get(i))
                .ok_or(CommandError::UnknownPriceRange(index, PRICE_RANGES.len()))?;
            filters = filters.with_price_range(range);
        }
        Ok(filters)
    }
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Price in rupees
    #[arg(long)]
    price: Price,

    /// Category slug
    #[arg(long)]
    category: String,

    /// Image file to upload (repeatable)
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Already-hosted image URL (repeatable)
    #[arg(long = "image-url")]
    image_urls: Vec<String>,

    /// Size label, e.g. "Free Size" (repeatable)
    #[arg(long = "size")]
    sizes: Vec<Size>,

    /// Color name (repeatable)
    #[arg(long = "color")]
    colors: Vec<Color>,

    #[arg(long, default_value_t = 0)]
    stock: u32,

    /// Create the product hidden from the storefront
    #[arg(long)]
    inactive: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Product ID
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    category: Option<String>,

    /// Image file to upload and append (repeatable)
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Hosted image URL to append (repeatable)
    #[arg(long = "image-url")]
    image_urls: Vec<String>,

    /// Replace the existing images instead of appending
    #[arg(long)]
    replace_images: bool,

    /// Replace sizes (repeatable)
    #[arg(long = "size")]
    sizes: Vec<Size>,

    /// Replace colors (repeatable)
    #[arg(long = "color")]
    colors: Vec<Color>,

    #[arg(long)]
    stock: Option<u32>,

    #[arg(long)]
    active: Option<bool>,
}

impl UpdateArgs {
    fn adds_images(&self) -> bool {
        !self.images.is_empty() || !self.image_urls.is_empty()
    }

    /// Reject flag combinations that would silently do nothing.
    fn check(&self) -> Result<(), CommandError> {
        if self.replace_images && !self.adds_images() {
            return Err(CommandError::ReplaceWithoutImages);
        }
        Ok(())
    }
}

pub async fn run(client: &CatalogClient, action: ProductAction) -> Result<(), CommandError> {
    match action {
        ProductAction::List(args) => list(client, &args).await,
        ProductAction::Show { id } => {
            let product = client.products().get(&ProductId::new(id)).await?;
            print_json(&product)
        }
        ProductAction::Create(args) => create(client, args).await,
        ProductAction::Update(args) => update(client, args).await,
        ProductAction::Delete { id } => {
            let id = ProductId::new(id);
            client.products().delete(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

async fn list(client: &CatalogClient, args: &ListArgs) -> Result<(), CommandError> {
    let mut page = client.products().list(&args.filters()?).await?;
    if let Some(sort) = args.sort {
        sort.apply(&mut page.products);
    }
    print_json(&page)
}

async fn create(client: &CatalogClient, args: CreateArgs) -> Result<(), CommandError> {
    let mut images = args.image_urls;
    if !args.images.is_empty() {
        let files = read_files(&args.images).await?;
        let batch = client
            .uploader()
            .upload_product_images(images.len(), files)
            .await?;
        images.extend(batch.into_urls()?);
    }

    let input = ProductInput {
        name: args.name,
        description: args.description,
        price: args.price,
        category: args.category,
        images,
        sizes: args.sizes,
        colors: args.colors,
        stock: args.stock,
        is_active: !args.inactive,
    };

    let product = client.products().create(input).await?;
    print_json(&product)
}

async fn update(client: &CatalogClient, args: UpdateArgs) -> Result<(), CommandError> {
    args.check()?;
    let id = ProductId::new(args.id.clone());
    let products = client.products();

    let images = if !args.adds_images() {
        None
    } else {
        let mut images = if args.replace_images {
            Vec::new()
        } else {
            products.get(&id).await?.images
        };
        images.extend(args.image_urls);

        if !args.images.is_empty() {
            let files = read_files(&args.images).await?;
            let batch = client
                .uploader()
                .upload_product_images(images.len(), files)
                .await?;
            images.extend(batch.into_urls()?);
        }
        Some(images)
    };

    let patch = ProductPatch {
        name: args.name,
        description: args.description,
        price: args.price,
        category: args.category,
        images,
        sizes: non_empty(args.sizes),
        colors: non_empty(args.colors),
        stock: args.stock,
        is_active: args.active,
    };
    if patch.is_empty() {
        return Err(CommandError::NothingToUpdate);
    }

    let product = products.update(&id, &patch).await?;
    print_json(&product)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
