//! Storefront presentation helpers: contact links and image URLs.

use srisri_core::{PLACEHOLDER_IMAGE, Product};
use url::Url;

use crate::config::ContactConfig;

const WHATSAPP_BASE: &str = "https://wa.me/";

/// Phone and WhatsApp call-to-action links.
#[derive(Debug, Clone)]
pub struct ContactLinks {
    phone: String,
    whatsapp: String,
}

impl ContactLinks {
    #[must_use]
    pub fn new(config: &ContactConfig) -> Self {
        Self {
            phone: config.phone.clone(),
            whatsapp: config.whatsapp.clone(),
        }
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// `tel:` link for the shop phone.
    #[must_use]
    pub fn tel_url(&self) -> String {
        let number: String = self.phone.chars().filter(|c| !c.is_whitespace()).collect();
        format!("tel:{number}")
    }

    /// `wa.me` chat link, optionally pre-filled with `message`.
    #[must_use]
    pub fn whatsapp_url(&self, message: Option<&str>) -> String {
        let digits: String = self.whatsapp.chars().filter(char::is_ascii_digit).collect();
        let link = format!("{WHATSAPP_BASE}{digits}");

        match (message, Url::parse(&link)) {
            (Some(text), Ok(mut url)) => {
                url.query_pairs_mut().append_pair("text", text);
                url.into()
            }
            _ => link,
        }
    }

    /// The message a customer sends when asking about `product`.
    #[must_use]
    pub fn product_inquiry(product: &Product) -> String {
        format!("Hi, I'm interested in {} (₹{})", product.name, product.price)
    }

    /// WhatsApp link pre-filled with the inquiry for `product`.
    #[must_use]
    pub fn product_whatsapp_url(&self, product: &Product) -> String {
        self.whatsapp_url(Some(&Self::product_inquiry(product)))
    }
}

/// Resolves stored image references to displayable URLs.
///
/// Absolute URLs and root-relative paths pass through. Bare storage keys are
/// joined onto the CDN origin when one is configured.
#[derive(Debug, Clone, Default)]
pub struct AssetUrls {
    cdn: Option<Url>,
}

impl AssetUrls {
    #[must_use]
    pub const fn new(cdn: Option<Url>) -> Self {
        Self { cdn }
    }

    #[must_use]
    pub fn resolve(&self, image: &str) -> String {
        let passthrough = image.starts_with("http://") || image.starts_with("https://") || image.starts_with('/');
        match &self.cdn {
            Some(cdn) if !passthrough => format!("{}/{image}", cdn.as_str().trim_end_matches('/')),
            _ => image.to_owned(),
        }
    }

    /// URL of the product's primary image, or the placeholder.
    #[must_use]
    pub fn primary_image(&self, product: &Product) -> String {
        product
            .primary_image()
            .map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), |image| self.resolve(image))
    }

    /// All image URLs of a product, in order.
    #[must_use]
    pub fn gallery(&self, product: &Product) -> Vec<String> {
        product.images.iter().map(|image| self.resolve(image)).collect()
    }
}
