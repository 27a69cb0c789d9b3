//! Contact links, optionally pre-filled for a product inquiry.

use serde_json::json;
use srisri_client::{CatalogClient, ContactLinks};
use srisri_core::ProductId;

use super::{CommandError, print_json};

pub async fn run(client: &CatalogClient, product: Option<String>) -> Result<(), CommandError> {
    let links = client.contact();

    let Some(id) = product else {
        return print_json(&json!({
            "phone": links.phone(),
            "tel": links.tel_url(),
            "whatsapp": links.whatsapp_url(None),
        }));
    };

    let product = client.products().get(&ProductId::new(id)).await?;
    print_json(&json!({
        "phone": links.phone(),
        "tel": links.tel_url(),
        "whatsapp": links.product_whatsapp_url(&product),
        "message": ContactLinks::product_inquiry(&product),
        "image": client.assets().primary_image(&product),
        "price": product.price.format_inr(),
    }))
}
