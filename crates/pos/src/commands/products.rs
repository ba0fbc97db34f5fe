//! Menu administration. Every handler needs an admin session.

use kasir_core::ProductId;
use kasir_pos::{Terminal, TerminalError};
use kasir_products::{CatalogFilter, ProductForm};

use super::print_product;

pub async fn list(terminal: &Terminal, search: Option<String>) -> anyhow::Result<()> {
    let mut filter = CatalogFilter::new().include_inactive(true);
    if let Some(query) = search {
        filter = filter.search(query);
    }
    for product in terminal.products(&filter).await? {
        print_product(&product);
    }
    Ok(())
}

pub async fn add(
    terminal: &mut Terminal,
    name: String,
    variant: String,
    price: String,
    is_active: bool,
) -> anyhow::Result<()> {
    let form = ProductForm {
        name,
        variant,
        price,
        is_active,
    };
    match terminal.create_product(&form).await {
        Ok(product) => {
            print_product(&product);
            Ok(())
        }
        Err(TerminalError::InvalidProduct(errors)) => {
            anyhow::bail!("invalid product: {}", errors.messages().join(", "))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn toggle(terminal: &mut Terminal, id: ProductId) -> anyhow::Result<()> {
    let product = terminal.toggle_product(id).await?;
    print_product(&product);
    Ok(())
}

pub async fn delete(terminal: &mut Terminal, id: ProductId) -> anyhow::Result<()> {
    terminal.delete_product(id).await?;
    println!("Produk {id} dihapus");
    Ok(())
}
