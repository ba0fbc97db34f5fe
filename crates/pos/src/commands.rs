//! Subcommand handlers. Each one drives the [`Terminal`] and prints for a
//! human at the counter.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use secrecy::SecretString;

use kasir_core::TransactionId;
use kasir_pos::{CheckoutOutcome, Terminal};
use kasir_products::{CatalogFilter, Product, VariantFilter};
use kasir_sales::{HistoryFilter, Receipt, format_date_time};

pub mod products;

pub async fn sign_in(
    terminal: &mut Terminal,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    match (email, password) {
        (Some(email), Some(password)) => {
            terminal
                .sign_in(&email, &SecretString::from(password))
                .await
                .with_context(|| format!("sign-in failed for {email}"))?;
        }
        _ if terminal.session().is_authenticated() => {}
        _ => bail!("not signed in: pass --email and --password"),
    }

    let session = terminal.session();
    let who = session
        .profile()
        .map(|p| p.display_name().to_string())
        .unwrap_or_default();
    tracing::debug!(user = %who, role = ?session.role(), "session ready");
    Ok(())
}

pub async fn catalog(
    terminal: &mut Terminal,
    search: Option<String>,
    variant: Option<String>,
) -> anyhow::Result<()> {
    terminal.load_menu().await?;

    let mut filter = CatalogFilter::new().variant(variant.map(VariantFilter::Only).unwrap_or_default());
    if let Some(query) = search {
        filter = filter.search(query);
    }

    let shown = terminal.menu(&filter);
    if shown.is_empty() {
        println!("Tidak ada produk");
    }
    for product in shown {
        print_product(product);
    }
    Ok(())
}

pub async fn sell(
    terminal: &mut Terminal,
    items: &[String],
    paid: &str,
    save_receipt: Option<PathBuf>,
) -> anyhow::Result<()> {
    terminal.load_menu().await?;

    for arg in items {
        let (variant, qty) = parse_item(arg)?;
        let product_id = terminal
            .menu(&CatalogFilter::new())
            .into_iter()
            .find(|p| p.variant.eq_ignore_ascii_case(&variant))
            .map(|p| p.id)
            .with_context(|| format!("no active product for variant {variant:?}"))?;
        let added = terminal.add_to_cart(product_id)?;
        terminal
            .cart_mut()
            .set_quantity(product_id, i64::from(added.quantity) + i64::from(qty) - 1);
    }

    terminal.begin_checkout();
    terminal.enter_paid(paid);

    match terminal.checkout().await? {
        CheckoutOutcome::Completed(receipt) => {
            print!("{}", terminal.render_receipt(&receipt));
            if let Some(dir) = save_receipt {
                save(terminal, &receipt, &dir).await?;
            }
            Ok(())
        }
        CheckoutOutcome::Disabled(quote) if quote.total.is_zero() => bail!("cart is empty"),
        CheckoutOutcome::Disabled(quote) => bail!(
            "not enough paid: total {}, paid {}, change {}",
            quote.total.to_rupiah(),
            quote.paid.to_rupiah(),
            quote.change_label()
        ),
    }
}

pub async fn history(
    terminal: &Terminal,
    search: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let offset = terminal.settings().offset;
    let mut filter = HistoryFilter::new(offset).start_date(from).end_date(to);
    if let Some(query) = search {
        filter = filter.search(query);
    }

    let history = terminal.history(&filter).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    for tx in &history.transactions {
        println!(
            "{}  {}  {:<16}  {:>12}  {}",
            tx.transaction_code,
            format_date_time(tx.created_at, offset),
            tx.cashier_name().unwrap_or("-"),
            tx.total.to_rupiah(),
            tx.id,
        );
    }
    println!(
        "{} transaksi, pendapatan {}, rata-rata {}",
        history.summary.count,
        history.summary.revenue.to_rupiah(),
        history.summary.average.to_rupiah(),
    );
    Ok(())
}

pub async fn receipt(
    terminal: &Terminal,
    id: TransactionId,
    save_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let receipt = terminal.receipt(id).await?;
    print!("{}", terminal.render_receipt(&receipt));
    if let Some(dir) = save_dir {
        save(terminal, &receipt, &dir).await?;
    }
    Ok(())
}

pub async fn dashboard(terminal: &Terminal, json: bool) -> anyhow::Result<()> {
    let dashboard = terminal.dashboard().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!("Hari ini");
    println!("  Transaksi : {}", dashboard.today.total_transactions);
    println!("  Pendapatan: {}", dashboard.today.total_revenue.to_rupiah());
    println!("  Rata-rata : {}", dashboard.today.average_transaction.to_rupiah());

    println!("Terlaris");
    if dashboard.best_sellers.is_empty() {
        println!("  Belum ada penjualan");
    }
    for (rank, item) in dashboard.best_sellers.iter().enumerate() {
        println!(
            "  {}. {} {} - {} terjual ({})",
            rank + 1,
            item.name,
            item.variant,
            item.total_sold,
            item.total_revenue.to_rupiah()
        );
    }

    println!("Penjualan {} hari terakhir", dashboard.daily_sales.len());
    for point in dashboard.chart() {
        println!(
            "  {:<7} {:>12}  {} transaksi",
            point.label,
            point.revenue.to_rupiah(),
            point.transactions
        );
    }
    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "{}  {:<28} {:>10}{}",
        product.id,
        product.display_name(),
        product.price.to_rupiah(),
        if product.is_active { "" } else { "  (nonaktif)" }
    );
}

async fn save(terminal: &Terminal, receipt: &Receipt, dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(receipt.file_name());
    tokio::fs::write(&path, terminal.render_receipt(receipt))
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "receipt saved");
    Ok(())
}

/// `"Matcha:3"` → `("Matcha", 3)`; a bare variant means one.
fn parse_item(arg: &str) -> anyhow::Result<(String, u32)> {
    let (variant, qty) = match arg.rsplit_once(':') {
        Some((variant, qty)) => {
            let qty: u32 = qty
                .trim()
                .parse()
                .with_context(|| format!("bad quantity in {arg:?}"))?;
            (variant, qty)
        }
        None => (arg, 1),
    };

    let variant = variant.trim();
    if variant.is_empty() {
        bail!("missing variant in {arg:?}");
    }
    if qty == 0 {
        bail!("quantity must be at least 1 in {arg:?}");
    }
    Ok((variant.to_string(), qty))
}
