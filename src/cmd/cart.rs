//! Cart commands: catalog, mutations, undo, show, checkout and reset.
//!
//! Every command opens the orchestrator on the saved cart, runs one
//! operation and closes it again, which writes the final state back.

use anyhow::{Result, bail};
use console::style;
use rust_decimal::Decimal;

use cartkit::cart::{CartState, demo_products, find_product};
use cartkit::cart_config::CartConfig;
use cartkit::orchestrator::{CartOrchestrator, Outcome};

fn money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

fn print_errors(state: &CartState) {
    for error in &state.errors {
        println!("{} {}", style("✗").red(), style(error).red());
    }
}

/// Report a settled mutation and write the cart back.
fn finish(orchestrator: CartOrchestrator, outcome: Outcome, done: &str) -> Result<()> {
    let state = orchestrator.state();
    orchestrator.close()?;

    match outcome {
        Outcome::Confirmed => {
            println!("{} {}", style("✓").green(), done);
            print_errors(&state);
        }
        Outcome::Skipped => println!("Nothing to change."),
        Outcome::Kept(message) => {
            println!("{} {}", style("!").yellow(), done);
            println!("  {} (change kept)", style(message).yellow());
        }
        Outcome::Rejected(message) => bail!("{}", message),
        Outcome::RolledBack(message) => {
            bail!("{}; the change was undone", message);
        }
    }
    println!("Total: {}", money(state.totals.total));
    Ok(())
}

pub fn cmd_catalog() {
    println!();
    println!("{:<6} {:<22} {:>10}", "ID", "Product", "Price");
    println!("{:<6} {:<22} {:>10}", "------", "----------------------", "----------");
    for product in demo_products() {
        println!(
            "{:<6} {:<22} {:>10}",
            product.id,
            product.name,
            money(product.price)
        );
    }
    println!();
}

pub async fn cmd_add(config: &CartConfig, product_id: &str, quantity: u32) -> Result<()> {
    let product = find_product(product_id)?;
    let item = product.to_item(quantity)?;

    let orchestrator = config.open_orchestrator();
    let outcome = orchestrator.add_to_cart(item).await;
    finish(
        orchestrator,
        outcome,
        &format!("Added {} × {}", quantity, product.name),
    )
}

pub async fn cmd_remove(config: &CartConfig, id: &str) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    if orchestrator.state().find(id).is_none() {
        bail!("'{}' is not in the cart", id);
    }
    let outcome = orchestrator.remove_item(id).await;
    finish(orchestrator, outcome, &format!("Removed {}", id))
}

pub async fn cmd_quantity(config: &CartConfig, id: &str, quantity: u32) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    if orchestrator.state().find(id).is_none() {
        bail!("'{}' is not in the cart", id);
    }
    let outcome = orchestrator.update_quantity(id, quantity).await;
    finish(
        orchestrator,
        outcome,
        &format!("Set {} quantity to {}", id, quantity),
    )
}

pub async fn cmd_discount(config: &CartConfig, code: &str) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    let outcome = orchestrator.apply_discount(code).await;
    let state = orchestrator.state();
    let done = if state.discount_amount > Decimal::ZERO {
        format!("Applied discount {}", state.discount_code)
    } else if state.discount_code.is_empty() {
        "Discount cleared".to_string()
    } else {
        format!("Discount {} not applied", state.discount_code)
    };
    finish(orchestrator, outcome, &done)
}

pub fn cmd_undo(config: &CartConfig) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    if orchestrator.cart().undo_stack.is_empty() {
        println!("Nothing to undo.");
        return Ok(orchestrator.close()?);
    }
    let state = orchestrator.undo();
    orchestrator.close()?;
    println!(
        "{} Undone. {} item(s), total {}",
        style("↶").cyan(),
        state.items.len(),
        money(state.totals.total)
    );
    Ok(())
}

pub fn cmd_clear_errors(config: &CartConfig) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    let cleared = orchestrator.state().errors.len();
    orchestrator.clear_errors();
    orchestrator.close()?;
    println!("Cleared {} error(s).", cleared);
    Ok(())
}

pub fn cmd_show(config: &CartConfig) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    let cart = orchestrator.cart();
    orchestrator.close()?;
    let state = &cart.state;

    println!();
    println!(
        "{} ({} item(s))",
        style("Your Cart").bold(),
        state.unit_count()
    );
    println!();

    if !state.errors.is_empty() {
        print_errors(state);
        println!("  You can also try `cart undo`.");
        println!();
    }

    if state.items.is_empty() {
        println!("Your cart is empty.");
    } else {
        for item in &state.items {
            println!(
                "  {:<6} {:<22} {:>9} × {:<3} {:>10}",
                item.id,
                item.name,
                money(item.price),
                item.quantity,
                money(item.line_total())
            );
        }
    }
    println!();

    let rate = (config.toml.pricing.tax_rate * Decimal::ONE_HUNDRED).normalize();
    println!("{}", style("Order Summary").bold());
    println!("  {:<20} {:>10}", "Subtotal", money(state.totals.subtotal));
    println!(
        "  {:<20} {:>10}",
        format!("Tax ({}%)", rate),
        money(state.totals.tax)
    );
    println!("  {:<20} {:>10}", "Shipping", money(state.totals.shipping));
    if state.discount_amount > Decimal::ZERO {
        println!(
            "  {:<20} {:>10}",
            format!("Discount ({})", state.discount_code),
            format!("-{}", money(state.discount_amount))
        );
    }
    println!(
        "  {:<20} {:>10}",
        style("Total").bold(),
        style(money(state.totals.total)).bold()
    );
    if !cart.undo_stack.is_empty() {
        println!();
        println!(
            "{}",
            style(format!("{} change(s) can be undone.", cart.undo_stack.len())).dim()
        );
    }
    println!();
    Ok(())
}

pub fn cmd_checkout(config: &CartConfig) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    let state = orchestrator.state();
    let Some(totals) = orchestrator.checkout() else {
        orchestrator.close()?;
        if state.is_loading {
            bail!("An update is still being confirmed; try again shortly");
        }
        bail!("Your cart is empty");
    };
    orchestrator.close()?;

    println!(
        "{} Checkout complete! (demo) Charged {}",
        style("✓").green(),
        money(totals.total)
    );
    Ok(())
}

pub fn cmd_reset(config: &CartConfig) -> Result<()> {
    let orchestrator = config.open_orchestrator();
    orchestrator.reset()?;
    drop(orchestrator);
    println!("Cart reset.");
    Ok(())
}
