//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use serde::Serialize;

use crate::api::models::{DonationRequest, DonationStatus, Funding, Page, UserRecord, UserStatus};
use crate::auth::models::{Identity, Role};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::routes::guard::GuardKind;
use crate::routes::{MenuItem, Route};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|name| Cell::new(name).fg(Color::Cyan)).collect()
}

fn new_table(names: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(names));
    table
}

fn status_color(status: DonationStatus) -> Color {
    match status {
        DonationStatus::Pending => Color::Yellow,
        DonationStatus::InProgress => Color::Blue,
        DonationStatus::Done => Color::Green,
        DonationStatus::Canceled => Color::Red,
    }
}

/// Format a donation status as a colored string
pub fn format_status(status: DonationStatus) -> String {
    let text = status.to_string();
    match status {
        DonationStatus::Pending => text.yellow().to_string(),
        DonationStatus::InProgress => text.blue().to_string(),
        DonationStatus::Done => text.green().to_string(),
        DonationStatus::Canceled => text.red().to_string(),
    }
}

/// Serialize for `--format json|yaml`; tables have no serialized form
pub fn render_formatted<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
        OutputFormat::Table => Ok(None),
    }
}

pub fn page_footer<T>(page: &Page<T>) -> String {
    format!("Page {} of {} ({} total)", page.page, page.total_pages().max(1), page.total)
}

fn print_page_footer<T>(page: &Page<T>) {
    println!("{}", page_footer(page).dimmed());
}

pub fn request_table(page: &Page<DonationRequest>) -> Table {
    let mut table = new_table(&["ID", "Recipient", "Blood", "Location", "Date", "Time", "Status"]);
    for request in &page.items {
        table.add_row(vec![
            Cell::new(&request.id),
            Cell::new(&request.recipient_name),
            Cell::new(request.blood_group).fg(Color::Red),
            Cell::new(format!("{}, {}", request.upazila, request.district)),
            Cell::new(request.donation_date.format("%Y-%m-%d")),
            Cell::new(&request.donation_time),
            Cell::new(request.status).fg(status_color(request.status)),
        ]);
    }
    table
}

/// Print a table of donation requests
pub fn print_request_table(page: &Page<DonationRequest>) {
    if page.items.is_empty() {
        info("No donation requests found");
        return;
    }
    println!("{}", request_table(page));
    print_page_footer(page);
}

/// Print detailed donation request
pub fn print_request_detail(request: &DonationRequest) {
    println!("{}", "Donation Request".bold().underline());
    println!();
    println!("  {} {}", "ID:".bold(), request.id);
    println!("  {} {}", "Status:".bold(), format_status(request.status));
    println!("  {} {}", "Recipient:".bold(), request.recipient_name);
    println!("  {} {}", "Blood group:".bold(), request.blood_group.to_string().red());
    println!("  {} {}", "Hospital:".bold(), request.hospital_name);
    println!("  {} {}", "Address:".bold(), request.full_address);
    println!("  {} {}, {}", "Location:".bold(), request.upazila, request.district);
    println!(
        "  {} {} {}",
        "When:".bold(),
        request.donation_date.format("%Y-%m-%d"),
        request.donation_time
    );
    println!(
        "  {} {} <{}>",
        "Requested by:".bold(),
        request.requester_name,
        request.requester_email
    );

    if let Some(donor) = &request.donor {
        println!("  {} {} <{}>", "Donor:".bold(), donor.name, donor.email.cyan());
    }
    if !request.request_message.is_empty() {
        println!();
        println!("  {}", request.request_message);
    }
}

pub fn user_table(page: &Page<UserRecord>) -> Table {
    let mut table = new_table(&["Name", "Email", "Blood", "Location", "Role", "Status"]);
    for user in &page.items {
        let status = match user.status {
            UserStatus::Active => Color::Green,
            UserStatus::Blocked => Color::Red,
        };
        table.add_row(vec![
            Cell::new(&user.name),
            Cell::new(&user.email),
            Cell::new(user.blood_group),
            Cell::new(format!("{}, {}", user.upazila, user.district)),
            Cell::new(user.role),
            Cell::new(user.status).fg(status),
        ]);
    }
    table
}

/// Print a table of users
pub fn print_user_table(page: &Page<UserRecord>) {
    if page.items.is_empty() {
        info("No users found");
        return;
    }
    println!("{}", user_table(page));
    print_page_footer(page);
}

pub fn funding_table(page: &Page<Funding>) -> Table {
    let mut table = new_table(&["Name", "Email", "Amount", "Date"]);
    for funding in &page.items {
        table.add_row(vec![
            Cell::new(&funding.name),
            Cell::new(&funding.email),
            Cell::new(format!("{:.2}", funding.amount)).fg(Color::Green),
            Cell::new(funding.date.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table
}

/// Print a table of funding entries
pub fn print_funding_table(page: &Page<Funding>) {
    if page.items.is_empty() {
        info("No funding received yet");
        return;
    }
    println!("{}", funding_table(page));
    print_page_footer(page);
}

pub fn route_table(routes: &[Route]) -> Table {
    let mut table = new_table(&["Path", "Page", "Access"]);
    for route in routes {
        let access = match route.guard {
            GuardKind::Public => Color::Green,
            GuardKind::Authenticated => Color::Yellow,
            GuardKind::Admin | GuardKind::Volunteer => Color::Red,
        };
        table.add_row(vec![
            Cell::new(route.pattern),
            Cell::new(route.title),
            Cell::new(route.guard).fg(access),
        ]);
    }
    table
}

/// Print the route table
pub fn print_route_table(routes: &[Route]) {
    println!("{}", route_table(routes));
}

/// Print the signed-in identity
pub fn print_identity(identity: &Identity) {
    println!("{}", "Signed in".bold().underline());
    println!();
    println!("  {} {}", "Email:".bold(), identity.email.as_deref().unwrap_or("-"));
    println!("  {} {}", "Name:".bold(), identity.display_name.as_deref().unwrap_or("-"));
    if let Some(photo) = &identity.photo_url {
        println!("  {} {}", "Avatar:".bold(), photo.cyan());
    }
    println!("  {} {:?}", "Method:".bold(), identity.method);
    println!("  {} {}", "UID:".bold(), identity.uid.dimmed());
}

/// Print a role and the dashboard entries it unlocks
pub fn print_role(role: Option<Role>, menu: &[MenuItem]) {
    match role {
        Some(role) => println!("  {} {}", "Role:".bold(), role.to_string().green()),
        None => println!("  {} {}", "Role:".bold(), "none".yellow()),
    }
    println!();
    println!("  {}", "Dashboard:".bold());
    for item in menu {
        println!("    - {} ({})", item.label, item.path.dimmed());
    }
}
