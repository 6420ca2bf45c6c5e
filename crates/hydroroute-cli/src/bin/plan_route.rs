//! CLI tool to plan a visiting order over observation stations.
//!
//! Resolves each keyword against the station directory, then prints the
//! suggested route with per-leg distances.

use clap::Parser;
use hydroroute_client::StationClient;
use hydroroute_core::models::{Stop, END_STOP_ID, START_STOP_ID};
use hydroroute_core::resolver;
use hydroroute_core::sequencer::compute_order;
use hydroroute_core::spatial::haversine_distance_m;

/// Plan a station visiting route (first keyword = start, last = destination)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Station directory base URL
    #[arg(long, default_value = "http://localhost:8000")]
    api_base: String,

    /// Station keywords, in entry order
    #[arg(required = true, num_args = 2..)]
    keywords: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!(
        "Resolving {} stations via {}...",
        args.keywords.len(),
        args.api_base
    );
    let client = StationClient::new(&args.api_base, None);

    let last = args.keywords.len() - 1;
    let mut stops = Vec::with_capacity(args.keywords.len());
    for (index, keyword) in args.keywords.iter().enumerate() {
        let id = match index {
            0 => START_STOP_ID.to_string(),
            i if i == last => END_STOP_ID.to_string(),
            i => format!("stop-{i}"),
        };
        let mut stop = Stop::new(id);
        stop.set_keyword(keyword);

        match resolver::resolve(&client, keyword).await {
            Some(place) => {
                println!(
                    "  {} -> {} ({:.4}, {:.4})",
                    keyword, place.name, place.coords.lat, place.coords.lng
                );
                stop.apply_place(place);
            }
            None => println!("  {} -> no match", keyword),
        }
        stops.push(stop);
    }

    let route = compute_order(&stops);
    println!();
    println!("{}", route.outcome.message());
    if !route.outcome.is_reordered() {
        return Ok(());
    }

    let mut previous = None;
    let mut total_m = 0.0;
    for (index, stop) in route.stops.iter().enumerate() {
        let label = stop.resolved_name.as_deref().unwrap_or(&stop.keyword);
        match (previous, stop.position) {
            (Some(from), Some(to)) => {
                let leg_m = haversine_distance_m(from, to);
                total_m += leg_m;
                println!("  {}. {} ({:.1} km)", index + 1, label, leg_m / 1000.0);
            }
            (_, Some(_)) => println!("  {}. {}", index + 1, label),
            (_, None) => println!("  {}. {} (unresolved, visit order not computed)", index + 1, label),
        }
        previous = stop.position.or(previous);
    }
    println!("Total: {:.1} km", total_m / 1000.0);

    Ok(())
}
