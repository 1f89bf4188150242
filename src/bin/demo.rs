//! Drives a reconciler backed by a local file, and prints what the views would show.
//!
//! Usage: `dayplanner-demo [path/to/tasks.json]`. Set `RUST_LOG=debug` for more details.

use std::error::Error;
use std::path::PathBuf;

use chrono::{Duration, Utc};

use dayplanner::config::Settings;
use dayplanner::reconciler::NewAppointment;
use dayplanner::store::LocalStore;
use dayplanner::utils::{print_calendar, print_list_projection};
use dayplanner::view::{ViewController, ViewEvent};
use dayplanner::{Category, Reconciler, Task};

const DEFAULT_STORE_FILE: &str = "dayplanner_tasks.json";


#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));

    let store = match LocalStore::from_file(&path) {
        Ok(store) => store,
        Err(err) => {
            log::warn!("Invalid store file: {}. Using an empty store", err);
            LocalStore::new(&path)
        }
    };
    let mut reconciler = Reconciler::new(store, Settings::default());
    reconciler.set_delete_confirmation(|task: &Task| {
        println!("Deleting {:?} (confirmed automatically)", task.description());
        true
    });

    println!("---- before -----");
    print_list_projection(&reconciler.derive_list_projection());

    let groceries = reconciler.add_task("buy groceries").await?;
    let placeholder = reconciler.add_task("").await?;
    let report = reconciler.add_task("write the weekly report").await?;

    let start = Utc::now() + Duration::hours(1);
    reconciler.schedule_task(report.id(), start, start + Duration::hours(2)).await?;
    reconciler.add_appointment(NewAppointment {
        title: "dentist".to_string(),
        start_date: start + Duration::days(1),
        end_date: start + Duration::days(1) + Duration::minutes(30),
    }).await?;
    reconciler.complete_task(groceries.id()).await?;
    reconciler.delete_task(placeholder.id()).await?;
    reconciler.refresh();

    println!("---- after -----");
    print_list_projection(&reconciler.derive_list_projection());
    print_calendar(&reconciler.derive_calendar_projection());
    println!("{} unscheduled, {} scheduled, {} completed",
        reconciler.count_tasks(Category::Unscheduled),
        reconciler.count_tasks(Category::Scheduled),
        reconciler.count_tasks(Category::Completed));

    let mut views = ViewController::new(1280, reconciler.settings().compact_layout_breakpoint);
    let mode = views.handle_all(vec![ViewEvent::Resized { width: 600 }, ViewEvent::ShowSchedule]);
    println!("On a 600px wide window, the views are {:?}", mode);

    Ok(())
}
