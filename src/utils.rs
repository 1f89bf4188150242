//! Some utility functions

use crate::reconciler::projection::{Appointment, ListProjection};
use crate::task::Task;

/// A debug utility that pretty-prints the list view
pub fn print_list_projection(projection: &ListProjection) {
    let lists = [
        ("Unscheduled", &projection.unscheduled),
        ("Scheduled", &projection.scheduled),
        ("Completed", &projection.completed),
        ("Past", &projection.past),
    ];
    for (title, tasks) in lists.iter() {
        if tasks.is_empty() && *title == "Past" {
            continue;
        }
        println!("{} ({})", title, tasks.len());
        for task in tasks.iter() {
            print_task(task);
        }
    }
}

pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let dates = match task.schedule() {
        None => String::new(),
        Some(schedule) => format!(" [{} → {}]", schedule.start().format("%Y-%m-%d %H:%M"), schedule.end().format("%Y-%m-%d %H:%M")),
    };
    println!("    {} {}{}\t{}", completion, task.description(), dates, task.id());
}

/// A debug utility that pretty-prints the calendar view
pub fn print_calendar(appointments: &[Appointment]) {
    println!("Calendar ({})", appointments.len());
    for appointment in appointments {
        let late = if appointment.past_due { "!" } else { " " };
        println!("    {} {} → {}\t{}",
            late,
            appointment.start_date.format("%Y-%m-%d %H:%M"),
            appointment.end_date.format("%Y-%m-%d %H:%M"),
            appointment.title);
    }
}
