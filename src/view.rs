//! Which of the list and schedule views are visible
//!
//! Wide windows show both views side by side. Compact windows show one view at a time, and a footer lets the user switch between them.

use bitflags::bitflags;

use crate::config::DEFAULT_COMPACT_LAYOUT_BREAKPOINT;

bitflags! {
    /// The set of views currently displayed
    pub struct ActiveViews: u8 {
        /// The task lists
        const TASKS = 1;
        /// The calendar
        const SCHEDULE = 2;
    }
}

/// The three reachable combinations of [`ActiveViews`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    TaskOnly,
    ScheduleOnly,
    Both,
}

/// What the view controller reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// The window now has this width (in pixels)
    Resized { width: u32 },
    /// The user asked for the task lists
    ShowTasks,
    /// The user asked for the calendar
    ShowSchedule,
}

/// Decides which views are visible, given resize events and explicit view switches
#[derive(Clone, Debug)]
pub struct ViewController {
    breakpoint: u32,
    compact: bool,
    active: ActiveViews,
}

impl ViewController {
    /// Create a controller for a window of a given width.
    /// Windows narrower than `breakpoint` use the compact layout
    pub fn new(width: u32, breakpoint: u32) -> Self {
        let compact = width < breakpoint;
        let active = if compact {
            ActiveViews::TASKS
        } else {
            ActiveViews::TASKS | ActiveViews::SCHEDULE
        };
        Self { breakpoint, compact, active }
    }

    pub fn with_default_breakpoint(width: u32) -> Self {
        Self::new(width, DEFAULT_COMPACT_LAYOUT_BREAKPOINT)
    }

    pub fn task_view_active(&self) -> bool     { self.active.contains(ActiveViews::TASKS)    }
    pub fn schedule_view_active(&self) -> bool { self.active.contains(ActiveViews::SCHEDULE) }
    pub fn active_views(&self) -> ActiveViews  { self.active  }
    /// Whether the compact layout (one view at a time, with a view-switching footer) is in use
    pub fn is_compact(&self) -> bool           { self.compact }

    pub fn mode(&self) -> ViewMode {
        match (self.task_view_active(), self.schedule_view_active()) {
            (true, true) => ViewMode::Both,
            (false, true) => ViewMode::ScheduleOnly,
            _ => ViewMode::TaskOnly,
        }
    }

    /// React to an event, and return the resulting mode
    pub fn handle(&mut self, event: ViewEvent) -> ViewMode {
        match event {
            ViewEvent::Resized { width } => {
                if width < self.breakpoint {
                    // Only switch views when entering the compact layout, so that a user choice survives further resizes
                    if !self.compact {
                        self.compact = true;
                        self.active = ActiveViews::TASKS;
                    }
                } else if width > self.breakpoint {
                    self.compact = false;
                    self.active = ActiveViews::TASKS | ActiveViews::SCHEDULE;
                }
            },
            ViewEvent::ShowTasks => self.active = ActiveViews::TASKS,
            ViewEvent::ShowSchedule => self.active = ActiveViews::SCHEDULE,
        }
        log::trace!("View event {:?}: now {:?}", event, self.mode());
        self.mode()
    }

    /// Drain an event source, and return the final mode
    pub fn handle_all<I>(&mut self, events: I) -> ViewMode
    where
        I: IntoIterator<Item = ViewEvent>,
    {
        for event in events {
            self.handle(event);
        }
        self.mode()
    }
}
