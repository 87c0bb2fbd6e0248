// Terminal front end for the FPL planner.

pub mod tui;
