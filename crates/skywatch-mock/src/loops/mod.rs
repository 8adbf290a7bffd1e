//! Background loops.

pub mod simulate_loop;
