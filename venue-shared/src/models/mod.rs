pub mod availability;
pub mod booking;
pub mod events;
pub mod venue;
