pub mod contract;
pub mod rating_event;
pub mod recommendation;
