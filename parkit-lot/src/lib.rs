pub mod allocator;
pub mod locks;
pub mod manager;

#[cfg(test)]
mod fakes;

pub use allocator::SpotAllocator;
pub use locks::PlateLocks;
pub use manager::{EntryReceipt, ExitReceipt, TicketLifecycleManager};
