pub mod app_config;
pub mod database;
pub mod spot_repo;
pub mod ticket_repo;
pub mod memory_repo;

pub use database::DbClient;
pub use spot_repo::PostgresSpotRepository;
pub use ticket_repo::PostgresTicketRepository;
pub use memory_repo::MemoryStore;
