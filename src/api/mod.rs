pub mod handlers;
pub mod mock_handlers;
pub mod routes;
