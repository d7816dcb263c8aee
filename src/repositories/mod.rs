pub mod order_repository;
pub mod route_repository;
