pub mod optimization_routes;
pub mod order_routes;
pub mod route_routes;
