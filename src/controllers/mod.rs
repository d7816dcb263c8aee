pub mod order_controller;
pub mod route_controller;
