//! # HTTP 接口模块
//!
//! JSON API、报表下载与静态看板页面

pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use routes::create_routes;
pub use server::{AppState, DashboardServer, create_router};
pub use services::EggService;
