pub mod dto;
pub mod error;
pub mod grpc_service;
pub mod http_handlers;
pub mod session;
