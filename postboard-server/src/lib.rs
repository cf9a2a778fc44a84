//! Post board backend: accounts, paginated post feeds and owner-gated
//! editing, served over HTTP (actix-web) and gRPC (tonic).

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub mod proto {
    tonic::include_proto!("postboard");
}
