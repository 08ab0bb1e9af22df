//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod auth_service;
pub mod batch_service;
pub mod campaign_service;
pub mod contact_store;
pub mod delivery_service;
pub mod render_service;
pub mod settings_service;
