pub mod auth_dto;
pub mod envelope;
pub mod profile_dto;
pub mod stage_dto;
