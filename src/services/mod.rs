pub mod temp_store;
pub mod upload_service;
pub mod uploader;
